use ndarray::{ArrayD, ArrayView1, ArrayViewD, Axis, Dimension, Ix1, IxDyn};

use crate::{BifError, Result, Scope};

/// Conditional probability table of a variable.
///
/// The first member of the scope is the variable the table describes, the other members are
/// its parents. Axis `i` of the array is scope member `i`, in standard layout, hence the flat
/// values are in canonical order.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Factor {
    scope: Scope,
    values: ArrayD<f64>,
}

impl Factor {
    pub fn new(scope: Scope, values: Vec<f64>) -> Result<Self> {
        if values.len() != scope.size() {
            return Err(BifError::schema(format!(
                "table has {} values, expected {}.",
                values.len(),
                scope.size()
            )));
        }
        let values = ArrayD::from_shape_vec(IxDyn(scope.cards()), values)
            .map_err(|e| BifError::schema(e.to_string()))?;
        Ok(Self { scope, values })
    }
    pub fn scope(&self) -> &Scope {
        &self.scope
    }
    /// Flat values, in canonical order.
    pub fn values(&self) -> &[f64] {
        // Built by from_shape_vec, always in standard layout.
        self.values.as_slice().unwrap_or_default()
    }
    pub fn array(&self) -> ArrayViewD<'_, f64> {
        self.values.view()
    }
    /// Value for a joint assignment (one state per scope member).
    pub fn get(&self, states: &[usize]) -> Option<f64> {
        if states.len() != self.scope.len() {
            return None;
        }
        self.values.get(states).copied()
    }
    /// Distribution of the variable given one state per parent (scope order).
    pub fn conditional(&self, parent_states: &[usize]) -> Option<ArrayView1<'_, f64>> {
        if self.scope.is_empty() || parent_states.len() + 1 != self.scope.len() {
            return None;
        }
        let mut view = self.values.view();
        for (s, c) in parent_states.iter().zip(&self.scope.cards()[1..]).rev() {
            if s >= c {
                return None;
            }
            let last = view.ndim() - 1;
            view = view.index_axis_move(Axis(last), *s);
        }
        view.into_dimensionality::<Ix1>().ok()
    }
    /// Parent assignments whose conditional distribution does not sum to one, with that sum.
    pub fn unnormalized(&self, tolerance: f64) -> Vec<(Vec<usize>, f64)> {
        if self.scope.is_empty() {
            return Vec::new();
        }
        self.values
            .sum_axis(Axis(0))
            .indexed_iter()
            .filter(|(_, s)| (*s - 1.0).abs() > tolerance)
            .map(|(ix, s)| (ix.slice().to_vec(), *s))
            .collect()
    }
}
