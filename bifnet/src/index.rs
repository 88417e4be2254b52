//! Mixed-radix indexing of probability tables.
//!
//! A table over a [`Scope`] is stored flat, the last member of the scope varying fastest:
//! the flat index of an assignment is `sum(state(v) * stride(v))` where `stride(v)` is the
//! product of the cardinalities of the members after `v`.
//!
//! Input files do not necessarily write values in that order. [`OrderedIndex`] maps the
//! position of a value in a listing (enumerated with the first listed variable fastest) to
//! its canonical flat index, and [`AttributionIndex`] computes the canonical index of a fully
//! specified assignment.
use std::collections::HashMap;

use itertools::izip;

use crate::{BifError, Result, VarId, Variable};

/// Ordered set of variables, the dimensions of a table.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Scope {
    vars: Vec<VarId>,
    cards: Vec<usize>,
}

impl Scope {
    pub fn new<'a>(vars: impl IntoIterator<Item = &'a Variable>) -> Result<Self> {
        let (vars, cards) = vars.into_iter().map(|v| (v.id(), v.cardinality())).unzip();
        Self::from_parts(vars, cards)
    }

    pub fn from_parts(vars: Vec<VarId>, cards: Vec<usize>) -> Result<Self> {
        if vars.len() != cards.len() {
            return Err(BifError::schema(format!(
                "scope has {} variables but {} cardinalities.",
                vars.len(),
                cards.len()
            )));
        }
        for (i, v) in vars.iter().enumerate() {
            if vars[..i].contains(v) {
                return Err(BifError::schema(format!(
                    "variable {} appears twice in scope.",
                    v
                )));
            }
        }
        if cards.contains(&0) {
            return Err(BifError::schema("scope contains a variable with no state."));
        }
        Ok(Self { vars, cards })
    }

    pub fn vars(&self) -> &[VarId] {
        &self.vars
    }
    pub fn cards(&self) -> &[usize] {
        &self.cards
    }
    pub fn len(&self) -> usize {
        self.vars.len()
    }
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
    /// Number of joint assignments, i.e. the length of a table over this scope.
    pub fn size(&self) -> usize {
        self.cards.iter().product()
    }
    pub fn position(&self, var: VarId) -> Option<usize> {
        self.vars.iter().position(|v| *v == var)
    }
    pub fn contains(&self, var: VarId) -> bool {
        self.position(var).is_some()
    }
    /// Place value of each member in the canonical flat order.
    pub fn strides(&self) -> Vec<usize> {
        let mut strides = vec![1; self.cards.len()];
        let mut acc = 1;
        for (s, c) in strides.iter_mut().zip(self.cards.iter()).rev() {
            *s = acc;
            acc *= c;
        }
        strides
    }
}

/// Cursor over the canonical indices of a table, in the order of a listing.
///
/// The listing enumerates the joint assignments of `var_ord` as an odometer whose first digit
/// (the first variable of `var_ord`) is the fastest. Iterating yields the canonical index in
/// `family` of each successive assignment, `family.size()` times, each index exactly once.
#[derive(Debug, Clone)]
pub struct OrderedIndex {
    // current state of each var_ord member
    counters: Vec<usize>,
    cards: Vec<usize>,
    // canonical stride of each var_ord member
    strides: Vec<usize>,
    remaining: usize,
}

impl OrderedIndex {
    pub fn new(var_ord: &Scope, family: &Scope) -> Result<Self> {
        if var_ord.len() != family.len() {
            return Err(BifError::schema(format!(
                "listing order has {} variables, table has {}.",
                var_ord.len(),
                family.len()
            )));
        }
        let family_strides = family.strides();
        let strides = izip!(var_ord.vars(), var_ord.cards())
            .map(|(v, c)| match family.position(*v) {
                Some(p) if family.cards()[p] == *c => Ok(family_strides[p]),
                Some(_) => Err(BifError::schema(format!(
                    "variable {} has inconsistent cardinalities.",
                    v
                ))),
                None => Err(BifError::schema(format!(
                    "variable {} is not in the table scope.",
                    v
                ))),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            counters: vec![0; var_ord.len()],
            cards: var_ord.cards().to_vec(),
            strides,
            remaining: family.size(),
        })
    }

    /// Canonical index of the current assignment.
    pub fn index(&self) -> usize {
        izip!(&self.counters, &self.strides)
            .map(|(c, s)| c * s)
            .sum()
    }

    /// State of each listing variable in the current assignment.
    pub fn states(&self) -> &[usize] {
        &self.counters
    }

    fn advance(&mut self) {
        for (c, card) in self.counters.iter_mut().zip(self.cards.iter()) {
            *c += 1;
            if *c < *card {
                return;
            }
            *c = 0;
        }
    }
}

impl Iterator for OrderedIndex {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let res = self.index();
        self.advance();
        self.remaining -= 1;
        Some(res)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for OrderedIndex {}

/// Canonical index of explicit assignments over a scope.
#[derive(Debug, Clone)]
pub struct AttributionIndex {
    vars: Vec<VarId>,
    cards: Vec<usize>,
    strides: Vec<usize>,
}

impl AttributionIndex {
    pub fn new(family: &Scope) -> Self {
        Self {
            vars: family.vars().to_vec(),
            cards: family.cards().to_vec(),
            strides: family.strides(),
        }
    }

    /// `assignment` maps variable ids to state ids, it must cover every member of the scope.
    /// Entries for other variables are ignored.
    pub fn index(&self, assignment: &HashMap<VarId, usize>) -> Result<usize> {
        izip!(&self.vars, &self.cards, &self.strides)
            .map(|(v, c, s)| match assignment.get(v) {
                Some(state) if state < c => Ok(state * s),
                Some(state) => Err(BifError::schema(format!(
                    "state {} out of range for variable {} with {} states.",
                    state, v, c
                ))),
                None => Err(BifError::schema(format!(
                    "no state assigned to variable {}.",
                    v
                ))),
            })
            .sum()
    }
}
