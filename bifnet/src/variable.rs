use crate::{BifError, Loc, Result, VarId};

/// A discrete random variable of the network.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Variable {
    id: VarId,
    cardinality: usize,
    name: String,
    evidence: bool,
    // None until the state names are declared
    states: Option<Vec<String>>,
}

impl Variable {
    pub fn new(id: VarId, cardinality: usize, name: impl Into<String>, is_evidence: bool) -> Self {
        Self {
            id,
            cardinality,
            name: name.into(),
            evidence: is_evidence,
            states: None,
        }
    }
    pub fn id(&self) -> VarId {
        self.id
    }
    pub fn cardinality(&self) -> usize {
        self.cardinality
    }
    pub fn name(&self) -> &str {
        self.name.as_str()
    }
    pub fn is_evidence(&self) -> bool {
        self.evidence
    }
    pub fn states(&self) -> Option<&[String]> {
        self.states.as_deref()
    }

    /// Set the state names. Can be done only once, and there must be exactly one name per state.
    pub fn set_states(&mut self, states: Vec<String>) -> Result<()> {
        if self.states.is_some() {
            return Err(BifError::schema(format!(
                "states of variable {} are already set.",
                self.name
            )));
        }
        if states.len() != self.cardinality {
            return Err(BifError::schema(format!(
                "variable {} has cardinality {} but {} state names.",
                self.name,
                self.cardinality,
                states.len()
            )));
        }
        for (i, s) in states.iter().enumerate() {
            if states[..i].contains(s) {
                return Err(BifError::schema(format!(
                    "state {} of variable {} is declared twice.",
                    s, self.name
                )));
            }
        }
        self.states = Some(states);
        Ok(())
    }

    /// Index of the state named `state`.
    pub fn state_id(&self, state: &str) -> Result<usize> {
        self.states
            .as_ref()
            .and_then(|states| states.iter().position(|s| s == state))
            .ok_or_else(|| BifError::UnknownState {
                loc: Loc(None),
                var: self.name.clone(),
                state: state.to_owned(),
            })
    }
}

impl std::fmt::Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.name, self.cardinality)
    }
}
