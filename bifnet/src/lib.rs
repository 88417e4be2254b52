pub mod bif;
pub mod factor;
pub mod index;
pub mod network;
pub mod variable;

pub use factor::Factor;
pub use index::{AttributionIndex, OrderedIndex, Scope};
pub use network::BayesNet;
pub use variable::Variable;

use thiserror::Error;

pub type VarId = usize;

/// Tolerance on the sum of a conditional distribution before a warning is emitted.
pub const NORM_TOLERANCE: f64 = 1e-6;

pub type Result<T> = std::result::Result<T, BifError>;

/// Optional line number prefix for error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Loc(pub Option<usize>);

impl std::fmt::Display for Loc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(line) => write!(f, "line {}: ", line),
            None => Ok(()),
        }
    }
}

#[derive(Error, Debug)]
pub enum BifError {
    /// Malformed line or token. `report` holds the rendered diagnostic for the line.
    #[error("line {line}: {msg}")]
    Parse {
        line: usize,
        msg: String,
        report: String,
    },
    #[error("{loc}unknown variable {name}.")]
    UnknownVariable { loc: Loc, name: String },
    #[error("{loc}variable {var} has no state named {state}.")]
    UnknownState {
        loc: Loc,
        var: String,
        state: String,
    },
    #[error("{loc}{msg}")]
    Schema { loc: Loc, msg: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BifError {
    pub(crate) fn schema(msg: impl Into<String>) -> Self {
        Self::Schema {
            loc: Loc(None),
            msg: msg.into(),
        }
    }

    /// Attach a line number, unless the error already carries one.
    pub fn at_line(mut self, line: usize) -> Self {
        match &mut self {
            Self::UnknownVariable { loc, .. }
            | Self::UnknownState { loc, .. }
            | Self::Schema { loc, .. } => {
                if loc.0.is_none() {
                    loc.0 = Some(line);
                }
            }
            Self::Parse { .. } | Self::Io(_) => {}
        }
        self
    }

    /// Line of the input the error refers to, if known.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Parse { line, .. } => Some(*line),
            Self::UnknownVariable { loc, .. }
            | Self::UnknownState { loc, .. }
            | Self::Schema { loc, .. } => loc.0,
            Self::Io(_) => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum deviation from 1 of the sum of a conditional distribution.
    /// Larger deviations are logged as warnings, parsing continues.
    /// If None, distributions are not checked.
    norm_tolerance: Option<f64>,
}

impl Config {
    pub fn with_tolerance(tolerance: f64) -> Self {
        Self {
            norm_tolerance: Some(tolerance),
        }
    }
    pub fn no_normalization_check() -> Self {
        Self {
            norm_tolerance: None,
        }
    }
    pub fn norm_tolerance(&self) -> Option<f64> {
        self.norm_tolerance
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::with_tolerance(NORM_TOLERANCE)
    }
}
