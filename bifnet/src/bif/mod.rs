//! Parser of the BIF interchange format.
//!
//! The input is processed line by line: `line_parser` recognizes the statement on a line,
//! [`Builder`] drives the declarations and probability blocks and fills the [`BayesNet`].
mod builder;
mod line_parser;

pub use builder::Builder;

use crate::{BayesNet, BifError, Config, Result};

/// Parse a network from the text of a BIF file.
pub fn parse_str(src: &str, config: &Config) -> Result<BayesNet> {
    let mut builder = Builder::new(config);
    for line in src.lines() {
        builder.feed(line)?;
    }
    builder.finish()
}

impl std::str::FromStr for BayesNet {
    type Err = BifError;

    fn from_str(s: &str) -> Result<Self> {
        parse_str(s, &Config::default())
    }
}
