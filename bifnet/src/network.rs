use std::io::BufRead;
use std::path::Path;

use indexmap::IndexMap;
use itertools::Itertools;

use crate::{bif, BifError, Config, Factor, Loc, Result, VarId, Variable};

type NamedList<T> = IndexMap<String, T>;
type VarVec<T> = Vec<T>;

/// A Bayesian network: variables, the parent/child relations between them and the
/// conditional probability table of each variable.
///
/// Variables are stored in declaration order, the position of a variable is its id. The
/// adjacency lists and the tables are indexed by variable id.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct BayesNet {
    pub(crate) name: Option<String>,
    pub(crate) vars: NamedList<Variable>,
    pub(crate) parents: VarVec<Vec<VarId>>,
    pub(crate) children: VarVec<Vec<VarId>>,
    pub(crate) factors: VarVec<Option<Factor>>,
}

impl BayesNet {
    /// Parse a network file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_file_with_config(path, &Config::default())
    }

    pub fn from_file_with_config(path: impl AsRef<Path>, config: &Config) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file), config)
    }

    pub fn from_reader(reader: impl BufRead, config: &Config) -> Result<Self> {
        let mut builder = bif::Builder::new(config);
        for line in reader.lines() {
            builder.feed(line?.as_str())?;
        }
        builder.finish()
    }

    /// Name given by the `network` statement, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
    pub fn len(&self) -> usize {
        self.vars.len()
    }
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// All variables, in id order.
    pub fn variables(&self) -> impl Iterator<Item = &Variable> + '_ {
        self.vars.values()
    }
    /// Variables without parents.
    pub fn roots(&self) -> impl Iterator<Item = &Variable> + '_ {
        self.filter_vars(|pa, _| pa.is_empty())
    }
    /// Variables without children.
    pub fn leafs(&self) -> impl Iterator<Item = &Variable> + '_ {
        self.filter_vars(|_, ch| ch.is_empty())
    }
    /// Variables with both parents and children.
    pub fn internals(&self) -> impl Iterator<Item = &Variable> + '_ {
        self.filter_vars(|pa, ch| !pa.is_empty() && !ch.is_empty())
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.vars.get(name)
    }
    pub fn variable_by_id(&self, id: VarId) -> Option<&Variable> {
        self.vars.get_index(id).map(|(_, v)| v)
    }
    pub fn get_varid(&self, name: &str) -> Result<VarId> {
        self.vars
            .get_index_of(name)
            .ok_or_else(|| BifError::UnknownVariable {
                loc: Loc(None),
                name: name.to_owned(),
            })
    }

    /// Parents of a variable, in the order of its probability statement.
    pub fn parents(&self, name: &str) -> Option<impl Iterator<Item = &Variable> + '_> {
        let id = self.vars.get_index_of(name)?;
        Some(self.resolve(&self.parents[id]))
    }
    pub fn children(&self, name: &str) -> Option<impl Iterator<Item = &Variable> + '_> {
        let id = self.vars.get_index_of(name)?;
        Some(self.resolve(&self.children[id]))
    }

    /// Conditional probability table of a variable, None if the variable has no table.
    pub fn factor(&self, name: &str) -> Option<&Factor> {
        let id = self.vars.get_index_of(name)?;
        self.factors[id].as_ref()
    }

    fn resolve<'a>(&'a self, ids: &'a [VarId]) -> impl Iterator<Item = &'a Variable> + 'a {
        ids.iter().map(move |id| &self.vars[*id])
    }

    fn filter_vars<F>(&self, f: F) -> impl Iterator<Item = &Variable> + '_
    where
        F: Fn(&[VarId], &[VarId]) -> bool + 'static,
    {
        self.vars
            .values()
            .enumerate()
            .filter(move |(id, _)| {
                f(self.parents[*id].as_slice(), self.children[*id].as_slice())
            })
            .map(|(_, v)| v)
    }

    // Construction, only used while parsing.

    pub(crate) fn add_var(&mut self, var: Variable) -> Result<VarId> {
        if self.vars.contains_key(var.name()) {
            return Err(BifError::schema(format!(
                "variable {} is declared twice.",
                var.name()
            )));
        }
        let (id, _) = self.vars.insert_full(var.name().to_owned(), var);
        self.parents.push(Vec::new());
        self.children.push(Vec::new());
        self.factors.push(None);
        Ok(id)
    }

    /// Record the parents of `child`, and `child` as a child of each of them.
    pub(crate) fn add_family(&mut self, child: VarId, parents: &[VarId]) {
        self.parents[child] = parents.to_vec();
        for p in parents {
            if !self.children[*p].contains(&child) {
                self.children[*p].push(child);
            }
        }
    }

    pub(crate) fn has_family(&self, child: VarId) -> bool {
        !self.parents[child].is_empty() || self.factors[child].is_some()
    }

    pub(crate) fn set_factor(&mut self, child: VarId, factor: Factor) -> Result<()> {
        if self.factors[child].is_some() {
            return Err(BifError::schema(format!(
                "variable {} has two probability tables.",
                self.vars[child].name()
            )));
        }
        self.factors[child] = Some(factor);
        Ok(())
    }
}

impl std::fmt::Display for BayesNet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Vars: ({})", self.variables().join(", "))?;
        for (id, v) in self.vars.values().enumerate() {
            writeln!(f, "PA[{}]: ({})", v.name(), self.resolve(&self.parents[id]).join(", "))?;
        }
        for (id, v) in self.vars.values().enumerate() {
            writeln!(f, "CH[{}]: ({})", v.name(), self.resolve(&self.children[id]).join(", "))?;
        }
        Ok(())
    }
}
