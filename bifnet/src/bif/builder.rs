use std::collections::HashMap;

use super::line_parser::{self, Body, Decl, LineError, VarType};
use crate::{
    AttributionIndex, BayesNet, BifError, Config, Factor, OrderedIndex, Result, Scope, VarId,
    Variable,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    // table, default and (states) values lines
    Marked,
    // rows of raw values
    Legacy,
}

/// Probability block being parsed.
#[derive(Debug)]
struct Family {
    child: VarId,
    card: usize,
    // line of the probability statement
    line: usize,
    // child then parents, in the order of the probability statement
    var_ord: Scope,
    // child then parents sorted by id, the storage order
    family: Scope,
    values: Vec<f64>,
    // for each parent assignment, whether its distribution has been given
    assigned: Vec<bool>,
    default: Option<Vec<f64>>,
    layout: Option<Layout>,
    // position of the next legacy row
    rows: OrderedIndex,
}

impl Family {
    fn n_parent_assignments(&self) -> usize {
        self.assigned.len()
    }
    fn set_layout(&mut self, layout: Layout) -> Result<()> {
        match self.layout {
            Some(l) if l != layout => Err(BifError::schema(
                "probability block mixes raw value rows with table or state entries.",
            )),
            _ => {
                self.layout = Some(layout);
                Ok(())
            }
        }
    }
    fn set(&mut self, index: usize, value: f64) {
        self.values[index] = value;
        let n = self.n_parent_assignments();
        self.assigned[index % n] = true;
    }
}

#[derive(Debug)]
enum State {
    Decl,
    // state list spanning several lines, text accumulated so far
    States { buf: String, line: usize },
    Family(Box<Family>),
}

/// Incremental BIF parser: lines are fed one at a time, the network is returned by
/// [`Builder::finish`].
#[derive(Debug)]
pub struct Builder<'c> {
    config: &'c Config,
    net: BayesNet,
    // name of the last `variable` statement, waiting for its type
    pending: Option<String>,
    state: State,
    line: usize,
}

fn parse_error(line: usize, e: LineError) -> BifError {
    BifError::Parse {
        line,
        msg: e.msg,
        report: e.report,
    }
}

impl<'c> Builder<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self {
            config,
            net: BayesNet::default(),
            pending: None,
            state: State::Decl,
            line: 0,
        }
    }

    /// Process the next line of the input.
    pub fn feed(&mut self, line: &str) -> Result<()> {
        self.line += 1;
        let lineno = self.line;
        self.step(line).map_err(|e| e.at_line(lineno))
    }

    /// End of input, returns the network.
    pub fn finish(self) -> Result<BayesNet> {
        match self.state {
            State::Decl => Ok(self.net),
            State::States { line, .. } => Err(BifError::Parse {
                line,
                msg: "Unterminated state list.".to_owned(),
                report: String::new(),
            }),
            State::Family(fam) => Err(BifError::Parse {
                line: fam.line,
                msg: format!(
                    "Unterminated probability block of variable {}.",
                    self.net.vars[fam.child].name()
                ),
                report: String::new(),
            }),
        }
    }

    fn step(&mut self, line: &str) -> Result<()> {
        let state = std::mem::replace(&mut self.state, State::Decl);
        self.state = match state {
            State::Decl => {
                if line_parser::open_state_list(line) {
                    State::States {
                        buf: line.to_owned(),
                        line: self.line,
                    }
                } else {
                    self.decl(line, self.line)?
                }
            }
            State::States { mut buf, line: start } => {
                buf.push(' ');
                buf.push_str(line);
                if line.contains('}') {
                    self.decl(&buf, start).map_err(|e| e.at_line(start))?
                } else {
                    State::States { buf, line: start }
                }
            }
            State::Family(mut fam) => {
                if self.body(&mut fam, line)? {
                    self.close(*fam)?;
                    State::Decl
                } else {
                    State::Family(fam)
                }
            }
        };
        Ok(())
    }

    fn decl(&mut self, text: &str, line: usize) -> Result<State> {
        match line_parser::parse_decl(text).map_err(|e| parse_error(line, e))? {
            Decl::Empty => {}
            Decl::Ignored => {
                tracing::trace!(line, text, "Ignored line.");
            }
            Decl::Network(name) => {
                self.net.name = Some(name);
            }
            Decl::Variable(name, ty) => {
                self.pending = Some(name);
                if let Some(ty) = ty {
                    self.declare(ty, line)?;
                }
            }
            Decl::Type(ty) => {
                self.declare(ty, line)?;
            }
            Decl::Probability { child, parents } => {
                return Ok(State::Family(Box::new(self.open_family(
                    &child, &parents, line,
                )?)));
            }
        }
        Ok(State::Decl)
    }

    /// Add the pending variable, with the given type.
    fn declare(&mut self, ty: VarType, line: usize) -> Result<()> {
        let VarType { card, states } = ty;
        let name = self.pending.take().ok_or_else(|| BifError::Parse {
            line,
            msg: "Variable type without variable declaration.".to_owned(),
            report: String::new(),
        })?;
        if card == 0 {
            return Err(BifError::schema(format!(
                "variable {} has no state.",
                name
            )));
        }
        let mut var = Variable::new(self.net.len(), card, name, false);
        if let Some(states) = states {
            var.set_states(states)?;
        }
        tracing::debug!(id = var.id(), name = var.name(), card, "New variable.");
        self.net.add_var(var)?;
        Ok(())
    }

    fn open_family(&mut self, child: &str, parents: &[String], line: usize) -> Result<Family> {
        let child_id = self.net.get_varid(child)?;
        let parent_ids = parents
            .iter()
            .map(|p| self.net.get_varid(p))
            .collect::<Result<Vec<_>>>()?;
        for (i, p) in parent_ids.iter().enumerate() {
            if *p == child_id || parent_ids[..i].contains(p) {
                return Err(BifError::schema(format!(
                    "variable {} appears twice in the probability statement of {}.",
                    self.net.vars[*p].name(),
                    child
                )));
            }
        }
        if self.net.has_family(child_id) {
            return Err(BifError::schema(format!(
                "variable {} has two probability statements.",
                child
            )));
        }
        self.net.add_family(child_id, &parent_ids);
        let mut sorted_parents = parent_ids.clone();
        sorted_parents.sort_unstable();
        let var_ord = Scope::new(
            std::iter::once(child_id)
                .chain(parent_ids)
                .map(|id| &self.net.vars[id]),
        )?;
        let family = Scope::new(
            std::iter::once(child_id)
                .chain(sorted_parents)
                .map(|id| &self.net.vars[id]),
        )?;
        let card = self.net.vars[child_id].cardinality();
        tracing::debug!(child, ?parents, "New probability block.");
        Ok(Family {
            child: child_id,
            card,
            line,
            rows: OrderedIndex::new(&var_ord, &family)?,
            values: vec![0.0; family.size()],
            assigned: vec![false; family.size() / card],
            default: None,
            layout: None,
            var_ord,
            family,
        })
    }

    /// Process a line of a probability block, returns true at the end of the block.
    fn body(&mut self, fam: &mut Family, line: &str) -> Result<bool> {
        match line_parser::parse_body(line).map_err(|e| parse_error(self.line, e))? {
            Body::Empty | Body::Ignored => {}
            Body::Close => return Ok(true),
            Body::Table(values) => {
                fam.set_layout(Layout::Marked)?;
                if values.len() != fam.family.size() {
                    return Err(BifError::schema(format!(
                        "table of variable {} has {} values, expected {}.",
                        self.net.vars[fam.child].name(),
                        values.len(),
                        fam.family.size()
                    )));
                }
                let index = OrderedIndex::new(&fam.var_ord, &fam.family)?;
                for (i, v) in index.zip(values) {
                    fam.set(i, v);
                }
            }
            Body::Default(values) => {
                fam.set_layout(Layout::Marked)?;
                self.check_distribution_len(fam, values.len())?;
                fam.default = Some(values);
            }
            Body::Entry { states, values } => {
                fam.set_layout(Layout::Marked)?;
                if states.len() != fam.var_ord.len() - 1 {
                    return Err(BifError::schema(format!(
                        "{} parent states given, variable {} has {} parents.",
                        states.len(),
                        self.net.vars[fam.child].name(),
                        fam.var_ord.len() - 1
                    )));
                }
                self.check_distribution_len(fam, values.len())?;
                let mut assignment = fam.var_ord.vars()[1..]
                    .iter()
                    .zip(states.iter())
                    .map(|(p, s)| -> Result<(VarId, usize)> {
                        Ok((*p, self.net.vars[*p].state_id(s)?))
                    })
                    .collect::<Result<HashMap<_, _>>>()?;
                let index = AttributionIndex::new(&fam.family);
                let mut acc = 0.0;
                for (j, v) in values.into_iter().enumerate() {
                    assignment.insert(fam.child, j);
                    fam.set(index.index(&assignment)?, v);
                    acc += v;
                }
                tracing::trace!(?states, sum = acc, "Distribution entry.");
            }
            Body::Raw(tokens) => {
                fam.set_layout(Layout::Legacy)?;
                if tokens.len() < fam.card {
                    return Err(BifError::schema(format!(
                        "row has {} values, variable {} has {} states.",
                        tokens.len(),
                        self.net.vars[fam.child].name(),
                        fam.card
                    )));
                }
                for tok in &tokens[tokens.len() - fam.card..] {
                    let v = tok.parse::<f64>().map_err(|_| BifError::Parse {
                        line: self.line,
                        msg: format!("Invalid number '{}'.", tok),
                        report: String::new(),
                    })?;
                    let i = fam.rows.next().ok_or_else(|| {
                        BifError::schema(format!(
                            "too many rows for variable {}, expected {}.",
                            self.net.vars[fam.child].name(),
                            fam.n_parent_assignments()
                        ))
                    })?;
                    fam.set(i, v);
                }
            }
        }
        Ok(false)
    }

    fn check_distribution_len(&self, fam: &Family, len: usize) -> Result<()> {
        if len != fam.card {
            return Err(BifError::schema(format!(
                "distribution has {} values, variable {} has {} states.",
                len,
                self.net.vars[fam.child].name(),
                fam.card
            )));
        }
        Ok(())
    }

    fn close(&mut self, mut fam: Family) -> Result<()> {
        let name = self.net.vars[fam.child].name().to_owned();
        let n = fam.n_parent_assignments();
        if fam.layout == Some(Layout::Legacy) && fam.rows.len() != 0 {
            return Err(BifError::schema(format!(
                "variable {} has {} rows, expected {}.",
                name,
                n - fam.rows.len() / fam.card,
                n
            )));
        }
        if let Some(default) = fam.default.take() {
            for p in 0..n {
                if !fam.assigned[p] {
                    for (j, v) in default.iter().enumerate() {
                        fam.set(j * n + p, *v);
                    }
                }
            }
        }
        let factor = Factor::new(fam.family, fam.values)?;
        if let Some(tolerance) = self.config.norm_tolerance() {
            for (parent_states, sum) in factor.unnormalized(tolerance) {
                tracing::warn!(
                    variable = name.as_str(),
                    ?parent_states,
                    sum,
                    "Unnormalized distribution."
                );
            }
        }
        self.net.set_factor(fam.child, factor)
    }
}
