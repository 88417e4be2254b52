//! Grammars for single lines of a BIF file.
//!
//! Lines are first classified by their leading keyword, then parsed with the grammar of that
//! class, hence a malformed line is reported against the statement it was meant to be.
use std::ops::Range;

use ariadne::{Label, Report, ReportKind, Source};
use chumsky::prelude::*;

type Err = Simple<char>;

/// `type discrete [ card ] { states }` clause.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct VarType {
    pub(crate) card: usize,
    pub(crate) states: Option<Vec<String>>,
}

/// Line outside of a probability block.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Decl {
    Empty,
    Network(String),
    /// Variable name, with its type when the block fits on one line.
    Variable(String, Option<VarType>),
    Type(VarType),
    Probability {
        child: String,
        parents: Vec<String>,
    },
    Ignored,
}

/// Line inside of a probability block.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Body {
    Empty,
    Close,
    Table(Vec<f64>),
    Default(Vec<f64>),
    Entry { states: Vec<String>, values: Vec<f64> },
    Raw(Vec<String>),
    Ignored,
}

#[derive(Debug, Clone)]
pub(crate) struct LineError {
    pub(crate) msg: String,
    pub(crate) report: String,
}

fn is_blank(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || line.starts_with("//") || line.starts_with('#')
}

fn is_close(line: &str) -> bool {
    matches!(line.trim(), "}" | "};")
}

fn leading_keyword(line: &str) -> &str {
    let line = line.trim_start();
    let end = line
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(line.len());
    &line[..end]
}

/// Type clause with a `{` without a matching `}`: a state list continued on the next lines.
pub(crate) fn open_state_list(line: &str) -> bool {
    let clause = match leading_keyword(line) {
        "type" => line,
        "variable" => match line.find(" type ") {
            Some(i) => &line[i..],
            None => return false,
        },
        _ => return false,
    };
    clause
        .find('{')
        .is_some_and(|i| !clause[i..].contains('}'))
}

pub(crate) fn parse_decl(line: &str) -> Result<Decl, LineError> {
    if is_blank(line) {
        return Ok(Decl::Empty);
    }
    match leading_keyword(line) {
        "network" => run(network(), line),
        "variable" => run(variable(), line),
        "type" => run(var_type(), line),
        "probability" => run(probability(), line),
        _ => Ok(Decl::Ignored),
    }
}

pub(crate) fn parse_body(line: &str) -> Result<Body, LineError> {
    if is_blank(line) {
        return Ok(Body::Empty);
    }
    if is_close(line) {
        return Ok(Body::Close);
    }
    // brace of the probability statement on its own line
    if line.trim() == "{" {
        return Ok(Body::Empty);
    }
    match leading_keyword(line) {
        "table" => run(table(), line),
        "default" => run(default(), line),
        "property" => Ok(Body::Ignored),
        "" if line.trim_start().starts_with('(') => run(entry(), line),
        _ => run(raw(), line),
    }
}

fn kw(s: &'static str) -> impl Parser<char, (), Error = Err> + Clone {
    text::keyword::<_, _, Err>(s).padded()
}

fn name() -> impl Parser<char, String, Error = Err> + Clone {
    filter::<_, _, Err>(|c: &char| c.is_alphanumeric() || *c == '_')
        .repeated()
        .at_least(1)
        .collect::<String>()
        .padded()
}

fn raw_token() -> impl Parser<char, String, Error = Err> + Clone {
    filter::<_, _, Err>(|c: &char| !c.is_whitespace() && !matches!(c, ',' | ';' | '(' | ')' | '{' | '}'))
        .repeated()
        .at_least(1)
        .collect::<String>()
}

fn token() -> impl Parser<char, String, Error = Err> + Clone {
    raw_token().padded()
}

fn number() -> impl Parser<char, f64, Error = Err> + Clone {
    raw_token()
        .try_map(|s: String, span: Range<usize>| {
            s.parse::<f64>()
                .map_err(|_| Simple::custom(span, format!("Invalid number '{}'.", s)))
        })
        .padded()
}

/// Items separated by commas and/or whitespace.
fn list<O>(
    item: impl Parser<char, O, Error = Err> + Clone,
) -> impl Parser<char, Vec<O>, Error = Err> + Clone {
    item.then_ignore(just(',').padded().or_not()).repeated()
}

fn open_brace() -> impl Parser<char, (), Error = Err> + Clone {
    just('{').padded().or_not().ignored()
}

fn terminator() -> impl Parser<char, (), Error = Err> + Clone {
    just(';').padded().or_not().ignored().then_ignore(end())
}

fn network() -> impl Parser<char, Decl, Error = Err> {
    kw("network")
        .ignore_then(token())
        .then_ignore(open_brace())
        .then_ignore(end())
        .map(Decl::Network)
}

fn variable() -> impl Parser<char, Decl, Error = Err> {
    let ty = type_clause().then_ignore(just(';').padded().or_not());
    kw("variable")
        .ignore_then(name())
        .then_ignore(open_brace())
        .then(ty.or_not())
        .then_ignore(just('}').padded().or_not())
        .then_ignore(end())
        .map(|(name, ty)| Decl::Variable(name, ty))
}

fn var_type() -> impl Parser<char, Decl, Error = Err> {
    type_clause().then_ignore(terminator()).map(Decl::Type)
}

fn type_clause() -> impl Parser<char, VarType, Error = Err> {
    let card = filter::<_, _, Err>(|c: &char| !c.is_whitespace() && *c != ']')
        .repeated()
        .at_least(1)
        .collect::<String>()
        .try_map(|s: String, span: Range<usize>| {
            s.parse::<usize>()
                .map_err(|_| Simple::custom(span, format!("Invalid cardinality '{}'.", s)))
        })
        .padded()
        .delimited_by(just('[').padded(), just(']').padded());
    let state = filter::<_, _, Err>(|c: &char| *c != ',' && *c != '}')
        .repeated()
        .collect::<String>()
        .try_map(|s: String, span: Range<usize>| {
            let s = s.trim();
            if s.is_empty() {
                Err(Simple::custom(span, "Empty state name."))
            } else {
                Ok(s.to_owned())
            }
        });
    let states = state
        .separated_by(just(','))
        .delimited_by(just('{').padded(), just('}').padded());
    kw("type")
        .ignore_then(kw("discrete"))
        .ignore_then(card)
        .then(states.or_not())
        .map(|(card, states)| VarType { card, states })
}

fn probability() -> impl Parser<char, Decl, Error = Err> {
    let parents = just('|').padded().ignore_then(list(name()));
    kw("probability")
        .ignore_then(
            name()
                .then(parents.or_not())
                .delimited_by(just('(').padded(), just(')').padded()),
        )
        .then_ignore(open_brace())
        .then_ignore(end())
        .map(|(child, parents)| Decl::Probability {
            child,
            parents: parents.unwrap_or_default(),
        })
}

fn table() -> impl Parser<char, Body, Error = Err> {
    kw("table")
        .ignore_then(list(number()))
        .then_ignore(terminator())
        .map(Body::Table)
}

fn default() -> impl Parser<char, Body, Error = Err> {
    kw("default")
        .ignore_then(list(number()))
        .then_ignore(terminator())
        .map(Body::Default)
}

fn entry() -> impl Parser<char, Body, Error = Err> {
    list(token())
        .delimited_by(just('(').padded(), just(')').padded())
        .then(list(number()))
        .then_ignore(terminator())
        .map(|(states, values)| Body::Entry { states, values })
}

fn raw() -> impl Parser<char, Body, Error = Err> {
    list(token()).then_ignore(terminator()).map(Body::Raw)
}

fn run<O>(parser: impl Parser<char, O, Error = Err>, line: &str) -> Result<O, LineError> {
    parser.parse(line).map_err(|errs| render(line, errs))
}

fn describe(e: &Err) -> String {
    if let chumsky::error::SimpleReason::Custom(msg) = e.reason() {
        msg.clone()
    } else {
        format!(
            "Unexpected {}, expected {}.",
            e.found()
                .map(|c| format!("'{}'", c))
                .unwrap_or_else(|| "end of line".to_string()),
            if e.expected().len() == 0 {
                "something else".to_string()
            } else {
                e.expected()
                    .map(|expected| match expected {
                        Some(expected) => format!("'{}'", expected),
                        None => "end of line".to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(", ")
            },
        )
    }
}

fn render(line: &str, errs: Vec<Err>) -> LineError {
    let msg = errs
        .first()
        .map(describe)
        .unwrap_or_else(|| "Malformed line.".to_string());
    let mut report = Vec::new();
    for e in errs {
        let label = match e.reason() {
            chumsky::error::SimpleReason::Custom(msg) => msg.clone(),
            _ => format!(
                "Unexpected {}",
                e.found()
                    .map(|c| format!("token '{}'", c))
                    .unwrap_or_else(|| "end of line".to_string())
            ),
        };
        // Writing to a Vec does not fail.
        let _ = Report::build(ReportKind::Error, (), e.span().start)
            .with_config(ariadne::Config::default().with_color(false))
            .with_message(describe(&e))
            .with_label(Label::new(e.span()).with_message(label))
            .finish()
            .write(Source::from(line), &mut report);
    }
    LineError {
        msg,
        report: String::from_utf8_lossy(&report).into_owned(),
    }
}
