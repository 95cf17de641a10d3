//! Error types for grammar compilation and input matching.
//!
//! Both positioned errors keep the text they refer to, so their `Display`
//! output carries the same line/column context (see [`crate::report`]).

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::report;

/// Why a grammar was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarErrorKind {
    #[error("expecting name")]
    ExpectedName,
    #[error("expecting ::=")]
    ExpectedAssign,
    #[error("expecting newline or end of input")]
    ExpectedNewline,
    #[error("expecting ')'")]
    UnbalancedGroup,
    #[error("expecting preceding item to */+/?")]
    DanglingQuantifier,
    #[error("unknown escape '\\{0}'")]
    UnknownEscape(char),
    #[error("invalid hex digit in escape")]
    InvalidHexEscape,
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("empty character class")]
    EmptyCharClass,
    #[error("rule '{0}' defined multiple times")]
    DuplicateRule(String),
    #[error("undefined rule identifier '{0}'")]
    UndefinedSymbol(String),
    #[error("grammar does not contain a 'root' symbol")]
    MissingRoot,
    #[error("no rules were found")]
    NoRules,
    #[error("groups nested deeper than {0} levels")]
    NestingTooDeep(usize),
    #[error("duration of {0:?} exceeded")]
    DurationExceeded(Duration),
    #[error("left recursion detected for rule '{0}'")]
    LeftRecursion(String),
}

/// A grammar that failed to compile, with the position it failed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarError {
    pub kind: GrammarErrorKind,
    /// The grammar text.
    pub grammar: String,
    /// Char offset into `grammar`.
    pub position: usize,
}

impl GrammarError {
    pub fn new(kind: GrammarErrorKind, grammar: impl Into<String>, position: usize) -> Self {
        Self {
            kind,
            grammar: grammar.into(),
            position,
        }
    }

    pub fn kind(&self) -> &GrammarErrorKind {
        &self.kind
    }

    /// Source lines around the failure, with a `^` marker.
    pub fn context(&self) -> Vec<String> {
        report::position_context(&self.grammar, self.position)
    }
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header = report::grammar_header(&self.kind.to_string());
        f.write_str(&report::render(&header, &self.grammar, self.position))
    }
}

impl std::error::Error for GrammarError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

/// An input codepoint rejected by every live parse branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputError {
    /// The codepoints that were being fed.
    pub input: Vec<u32>,
    /// Index of the rejected codepoint in `input`.
    pub position: usize,
}

impl InputError {
    pub fn new(input: impl Into<Vec<u32>>, position: usize) -> Self {
        Self {
            input: input.into(),
            position,
        }
    }

    /// The rejected codepoint.
    pub fn codepoint(&self) -> Option<u32> {
        self.input.get(self.position).copied()
    }

    /// The fed input as text; invalid codepoints become U+FFFD.
    pub fn input_string(&self) -> String {
        codepoints_to_string(&self.input)
    }

    pub fn context(&self) -> Vec<String> {
        report::position_context(&self.input_string(), self.position)
    }
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&report::render(
            report::INPUT_HEADER,
            &self.input_string(),
            self.position,
        ))
    }
}

impl std::error::Error for InputError {}

/// Either stage failing, for callers that compile and match in one go.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Grammar(#[from] GrammarError),
    #[error(transparent)]
    Input(#[from] InputError),
}

pub(crate) fn codepoints_to_string(codepoints: &[u32]) -> String {
    codepoints
        .iter()
        .map(|&cp| char::from_u32(cp).unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}
