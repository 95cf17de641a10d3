//! Incremental matcher: a nondeterministic stack automaton over codepoints.
//!
//! `MatcherState` keeps every parse branch that is still consistent with the
//! input consumed so far. Each call to [`MatcherState::advance`] moves all of
//! them past one codepoint and returns a new state; the old one stays valid,
//! so callers can branch or backtrack freely.
//!
//! - Branches are deduplicated and kept in the order they were first reached
//! - An empty branch means the root rule is complete ([`MatcherState::is_accepting`])
//! - [`MatcherState::expected`] lists the groups that may come next

mod graph;
mod stack;

use std::sync::Arc;

use crate::error::{Error, GrammarError, InputError};
use crate::grammar::{RuleElement, RuleTable, SymbolId};

pub use graph::RuleGraph;
pub use stack::{Branches, ParseStack, Position};

use stack::{match_group, scan_group};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Codepoints to feed, from text, a single codepoint or a codepoint sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Input(Vec<u32>);

impl Input {
    pub fn codepoints(&self) -> &[u32] {
        &self.0
    }
}

impl From<&str> for Input {
    fn from(text: &str) -> Self {
        Self(text.chars().map(u32::from).collect())
    }
}

impl From<String> for Input {
    fn from(text: String) -> Self {
        Self::from(text.as_str())
    }
}

impl From<char> for Input {
    fn from(c: char) -> Self {
        Self(vec![c as u32])
    }
}

impl From<u32> for Input {
    fn from(codepoint: u32) -> Self {
        Self(vec![codepoint])
    }
}

impl From<&[u32]> for Input {
    fn from(codepoints: &[u32]) -> Self {
        Self(codepoints.to_vec())
    }
}

impl From<Vec<u32>> for Input {
    fn from(codepoints: Vec<u32>) -> Self {
        Self(codepoints)
    }
}

// ---------------------------------------------------------------------------
// Expected items
// ---------------------------------------------------------------------------

/// A character-class group as inclusive ranges.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CharClass {
    pub negated: bool,
    pub ranges: Vec<(u32, u32)>,
}

impl CharClass {
    fn at(elements: &[RuleElement], offset: usize) -> Self {
        let mut ranges = Vec::new();
        let (negated, _) = scan_group(elements, offset, |lo, hi| ranges.push((lo, hi)));
        Self { negated, ranges }
    }

    pub fn contains(&self, codepoint: u32) -> bool {
        let listed = self
            .ranges
            .iter()
            .any(|&(lo, hi)| lo <= codepoint && codepoint <= hi);
        listed != self.negated
    }
}

/// Something the matcher can accept next.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expected {
    /// A codepoint from this class.
    Class(CharClass),
    /// End of input: the text so far is complete.
    End,
}

// ---------------------------------------------------------------------------
// Matcher state
// ---------------------------------------------------------------------------

/// Live parse branches after some prefix of the input.
#[derive(Debug, Clone)]
pub struct MatcherState {
    graph: Arc<RuleGraph>,
    stacks: Vec<ParseStack>,
    consumed: usize,
}

impl MatcherState {
    /// State before any input, with `root` as the start rule.
    pub fn initial(rules: Arc<RuleTable>, root: SymbolId) -> Result<Self, GrammarError> {
        Ok(Self::new(Arc::new(RuleGraph::new(rules, root)?)))
    }

    /// State before any input, from a prepared graph.
    pub fn new(graph: Arc<RuleGraph>) -> Self {
        let stacks = graph.initial_stacks();
        Self {
            graph,
            stacks,
            consumed: 0,
        }
    }

    /// Build the initial state and feed `input` through it.
    ///
    /// # Example
    /// ```
    /// use std::sync::Arc;
    /// use gbnf::{compile, MatcherState};
    ///
    /// let rules = Arc::new(compile(r#"root ::= "a" "b"*"#).unwrap());
    /// let root = rules.root_id();
    /// let state = MatcherState::parse(rules.clone(), root, "abbb").unwrap();
    /// assert!(state.is_accepting());
    ///
    /// let err = MatcherState::parse(rules, root, "ac").unwrap_err();
    /// assert!(err.to_string().starts_with("Failed to parse input string:"));
    /// ```
    pub fn parse(
        rules: Arc<RuleTable>,
        root: SymbolId,
        input: impl Into<Input>,
    ) -> Result<Self, Error> {
        let state = Self::initial(rules, root)?;
        let input = input.into();
        Ok(state.feed(input.codepoints())?)
    }

    /// Move every branch past `codepoint`. `None` if no branch accepts it.
    pub fn advance(&self, codepoint: u32) -> Option<MatcherState> {
        let mut next = Branches::new();
        for stack in &self.stacks {
            let Some(head) = stack.head() else {
                continue;
            };
            let Some(rule) = self.graph.rule(head.rule) else {
                continue;
            };
            let (matched, end) = match_group(rule.elements(), head.offset(), codepoint);
            if !matched {
                continue;
            }
            let mut advanced = stack.popped();
            if !rule.get(end).is_end_of_sequence() {
                advanced.push(Position::new(head.rule, end));
            }
            self.graph.expand(advanced, &mut next);
        }

        tracing::trace!(
            codepoint,
            before = self.stacks.len(),
            after = next.len(),
            "advance"
        );

        if next.is_empty() {
            return None;
        }
        Some(MatcherState {
            graph: Arc::clone(&self.graph),
            stacks: next.into_stacks(),
            consumed: self.consumed + 1,
        })
    }

    /// Advance through `codepoints`, failing at the first rejected one.
    ///
    /// The error position is an index into `codepoints`.
    pub fn feed(&self, codepoints: &[u32]) -> Result<MatcherState, InputError> {
        let mut state = self.clone();
        for (i, &codepoint) in codepoints.iter().enumerate() {
            state = state
                .advance(codepoint)
                .ok_or_else(|| InputError::new(codepoints, i))?;
        }
        Ok(state)
    }

    pub fn feed_str(&self, text: &str) -> Result<MatcherState, InputError> {
        let codepoints: Vec<u32> = text.chars().map(u32::from).collect();
        self.feed(&codepoints)
    }

    /// Whether the input consumed so far is a complete string of the grammar.
    pub fn is_accepting(&self) -> bool {
        self.stacks.iter().any(ParseStack::is_empty)
    }

    /// Whether `codepoint` would be accepted next.
    pub fn accepts(&self, codepoint: u32) -> bool {
        self.stacks.iter().any(|stack| {
            stack.head().is_some_and(|head| {
                self.graph
                    .rule(head.rule)
                    .is_some_and(|rule| match_group(rule.elements(), head.offset(), codepoint).0)
            })
        })
    }

    /// Distinct items acceptable next, in branch order.
    pub fn expected(&self) -> Vec<Expected> {
        let mut out = Vec::new();
        for stack in &self.stacks {
            let item = match stack.head() {
                None => Expected::End,
                Some(head) => match self.graph.rule(head.rule) {
                    Some(rule) => Expected::Class(CharClass::at(rule.elements(), head.offset())),
                    None => continue,
                },
            };
            if !out.contains(&item) {
                out.push(item);
            }
        }
        out
    }

    /// Number of live branches.
    pub fn len(&self) -> usize {
        self.stacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    /// Codepoints consumed since the initial state.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    pub fn stacks(&self) -> &[ParseStack] {
        &self.stacks
    }

    pub fn graph(&self) -> &Arc<RuleGraph> {
        &self.graph
    }

    pub fn rules(&self) -> &Arc<RuleTable> {
        self.graph.rules()
    }
}
