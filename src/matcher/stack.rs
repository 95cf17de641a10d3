//! Parse stacks, branch sets and character-class group scanning.

use rustc_hash::FxHashSet;

use crate::grammar::{RuleElement, SymbolId};

// ---------------------------------------------------------------------------
// Position / stack
// ---------------------------------------------------------------------------

/// A resume point inside a rule body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub rule: SymbolId,
    pub offset: u32,
}

impl Position {
    #[inline]
    pub fn new(rule: SymbolId, offset: usize) -> Self {
        Self {
            rule,
            offset: offset as u32,
        }
    }

    #[inline]
    pub fn offset(self) -> usize {
        self.offset as usize
    }

    /// Same rule, `by` elements further on.
    #[inline]
    pub(crate) fn advanced(self, by: usize) -> Self {
        Self::new(self.rule, self.offset() + by)
    }
}

/// One parse branch: resume positions with the current head last.
///
/// A non-empty stack produced by expansion always has a character-class
/// group at its head. An empty stack means the root rule is complete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ParseStack {
    positions: Vec<Position>,
}

impl ParseStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn head(&self) -> Option<Position> {
        self.positions.last().copied()
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub(crate) fn push(&mut self, position: Position) {
        self.positions.push(position);
    }

    pub(crate) fn pop(&mut self) -> Option<Position> {
        self.positions.pop()
    }

    /// Copy of this stack without its head.
    pub(crate) fn popped(&self) -> Self {
        let mut stack = self.clone();
        stack.pop();
        stack
    }
}

impl From<Vec<Position>> for ParseStack {
    fn from(positions: Vec<Position>) -> Self {
        Self { positions }
    }
}

// ---------------------------------------------------------------------------
// Branches: ordered, deduplicated output of one expansion pass
// ---------------------------------------------------------------------------

/// Branch set under construction.
///
/// `seen` records every stack visited during the pass, intermediate ones
/// included, so an identical stack is expanded at most once. `stacks` holds
/// the finished branches in the order they were first reached.
#[derive(Debug, Default)]
pub struct Branches {
    stacks: Vec<ParseStack>,
    seen: FxHashSet<ParseStack>,
}

impl Branches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `stack` as visited. Returns false if it already was.
    pub(crate) fn visit(&mut self, stack: &ParseStack) -> bool {
        if self.seen.contains(stack) {
            return false;
        }
        self.seen.insert(stack.clone());
        true
    }

    /// Record a finished branch. Callers visit it first.
    pub(crate) fn push(&mut self, stack: ParseStack) {
        self.stacks.push(stack);
    }

    pub fn len(&self) -> usize {
        self.stacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    pub fn into_stacks(self) -> Vec<ParseStack> {
        self.stacks
    }
}

// ---------------------------------------------------------------------------
// Character-class groups
// ---------------------------------------------------------------------------

/// Walk the group starting at `offset`, calling `f(lo, hi)` for each member
/// (single values come through as `lo == hi`).
///
/// Returns whether the group is negated and the offset just past it.
pub(crate) fn scan_group(
    elements: &[RuleElement],
    offset: usize,
    mut f: impl FnMut(u32, u32),
) -> (bool, usize) {
    let negated = matches!(elements.get(offset), Some(RuleElement::CharNot(_)));
    let mut i = offset;
    loop {
        let lo = match elements.get(i) {
            Some(&RuleElement::Char(c))
            | Some(&RuleElement::CharNot(c))
            | Some(&RuleElement::CharAlt(c)) => c,
            _ => break,
        };
        if let Some(&RuleElement::CharRngUpper(hi)) = elements.get(i + 1) {
            f(lo, hi);
            i += 2;
        } else {
            f(lo, lo);
            i += 1;
        }
        if !matches!(elements.get(i), Some(RuleElement::CharAlt(_))) {
            break;
        }
    }
    (negated, i)
}

/// Test `codepoint` against the group at `offset`.
///
/// Returns the verdict and the offset just past the group.
#[inline]
pub(crate) fn match_group(elements: &[RuleElement], offset: usize, codepoint: u32) -> (bool, usize) {
    let mut found = false;
    let (negated, end) = scan_group(elements, offset, |lo, hi| {
        found |= lo <= codepoint && codepoint <= hi;
    });
    (found != negated, end)
}
