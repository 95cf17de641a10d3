//! Rule graph: alternative offsets, nullability and stack expansion.
//!
//! Expansion replaces a `RuleRef` head by the start of each alternative of
//! the referenced rule, until every branch has a character-class group at its
//! head or is empty. Left recursion that pushes a resume position on every
//! turn would make that loop forever, so it is rejected when the graph is
//! built.

use std::sync::Arc;

use crate::error::{GrammarError, GrammarErrorKind};
use crate::grammar::{Rule, RuleElement, RuleTable, SymbolId};

use super::stack::{Branches, ParseStack, Position};

/// Compiled rules prepared for matching. Shared by every state derived from it.
#[derive(Debug)]
pub struct RuleGraph {
    rules: Arc<RuleTable>,
    root: SymbolId,
    /// Start offset of every alternative, per rule.
    alternatives: Vec<Vec<u32>>,
    nullable: Vec<bool>,
}

impl RuleGraph {
    pub fn new(rules: Arc<RuleTable>, root: SymbolId) -> Result<Self, GrammarError> {
        if rules.get(root).is_none() {
            return Err(GrammarError::new(
                GrammarErrorKind::MissingRoot,
                rules.source(),
                0,
            ));
        }

        let alternatives = rules
            .rules()
            .iter()
            .map(|rule| {
                rule.alternative_starts()
                    .into_iter()
                    .map(|offset| offset as u32)
                    .collect()
            })
            .collect();
        let nullable = nullable_rules(&rules);
        check_left_recursion(&rules, &nullable)?;

        tracing::debug!(
            rules = rules.num_rules(),
            nullable = nullable.iter().filter(|&&n| n).count(),
            root = rules.name(root),
            "built rule graph"
        );

        Ok(Self {
            rules,
            root,
            alternatives,
            nullable,
        })
    }

    pub fn rules(&self) -> &Arc<RuleTable> {
        &self.rules
    }

    pub fn root(&self) -> SymbolId {
        self.root
    }

    pub fn rule(&self, id: SymbolId) -> Option<&Rule> {
        self.rules.get(id)
    }

    /// Start offsets of the alternatives of `id`, in declaration order.
    pub fn alternatives(&self, id: SymbolId) -> &[u32] {
        self.alternatives
            .get(id.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether `id` can match the empty string.
    pub fn is_nullable(&self, id: SymbolId) -> bool {
        self.nullable.get(id.index()).copied().unwrap_or(false)
    }

    /// Element at `position`; `End` for anything out of range.
    #[inline]
    pub fn element(&self, position: Position) -> RuleElement {
        self.rules
            .get(position.rule)
            .map_or(RuleElement::End, |rule| rule.get(position.offset()))
    }

    /// Branches before any input: the root rule, fully expanded.
    pub fn initial_stacks(&self) -> Vec<ParseStack> {
        let mut branches = Branches::new();
        self.expand_rule(self.root, &ParseStack::new(), &mut branches);
        branches.into_stacks()
    }

    /// Expand `stack` until every resulting branch is empty or has a group at
    /// its head, appending new branches to `out`.
    pub fn expand(&self, stack: ParseStack, out: &mut Branches) {
        let mut todo = vec![stack];
        while let Some(stack) = todo.pop() {
            if !out.visit(&stack) {
                continue;
            }
            let Some(head) = stack.head() else {
                out.push(stack);
                continue;
            };
            match self.element(head) {
                RuleElement::RuleRef(target) => {
                    let mut base = stack.popped();
                    let resume = head.advanced(1);
                    if !self.element(resume).is_end_of_sequence() {
                        base.push(resume);
                    }
                    // Reversed so alternatives pop off `todo` in declaration order.
                    for &start in self.alternatives(target).iter().rev() {
                        todo.push(self.enter(target, start as usize, &base));
                    }
                }
                element if element.is_group_head() => out.push(stack),
                // Group members and terminators are never pushed as a head.
                _ => {}
            }
        }
    }

    fn expand_rule(&self, id: SymbolId, base: &ParseStack, out: &mut Branches) {
        for &start in self.alternatives(id) {
            self.expand(self.enter(id, start as usize, base), out);
        }
    }

    /// `base` plus the start of an alternative, unless that alternative is empty.
    fn enter(&self, id: SymbolId, start: usize, base: &ParseStack) -> ParseStack {
        let mut stack = base.clone();
        let position = Position::new(id, start);
        if !self.element(position).is_end_of_sequence() {
            stack.push(position);
        }
        stack
    }
}

/// Rules that can derive the empty string, by fixpoint.
fn nullable_rules(table: &RuleTable) -> Vec<bool> {
    let mut nullable = vec![false; table.num_rules()];
    loop {
        let mut changed = false;
        for (i, rule) in table.rules().iter().enumerate() {
            if nullable[i] {
                continue;
            }
            let derives_empty = rule.alternatives().any(|alt| {
                alt.iter()
                    .all(|e| matches!(e, RuleElement::RuleRef(id) if nullable[id.index()]))
            });
            if derives_empty {
                nullable[i] = true;
                changed = true;
            }
        }
        if !changed {
            return nullable;
        }
    }
}

/// Rules reachable from `rule` without consuming input: every `RuleRef` in an
/// alternative up to and including the first non-nullable item.
///
/// The flag is set when the reference ends its alternative. Expanding such a
/// reference replaces the head without pushing a resume position, so the
/// stack does not grow.
fn left_edges(rule: &Rule, nullable: &[bool]) -> Vec<(SymbolId, bool)> {
    let mut edges = Vec::new();
    for alt in rule.alternatives() {
        for (i, element) in alt.iter().enumerate() {
            match *element {
                RuleElement::RuleRef(id) => {
                    edges.push((id, i + 1 == alt.len()));
                    if !nullable[id.index()] {
                        break;
                    }
                }
                _ => break,
            }
        }
    }
    edges
}

/// Reject left recursion that grows the stack.
///
/// A cycle of left edges loops forever only if one of its edges pushes a
/// resume position. Cycles made only of tail references revisit the same
/// stacks and are cut off by branch deduplication, so `("a"?)*` is fine.
fn check_left_recursion(table: &RuleTable, nullable: &[bool]) -> Result<(), GrammarError> {
    let edges: Vec<Vec<(SymbolId, bool)>> = table
        .rules()
        .iter()
        .map(|rule| left_edges(rule, nullable))
        .collect();

    for (from, out) in edges.iter().enumerate() {
        for &(target, tail) in out {
            if tail || !reaches(&edges, target.index(), from) {
                continue;
            }
            return Err(GrammarError::new(
                GrammarErrorKind::LeftRecursion(table.name(target).to_string()),
                table.source(),
                table.origin(target),
            ));
        }
    }
    Ok(())
}

/// Whether `goal` is reachable from `start` over left edges, in zero or more steps.
fn reaches(edges: &[Vec<(SymbolId, bool)>], start: usize, goal: usize) -> bool {
    let mut seen = vec![false; edges.len()];
    let mut todo = vec![start];
    while let Some(rule) = todo.pop() {
        if rule == goal {
            return true;
        }
        if std::mem::replace(&mut seen[rule], true) {
            continue;
        }
        if let Some(out) = edges.get(rule) {
            todo.extend(out.iter().map(|(id, _)| id.index()));
        }
    }
    false
}
