//! GBNF compiler: parses grammar text into a [`RuleTable`].
//!
//! Supports:
//! - String literals with escape sequences
//! - Character classes with ranges and negation
//! - Rule references
//! - Sequences, alternation (`|`), grouping with parentheses
//! - Quantifiers: `*`, `+`, `?`
//! - Comments: `#` to end of line
//!
//! Groups and quantifiers are desugared into synthesized rules named
//! `<rule>_<id>`, so the output only contains plain BNF.

use std::time::Duration;

use rustc_hash::FxHashMap;

use super::escape::decode_char;
use super::options::{Clock, CompileOptions};
use super::symbols::SymbolTable;
use super::{Rule, RuleElement, RuleTable, SymbolId};
use crate::error::{GrammarError, GrammarErrorKind};

/// Compile grammar text with the default [`CompileOptions`].
///
/// Defining the same rule twice is an error ([`GrammarErrorKind::DuplicateRule`]).
/// This is stricter than GBNF tools where a later definition silently
/// replaces the earlier one.
///
/// # Example
/// ```
/// use gbnf::grammar::{compile, RuleElement};
///
/// let table = compile(r#"root ::= "a" | "b""#).unwrap();
/// let root = table.rule(table.root_id());
/// assert_eq!(
///     root.elements(),
///     &[
///         RuleElement::Char('a' as u32),
///         RuleElement::Alt,
///         RuleElement::Char('b' as u32),
///         RuleElement::End,
///     ]
/// );
/// ```
pub fn compile(text: &str) -> Result<RuleTable, GrammarError> {
    compile_with(text, &CompileOptions::default())
}

/// Compile grammar text with explicit [`CompileOptions`].
///
/// Groups nested deeper than [`CompileOptions::max_depth`] fail with
/// [`GrammarErrorKind::NestingTooDeep`] at the offending `(`.
pub fn compile_with(text: &str, options: &CompileOptions) -> Result<RuleTable, GrammarError> {
    Compiler::new(text, options).compile()
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '-' || c == '_'
}

struct Compiler<'a> {
    text: &'a str,
    src: Vec<char>,
    pos: usize,
    symbols: SymbolTable,
    /// Rule arena indexed by symbol id; `None` until the rule is defined.
    rules: Vec<Option<Rule>>,
    origins: Vec<usize>,
    first_reference: FxHashMap<SymbolId, usize>,
    clock: &'a dyn Clock,
    started: Duration,
    time_limit: Duration,
    max_depth: usize,
}

impl<'a> Compiler<'a> {
    fn new(text: &'a str, options: &'a CompileOptions) -> Self {
        let clock = options.clock.as_ref();
        Self {
            text,
            src: text.chars().collect(),
            pos: 0,
            symbols: SymbolTable::new(),
            rules: Vec::new(),
            origins: Vec::new(),
            first_reference: FxHashMap::default(),
            clock,
            started: clock.now(),
            time_limit: options.time_limit,
            max_depth: options.max_depth,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, delta: usize) -> Option<char> {
        self.src.get(self.pos + delta).copied()
    }

    fn error(&self, kind: GrammarErrorKind) -> GrammarError {
        self.error_at(kind, self.pos)
    }

    fn error_at(&self, kind: GrammarErrorKind, position: usize) -> GrammarError {
        GrammarError::new(kind, self.text, position)
    }

    fn check_duration(&self) -> Result<(), GrammarError> {
        let elapsed = self.clock.now().saturating_sub(self.started);
        if elapsed > self.time_limit {
            tracing::warn!(
                ?elapsed,
                limit = ?self.time_limit,
                position = self.pos,
                "grammar compilation exceeded its time budget"
            );
            return Err(self.error(GrammarErrorKind::DurationExceeded(self.time_limit)));
        }
        Ok(())
    }

    /// Skip spaces, tabs and comments, plus newlines when `newline_ok`.
    fn skip_space(&mut self, newline_ok: bool) {
        while let Some(c) = self.peek() {
            match c {
                ' ' | '\t' => self.pos += 1,
                '#' => {
                    while self.peek().is_some_and(|c| c != '\r' && c != '\n') {
                        self.pos += 1;
                    }
                }
                '\r' | '\n' if newline_ok => self.pos += 1,
                _ => break,
            }
        }
    }

    fn parse_name(&mut self) -> Result<String, GrammarError> {
        let start = self.pos;
        while self.peek().is_some_and(is_name_char) {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error(GrammarErrorKind::ExpectedName));
        }
        Ok(self.src[start..self.pos].iter().collect())
    }

    /// Decode the character under the cursor and step past it.
    fn next_char(&mut self) -> Result<u32, GrammarError> {
        let (cp, len) = decode_char(&self.src, self.pos).map_err(|kind| self.error(kind))?;
        self.pos += len;
        Ok(cp)
    }

    fn is_defined(&self, id: SymbolId) -> bool {
        matches!(self.rules.get(id.index()), Some(Some(_)))
    }

    fn define(&mut self, id: SymbolId, elements: Vec<RuleElement>, origin: usize) {
        let idx = id.index();
        if self.rules.len() <= idx {
            self.rules.resize(idx + 1, None);
            self.origins.resize(idx + 1, 0);
        }
        self.rules[idx] = Some(Rule::new(elements));
        self.origins[idx] = origin;
    }

    fn synthesize(&mut self, rule_name: &str) -> SymbolId {
        let id = self.symbols.synthesize(rule_name);
        tracing::trace!(
            rule = rule_name,
            synthesized = self.symbols.name(id).unwrap_or_default(),
            "synthesized rule"
        );
        id
    }

    // ── Parsing ──

    fn compile(mut self) -> Result<RuleTable, GrammarError> {
        self.skip_space(true);
        while self.pos < self.src.len() {
            self.check_duration()?;
            self.parse_rule()?;
        }
        self.finish()
    }

    fn parse_rule(&mut self) -> Result<(), GrammarError> {
        let start = self.pos;
        let name = self.parse_name()?;
        self.skip_space(true);
        if !(self.peek() == Some(':') && self.peek_at(1) == Some(':') && self.peek_at(2) == Some('='))
        {
            return Err(self.error(GrammarErrorKind::ExpectedAssign));
        }
        self.pos += 3;
        self.skip_space(true);

        let id = self.symbols.resolve(&name);
        if self.is_defined(id) {
            return Err(self.error_at(GrammarErrorKind::DuplicateRule(name), start));
        }
        self.parse_alternates(&name, id, start, 0)?;

        match self.peek() {
            Some('\r') => self.pos += if self.peek_at(1) == Some('\n') { 2 } else { 1 },
            Some('\n') => self.pos += 1,
            Some(_) => return Err(self.error(GrammarErrorKind::ExpectedNewline)),
            None => {}
        }
        self.skip_space(true);
        Ok(())
    }

    fn parse_alternates(
        &mut self,
        rule_name: &str,
        id: SymbolId,
        origin: usize,
        depth: usize,
    ) -> Result<(), GrammarError> {
        let mut elements = Vec::new();
        self.parse_sequence(rule_name, &mut elements, depth)?;
        while self.peek() == Some('|') {
            self.check_duration()?;
            elements.push(RuleElement::Alt);
            self.pos += 1;
            self.skip_space(true);
            self.parse_sequence(rule_name, &mut elements, depth)?;
        }
        elements.push(RuleElement::End);
        self.define(id, elements, origin);
        Ok(())
    }

    fn parse_sequence(
        &mut self,
        rule_name: &str,
        out: &mut Vec<RuleElement>,
        depth: usize,
    ) -> Result<(), GrammarError> {
        let nested = depth != 0;
        // Start of the most recent item, the target of a following quantifier.
        let mut last_sym_start = out.len();

        while let Some(c) = self.peek() {
            self.check_duration()?;
            match c {
                '"' => {
                    self.pos += 1;
                    last_sym_start = out.len();
                    while self.peek() != Some('"') {
                        self.check_duration()?;
                        let cp = self.next_char()?;
                        out.push(RuleElement::Char(cp));
                    }
                    self.pos += 1;
                    self.skip_space(nested);
                }
                '[' => {
                    let open = self.pos;
                    self.pos += 1;
                    let negated = self.peek() == Some('^');
                    if negated {
                        self.pos += 1;
                    }
                    last_sym_start = out.len();
                    while self.peek() != Some(']') {
                        self.check_duration()?;
                        let cp = self.next_char()?;
                        let element = if out.len() > last_sym_start {
                            RuleElement::CharAlt(cp)
                        } else if negated {
                            RuleElement::CharNot(cp)
                        } else {
                            RuleElement::Char(cp)
                        };
                        out.push(element);
                        if self.peek() == Some('-') && self.peek_at(1) != Some(']') {
                            self.pos += 1;
                            let upper = self.next_char()?;
                            out.push(RuleElement::CharRngUpper(upper));
                        }
                    }
                    if out.len() == last_sym_start {
                        return Err(self.error_at(GrammarErrorKind::EmptyCharClass, open));
                    }
                    self.pos += 1;
                    self.skip_space(nested);
                }
                c if is_name_char(c) => {
                    let at = self.pos;
                    let name = self.parse_name()?;
                    let id = self.symbols.resolve(&name);
                    self.first_reference.entry(id).or_insert(at);
                    self.skip_space(nested);
                    last_sym_start = out.len();
                    out.push(RuleElement::RuleRef(id));
                }
                '(' => {
                    let open = self.pos;
                    if depth >= self.max_depth {
                        return Err(self.error_at(
                            GrammarErrorKind::NestingTooDeep(self.max_depth),
                            open,
                        ));
                    }
                    self.pos += 1;
                    self.skip_space(true);
                    let sub = self.synthesize(rule_name);
                    self.parse_alternates(rule_name, sub, open, depth + 1)?;
                    last_sym_start = out.len();
                    out.push(RuleElement::RuleRef(sub));
                    if self.peek() != Some(')') {
                        return Err(self.error(GrammarErrorKind::UnbalancedGroup));
                    }
                    self.pos += 1;
                    self.skip_space(nested);
                }
                '*' | '+' | '?' => {
                    if last_sym_start == out.len() {
                        return Err(self.error(GrammarErrorKind::DanglingQuantifier));
                    }
                    let sub = self.synthesize(rule_name);
                    let item: Vec<RuleElement> = out.drain(last_sym_start..).collect();
                    self.define(sub, desugar_quantifier(c, sub, &item), self.pos);
                    out.push(RuleElement::RuleRef(sub));
                    self.pos += 1;
                    self.skip_space(nested);
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<RuleTable, GrammarError> {
        if !self.rules.iter().any(Option::is_some) {
            return Err(self.error_at(GrammarErrorKind::NoRules, 0));
        }
        let root = match self.symbols.root() {
            Ok(id) if self.is_defined(id) => id,
            _ => return Err(self.error_at(GrammarErrorKind::MissingRoot, 0)),
        };

        for rule in self.rules.iter().flatten() {
            if let Some(id) = rule.references().find(|&id| !self.is_defined(id)) {
                return Err(self.undefined(id));
            }
        }

        let mut rules = Vec::with_capacity(self.symbols.len());
        for (id, _) in self.symbols.iter() {
            match self.rules.get(id.index()).cloned().flatten() {
                Some(rule) => rules.push(rule),
                None => return Err(self.undefined(id)),
            }
        }

        tracing::debug!(
            rules = rules.len(),
            symbols = self.symbols.len(),
            "compiled grammar"
        );

        let mut origins = self.origins;
        origins.resize(rules.len(), 0);
        Ok(RuleTable {
            rules,
            symbols: self.symbols,
            root,
            source: self.text.to_string(),
            origins,
        })
    }

    fn undefined(&self, id: SymbolId) -> GrammarError {
        let name = self.symbols.name(id).unwrap_or_default().to_string();
        let position = self.first_reference.get(&id).copied().unwrap_or(self.pos);
        self.error_at(GrammarErrorKind::UndefinedSymbol(name), position)
    }
}

/// Body of the rule that replaces `item` followed by a quantifier:
///
/// - `?`: `item | ε`
/// - `*`: `item self | ε`
/// - `+`: `item self | item`
fn desugar_quantifier(quantifier: char, id: SymbolId, item: &[RuleElement]) -> Vec<RuleElement> {
    let mut body = Vec::with_capacity(item.len() * 2 + 3);
    body.extend_from_slice(item);
    if quantifier != '?' {
        body.push(RuleElement::RuleRef(id));
    }
    body.push(RuleElement::Alt);
    if quantifier == '+' {
        body.extend_from_slice(item);
    }
    body.push(RuleElement::End);
    body
}
