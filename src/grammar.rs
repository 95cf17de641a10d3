pub mod compiler;
pub mod escape;
pub mod options;
pub mod symbols;

use std::fmt;

pub use compiler::{compile, compile_with};
pub use options::{Clock, CompileOptions, MonotonicClock};
pub use symbols::SymbolTable;

/// Dense index of a named or synthesized rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

impl SymbolId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One element of a compiled rule body.
///
/// Character classes are flattened into runs: a `Char` or `CharNot` head,
/// followed by any number of `CharAlt` members, where a `CharRngUpper` closes
/// a range whose lower bound is the element right before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleElement {
    /// Literal codepoint, or the first value of a character-class group.
    Char(u32),
    /// First value of a negated character-class group.
    CharNot(u32),
    /// Additional codepoint of the current group.
    CharAlt(u32),
    /// Inclusive upper bound of a range started by the previous element.
    CharRngUpper(u32),
    /// Reference to another rule.
    RuleRef(SymbolId),
    /// Separates two alternatives.
    Alt,
    /// Terminates the rule body.
    End,
}

impl RuleElement {
    /// True for `Alt` and `End`, the two elements that close an alternative.
    #[inline]
    pub fn is_end_of_sequence(self) -> bool {
        matches!(self, RuleElement::Alt | RuleElement::End)
    }

    /// True for the elements that can start a character-class group.
    #[inline]
    pub fn is_group_head(self) -> bool {
        matches!(self, RuleElement::Char(_) | RuleElement::CharNot(_))
    }
}

/// A compiled rule: `|`-separated alternatives terminated by `End`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rule {
    elements: Vec<RuleElement>,
}

impl Rule {
    pub(crate) fn new(elements: Vec<RuleElement>) -> Self {
        debug_assert_eq!(elements.last(), Some(&RuleElement::End));
        Self { elements }
    }

    pub fn elements(&self) -> &[RuleElement] {
        &self.elements
    }

    /// Element at `offset`. Offsets past the body read as `End`.
    #[inline]
    pub fn get(&self, offset: usize) -> RuleElement {
        self.elements.get(offset).copied().unwrap_or(RuleElement::End)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Start offset of every alternative, in declaration order.
    pub fn alternative_starts(&self) -> Vec<usize> {
        std::iter::once(0)
            .chain(
                self.elements
                    .iter()
                    .enumerate()
                    .filter(|(_, e)| matches!(e, RuleElement::Alt))
                    .map(|(i, _)| i + 1),
            )
            .collect()
    }

    /// Iterate over the alternatives, without their `Alt`/`End` terminators.
    pub fn alternatives(&self) -> impl Iterator<Item = &[RuleElement]> {
        let body = &self.elements[..self.elements.len().saturating_sub(1)];
        body.split(|e| matches!(e, RuleElement::Alt))
    }

    /// Every rule referenced from this body.
    pub fn references(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.elements.iter().filter_map(|e| match e {
            RuleElement::RuleRef(id) => Some(*id),
            _ => None,
        })
    }
}

/// An immutable, fully validated grammar.
///
/// Produced by [`compile`]. Every `RuleRef` indexes a defined rule and the
/// `root` rule exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTable {
    pub(crate) rules: Vec<Rule>,
    pub(crate) symbols: SymbolTable,
    pub(crate) root: SymbolId,
    pub(crate) source: String,
    /// Source position (in chars) where each rule was defined.
    pub(crate) origins: Vec<usize>,
}

impl RuleTable {
    /// Id of the `root` rule.
    pub fn root_id(&self) -> SymbolId {
        self.root
    }

    /// Rule body for `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not index a rule of this table, such as an id taken
    /// from another table. Use [`RuleTable::get`] for ids of unknown origin.
    pub fn rule(&self, id: SymbolId) -> &Rule {
        &self.rules[id.index()]
    }

    pub fn get(&self, id: SymbolId) -> Option<&Rule> {
        self.rules.get(id.index())
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn num_rules(&self) -> usize {
        self.rules.len()
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Name of a rule, named or synthesized.
    pub fn name(&self, id: SymbolId) -> &str {
        self.symbols.name(id).unwrap_or("<unknown>")
    }

    /// Look up a rule id by name.
    pub fn find(&self, name: &str) -> Option<SymbolId> {
        self.symbols.get(name)
    }

    /// The grammar text this table was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub(crate) fn origin(&self, id: SymbolId) -> usize {
        self.origins.get(id.index()).copied().unwrap_or(0)
    }
}

impl fmt::Display for RuleTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, rule) in self.rules.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{} ::=", self.name(SymbolId(i as u32)))?;
            self.fmt_rule(f, rule)?;
        }
        Ok(())
    }
}

impl RuleTable {
    fn fmt_rule(&self, f: &mut fmt::Formatter<'_>, rule: &Rule) -> fmt::Result {
        let elements = rule.elements();
        let mut i = 0;
        while i < elements.len() {
            match elements[i] {
                RuleElement::End => break,
                RuleElement::Alt => {
                    write!(f, " |")?;
                    i += 1;
                }
                RuleElement::RuleRef(id) => {
                    write!(f, " {}", self.name(id))?;
                    i += 1;
                }
                RuleElement::Char(_) if !group_continues(elements, i + 1) => {
                    // A run of single-codepoint groups reads back as a string literal.
                    write!(f, " \"")?;
                    while let Some(RuleElement::Char(cp)) = elements.get(i) {
                        if group_continues(elements, i + 1) {
                            break;
                        }
                        fmt_literal_char(f, *cp, '"')?;
                        i += 1;
                    }
                    write!(f, "\"")?;
                }
                RuleElement::Char(_) | RuleElement::CharNot(_) => {
                    write!(f, " [")?;
                    if matches!(elements[i], RuleElement::CharNot(_)) {
                        write!(f, "^")?;
                    }
                    loop {
                        match elements[i] {
                            RuleElement::Char(cp)
                            | RuleElement::CharNot(cp)
                            | RuleElement::CharAlt(cp) => fmt_literal_char(f, cp, ']')?,
                            RuleElement::CharRngUpper(cp) => {
                                write!(f, "-")?;
                                fmt_literal_char(f, cp, ']')?;
                            }
                            _ => {}
                        }
                        i += 1;
                        if !group_continues(elements, i) {
                            break;
                        }
                    }
                    write!(f, "]")?;
                }
                RuleElement::CharAlt(_) | RuleElement::CharRngUpper(_) => {
                    // Only reachable on a malformed table; print verbatim.
                    write!(f, " {:?}", elements[i])?;
                    i += 1;
                }
            }
        }
        Ok(())
    }
}

fn group_continues(elements: &[RuleElement], i: usize) -> bool {
    matches!(
        elements.get(i),
        Some(RuleElement::CharAlt(_) | RuleElement::CharRngUpper(_))
    )
}

fn fmt_literal_char(f: &mut fmt::Formatter<'_>, cp: u32, delimiter: char) -> fmt::Result {
    match cp {
        0x5c => write!(f, "\\\\"),
        0x09 => write!(f, "\\t"),
        0x0a => write!(f, "\\n"),
        0x0d => write!(f, "\\r"),
        cp if char::from_u32(cp) == Some(delimiter) => write!(f, "\\{}", delimiter),
        // `-` and `^` are not escapable inside a class; spell them as hex.
        0x2d | 0x5e if delimiter == ']' => write!(f, "\\x{:02X}", cp),
        cp if (0x20..=0x7e).contains(&cp) => match char::from_u32(cp) {
            Some(c) => write!(f, "{}", c),
            None => write!(f, "\\x{:02X}", cp),
        },
        cp if cp <= 0xff => write!(f, "\\x{:02X}", cp),
        cp if cp <= 0xffff => write!(f, "\\u{:04X}", cp),
        cp => write!(f, "\\U{:08X}", cp),
    }
}
