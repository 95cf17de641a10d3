//! GBNF grammar compiler and incremental codepoint matcher.
//!
//! Grammars are written in GBNF (BNF with string literals, character classes,
//! grouping and `*`/`+`/`?` quantifiers). The compiler desugars them into a
//! flat [`RuleTable`]; the matcher then answers, one codepoint at a time,
//! which codepoints may come next and whether the input so far is complete.
//!
//! # Usage
//!
//! The typical flow is:
//!
//! 1. **Compile** the grammar text into a [`RuleTable`]
//! 2. **Create a matcher** with [`MatcherState::initial`]
//! 3. **Loop**: check [`MatcherState::expected`] → pick a codepoint → [`MatcherState::advance`]
//! 4. Stop once [`MatcherState::is_accepting`] says the input is complete
//!
//! ```rust
//! use std::sync::Arc;
//! use gbnf::{compile, MatcherState};
//!
//! let rules = Arc::new(compile(r#"root ::= "f" ("b" | "a")"#).unwrap());
//! let state = MatcherState::initial(rules.clone(), rules.root_id()).unwrap();
//!
//! let state = state.advance('f' as u32).unwrap();
//! assert!(!state.is_accepting());
//! assert!(state.advance('c' as u32).is_none());
//!
//! let state = state.advance('a' as u32).unwrap();
//! assert!(state.is_accepting());
//! ```
//!
//! # Errors
//!
//! Grammar and input errors both carry their text, and display with the
//! offending line and a `^` marker:
//!
//! ```rust
//! let err = gbnf::compile("root ::= item").unwrap_err();
//! assert_eq!(
//!     err.to_string(),
//!     "Failed to parse grammar: undefined rule identifier 'item'\n\nroot ::= item\n         ^"
//! );
//! ```

pub mod error;
pub mod grammar;
pub mod matcher;
pub mod report;

pub use error::{Error, GrammarError, GrammarErrorKind, InputError};
pub use grammar::{compile, compile_with, CompileOptions, RuleElement, RuleTable, SymbolId};
pub use matcher::{CharClass, Expected, Input, MatcherState, RuleGraph};
