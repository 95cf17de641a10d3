//! Property-based tests over generated grammars and inputs.

use std::sync::Arc;

use gbnf::grammar::{compile, RuleElement, SymbolId};
use gbnf::report::position_context;
use gbnf::MatcherState;
use proptest::prelude::*;

/// Generate a single GBNF item, possibly nested and quantified.
fn item_strategy() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        // Literals
        "[a-z]{1,3}".prop_map(|s| format!("\"{s}\"")),
        // Ranges
        ("[a-m]", "[n-z]").prop_map(|(lo, hi)| format!("[{lo}-{hi}]")),
        // Negated classes
        "[a-z]".prop_map(|c| format!("[^{c}]")),
    ];
    leaf.prop_recursive(3, 16, 3, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 1..4).prop_map(|v| format!("({})", v.join(" | "))),
            prop::collection::vec(inner.clone(), 2..4).prop_map(|v| v.join(" ")),
            (inner, prop_oneof![Just('*'), Just('+'), Just('?')])
                .prop_map(|(item, q)| format!("({item}){q}")),
        ]
    })
}

fn quantifier_strategy() -> impl Strategy<Value = char> {
    prop_oneof![Just('*'), Just('+'), Just('?')]
}

proptest! {
    #[test]
    fn compiling_is_deterministic(item in item_strategy()) {
        let text = format!("root ::= {item}");
        let a = compile(&text).unwrap();
        let b = compile(&text).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn references_never_dangle(item in item_strategy(), other in item_strategy()) {
        let text = format!("root ::= {item} helper\nhelper ::= {other} | \"z\"");
        let table = compile(&text).unwrap();
        for rule in table.rules() {
            prop_assert_eq!(rule.elements().last(), Some(&RuleElement::End));
            for id in rule.references() {
                let target = table.get(id);
                prop_assert!(target.is_some(), "dangling {}", id);
                prop_assert!(!target.unwrap().is_empty());
            }
        }
    }

    #[test]
    fn quantifiers_desugar_to_fixed_shapes(item in item_strategy(), q in quantifier_strategy()) {
        let base = compile(&format!("root ::= ({item})")).unwrap();
        let quantified = compile(&format!("root ::= ({item}){q}")).unwrap();

        let body = base.rule(base.root_id()).elements();
        let x = &body[..body.len() - 1];
        let aux = SymbolId(base.num_rules() as u32);

        let mut expected = x.to_vec();
        if q != '?' {
            expected.push(RuleElement::RuleRef(aux));
        }
        expected.push(RuleElement::Alt);
        if q == '+' {
            expected.extend_from_slice(x);
        }
        expected.push(RuleElement::End);

        prop_assert_eq!(quantified.num_rules(), base.num_rules() + 1);
        prop_assert_eq!(
            quantified.rule(quantified.root_id()).elements(),
            &[RuleElement::RuleRef(aux), RuleElement::End][..]
        );
        prop_assert_eq!(quantified.rule(aux).elements(), &expected[..]);
    }

    #[test]
    fn class_membership(lo in 0x20u32..0x3000, width in 0u32..0x200, cp in 0x20u32..0x3400) {
        let hi = lo + width;
        let text = format!("root ::= [\\u{lo:04X}-\\u{hi:04X}]");
        let rules = Arc::new(compile(&text).unwrap());
        let state = MatcherState::initial(rules.clone(), rules.root_id()).unwrap();
        prop_assert_eq!(state.advance(cp).is_some(), (lo..=hi).contains(&cp));

        let text = format!("root ::= [^\\u{lo:04X}-\\u{hi:04X}]");
        let rules = Arc::new(compile(&text).unwrap());
        let state = MatcherState::initial(rules.clone(), rules.root_id()).unwrap();
        prop_assert_eq!(state.advance(cp).is_some(), !(lo..=hi).contains(&cp));
    }

    #[test]
    fn every_listed_word_is_accepted(words in prop::collection::vec("[a-z]{1,6}", 1..6), pick in any::<prop::sample::Index>()) {
        let alternatives: Vec<String> = words.iter().map(|w| format!("\"{w}\"")).collect();
        let text = format!("root ::= {}", alternatives.join(" | "));
        let rules = Arc::new(compile(&text).unwrap());
        let word = pick.get(&words);
        let state = MatcherState::parse(rules, SymbolId(0), word.as_str()).unwrap();
        prop_assert!(state.is_accepting());
    }

    #[test]
    fn rejection_index_is_first_bad_codepoint(prefix in "[a-z]{0,8}", bad in "[0-9]", rest in "[a-z0-9]{0,4}") {
        let rules = Arc::new(compile("root ::= [a-z]*").unwrap());
        let input = format!("{prefix}{bad}{rest}");
        let state = MatcherState::initial(rules.clone(), rules.root_id()).unwrap();
        let err = state.feed_str(&input).unwrap_err();
        prop_assert_eq!(err.position, prefix.chars().count());
    }

    #[test]
    fn context_ends_with_marker(text in "[a-z\n]{1,40}", position in 0usize..60) {
        let lines = position_context(&text, position);
        prop_assert!(lines.len() >= 2 && lines.len() <= 4);
        let marker = lines.last().unwrap();
        prop_assert!(marker.ends_with('^'));
        prop_assert!(marker[..marker.len() - 1].chars().all(|c| c == ' '));
    }
}
