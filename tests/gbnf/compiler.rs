//! Compiler output shape: desugaring, symbol ids, escapes and printing.

use gbnf::grammar::{compile, RuleElement, RuleTable, SymbolId};

use RuleElement::*;

fn ch(c: char) -> RuleElement {
    Char(c as u32)
}

fn elements(table: &RuleTable, id: SymbolId) -> Vec<RuleElement> {
    table.rule(id).elements().to_vec()
}

// ---------------------------------------------------------------------------
// Quantifier desugaring
// ---------------------------------------------------------------------------

#[test]
fn test_star_yields_two_rules() {
    let t = compile(r#"root ::= "x"*"#).unwrap();
    assert_eq!(t.num_rules(), 2);
    let aux = SymbolId(1);
    assert_eq!(elements(&t, t.root_id()), vec![RuleRef(aux), End]);
    assert_eq!(elements(&t, aux), vec![ch('x'), RuleRef(aux), Alt, End]);
}

#[test]
fn test_plus_repeats_item_in_second_alternative() {
    let t = compile(r#"root ::= "x"+"#).unwrap();
    let aux = SymbolId(1);
    assert_eq!(
        elements(&t, aux),
        vec![ch('x'), RuleRef(aux), Alt, ch('x'), End]
    );
}

#[test]
fn test_question_is_item_or_empty() {
    let t = compile(r#"root ::= "x"?"#).unwrap();
    assert_eq!(elements(&t, SymbolId(1)), vec![ch('x'), Alt, End]);
}

#[test]
fn test_quantifier_binds_to_last_item_only() {
    let t = compile(r#"root ::= "a" [0-9]* "b""#).unwrap();
    let aux = SymbolId(1);
    assert_eq!(
        elements(&t, t.root_id()),
        vec![ch('a'), RuleRef(aux), ch('b'), End]
    );
    assert_eq!(
        elements(&t, aux),
        vec![ch('0'), CharRngUpper('9' as u32), RuleRef(aux), Alt, End]
    );
}

#[test]
fn test_quantified_reference() {
    let t = compile("root ::= item*\nitem ::= \"i\"").unwrap();
    let item = t.find("item").unwrap();
    let aux = t.find("root_2").unwrap();
    assert_eq!(item, SymbolId(1));
    assert_eq!(elements(&t, aux), vec![RuleRef(item), RuleRef(aux), Alt, End]);
}

// ---------------------------------------------------------------------------
// Symbols
// ---------------------------------------------------------------------------

#[test]
fn test_ids_follow_first_use() {
    let t = compile("root ::= b a\na ::= \"a\"\nb ::= \"b\"").unwrap();
    assert_eq!(t.find("root"), Some(SymbolId(0)));
    assert_eq!(t.find("b"), Some(SymbolId(1)));
    assert_eq!(t.find("a"), Some(SymbolId(2)));
}

#[test]
fn test_root_need_not_come_first() {
    let t = compile("ws ::= \" \"\nroot ::= ws").unwrap();
    assert_eq!(t.root_id(), SymbolId(1));
    assert_eq!(t.name(t.root_id()), "root");
}

#[test]
fn test_names_with_dashes_and_underscores() {
    let t = compile("root ::= my-rule my_rule\nmy-rule ::= \"a\"\nmy_rule ::= \"b\"").unwrap();
    assert!(t.find("my-rule").is_some());
    assert!(t.find("my_rule").is_some());
}

#[test]
fn test_compiling_twice_is_identical() {
    let text = "root ::= (\"a\" | b)+ c?\nb ::= [x-z]\nc ::= \"c\"*";
    assert_eq!(compile(text).unwrap(), compile(text).unwrap());
}

// ---------------------------------------------------------------------------
// Escapes
// ---------------------------------------------------------------------------

#[test]
fn test_hex_escapes_agree() {
    for text in [
        r#"root ::= "\x41""#,
        r#"root ::= "\u0041""#,
        r#"root ::= "\U00000041""#,
    ] {
        let t = compile(text).unwrap();
        assert_eq!(elements(&t, t.root_id()), vec![Char(65), End], "{text}");
    }
}

#[test]
fn test_escapes_inside_classes() {
    let t = compile(r"root ::= [\x00-\x1F\t]").unwrap();
    assert_eq!(
        elements(&t, t.root_id()),
        vec![Char(0), CharRngUpper(0x1f), CharAlt(9), End]
    );
}

#[test]
fn test_non_ascii_literal() {
    let t = compile("root ::= \"日本\"").unwrap();
    assert_eq!(
        elements(&t, t.root_id()),
        vec![Char(0x65e5), Char(0x672c), End]
    );
}

// ---------------------------------------------------------------------------
// Printing
// ---------------------------------------------------------------------------

#[test]
fn test_display_reprints_rules() {
    let t = compile(r#"root ::= "a" "b"*"#).unwrap();
    assert_eq!(t.to_string(), "root ::= \"a\" root_1\nroot_1 ::= \"b\" root_1 |");
}

#[test]
fn test_display_classes() {
    let t = compile(r"root ::= [a-z0-9_] [^\n] | [-^]").unwrap();
    assert_eq!(
        t.to_string(),
        r"root ::= [a-z0-9_] [^\n] | [\x2D\x5E]"
    );
}

#[test]
fn test_display_escapes_literals() {
    let t = compile(r#"root ::= "\"q\\" "\x7F""#).unwrap();
    assert_eq!(t.to_string(), r#"root ::= "\"q\\\x7F""#);
}

#[test]
fn test_source_is_kept() {
    let text = "root ::= \"ok\"\n";
    assert_eq!(compile(text).unwrap().source(), text);
}
