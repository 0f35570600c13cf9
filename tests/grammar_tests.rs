// Tests for the top-level grammar driver: whole-file parsing, recovery
// between rules, duplicate detection, and rendering.

use pegma::{Grammar, GrammarError};

fn syntax_messages(error: GrammarError) -> Vec<String> {
    match error {
        GrammarError::Syntax(errors) => errors.into_iter().map(|e| e.message).collect(),
        GrammarError::Internal(internal) => panic!("unexpected internal error: {internal}"),
    }
}

#[test]
fn parses_a_complete_grammar() {
    let source = "\
# a small expression grammar
digit: ['0' - '9']
number: digit+
operators...
    plus: '+'
    minus: '-'
expression: number (operators number)*
";
    let grammar = Grammar::parse(source).expect("grammar should parse");
    assert_eq!(grammar.rules.len(), 4);
    assert_eq!(grammar.rules[3].name, "expression");

    let operators = &grammar.rules[2];
    let children = operators.children().expect("expected a name-extended rule");
    assert_eq!(children.len(), 2);
    assert_eq!(children[0].scope, vec!["operators"]);
}

#[test]
fn empty_input_yields_an_empty_grammar() {
    let grammar = Grammar::parse("\n# only a comment\n\n").expect("should parse");
    assert!(grammar.rules.is_empty());
}

#[test]
fn misindented_top_level_rule_fails_cleanly() {
    let messages = syntax_messages(Grammar::parse("  x: 'a'\n").unwrap_err());
    assert_eq!(messages, vec!["invalid indentation level"]);
}

#[test]
fn driver_recovers_between_top_level_rules() {
    // The bad first rule must not hide the bad third one.
    let source = "first 'a'\nsecond: 'b'\nthird 'c'\n";
    let messages = syntax_messages(Grammar::parse(source).unwrap_err());
    assert_eq!(messages, vec!["expected ':' or '...'", "expected ':' or '...'"]);
}

#[test]
fn sibling_after_indentation_jump_is_still_reported() {
    // The 8-space child aborts root's scan, but the driver then sees the
    // orphaned third child at top level and reports it too.
    let source = "root...\n    a: 'x'\n        b: 'y'\n    c: 'z'\n";
    let messages = syntax_messages(Grammar::parse(source).unwrap_err());
    assert_eq!(
        messages,
        vec![
            "unexpected indentation increase",
            "unexpected indentation increase"
        ]
    );
}

#[test]
fn duplicate_top_level_names_are_rejected() {
    let source = "word: 'a'\nword: 'b'\n";
    let messages = syntax_messages(Grammar::parse(source).unwrap_err());
    assert_eq!(messages, vec!["redefinition of rule 'word'"]);
}

#[test]
fn duplicate_nested_names_are_rejected_per_sibling_group() {
    // Duplicates are scoped to one sibling group; reusing a name in a
    // different group is fine.
    let clean = "\
outer...
    word: 'a'
other...
    word: 'b'
";
    assert!(Grammar::parse(clean).is_ok());

    let source = "\
outer...
    word: 'a'
    word: 'b'
";
    let messages = syntax_messages(Grammar::parse(source).unwrap_err());
    assert_eq!(messages, vec!["redefinition of rule 'word'"]);
}

#[test]
fn duplicate_position_points_at_the_extra_occurrence() {
    let source = "word: 'a'\nword: 'b'\n";
    let Err(GrammarError::Syntax(errors)) = Grammar::parse(source) else {
        panic!("expected syntax errors");
    };
    assert_eq!(errors.len(), 1);
    assert_eq!((errors[0].line, errors[0].column), (2, 1));
}

#[test]
fn success_never_carries_diagnostics() {
    // A subtree that parses after earlier failures still fails the whole
    // grammar; a grammar only succeeds with a clean pass.
    let source = "bad 'x'\ngood: 'y'\n";
    match Grammar::parse(source) {
        Err(GrammarError::Syntax(errors)) => assert!(!errors.is_empty()),
        other => panic!("expected syntax failure, got {other:?}"),
    }
}

#[test]
fn rendering_round_trips_canonically() {
    let source = "\
digit: ['0' - '9']
group...
    item: 'a' | 'b'
    rest: item*
";
    let grammar = Grammar::parse(source).expect("grammar should parse");
    let rendered = grammar.to_string();
    let reparsed = Grammar::parse(&rendered).expect("rendering should re-parse");
    assert_eq!(rendered, reparsed.to_string());
}

#[test]
fn tree_serializes_to_json() {
    let grammar = Grammar::parse("word: 'a'\n").expect("grammar should parse");
    let json = serde_json::to_string(&grammar).expect("tree should serialize");
    assert!(json.contains("\"word\""));
    assert!(json.contains("Terminal"));
}
