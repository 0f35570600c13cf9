// Tests for the indentation-sensitive rule parser: tree shapes, scope
// chains, diagnostic accumulation, and recovery behavior.

use pegma::{Cursor, Rule, RuleKind, SyntaxError, TermKind};

// Parses a single rule at depth 0, the way the grammar driver invokes it.
fn parse_rule(source: &str) -> (Option<Rule>, Vec<SyntaxError>) {
    let mut cursor = Cursor::new(source);
    let mut errors = Vec::new();
    let rule = Rule::parse(&mut cursor, &mut errors, 0).expect("no internal error expected");
    (rule, errors)
}

#[test]
fn parses_terminal_rule() {
    let (rule, errors) = parse_rule("word: 'hello'\n");
    assert!(errors.is_empty());

    let rule = rule.expect("rule should parse");
    assert_eq!(rule.name, "word");
    assert!(rule.scope.is_empty());
    assert_eq!(rule.position.line, 1);
    assert_eq!(rule.position.column, 1);
    match &rule.kind {
        RuleKind::Terminal(term) => {
            assert!(matches!(&term.kind, TermKind::Constant(value) if value == "hello"))
        }
        RuleKind::NonTerminal(_) => panic!("expected a terminal rule"),
    }
}

#[test]
fn parses_name_extended_rule_with_child() {
    let (rule, errors) = parse_rule("root...\n    child: 'x'\n");
    assert!(errors.is_empty());

    let rule = rule.expect("rule should parse");
    assert_eq!(rule.name, "root");
    let children = rule.children().expect("expected a name-extended rule");
    assert_eq!(children.len(), 1);

    let child = &children[0];
    assert_eq!(child.name, "child");
    assert!(child.is_terminal());
    assert_eq!(child.scope, vec!["root"]);
}

#[test]
fn scope_chains_list_nearest_ancestor_first() {
    let (rule, errors) = parse_rule("a...\n    b...\n        c: 'x'\n");
    assert!(errors.is_empty());

    let a = rule.expect("rule should parse");
    assert!(a.scope.is_empty());

    let b = &a.children().unwrap()[0];
    assert_eq!(b.scope, vec!["a"]);

    let c = &b.children().unwrap()[0];
    assert_eq!(c.scope, vec!["b", "a"]);
}

#[test]
fn scope_length_matches_nesting_depth() {
    let source = "top...\n    one: 'a'\n    two...\n        deep: 'b'\n";
    let (rule, errors) = parse_rule(source);
    assert!(errors.is_empty());

    fn check(rule: &Rule, depth: usize) {
        assert_eq!(rule.scope.len(), depth);
        if let Some(children) = rule.children() {
            for child in children {
                check(child, depth + 1);
            }
        }
    }
    check(&rule.unwrap(), 0);
}

#[test]
fn rejects_non_multiple_indentation() {
    let mut cursor = Cursor::new("  x: 'a'\n");
    let mut errors = Vec::new();
    cursor.skip_whitespace();
    let rule = Rule::parse(&mut cursor, &mut errors, 0).unwrap();

    assert!(rule.is_none());
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "invalid indentation level");
}

#[test]
fn rejects_wrong_depth_header() {
    let mut cursor = Cursor::new("    x: 'a'\n");
    let mut errors = Vec::new();
    cursor.skip_whitespace();
    let rule = Rule::parse(&mut cursor, &mut errors, 0).unwrap();

    assert!(rule.is_none());
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "unexpected indentation increase");
}

#[test]
fn childless_name_extended_rule_fails_at_its_header() {
    let (rule, errors) = parse_rule("root...\n");
    assert!(rule.is_none());
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].message,
        "no children found for name-extended rule 'root'"
    );
    // Positioned back at root's header, not wherever scanning stopped.
    assert_eq!((errors[0].line, errors[0].column), (1, 1));
}

#[test]
fn missing_separator_is_diagnosed() {
    let (rule, errors) = parse_rule("root 'a'\n");
    assert!(rule.is_none());
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "expected ':' or '...'");
}

#[test]
fn trailing_characters_after_ellipsis_doom_the_rule() {
    let (rule, errors) = parse_rule("root... junk\n    child: 'x'\n");
    assert!(rule.is_none());
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "trailing characters after '...'");
}

#[test]
fn children_after_trailing_junk_are_still_scanned() {
    // The junk dooms the rule but not the pass; the malformed child on the
    // next line still gets its own diagnostic.
    let (rule, errors) = parse_rule("root... junk\n    a:\n");
    assert!(rule.is_none());
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].message, "trailing characters after '...'");
    assert_eq!(errors[1].message, "expected a term");
    assert_eq!(errors[1].line, 2);
}

#[test]
fn comment_after_ellipsis_is_not_trailing_content() {
    let (rule, errors) = parse_rule("root... # namespace\n    child: 'x'\n");
    assert!(errors.is_empty());
    assert!(rule.is_some());
}

#[test]
fn failed_child_does_not_stop_sibling_scan() {
    // The first and third children are malformed; both get diagnosed in a
    // single pass, and the parent fails even though the middle child parsed.
    let source = "root...\n    a:\n    b: 'x'\n    c:\n";
    let (rule, errors) = parse_rule(source);

    assert!(rule.is_none());
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].message, "expected a term");
    assert_eq!(errors[0].line, 2);
    assert_eq!(errors[1].message, "expected a term");
    assert_eq!(errors[1].line, 4);
}

#[test]
fn bad_sibling_indentation_aborts_the_block() {
    // An 8-space jump where 4 is expected ends the children scan outright;
    // unlike a failed child, later siblings at this level are not attempted
    // by this rule.
    let source = "root...\n    a: 'x'\n        b: 'y'\n    c: 'z'\n";
    let (rule, errors) = parse_rule(source);

    assert!(rule.is_none());
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "unexpected indentation increase");
    assert_eq!(errors[0].line, 3);
}

#[test]
fn failed_subtree_discards_clean_children() {
    // The nested group parses its first child fine, but its second child is
    // malformed, so the whole 'inner' subtree is discarded and 'root' fails.
    let source = "root...\n    inner...\n        good: 'a'\n        bad:\n";
    let (rule, errors) = parse_rule(source);

    assert!(rule.is_none());
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "expected a term");
}

#[test]
fn node_count_matches_header_count() {
    let source = "\
root...
    one: 'a'
    two...
        three: 'b'
        four: 'c'
    five: 'd'
";
    let (rule, errors) = parse_rule(source);
    assert!(errors.is_empty());

    fn count(rule: &Rule) -> usize {
        1 + rule
            .children()
            .map(|children| children.iter().map(count).sum())
            .unwrap_or(0)
    }
    assert_eq!(count(&rule.unwrap()), 6);
}

#[test]
fn rendering_is_deterministic() {
    let (rule, _) = parse_rule("root...\n    a: 'x' | 'y'\n    b...\n        c: ['0' - '9']+\n");
    let rule = rule.expect("rule should parse");

    let first = rule.to_string();
    let second = rule.to_string();
    assert_eq!(first, second);
    assert!(first.starts_with("root...\n"));
    assert!(first.contains("    a: 'x' | 'y'\n"));
    assert!(first.contains("        c: ['0' - '9']+\n"));
}

#[test]
fn terminal_rule_spans_continuation_lines() {
    // A line indented two extra steps continues the previous line's term.
    let (rule, errors) = parse_rule("long: 'a' 'b'\n        'c'\n");
    assert!(errors.is_empty());

    let rule = rule.expect("rule should parse");
    match &rule.kind {
        RuleKind::Terminal(term) => match &term.kind {
            TermKind::Sequence(values) => assert_eq!(values.len(), 3),
            other => panic!("expected a sequence, got {other:?}"),
        },
        RuleKind::NonTerminal(_) => panic!("expected a terminal rule"),
    }
}
