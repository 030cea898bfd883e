// tests/compile_tests.rs

use cassia::{
    Comparator, NodeKind, PathNode, Query, Subscript, SyntaxError, compile,
};

fn steps(path: &cassia::CompiledPath) -> Vec<&NodeKind> {
    let mut out = Vec::new();
    let mut node = Some(path.root());
    while let Some(n) = node {
        out.push(&n.kind);
        node = n.next.as_deref();
    }
    out
}

// ============================================================================
// Chains
// ============================================================================

#[test]
fn dotted_members_chain_in_order() {
    let path = compile("$.store.book").unwrap();
    match steps(&path).as_slice() {
        [NodeKind::Root, NodeKind::ChildSingle(a), NodeKind::ChildSingle(b)] => {
            assert_eq!(a, "store");
            assert_eq!(b, "book");
        }
        other => panic!("unexpected chain: {:?}", other),
    }
    assert!(!path.is_multi_value());
    assert_eq!(path.source(), "$.store.book");
}

#[test]
fn quoted_member_unescapes() {
    let path = compile(r"$['it\'s']").unwrap();
    assert!(matches!(
        steps(&path).as_slice(),
        [NodeKind::Root, NodeKind::ChildSingle(name)] if name == "it's"
    ));
}

#[test]
fn quoted_name_list_becomes_multi_member() {
    let path = compile(r#"$["a", "b", "a"]"#).unwrap();
    match steps(&path).as_slice() {
        [NodeKind::Root, NodeKind::ChildMulti(names)] => {
            // requested order kept, duplicates kept
            assert_eq!(names, &vec!["a".to_string(), "b".to_string(), "a".to_string()]);
        }
        other => panic!("unexpected chain: {:?}", other),
    }
    assert!(path.is_multi_value());
}

#[test]
fn wildcard_member() {
    let path = compile("$.*").unwrap();
    assert!(matches!(
        steps(&path).as_slice(),
        [NodeKind::Root, NodeKind::ChildAsterisk]
    ));
    assert!(path.is_multi_value());
}

#[test]
fn recursive_descent_wraps_its_child() {
    let path = compile("$..author").unwrap();
    match steps(&path).as_slice() {
        [NodeKind::Root, NodeKind::RecursiveDescent(child)] => {
            assert!(matches!(&child.kind, NodeKind::ChildSingle(n) if n == "author"));
        }
        other => panic!("unexpected chain: {:?}", other),
    }
    assert!(path.is_multi_value());
}

// ============================================================================
// Subscripts
// ============================================================================

#[test]
fn single_index_is_single_valued() {
    let path = compile("$[0]").unwrap();
    assert!(matches!(
        steps(&path).as_slice(),
        [NodeKind::Root, NodeKind::Subscripted(Subscript::Index(b))] if b.value == 0
    ));
    assert!(!path.is_multi_value());
}

#[test]
fn negative_index() {
    let path = compile("$[-1]").unwrap();
    assert!(matches!(
        steps(&path).as_slice(),
        [NodeKind::Root, NodeKind::Subscripted(Subscript::Index(b))] if b.value == -1
    ));
}

#[test]
fn index_union_keeps_requested_order() {
    let path = compile("$[2,0]").unwrap();
    match steps(&path).as_slice() {
        [NodeKind::Root, NodeKind::Subscripted(Subscript::Union(members))] => {
            assert!(matches!(&members[0], Subscript::Index(b) if b.value == 2));
            assert!(matches!(&members[1], Subscript::Index(b) if b.value == 0));
        }
        other => panic!("unexpected chain: {:?}", other),
    }
    assert!(path.is_multi_value());
}

#[test]
fn slice_bounds_and_default_step() {
    let path = compile("$[1:3]").unwrap();
    match steps(&path).as_slice() {
        [NodeKind::Root, NodeKind::Subscripted(Subscript::Slice { start, end, step })] => {
            assert_eq!((start.value, start.omitted), (1, false));
            assert_eq!((end.value, end.omitted), (3, false));
            assert_eq!((step.value, step.omitted), (1, true));
        }
        other => panic!("unexpected chain: {:?}", other),
    }
}

#[test]
fn open_ended_slice_with_step() {
    let path = compile("$[::2]").unwrap();
    match steps(&path).as_slice() {
        [NodeKind::Root, NodeKind::Subscripted(Subscript::Slice { start, end, step })] => {
            assert!(start.omitted);
            assert!(end.omitted);
            assert_eq!((step.value, step.omitted), (2, false));
        }
        other => panic!("unexpected chain: {:?}", other),
    }
}

#[test]
fn script_subscript_compiles() {
    let path = compile("$.book[(@.length-1)]").unwrap();
    assert!(matches!(
        steps(&path).as_slice(),
        [NodeKind::Root, NodeKind::ChildSingle(_), NodeKind::Script(cmd)]
            if cmd == "@.length-1"
    ));
}

// ============================================================================
// Filter queries
// ============================================================================

fn filter_query(path: &cassia::CompiledPath) -> &Query {
    for kind in steps(path) {
        if let NodeKind::Filter(q) = kind {
            return q;
        }
    }
    panic!("no filter in chain");
}

#[test]
fn comparison_against_literal_uses_scalar_equality() {
    let path = compile("$[?(@.a == 1)]").unwrap();
    assert!(matches!(
        filter_query(&path),
        Query::Compare {
            cmp: Comparator::Eq,
            ..
        }
    ));
}

#[test]
fn comparison_between_paths_deepens_to_structural_equality() {
    let path = compile("$[?(@.a == $.b)]").unwrap();
    assert!(matches!(
        filter_query(&path),
        Query::Compare {
            cmp: Comparator::DeepEq,
            ..
        }
    ));
}

#[test]
fn not_equal_is_negated_equality() {
    let path = compile("$[?(@.a != 1)]").unwrap();
    match filter_query(&path) {
        Query::LogicalNot(inner) => {
            assert!(matches!(
                inner.as_ref(),
                Query::Compare {
                    cmp: Comparator::Eq,
                    ..
                }
            ));
        }
        other => panic!("expected negation, got {:?}", other),
    }
}

#[test]
fn regex_operator_compiles_its_pattern() {
    let path = compile("$[?(@.name =~ /^a.*e$/)]").unwrap();
    match filter_query(&path) {
        Query::Compare {
            cmp: Comparator::Regex(re),
            ..
        } => assert_eq!(re.as_str(), "^a.*e$"),
        other => panic!("expected regex comparison, got {:?}", other),
    }
}

#[test]
fn logical_operators_nest_right() {
    let path = compile("$[?(@.a || @.b || @.c)]").unwrap();
    match filter_query(&path) {
        Query::LogicalOr(_, right) => {
            assert!(matches!(right.as_ref(), Query::LogicalOr(_, _)));
        }
        other => panic!("expected disjunction, got {:?}", other),
    }
}

#[test]
fn bare_sub_path_is_an_existence_test() {
    let path = compile("$[?(@.isbn)]").unwrap();
    match filter_query(&path) {
        Query::NodeFilter(node) => {
            assert!(matches!(node.kind, NodeKind::CurrentRoot));
        }
        other => panic!("expected existence test, got {:?}", other),
    }
}

// ============================================================================
// Rejected input
// ============================================================================

#[test]
fn current_head_outside_filter_is_rejected() {
    let err = compile("@.a").unwrap_err();
    assert!(matches!(err, SyntaxError::RootRequired { .. }));
}

#[test]
fn bare_head_outside_filter_is_rejected() {
    let err = compile("store.book").unwrap_err();
    assert!(matches!(err, SyntaxError::RootRequired { .. }));
}

#[test]
fn comparing_root_to_root_is_rejected() {
    let err = compile("$[?($.a == $.b)]").unwrap_err();
    assert!(matches!(err, SyntaxError::CurrentRequired { .. }));
}

#[test]
fn comparing_current_to_current_is_rejected() {
    let err = compile("$[?(@.a == @.b)]").unwrap_err();
    assert!(matches!(err, SyntaxError::AmbiguousComparison { .. }));
}

#[test]
fn multi_valued_comparison_operand_is_rejected() {
    let err = compile("$[?(@.a[*] == 1)]").unwrap_err();
    assert!(matches!(err, SyntaxError::MultiValuedOperand { .. }));
}

#[test]
fn zero_slice_step_is_rejected() {
    let err = compile("$[1:5:0]").unwrap_err();
    assert!(matches!(err, SyntaxError::BadSliceStep { .. }));
}

#[test]
fn negative_slice_step_is_rejected() {
    let err = compile("$[::-1]").unwrap_err();
    assert!(matches!(err, SyntaxError::BadSliceStep { .. }));
}

#[test]
fn index_overflow_is_rejected() {
    let err = compile("$[99999999999999999999]").unwrap_err();
    assert!(matches!(err, SyntaxError::BadNumber { .. }));
}

#[test]
fn unknown_escape_is_rejected() {
    let err = compile(r"$['\q']").unwrap_err();
    assert!(matches!(err, SyntaxError::BadEscape { .. }));
}

#[test]
fn malformed_regex_is_rejected() {
    let err = compile("$[?(@.a =~ /(/)]").unwrap_err();
    assert!(matches!(err, SyntaxError::BadRegex { .. }));
}

#[test]
fn unrecognized_input_reports_a_span() {
    let err = compile("$.store.book[").unwrap_err();
    match err {
        SyntaxError::Unrecognized { span, .. } => assert!(span.1 >= 13),
        other => panic!("expected unrecognized input, got {:?}", other),
    }
}

#[test]
fn error_display_names_the_offending_text() {
    let err = compile("@.a").unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains('@'), "message was: {}", msg);
}

// ============================================================================
// Multi-value propagation
// ============================================================================

#[test]
fn multi_value_flag_propagates_leftward() {
    let path = compile("$.a.b[*].c").unwrap();
    // every step before the wildcard sees it downstream
    let mut node: Option<&PathNode> = Some(path.root());
    let mut seen_wildcard = false;
    while let Some(n) = node {
        if seen_wildcard {
            assert!(matches!(n.kind, NodeKind::ChildSingle(_)));
            assert!(!n.multi_value);
        } else {
            assert!(n.multi_value);
        }
        if matches!(n.kind, NodeKind::Subscripted(Subscript::Asterisk)) {
            seen_wildcard = true;
        }
        node = n.next.as_deref();
    }
    assert!(seen_wildcard);
}
