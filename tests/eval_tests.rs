// tests/eval_tests.rs

use cassia::{EvalError, Value, compile, evaluate};
use serde_json::json;

fn eval(query: &str, doc: serde_json::Value) -> Vec<Value> {
    let path = compile(query).unwrap();
    evaluate(&path, &doc.into()).unwrap()
}

fn values(docs: Vec<serde_json::Value>) -> Vec<Value> {
    docs.into_iter().map(Value::from).collect()
}

// ============================================================================
// Projections
// ============================================================================

#[test]
fn member_chain() {
    let got = eval("$.a.b", json!({"a": {"b": "x"}}));
    assert_eq!(got, values(vec![json!("x")]));
}

#[test]
fn missing_member_drops_silently() {
    let got = eval("$.a.b.c", json!({"a": {"b": "x"}}));
    assert!(got.is_empty());
}

#[test]
fn member_on_scalar_drops_silently() {
    let got = eval("$.a", json!(5));
    assert!(got.is_empty());
}

#[test]
fn wildcard_over_array_keeps_order() {
    let got = eval("$[*]", json!([1, 2, 3]));
    assert_eq!(got, values(vec![json!(1), json!(2), json!(3)]));
}

#[test]
fn dotted_wildcard_over_array() {
    let got = eval("$.*", json!(["a", "b"]));
    assert_eq!(got, values(vec![json!("a"), json!("b")]));
}

#[test]
fn multi_member_projection_keeps_requested_order() {
    let got = eval(
        r#"$["b", "a"]"#,
        json!({"a": 1, "b": 2}),
    );
    assert_eq!(got, values(vec![json!(2), json!(1)]));
}

// ============================================================================
// Subscripts
// ============================================================================

#[test]
fn index_and_negative_index() {
    let doc = json!([10, 20, 30]);
    assert_eq!(eval("$[0]", doc.clone()), values(vec![json!(10)]));
    assert_eq!(eval("$[-1]", doc.clone()), values(vec![json!(30)]));
    assert_eq!(eval("$[2]", doc), values(vec![json!(30)]));
}

#[test]
fn out_of_range_index_drops() {
    let doc = json!([10, 20, 30]);
    assert!(eval("$[5]", doc.clone()).is_empty());
    assert!(eval("$[-4]", doc).is_empty());
}

#[test]
fn slice_half_open() {
    let doc = json!([0, 1, 2, 3, 4]);
    assert_eq!(eval("$[1:3]", doc), values(vec![json!(1), json!(2)]));
}

#[test]
fn slice_bounds_clamp_to_length() {
    let doc = json!([0, 1, 2]);
    assert_eq!(
        eval("$[0:99]", doc.clone()),
        values(vec![json!(0), json!(1), json!(2)])
    );
    assert!(eval("$[2:1]", doc).is_empty());
}

#[test]
fn slice_negative_bounds_resolve_from_the_end() {
    let doc = json!([0, 1, 2, 3, 4]);
    assert_eq!(eval("$[-2:]", doc.clone()), values(vec![json!(3), json!(4)]));
    assert_eq!(eval("$[:-3]", doc), values(vec![json!(0), json!(1)]));
}

#[test]
fn slice_step_skips() {
    let doc = json!([0, 1, 2, 3, 4]);
    assert_eq!(
        eval("$[::2]", doc),
        values(vec![json!(0), json!(2), json!(4)])
    );
}

#[test]
fn union_keeps_requested_order_and_duplicates() {
    let doc = json!([10, 20, 30]);
    assert_eq!(
        eval("$[2,0,0]", doc),
        values(vec![json!(30), json!(10), json!(10)])
    );
}

#[test]
fn union_of_index_and_slice() {
    let doc = json!([0, 1, 2, 3]);
    assert_eq!(
        eval("$[3,0:2]", doc),
        values(vec![json!(3), json!(0), json!(1)])
    );
}

#[test]
fn subscript_on_object_drops() {
    assert!(eval("$[0]", json!({"0": "x"})).is_empty());
}

// ============================================================================
// Recursive descent
// ============================================================================

#[test]
fn recursive_descent_visits_nested_values_in_order() {
    let doc = json!([{"a": 1}, [{"a": 2}]]);
    assert_eq!(eval("$..a", doc), values(vec![json!(1), json!(2)]));
}

#[test]
fn recursive_descent_includes_the_starting_value() {
    let doc = json!({"a": {"a": 1}});
    let got = eval("$..a", doc);
    // the outer object itself is a candidate, so its member matches too
    assert_eq!(got.len(), 2);
    assert!(got.contains(&Value::from(json!({"a": 1}))));
    assert!(got.contains(&Value::from(json!(1))));
}

#[test]
fn recursive_descent_with_subscript() {
    let doc = json!({"books": [[10, 20], [30]]});
    let got = eval("$..[0]", doc);
    assert_eq!(got.len(), 3);
    assert!(got.contains(&Value::from(json!([10, 20]))));
    assert!(got.contains(&Value::from(json!(10))));
    assert!(got.contains(&Value::from(json!(30))));
}

// ============================================================================
// Filters
// ============================================================================

#[test]
fn filter_by_equality() {
    let doc = json!([{"p": 1}, {"p": 2}, {"p": 1}]);
    assert_eq!(
        eval("$[?(@.p == 1)]", doc),
        values(vec![json!({"p": 1}), json!({"p": 1})])
    );
}

#[test]
fn filter_by_string_equality() {
    let doc = json!([{"n": "x"}, {"n": "y"}]);
    assert_eq!(
        eval(r#"$[?(@.n == "y")]"#, doc),
        values(vec![json!({"n": "y"})])
    );
}

#[test]
fn filter_by_ordering() {
    let doc = json!([{"p": 5}, {"p": 15}, {"p": 10}]);
    assert_eq!(
        eval("$[?(@.p < 10)]", doc.clone()),
        values(vec![json!({"p": 5})])
    );
    assert_eq!(
        eval("$[?(@.p >= 10)]", doc),
        values(vec![json!({"p": 15}), json!({"p": 10})])
    );
}

#[test]
fn ordering_drops_non_numeric_candidates() {
    let doc = json!([{"p": 5}, {"p": "cheap"}]);
    assert_eq!(eval("$[?(@.p < 10)]", doc), values(vec![json!({"p": 5})]));
}

#[test]
fn not_equal_keeps_candidates_missing_the_member() {
    // negation inverts survivorship, so entries where @.a is absent pass
    let doc = json!([{"a": 1}, {"a": 2}, {"b": 3}]);
    assert_eq!(
        eval("$[?(@.a != 1)]", doc),
        values(vec![json!({"a": 2}), json!({"b": 3})])
    );
}

#[test]
fn existence_filter() {
    let doc = json!([{"isbn": "0-553"}, {"title": "x"}]);
    assert_eq!(
        eval("$[?(@.isbn)]", doc),
        values(vec![json!({"isbn": "0-553"})])
    );
}

#[test]
fn filter_against_current_value_itself() {
    let doc = json!([1, 25, 3]);
    assert_eq!(eval("$[?(@ > 10)]", doc), values(vec![json!(25)]));
}

#[test]
fn filter_against_root_anchored_operand() {
    let doc = json!({"limit": 2, "items": [1, 2, 3]});
    assert_eq!(eval("$.items[?(@ < $.limit)]", doc), values(vec![json!(1)]));
}

#[test]
fn conjunction_and_disjunction() {
    let doc = json!([
        {"a": 1, "b": 1},
        {"a": 1},
        {"b": 1},
        {}
    ]);
    assert_eq!(
        eval("$[?(@.a && @.b)]", doc.clone()),
        values(vec![json!({"a": 1, "b": 1})])
    );
    assert_eq!(
        eval("$[?(@.a || @.b)]", doc),
        values(vec![json!({"a": 1, "b": 1}), json!({"a": 1}), json!({"b": 1})])
    );
}

#[test]
fn negation_complements_the_candidate_set() {
    let doc = json!([{"a": 1}, {"b": 2}]);
    assert_eq!(eval("$[?(!@.a)]", doc), values(vec![json!({"b": 2})]));
}

#[test]
fn regex_filter_keeps_strings_that_match() {
    let doc = json!([{"n": "apple"}, {"n": "banana"}, {"n": 7}]);
    assert_eq!(
        eval("$[?(@.n =~ /^a/)]", doc),
        values(vec![json!({"n": "apple"})])
    );
}

#[test]
fn deep_equality_between_paths() {
    let doc = json!({
        "want": {"x": 1},
        "items": [{"v": {"x": 1}}, {"v": {"x": 2}}]
    });
    assert_eq!(
        eval("$.items[?(@.v == $.want)]", doc),
        values(vec![json!({"v": {"x": 1}})])
    );
}

#[test]
fn literal_filter_gates_the_whole_set() {
    let doc = json!([1, 2]);
    assert_eq!(
        eval("$[?(true)]", doc.clone()),
        values(vec![json!(1), json!(2)])
    );
    assert!(eval("$[?(false)]", doc).is_empty());
}

#[test]
fn literal_comparison_gates_the_whole_set() {
    // neither side references a candidate, so the comparison decides once
    // for the entire set
    let doc = json!([7, 8]);
    assert_eq!(
        eval("$[?(1 == 1)]", doc.clone()),
        values(vec![json!(7), json!(8)])
    );
    assert!(eval("$[?(1 == 2)]", doc).is_empty());
}

#[test]
fn huge_floats_do_not_collapse_to_zero() {
    assert_ne!(Value::from(json!(1e300)), Value::from(json!(0)));
    assert!(eval("$[?(@ == 0)]", json!([1e300])).is_empty());
    assert_eq!(eval("$[?(@ > 0)]", json!([1e300])).len(), 1);
    assert_eq!(eval("$[?(@ < 0)]", json!([-1e300])).len(), 1);
}

#[test]
fn filter_over_scalar_tests_the_scalar_itself() {
    assert_eq!(eval("$[?(@ == 5)]", json!(5)), values(vec![json!(5)]));
    assert!(eval("$[?(@ == 5)]", json!(6)).is_empty());
}

// ============================================================================
// Script subscripts
// ============================================================================

#[test]
fn script_subscript_fails_at_evaluation() {
    let path = compile("$.a[(@.length-1)]").unwrap();
    let doc: Value = json!({"a": [1, 2, 3]}).into();
    match evaluate(&path, &doc) {
        Err(EvalError::UnsupportedScript(cmd)) => assert_eq!(cmd, "@.length-1"),
        other => panic!("expected script error, got {:?}", other),
    }
}

#[test]
fn script_step_refuses_even_with_no_surviving_positions() {
    let path = compile("$.missing[(@.length-1)]").unwrap();
    let doc: Value = json!({"a": []}).into();
    assert!(evaluate(&path, &doc).is_err());
}
