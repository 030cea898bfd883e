//! Path evaluation over decoded JSON documents.
//!
//! ## Value sets
//!
//! Every step of a chain maps an ordered set of position-keyed values to the
//! next one. Keys are opaque `u64` tokens: a step that projects one value per
//! input (a member lookup, an index) preserves the incoming key, while a step
//! that can fan out (wildcards, slices, unions, filters) mints fresh keys for
//! its results. Filter queries decide survival per key, so logical
//! combinators work on which keys survive rather than on per-pair booleans.
//!
//! ## Mismatches drop, they do not fail
//!
//! Asking an array for a member, an object for an index, or a scalar for
//! either simply removes that position from the set. The only evaluation
//! error is a script subscript, which the grammar accepts but this engine
//! does not execute.

use rust_decimal::Decimal;

use crate::ast::{Comparator, NodeKind, PathNode, Query, Subscript};
use crate::value::Value;

/// Errors that can occur while evaluating a compiled path.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// A `[( ... )]` script subscript was reached; scripts parse but have no
    /// execution backend
    UnsupportedScript(String),
}

impl std::fmt::Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvalError::UnsupportedScript(cmd) => {
                write!(f, "script subscripts are not supported: ({})", cmd)
            }
        }
    }
}

impl std::error::Error for EvalError {}

/// Ordered set of position-keyed values.
#[derive(Debug, Clone, Default)]
struct ValueSet {
    entries: Vec<(u64, Value)>,
}

impl ValueSet {
    fn new() -> Self {
        ValueSet::default()
    }

    fn singleton(key: u64, value: Value) -> Self {
        ValueSet {
            entries: vec![(key, value)],
        }
    }

    fn push(&mut self, key: u64, value: Value) {
        self.entries.push((key, value));
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn contains_key(&self, key: u64) -> bool {
        self.entries.iter().any(|(k, _)| *k == key)
    }

    fn into_first_value(self) -> Option<Value> {
        self.entries.into_iter().next().map(|(_, v)| v)
    }

    fn into_values(self) -> Vec<Value> {
        self.entries.into_iter().map(|(_, v)| v).collect()
    }
}

/// One comparison operand, resolved against the candidate set.
///
/// A literal or a `$`-anchored path yields the same value for every
/// candidate; an `@`-anchored path yields one slot per candidate key, absent
/// where the projection found nothing.
enum Side {
    Uniform(Option<Value>),
    PerKey(Vec<(u64, Option<Value>)>),
}

/// Evaluates compiled path chains against one document.
pub struct Evaluator<'a> {
    root: &'a Value,
    next_key: u64,
}

impl<'a> Evaluator<'a> {
    pub fn new(root: &'a Value) -> Self {
        Evaluator { root, next_key: 0 }
    }

    /// Walk the chain from the document root and return the matched values
    /// in set order.
    pub fn evaluate(&mut self, path: &PathNode) -> Result<Vec<Value>, EvalError> {
        let start = ValueSet::singleton(self.fresh_key(), self.root.clone());
        let result = self.project(path, start)?;
        Ok(result.into_values())
    }

    fn fresh_key(&mut self) -> u64 {
        let k = self.next_key;
        self.next_key += 1;
        k
    }

    /// Apply every step of a chain, left to right.
    fn project(&mut self, chain: &PathNode, input: ValueSet) -> Result<ValueSet, EvalError> {
        let mut current = input;
        let mut step = Some(chain);
        while let Some(node) = step {
            current = self.apply_step(node, current)?;
            step = node.next.as_deref();
        }
        Ok(current)
    }

    fn apply_step(&mut self, node: &PathNode, input: ValueSet) -> Result<ValueSet, EvalError> {
        match &node.kind {
            NodeKind::Root => Ok(ValueSet::singleton(self.fresh_key(), self.root.clone())),
            NodeKind::CurrentRoot => Ok(input),
            NodeKind::ChildSingle(name) => {
                let mut out = ValueSet::new();
                for (key, value) in input.entries {
                    if let Value::Object(map) = &value {
                        if let Some(member) = map.get(name) {
                            out.push(key, member.clone());
                        }
                    }
                }
                Ok(out)
            }
            NodeKind::ChildMulti(names) => {
                let mut out = ValueSet::new();
                for (_, value) in &input.entries {
                    if let Value::Object(map) = value {
                        for name in names {
                            if let Some(member) = map.get(name) {
                                let key = self.fresh_key();
                                out.push(key, member.clone());
                            }
                        }
                    }
                }
                Ok(out)
            }
            NodeKind::ChildAsterisk => {
                let mut out = ValueSet::new();
                for (_, value) in &input.entries {
                    match value {
                        Value::Array(items) => {
                            for item in items {
                                let key = self.fresh_key();
                                out.push(key, item.clone());
                            }
                        }
                        Value::Object(map) => {
                            for member in map.values() {
                                let key = self.fresh_key();
                                out.push(key, member.clone());
                            }
                        }
                        _ => {}
                    }
                }
                Ok(out)
            }
            NodeKind::RecursiveDescent(child) => {
                let mut collected = ValueSet::new();
                for (_, value) in &input.entries {
                    // preorder walk, the starting value included
                    let mut stack = vec![value.clone()];
                    while let Some(v) = stack.pop() {
                        match &v {
                            Value::Array(items) => {
                                for item in items.iter().rev() {
                                    stack.push(item.clone());
                                }
                            }
                            Value::Object(map) => {
                                for member in map.values() {
                                    stack.push(member.clone());
                                }
                            }
                            _ => {}
                        }
                        let key = self.fresh_key();
                        collected.push(key, v);
                    }
                }
                self.apply_step(child, collected)
            }
            NodeKind::Subscripted(sub) => {
                let mut out = ValueSet::new();
                for (key, value) in &input.entries {
                    if let Value::Array(items) = value {
                        self.apply_subscript(sub, *key, items, &mut out);
                    }
                }
                Ok(out)
            }
            NodeKind::Script(cmd) => Err(EvalError::UnsupportedScript(cmd.clone())),
            NodeKind::Filter(query) => {
                let mut out = ValueSet::new();
                for (_, value) in &input.entries {
                    let mut candidates = ValueSet::new();
                    match value {
                        Value::Array(items) => {
                            for item in items {
                                let key = self.fresh_key();
                                candidates.push(key, item.clone());
                            }
                        }
                        Value::Object(map) => {
                            for member in map.values() {
                                let key = self.fresh_key();
                                candidates.push(key, member.clone());
                            }
                        }
                        other => {
                            let key = self.fresh_key();
                            candidates.push(key, other.clone());
                        }
                    }
                    let survivors = self.eval_query(query, &candidates)?;
                    for (_, v) in survivors.entries {
                        let key = self.fresh_key();
                        out.push(key, v);
                    }
                }
                Ok(out)
            }
        }
    }

    fn apply_subscript(&mut self, sub: &Subscript, key: u64, items: &[Value], out: &mut ValueSet) {
        let len = items.len() as i64;
        match sub {
            Subscript::Index(bound) => {
                let idx = if bound.value < 0 {
                    len + bound.value
                } else {
                    bound.value
                };
                if (0..len).contains(&idx) {
                    out.push(key, items[idx as usize].clone());
                }
            }
            Subscript::Slice { start, end, step } => {
                let clamp = |bound: i64| -> i64 {
                    let resolved = if bound < 0 { len + bound } else { bound };
                    resolved.clamp(0, len)
                };
                let lo = if start.omitted { 0 } else { clamp(start.value) };
                let hi = if end.omitted { len } else { clamp(end.value) };
                let by = step.value.max(1) as usize;
                let mut i = lo;
                while i < hi {
                    let k = self.fresh_key();
                    out.push(k, items[i as usize].clone());
                    i += by as i64;
                }
            }
            Subscript::Asterisk => {
                for item in items {
                    let k = self.fresh_key();
                    out.push(k, item.clone());
                }
            }
            Subscript::Union(members) => {
                // unions fan out, so every member result is re-keyed even
                // when the member itself is a key-preserving index
                for member in members {
                    let mut scratch = ValueSet::new();
                    self.apply_subscript(member, key, items, &mut scratch);
                    for (_, v) in scratch.entries {
                        let k = self.fresh_key();
                        out.push(k, v);
                    }
                }
            }
        }
    }

    /// Decide which candidates survive a filter query. The returned set is a
    /// subset of `candidates` with keys preserved.
    fn eval_query(&mut self, query: &Query, candidates: &ValueSet) -> Result<ValueSet, EvalError> {
        match query {
            Query::LogicalOr(a, b) => {
                let left = self.eval_query(a, candidates)?;
                let right = self.eval_query(b, candidates)?;
                let mut out = ValueSet::new();
                for (key, value) in &candidates.entries {
                    if left.contains_key(*key) || right.contains_key(*key) {
                        out.push(*key, value.clone());
                    }
                }
                Ok(out)
            }
            Query::LogicalAnd(a, b) => {
                let left = self.eval_query(a, candidates)?;
                let right = self.eval_query(b, candidates)?;
                let mut out = ValueSet::new();
                for (key, value) in &candidates.entries {
                    if left.contains_key(*key) && right.contains_key(*key) {
                        out.push(*key, value.clone());
                    }
                }
                Ok(out)
            }
            Query::LogicalNot(inner) => {
                let survivors = self.eval_query(inner, candidates)?;
                let mut out = ValueSet::new();
                for (key, value) in &candidates.entries {
                    if !survivors.contains_key(*key) {
                        out.push(*key, value.clone());
                    }
                }
                Ok(out)
            }
            Query::NodeFilter(path) => self.eval_existence(path, candidates),
            Query::Literal(v) => {
                if truthy(v) {
                    Ok(candidates.clone())
                } else {
                    Ok(ValueSet::new())
                }
            }
            Query::Compare { left, right, cmp } => {
                let lhs = self.compare_side(left, candidates)?;
                let rhs = self.compare_side(right, candidates)?;
                self.compare(candidates, lhs, rhs, cmp)
            }
        }
    }

    /// Bare sub-path as a query: a candidate survives when the projection
    /// finds a value for it. A `$`-anchored path is the same test for every
    /// candidate.
    fn eval_existence(
        &mut self,
        path: &PathNode,
        candidates: &ValueSet,
    ) -> Result<ValueSet, EvalError> {
        if matches!(path.kind, NodeKind::Root) {
            let key = self.fresh_key();
            let from_root = self.project(path, ValueSet::singleton(key, self.root.clone()))?;
            if from_root.is_empty() {
                return Ok(ValueSet::new());
            }
            return Ok(candidates.clone());
        }
        let mut out = ValueSet::new();
        for (key, value) in &candidates.entries {
            let projected = self.project(path, ValueSet::singleton(*key, value.clone()))?;
            if !projected.is_empty() {
                out.push(*key, value.clone());
            }
        }
        Ok(out)
    }

    fn compare_side(&mut self, q: &Query, candidates: &ValueSet) -> Result<Side, EvalError> {
        match q {
            Query::Literal(v) => Ok(Side::Uniform(Some(v.clone()))),
            Query::NodeFilter(path) => {
                if matches!(path.kind, NodeKind::Root) {
                    let key = self.fresh_key();
                    let set = self.project(path, ValueSet::singleton(key, self.root.clone()))?;
                    Ok(Side::Uniform(set.into_first_value()))
                } else {
                    let mut slots = Vec::with_capacity(candidates.entries.len());
                    for (key, value) in &candidates.entries {
                        let set =
                            self.project(path, ValueSet::singleton(*key, value.clone()))?;
                        slots.push((*key, set.into_first_value()));
                    }
                    Ok(Side::PerKey(slots))
                }
            }
            // a nested boolean expression used as an operand compares by its
            // own survivorship
            nested => {
                let survivors = self.eval_query(nested, candidates)?;
                let slots = candidates
                    .entries
                    .iter()
                    .map(|(key, _)| (*key, Some(Value::Boolean(survivors.contains_key(*key)))))
                    .collect();
                Ok(Side::PerKey(slots))
            }
        }
    }

    fn compare(
        &mut self,
        candidates: &ValueSet,
        lhs: Side,
        rhs: Side,
        cmp: &Comparator,
    ) -> Result<ValueSet, EvalError> {
        // two uniform sides decide once for the whole set
        if let (Side::Uniform(l), Side::Uniform(r)) = (&lhs, &rhs) {
            let pass = match (l, r) {
                (Some(l), Some(r)) => satisfied(cmp, l, r),
                _ => false,
            };
            return Ok(if pass {
                candidates.clone()
            } else {
                ValueSet::new()
            });
        }
        let slot = |side: &Side, key: u64| -> Option<Value> {
            match side {
                Side::Uniform(v) => v.clone(),
                Side::PerKey(slots) => slots
                    .iter()
                    .find(|(k, _)| *k == key)
                    .and_then(|(_, v)| v.clone()),
            }
        };
        let mut out = ValueSet::new();
        for (key, value) in &candidates.entries {
            let (Some(l), Some(r)) = (slot(&lhs, *key), slot(&rhs, *key)) else {
                continue;
            };
            if satisfied(cmp, &l, &r) {
                out.push(*key, value.clone());
            }
        }
        Ok(out)
    }
}

/// A literal used as a whole filter expression gates the entire set.
fn truthy(v: &Value) -> bool {
    !matches!(v, Value::Null | Value::Boolean(false))
}

/// Apply one comparator to a concrete pair. Operands the comparator's
/// coercion policy cannot use make the pair fail rather than error.
fn satisfied(cmp: &Comparator, left: &Value, right: &Value) -> bool {
    match cmp {
        Comparator::Eq | Comparator::DeepEq => left.deep_eq(right),
        Comparator::Ge => numeric(left, right).is_some_and(|(l, r)| l >= r),
        Comparator::Gt => numeric(left, right).is_some_and(|(l, r)| l > r),
        Comparator::Le => numeric(left, right).is_some_and(|(l, r)| l <= r),
        Comparator::Lt => numeric(left, right).is_some_and(|(l, r)| l < r),
        Comparator::Regex(re) => left.as_str().is_some_and(|s| re.is_match(s)),
    }
}

fn numeric(left: &Value, right: &Value) -> Option<(Decimal, Decimal)> {
    Some((left.as_decimal()?, right.as_decimal()?))
}

#[test]
fn union_members_mint_fresh_keys() {
    let doc: Value = serde_json::json!([10, 20, 30]).into();
    let path = crate::compile("$[0,2,0]").unwrap();
    let mut evaluator = Evaluator::new(&doc);
    let key = evaluator.fresh_key();
    let start = ValueSet::singleton(key, doc.clone());
    let out = evaluator.project(path.root(), start).unwrap();
    let mut keys: Vec<u64> = out.entries.iter().map(|(k, _)| *k).collect();
    assert_eq!(keys.len(), 3);
    keys.sort_unstable();
    keys.dedup();
    assert_eq!(keys.len(), 3, "union entries must carry distinct keys");
}

#[test]
fn wildcard_results_carry_distinct_keys() {
    let doc: Value = serde_json::json!([1, 1, 1]).into();
    let path = crate::compile("$[*]").unwrap();
    let mut evaluator = Evaluator::new(&doc);
    let key = evaluator.fresh_key();
    let start = ValueSet::singleton(key, doc.clone());
    let out = evaluator.project(path.root(), start).unwrap();
    let mut keys: Vec<u64> = out.entries.iter().map(|(k, _)| *k).collect();
    keys.sort_unstable();
    keys.dedup();
    assert_eq!(keys.len(), 3);
}
