//! Semantic-action interpreter: replays the grammar engine's event trace in
//! emission order and assembles the AST on an explicit operand stack.
//!
//! Each completed rule runs one action that pushes a fresh fragment, pops
//! fragments to combine them, or validates already-pushed state against the
//! current match span. Validation failures are recorded without aborting the
//! replay; they are checked before the final AST is accepted, so one pass
//! reports the first of possibly several problems with its exact span.

use regex::Regex;

use crate::ast::{Comparator, IndexBound, NodeKind, PathNode, Query, Subscript};
use crate::grammar::{ParseEvent, Rule, Trace};
use crate::text;
use crate::value::Value;

/// A compile-time syntax error with the offending source span.
#[derive(Debug, Clone, PartialEq)]
pub enum SyntaxError {
    /// Input the grammar could not recognize; the span is the furthest
    /// failure the engine reached
    Unrecognized { span: (usize, usize), text: String },

    /// `@` (or a bare identifier) used to start a top-level path, where `$`
    /// is required
    RootRequired { span: (usize, usize), text: String },

    /// A filter comparison referencing the document root on both sides,
    /// where a current-node reference is required
    CurrentRequired { span: (usize, usize), text: String },

    /// A filter comparison with current-node references on both sides
    AmbiguousComparison { span: (usize, usize), text: String },

    /// A filter operand path that can yield more than one value per
    /// candidate
    MultiValuedOperand { span: (usize, usize), text: String },

    /// Malformed escape sequence inside a quoted literal
    BadEscape {
        span: (usize, usize),
        text: String,
        message: String,
    },

    /// Numeric literal text that failed conversion
    BadNumber { span: (usize, usize), text: String },

    /// Regex pattern that failed to compile
    BadRegex {
        span: (usize, usize),
        text: String,
        message: String,
    },

    /// Slice step that is zero or negative (reverse iteration is
    /// unsupported)
    BadSliceStep { span: (usize, usize), text: String },
}

impl SyntaxError {
    /// The character span of the offending text.
    pub fn span(&self) -> (usize, usize) {
        match self {
            SyntaxError::Unrecognized { span, .. }
            | SyntaxError::RootRequired { span, .. }
            | SyntaxError::CurrentRequired { span, .. }
            | SyntaxError::AmbiguousComparison { span, .. }
            | SyntaxError::MultiValuedOperand { span, .. }
            | SyntaxError::BadEscape { span, .. }
            | SyntaxError::BadNumber { span, .. }
            | SyntaxError::BadRegex { span, .. }
            | SyntaxError::BadSliceStep { span, .. } => *span,
        }
    }
}

impl std::fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyntaxError::Unrecognized { span, text } => {
                write!(f, "unrecognized input '{}' at {}..{}", text, span.0, span.1)
            }
            SyntaxError::RootRequired { span, text } => write!(
                f,
                "path must start with '$' outside a filter, found '{}' at {}..{}",
                text, span.0, span.1
            ),
            SyntaxError::CurrentRequired { span, text } => write!(
                f,
                "filter comparison '{}' at {}..{} references the document root on both sides; one side must use '@'",
                text, span.0, span.1
            ),
            SyntaxError::AmbiguousComparison { span, text } => write!(
                f,
                "filter comparison '{}' at {}..{} references the current node on both sides",
                text, span.0, span.1
            ),
            SyntaxError::MultiValuedOperand { span, text } => write!(
                f,
                "filter operand '{}' at {}..{} may yield multiple values; operands must be single-valued",
                text, span.0, span.1
            ),
            SyntaxError::BadEscape { span, text, message } => write!(
                f,
                "bad escape in '{}' at {}..{}: {}",
                text, span.0, span.1, message
            ),
            SyntaxError::BadNumber { span, text } => {
                write!(f, "malformed number '{}' at {}..{}", text, span.0, span.1)
            }
            SyntaxError::BadRegex { span, text, message } => write!(
                f,
                "malformed regex '{}' at {}..{}: {}",
                text, span.0, span.1, message
            ),
            SyntaxError::BadSliceStep { span, text } => write!(
                f,
                "slice step in '{}' at {}..{} must be a positive integer",
                text, span.0, span.1
            ),
        }
    }
}

impl std::error::Error for SyntaxError {}

/// Comparison operator tag pushed between the two operands of a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CmpTag {
    Eq,
    Ne,
    Ge,
    Gt,
    Le,
    Lt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BoundKind {
    Start,
    End,
    Step,
}

/// One operand-stack slot. A closed tagged union with exhaustive matching at
/// every consumption site; no fragment is ever downcast.
#[derive(Debug)]
enum StackItem {
    /// Path chain under construction, as an ordered step list
    Chain(Vec<PathNode>),
    /// A finished subscript
    Sub(Subscript),
    /// Quoted names collected inside one bracket
    Names(Vec<String>),
    /// A finished query fragment
    Query(Query),
    /// Comparison operator awaiting its right operand
    Cmp(CmpTag),
    /// Compiled regex comparator (None when compilation failed and the
    /// error was recorded)
    CmpRegex(Option<Regex>, String),
    /// Slice bound awaiting its enclosing slice
    SliceBound(BoundKind, i64),
    /// Filter query awaiting its enclosing bracket
    FilterQuery(Query),
    /// Script command text awaiting its enclosing bracket
    ScriptText(String),
}

/// Replays a [`Trace`] and builds the compiled path chain.
pub struct Interpreter<'t> {
    trace: &'t Trace,
    stack: Vec<StackItem>,
    errors: Vec<SyntaxError>,
    result: Option<PathNode>,
}

impl<'t> Interpreter<'t> {
    pub fn new(trace: &'t Trace) -> Self {
        Interpreter {
            trace,
            stack: Vec::new(),
            errors: Vec::new(),
            result: None,
        }
    }

    /// Replay every event and hand back the finished chain, or the first
    /// recorded syntax error.
    pub fn build(mut self) -> Result<PathNode, SyntaxError> {
        for i in 0..self.trace.events().len() {
            let ev = self.trace.events()[i];
            self.action(&ev);
        }
        if let Some(err) = self.errors.into_iter().next() {
            return Err(err);
        }
        match self.result {
            Some(node) => Ok(node),
            None => Err(SyntaxError::Unrecognized {
                span: (0, 0),
                text: String::new(),
            }),
        }
    }

    fn err(&mut self, e: SyntaxError) {
        self.errors.push(e);
    }

    fn span_of(&self, ev: &ParseEvent) -> (usize, usize) {
        (ev.begin, ev.end)
    }

    fn malformed(&mut self, ev: &ParseEvent) {
        let text = self.trace.text(ev);
        self.err(SyntaxError::Unrecognized {
            span: (ev.begin, ev.end),
            text,
        });
    }

    /// Append a step to the chain on top of the stack.
    fn append_step(&mut self, ev: &ParseEvent, node: PathNode) {
        match self.stack.last_mut() {
            Some(StackItem::Chain(steps)) => steps.push(node),
            _ => self.malformed(ev),
        }
    }

    /// `@` and bare-identifier heads are only legal inside a filter, where
    /// the sub-path starts past the buffer's first character.
    fn check_head(&mut self, ev: &ParseEvent) {
        if ev.begin == 0 {
            let text = self.trace.text(ev);
            self.err(SyntaxError::RootRequired {
                span: (ev.begin, ev.end),
                text,
            });
        }
    }

    fn action(&mut self, ev: &ParseEvent) {
        let text = self.trace.text(ev);
        match ev.rule {
            Rule::Root => {
                self.stack
                    .push(StackItem::Chain(vec![PathNode::new(NodeKind::Root, text)]));
            }
            Rule::Current => {
                self.check_head(ev);
                self.stack.push(StackItem::Chain(vec![PathNode::new(
                    NodeKind::CurrentRoot,
                    text,
                )]));
            }
            Rule::BareHead => {
                self.check_head(ev);
                let node = PathNode::new(NodeKind::ChildSingle(text.clone()), text);
                self.stack.push(StackItem::Chain(vec![node]));
            }
            Rule::Member => {
                let node = PathNode::new(NodeKind::ChildSingle(text.clone()), text);
                self.append_step(ev, node);
            }
            Rule::WildcardMember => {
                let node = PathNode::new(NodeKind::ChildAsterisk, text);
                self.append_step(ev, node);
            }
            Rule::Recursive => {
                // `..` wraps the step its body just appended as its child
                let child = match self.stack.last_mut() {
                    Some(StackItem::Chain(steps)) => steps.pop(),
                    _ => None,
                };
                match child {
                    Some(child) => self.append_step(
                        ev,
                        PathNode::new(NodeKind::RecursiveDescent(Box::new(child)), text),
                    ),
                    None => self.malformed(ev),
                }
            }
            Rule::Bracket => self.bracket(ev, text),
            Rule::QuotedName => self.quoted_name(ev),
            Rule::Script => {
                let inner = self.trace.span_text(ev.begin + 1, ev.end - 1);
                self.stack.push(StackItem::ScriptText(inner));
            }
            Rule::Filter => match self.stack.pop() {
                Some(StackItem::Query(q)) => self.stack.push(StackItem::FilterQuery(q)),
                _ => self.malformed(ev),
            },
            Rule::Index => match text.parse::<i64>() {
                Ok(n) => self
                    .stack
                    .push(StackItem::Sub(Subscript::Index(IndexBound::new(n)))),
                Err(_) => {
                    self.err(SyntaxError::BadNumber {
                        span: (ev.begin, ev.end),
                        text,
                    });
                    self.stack
                        .push(StackItem::Sub(Subscript::Index(IndexBound::new(0))));
                }
            },
            Rule::SliceStart => self.slice_bound(ev, BoundKind::Start, text),
            Rule::SliceEnd => self.slice_bound(ev, BoundKind::End, text),
            Rule::SliceStep => self.slice_bound(ev, BoundKind::Step, text),
            Rule::Slice => self.slice(ev),
            Rule::WildcardSub => self.stack.push(StackItem::Sub(Subscript::Asterisk)),
            Rule::UnionTail => self.union_tail(ev),
            Rule::SubPath => self.sub_path(ev, text),
            Rule::Comparison => self.comparison(ev, text),
            Rule::OpEq => self.stack.push(StackItem::Cmp(CmpTag::Eq)),
            Rule::OpNe => self.stack.push(StackItem::Cmp(CmpTag::Ne)),
            Rule::OpGe => self.stack.push(StackItem::Cmp(CmpTag::Ge)),
            Rule::OpGt => self.stack.push(StackItem::Cmp(CmpTag::Gt)),
            Rule::OpLe => self.stack.push(StackItem::Cmp(CmpTag::Le)),
            Rule::OpLt => self.stack.push(StackItem::Cmp(CmpTag::Lt)),
            Rule::RegexLit => self.regex_lit(ev),
            Rule::NumberLit => match text::parse_number(&text) {
                Some(d) => self
                    .stack
                    .push(StackItem::Query(Query::Literal(Value::Number(d)))),
                None => {
                    self.err(SyntaxError::BadNumber {
                        span: (ev.begin, ev.end),
                        text,
                    });
                    self.stack
                        .push(StackItem::Query(Query::Literal(Value::Null)));
                }
            },
            Rule::StringLit => {
                let lit = self.unescape_quoted(ev);
                self.stack
                    .push(StackItem::Query(Query::Literal(Value::String(lit))));
            }
            Rule::TrueLit => self
                .stack
                .push(StackItem::Query(Query::Literal(Value::Boolean(true)))),
            Rule::FalseLit => self
                .stack
                .push(StackItem::Query(Query::Literal(Value::Boolean(false)))),
            Rule::NullLit => self
                .stack
                .push(StackItem::Query(Query::Literal(Value::Null))),
            Rule::NotExpr => match self.stack.pop() {
                Some(StackItem::Query(q)) => self
                    .stack
                    .push(StackItem::Query(Query::LogicalNot(Box::new(q)))),
                _ => self.malformed(ev),
            },
            Rule::AndTail => match (self.stack.pop(), self.stack.pop()) {
                (Some(StackItem::Query(right)), Some(StackItem::Query(left))) => {
                    self.stack.push(StackItem::Query(Query::LogicalAnd(
                        Box::new(left),
                        Box::new(right),
                    )));
                }
                _ => self.malformed(ev),
            },
            Rule::OrTail => match (self.stack.pop(), self.stack.pop()) {
                (Some(StackItem::Query(right)), Some(StackItem::Query(left))) => {
                    self.stack.push(StackItem::Query(Query::LogicalOr(
                        Box::new(left),
                        Box::new(right),
                    )));
                }
                _ => self.malformed(ev),
            },
            Rule::Path => match self.stack.pop() {
                Some(StackItem::Chain(steps)) => self.result = PathNode::link(steps),
                _ => self.malformed(ev),
            },
        }
    }

    fn bracket(&mut self, ev: &ParseEvent, text: String) {
        match self.stack.pop() {
            Some(StackItem::Sub(sub)) => {
                self.append_step(ev, PathNode::new(NodeKind::Subscripted(sub), text));
            }
            Some(StackItem::Names(mut names)) => {
                let kind = if names.len() == 1 {
                    NodeKind::ChildSingle(names.remove(0))
                } else {
                    NodeKind::ChildMulti(names)
                };
                self.append_step(ev, PathNode::new(kind, text));
            }
            Some(StackItem::FilterQuery(q)) => {
                self.append_step(ev, PathNode::new(NodeKind::Filter(q), text));
            }
            Some(StackItem::ScriptText(cmd)) => {
                self.append_step(ev, PathNode::new(NodeKind::Script(cmd), text));
            }
            _ => self.malformed(ev),
        }
    }

    fn quoted_name(&mut self, ev: &ParseEvent) {
        let name = self.unescape_quoted(ev);
        match self.stack.last_mut() {
            Some(StackItem::Names(names)) => names.push(name),
            _ => self.stack.push(StackItem::Names(vec![name])),
        }
    }

    /// Strip the quotes off a quoted span and un-escape its content; the
    /// escape error, if any, is recorded and the raw content used so replay
    /// continues.
    fn unescape_quoted(&mut self, ev: &ParseEvent) -> String {
        let raw = self.trace.span_text(ev.begin + 1, ev.end - 1);
        let quote = self
            .trace
            .span_text(ev.begin, ev.begin + 1)
            .chars()
            .next()
            .unwrap_or('"');
        match text::unescape(&raw, quote) {
            Ok(s) => s,
            Err(e) => {
                let text = self.trace.text(ev);
                self.err(SyntaxError::BadEscape {
                    span: (ev.begin, ev.end),
                    text,
                    message: e.to_string(),
                });
                raw
            }
        }
    }

    fn slice_bound(&mut self, ev: &ParseEvent, kind: BoundKind, text: String) {
        match text.parse::<i64>() {
            Ok(n) => {
                if kind == BoundKind::Step && n <= 0 {
                    self.err(SyntaxError::BadSliceStep {
                        span: (ev.begin, ev.end),
                        text,
                    });
                }
                self.stack.push(StackItem::SliceBound(kind, n));
            }
            Err(_) => {
                self.err(SyntaxError::BadNumber {
                    span: (ev.begin, ev.end),
                    text,
                });
                self.stack.push(StackItem::SliceBound(kind, 0));
            }
        }
    }

    fn slice(&mut self, _ev: &ParseEvent) {
        let mut start = IndexBound::omitted();
        let mut end = IndexBound::omitted();
        let mut step = IndexBound {
            value: 1,
            omitted: true,
        };
        while let Some(StackItem::SliceBound(kind, n)) = self.stack.last() {
            let (kind, n) = (*kind, *n);
            self.stack.pop();
            match kind {
                BoundKind::Start => start = IndexBound::new(n),
                BoundKind::End => end = IndexBound::new(n),
                BoundKind::Step => {
                    step = IndexBound::new(n.max(1));
                }
            }
        }
        self.stack
            .push(StackItem::Sub(Subscript::Slice { start, end, step }));
    }

    fn union_tail(&mut self, ev: &ParseEvent) {
        match (self.stack.pop(), self.stack.pop()) {
            (Some(StackItem::Sub(right)), Some(StackItem::Sub(left))) => {
                let union = match left {
                    Subscript::Union(mut members) => {
                        members.push(right);
                        Subscript::Union(members)
                    }
                    other => Subscript::Union(vec![other, right]),
                };
                self.stack.push(StackItem::Sub(union));
            }
            _ => self.malformed(ev),
        }
    }

    fn sub_path(&mut self, ev: &ParseEvent, text: String) {
        match self.stack.pop() {
            Some(StackItem::Chain(steps)) => {
                let Some(node) = PathNode::link(steps) else {
                    self.malformed(ev);
                    return;
                };
                if node.is_multi_value() {
                    self.err(SyntaxError::MultiValuedOperand {
                        span: (ev.begin, ev.end),
                        text,
                    });
                }
                self.stack
                    .push(StackItem::Query(Query::NodeFilter(Box::new(node))));
            }
            _ => self.malformed(ev),
        }
    }

    fn regex_lit(&mut self, ev: &ParseEvent) {
        let pattern = self
            .trace
            .span_text(ev.begin + 1, ev.end - 1)
            .replace("\\/", "/");
        match Regex::new(&pattern) {
            Ok(re) => self.stack.push(StackItem::CmpRegex(Some(re), pattern)),
            Err(e) => {
                let text = self.trace.text(ev);
                self.err(SyntaxError::BadRegex {
                    span: (ev.begin, ev.end),
                    text,
                    message: e.to_string(),
                });
                self.stack.push(StackItem::CmpRegex(None, pattern));
            }
        }
    }

    fn comparison(&mut self, ev: &ParseEvent, text: String) {
        match self.stack.pop() {
            // `left =~ /pattern/`
            Some(StackItem::CmpRegex(re, pattern)) => {
                let left = match self.stack.pop() {
                    Some(StackItem::Query(q)) => q,
                    _ => {
                        self.malformed(ev);
                        return;
                    }
                };
                let cmp = match re {
                    Some(re) => Comparator::Regex(re),
                    // compile failed and was recorded; keep the shape legal
                    None => Comparator::Eq,
                };
                self.stack.push(StackItem::Query(Query::Compare {
                    left: Box::new(left),
                    right: Box::new(Query::Literal(Value::String(pattern))),
                    cmp,
                }));
            }
            Some(StackItem::Query(right)) => {
                if matches!(self.stack.last(), Some(StackItem::Cmp(_))) {
                    let Some(StackItem::Cmp(tag)) = self.stack.pop() else {
                        return;
                    };
                    let left = match self.stack.pop() {
                        Some(StackItem::Query(q)) => q,
                        _ => {
                            self.malformed(ev);
                            return;
                        }
                    };
                    self.validate_sides(ev, &text, &left, &right);
                    self.stack
                        .push(StackItem::Query(build_comparison(left, right, tag)));
                } else {
                    // bare operand: the query is the operand itself
                    self.stack.push(StackItem::Query(right));
                }
            }
            _ => self.malformed(ev),
        }
    }

    /// A comparison anchored the same way on both sides cannot correlate
    /// its operands.
    fn validate_sides(&mut self, ev: &ParseEvent, text: &str, left: &Query, right: &Query) {
        let (Some(l), Some(r)) = (head_kind(left), head_kind(right)) else {
            return;
        };
        match (l, r) {
            (NodeKind::CurrentRoot, NodeKind::CurrentRoot) => {
                self.err(SyntaxError::AmbiguousComparison {
                    span: self.span_of(ev),
                    text: text.to_string(),
                });
            }
            (NodeKind::Root, NodeKind::Root) => {
                self.err(SyntaxError::CurrentRequired {
                    span: self.span_of(ev),
                    text: text.to_string(),
                });
            }
            _ => {}
        }
    }
}

fn head_kind(q: &Query) -> Option<&NodeKind> {
    match q {
        Query::NodeFilter(node) => Some(&node.kind),
        _ => None,
    }
}

/// Build the comparison node for an operator tag. Equality between two
/// node-filters compares structures, so it deepens to `DeepEq`; `!=` is
/// logical negation around the equality comparison, never a primitive.
fn build_comparison(left: Query, right: Query, tag: CmpTag) -> Query {
    let both_paths = matches!(
        (&left, &right),
        (Query::NodeFilter(_), Query::NodeFilter(_))
    );
    let eq_cmp = if both_paths {
        Comparator::DeepEq
    } else {
        Comparator::Eq
    };
    let (left, right) = (Box::new(left), Box::new(right));
    match tag {
        CmpTag::Eq => Query::Compare {
            left,
            right,
            cmp: eq_cmp,
        },
        CmpTag::Ne => Query::LogicalNot(Box::new(Query::Compare {
            left,
            right,
            cmp: eq_cmp,
        })),
        CmpTag::Ge => Query::Compare {
            left,
            right,
            cmp: Comparator::Ge,
        },
        CmpTag::Gt => Query::Compare {
            left,
            right,
            cmp: Comparator::Gt,
        },
        CmpTag::Le => Query::Compare {
            left,
            right,
            cmp: Comparator::Le,
        },
        CmpTag::Lt => Query::Compare {
            left,
            right,
            cmp: Comparator::Lt,
        },
    }
}
