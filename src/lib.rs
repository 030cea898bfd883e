//! cassia: a JSONPath compiler and evaluator.
//!
//! A query string is compiled once into a [`CompiledPath`], then evaluated
//! any number of times against decoded documents:
//!
//! ```
//! use cassia::{compile, evaluate, Value};
//!
//! let path = compile("$.store.book[?(@.price < 10)].title").unwrap();
//! let doc: Value = serde_json::from_str::<serde_json::Value>(
//!     r#"{"store":{"book":[{"title":"Sayings","price":8.95}]}}"#,
//! )
//! .unwrap()
//! .into();
//! let titles = evaluate(&path, &doc).unwrap();
//! assert_eq!(titles, vec![Value::String("Sayings".to_string())]);
//! ```

pub mod ast;
pub mod evaluator;
pub mod grammar;
pub mod interpreter;
pub mod text;
pub mod value;

pub use ast::{Comparator, IndexBound, NodeKind, PathNode, Query, Subscript};
pub use evaluator::{EvalError, Evaluator};
pub use grammar::{Matcher, ParseEvent, Rule, Trace};
pub use interpreter::{Interpreter, SyntaxError};
pub use value::Value;

/// A compiled path expression.
///
/// Holds the immutable step chain and the source text it was compiled from.
/// Compilation is the only mutable phase; a compiled path is read-only and
/// freely shareable across threads.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPath {
    root: PathNode,
    source: String,
}

impl CompiledPath {
    /// The first step of the chain.
    pub fn root(&self) -> &PathNode {
        &self.root
    }

    /// The query text this path was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether evaluating this path can return more than one value.
    pub fn is_multi_value(&self) -> bool {
        self.root.is_multi_value()
    }
}

/// Compile a query string into a reusable [`CompiledPath`].
pub fn compile(query: &str) -> Result<CompiledPath, SyntaxError> {
    let trace = Matcher::parse(query).map_err(|fail| SyntaxError::Unrecognized {
        span: (fail.begin, fail.end),
        text: query.chars().skip(fail.begin).take(fail.end - fail.begin).collect(),
    })?;
    let root = Interpreter::new(&trace).build()?;
    Ok(CompiledPath {
        root,
        source: query.to_string(),
    })
}

/// Evaluate a compiled path against a document, returning matched values in
/// document order.
pub fn evaluate(path: &CompiledPath, doc: &Value) -> Result<Vec<Value>, EvalError> {
    Evaluator::new(doc).evaluate(&path.root)
}
