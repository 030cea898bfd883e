use crate::ast::query::Query;
use crate::ast::subscript::Subscript;

/// One step of a compiled path expression.
///
/// Nodes form an owned, non-cyclic, singly-linked forward chain: each node
/// owns at most one `next` node. Every node carries the raw text it was
/// parsed from (for diagnostics) and a multi-value flag; after the chain is
/// linked the flag on any node reflects whether that node *or anything after
/// it* can yield more than one result.
#[derive(Debug, Clone, PartialEq)]
pub struct PathNode {
    pub kind: NodeKind,
    /// Raw matched text of this step
    pub text: String,
    /// True when this step, or any step after it, may yield more than one
    /// result per input position
    pub multi_value: bool,
    pub next: Option<Box<PathNode>>,
}

/// The selector variant of a path node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// `$` - the document root
    Root,

    /// `@` - the current candidate inside a filter
    CurrentRoot,

    /// `.name` or `['name']` - single member projection
    ChildSingle(String),

    /// `['a','b']` - ordered multi-member projection (names need not be
    /// unique)
    ChildMulti(Vec<String>),

    /// `.*` - all members of an object or elements of an array
    ChildAsterisk,

    /// `..x` - recursive descent applying the wrapped child at every
    /// transitively nested value, the starting value included
    RecursiveDescent(Box<PathNode>),

    /// `[ ... ]` - index, slice, wildcard, or union over a sequence
    Subscripted(Subscript),

    /// `[( ... )]` - script subscript; carried in the AST, unsupported at
    /// evaluation time
    Script(String),

    /// `[?( ... )]` - filter keeping candidates whose query survives
    Filter(Query),
}

impl PathNode {
    /// Build a node with the multi-value flag its own kind implies.
    pub fn new(kind: NodeKind, text: impl Into<String>) -> Self {
        let multi_value = match &kind {
            NodeKind::ChildAsterisk
            | NodeKind::RecursiveDescent(_)
            | NodeKind::Filter(_) => true,
            NodeKind::ChildMulti(_) => true,
            NodeKind::Subscripted(sub) => sub.is_multi_value(),
            _ => false,
        };
        PathNode {
            kind,
            text: text.into(),
            multi_value,
            next: None,
        }
    }

    /// Link a sequence of steps into a forward chain, folding right-to-left
    /// so each node's multi-value flag absorbs everything after it.
    pub fn link(steps: Vec<PathNode>) -> Option<PathNode> {
        let mut chain: Option<PathNode> = None;
        for mut step in steps.into_iter().rev() {
            if let Some(next) = chain.take() {
                step.multi_value |= next.multi_value;
                step.next = Some(Box::new(next));
            }
            chain = Some(step);
        }
        chain
    }

    /// Whether evaluating this chain can produce more than one value per
    /// input position.
    pub fn is_multi_value(&self) -> bool {
        self.multi_value
    }
}
