use crate::ast::comparator::Comparator;
use crate::ast::node::PathNode;
use crate::value::Value;

/// A boolean or value expression used inside a `?( … )` filter.
///
/// Queries form an owned tree with no sharing between subtrees. Logical
/// combinators operate on which position keys survive, not on per-pair
/// truth values; in particular `!=` is represented as [`Query::LogicalNot`]
/// around an equality [`Query::Compare`], so negation inverts survivorship.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// `a || b`
    LogicalOr(Box<Query>, Box<Query>),

    /// `a && b`
    LogicalAnd(Box<Query>, Box<Query>),

    /// `! a`
    LogicalNot(Box<Query>),

    /// `left <cmp> right`
    Compare {
        left: Box<Query>,
        right: Box<Query>,
        cmp: Comparator,
    },

    /// A sub-path evaluated relative to the current candidate (`@.price`)
    /// or the document root (`$.limit`). The wrapped path must not be
    /// multi-valued; the interpreter rejects multi-valued operands at
    /// compile time.
    NodeFilter(Box<PathNode>),

    /// A literal operand (`1`, `"x"`, `true`, `null`)
    Literal(Value),
}
