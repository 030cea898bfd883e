use regex::Regex;

/// Comparison operator bound into a [`crate::ast::Query::Compare`] node.
///
/// Each comparator pairs a two-argument predicate with a type-coercion
/// policy the evaluator applies to candidate values before comparing:
/// ordering comparators keep only numeric values, the regex comparator
/// keeps only strings, equality keeps any present value, and deep equality
/// clears structurally unequal entries to an absent slot so index alignment
/// survives across candidates.
///
/// `!=` has no comparator of its own: the interpreter builds logical
/// negation around an equality comparison instead.
#[derive(Debug, Clone)]
pub enum Comparator {
    /// Scalar equality (`==`), numbers compared by value
    Eq,
    /// Greater-or-equal (`>=`), numeric operands only
    Ge,
    /// Greater-than (`>`), numeric operands only
    Gt,
    /// Less-or-equal (`<=`), numeric operands only
    Le,
    /// Less-than (`<`), numeric operands only
    Lt,
    /// Structural deep equality for node-filter vs node-filter comparisons
    DeepEq,
    /// Pattern match (`=~ /…/`), compiled once at parse time and reused
    /// read-only across matches
    Regex(Regex),
}

impl PartialEq for Comparator {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparator::Eq, Comparator::Eq)
            | (Comparator::Ge, Comparator::Ge)
            | (Comparator::Gt, Comparator::Gt)
            | (Comparator::Le, Comparator::Le)
            | (Comparator::Lt, Comparator::Lt)
            | (Comparator::DeepEq, Comparator::DeepEq) => true,
            (Comparator::Regex(a), Comparator::Regex(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}
