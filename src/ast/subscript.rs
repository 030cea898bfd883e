/// One bound of an index or slice expression.
///
/// `omitted` marks a bound the query left out; the evaluator resolves it
/// against the concrete sequence length at evaluation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexBound {
    pub value: i64,
    pub omitted: bool,
}

impl IndexBound {
    pub fn new(value: i64) -> Self {
        IndexBound {
            value,
            omitted: false,
        }
    }

    pub fn omitted() -> Self {
        IndexBound {
            value: 0,
            omitted: true,
        }
    }
}

/// A bracket-expression selector.
#[derive(Debug, Clone, PartialEq)]
pub enum Subscript {
    /// Single signed integer index (`[2]`, `[-1]`). Never multi-valued.
    Index(IndexBound),

    /// Slice (`[1:3]`, `[:2]`, `[::2]`). Always multi-valued; omitted and
    /// negative bounds resolve against the sequence length when evaluated.
    /// Step defaults to 1; zero or negative steps are rejected at compile
    /// time.
    Slice {
        start: IndexBound,
        end: IndexBound,
        step: IndexBound,
    },

    /// Wildcard (`[*]`). Always multi-valued.
    Asterisk,

    /// Union of subscripts (`[0,2]`, `[0,1:3]`), in requested order.
    /// Always multi-valued once more than one member exists.
    Union(Vec<Subscript>),
}

impl Subscript {
    /// Whether this subscript may yield more than one result per position.
    pub fn is_multi_value(&self) -> bool {
        match self {
            Subscript::Index(_) => false,
            Subscript::Slice { .. } => true,
            Subscript::Asterisk => true,
            Subscript::Union(members) => {
                members.len() > 1 || members.iter().any(Subscript::is_multi_value)
            }
        }
    }
}
