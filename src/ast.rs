//! # Cassia - Abstract Syntax Tree
//!
//! This module defines the Abstract Syntax Tree for cassia path expressions:
//! a compiled, immutable representation of a JSONPath query that the
//! evaluator walks against decoded JSON documents.
//!
//! ## Architecture Overview
//!
//! The AST module is organized into focused submodules:
//!
//! - **[node]** - Path nodes: one selector step plus an owned link to the next
//! - **[subscript]** - Bracket selectors (index, slice, wildcard, union)
//! - **[query]** - Boolean/value expressions used inside `?( … )` filters
//! - **[comparator]** - Comparison operators and their compiled regex form
//!
//! ## Core Concepts
//!
//! ### The path chain
//!
//! A compiled path is a forward-linked chain of nodes, one per selector:
//!
//! ```text
//! $.store.book[0].title
//! Root -> ChildSingle("store") -> ChildSingle("book")
//!      -> Subscripted(Index 0) -> ChildSingle("title")
//! ```
//!
//! One node owns at most one `next` node; the chain is never cyclic.
//!
//! ### Multi-value flags
//!
//! Every node and subscript knows whether it can yield more than one result
//! per input position (`*`, slices, unions, filters, recursive descent). A
//! chain's effective multi-valuedness is true iff any node in it is
//! multi-valued; the flag propagates leftward when the chain is linked, so
//! the head node always answers for the whole chain.
//!
//! ### Filters
//!
//! `[?( … )]` wraps a [`query::Query`] tree built from comparators and
//! logical combinators; its path operands are node-filters evaluated
//! relative to the current candidate.
pub mod comparator;
pub mod node;
pub mod query;
pub mod subscript;

pub use comparator::Comparator;
pub use node::{NodeKind, PathNode};
pub use query::Query;
pub use subscript::{IndexBound, Subscript};
