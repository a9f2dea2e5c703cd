//! Filter model and query compiler for the directory bridge.
//!
//! Directory clients select entries with boolean filter expressions
//! (RFC 4511 §4.5.1, textual form RFC 4515). The accounts backend speaks a much
//! flatter language of `field eq 'value'` clauses joined by `and`, `or` and
//! `not`. This crate holds the pieces that sit between the two:
//!
//! - [`FilterNode`]: the immutable filter tree, built either by the wire
//!   decoder in the daemon or by [`parse`] from RFC 4515 text.
//! - [`compile`]: folds a tree into a [`CompiledQuery`] with a single
//!   [`QueryDomain`], rejecting trees that mix principal and group criteria.
//! - [`escape_value`] and [`credential_query`]: literal quoting shared with
//!   the bind path.
//!
//! The crate performs no I/O and keeps no state between calls.
//!
//! # Example
//!
//! ```
//! use dirbridge_filter::{QueryDomain, compile, parse};
//!
//! let filter = parse("(&(objectClass=posixAccount)(uid=alice))").expect("valid filter");
//! let query = compile(&filter).expect("compilable filter");
//! assert_eq!(query.domain(), QueryDomain::Principals);
//! assert_eq!(query.expression(), "preferred_name eq 'alice'");
//! ```

mod compiler;
mod node;
mod parser;

pub use compiler::{
    CompileError, CompiledQuery, QueryDomain, compile, credential_query, escape_value,
};
pub use node::FilterNode;
pub use parser::{ParseError, parse};

/// Deepest filter nesting accepted by the decoders.
///
/// Both the RFC 4515 parser and the daemon's wire filter mapping refuse trees nested
/// beyond this depth, which bounds the recursion performed by [`compile`].
pub const MAX_FILTER_DEPTH: usize = 64;

#[cfg(test)]
mod tests;
