//! The filter expression tree.

use std::fmt;

/// A directory search filter.
///
/// Only the boolean connectives and equality assertions are modelled; the
/// decoders reject presence, substring, ordering and extensible assertions
/// before a tree is built.
///
/// `Not` keeps a child list rather than a single boxed child; a hand-built
/// negation with the wrong number of children is reported by
/// [`compile`](crate::compile) as an arity error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterNode {
    /// `(attribute=value)`.
    Equality {
        /// Attribute description as sent by the client.
        attribute: String,
        /// Assertion value with RFC 4515 escapes already resolved.
        value: String,
    },
    /// `(&...)`; an empty conjunction is the RFC 4526 absolute-true filter.
    And(Vec<FilterNode>),
    /// `(|...)`; an empty disjunction is the RFC 4526 absolute-false filter.
    Or(Vec<FilterNode>),
    /// `(!...)`; well-formed negations carry exactly one child.
    Not(Vec<FilterNode>),
}

impl FilterNode {
    /// Builds an equality assertion.
    #[must_use]
    pub fn equality(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Equality {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Builds a negation of a single child.
    #[must_use]
    pub fn not(child: Self) -> Self {
        Self::Not(vec![child])
    }

    /// Returns `true` for the absolute-true filter `(&)`.
    #[must_use]
    pub fn is_absolute_true(&self) -> bool {
        matches!(self, Self::And(children) if children.is_empty())
    }

    /// Nesting depth of the tree; a lone equality assertion has depth one.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Equality { .. } => 1,
            Self::And(children) | Self::Or(children) | Self::Not(children) => {
                1 + children.iter().map(Self::depth).max().unwrap_or(0)
            }
        }
    }
}

impl fmt::Display for FilterNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equality { attribute, value } => {
                write!(f, "({attribute}=")?;
                write_escaped(f, value)?;
                f.write_str(")")
            }
            Self::And(children) => write_set(f, '&', children),
            Self::Or(children) => write_set(f, '|', children),
            Self::Not(children) => write_set(f, '!', children),
        }
    }
}

fn write_set(f: &mut fmt::Formatter<'_>, operator: char, children: &[FilterNode]) -> fmt::Result {
    write!(f, "({operator}")?;
    for child in children {
        write!(f, "{child}")?;
    }
    f.write_str(")")
}

fn write_escaped(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    for character in value.chars() {
        match character {
            '*' => f.write_str("\\2a")?,
            '(' => f.write_str("\\28")?,
            ')' => f.write_str("\\29")?,
            '\\' => f.write_str("\\5c")?,
            '\0' => f.write_str("\\00")?,
            other => write!(f, "{other}")?,
        }
    }
    Ok(())
}
