//! Translation of filter trees into the accounts backend query language.
//!
//! The backend accepts flat expressions such as
//! `preferred_name eq 'alice' and not mail eq 'a@example.org'`. Directory
//! filters additionally carry an `objectClass` discriminator that decides
//! whether principal or group records are wanted; that discriminator never
//! reaches the backend expression and is reported through [`QueryDomain`]
//! instead.

use std::fmt;

use thiserror::Error;

use crate::FilterNode;

/// Record domain targeted by a compiled filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum QueryDomain {
    /// No domain-discriminating clause was present.
    #[default]
    Unset,
    /// Principal (user account) records.
    Principals,
    /// Group records.
    Groups,
}

impl QueryDomain {
    /// Returns the canonical label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unset => "unset",
            Self::Principals => "principals",
            Self::Groups => "groups",
        }
    }

    /// Merges a sibling's domain into the domain accumulated so far.
    ///
    /// The first non-`Unset` domain wins. `Unset` never conflicts.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::DomainConflict`] when both domains are set and
    /// differ.
    pub fn reconcile(self, other: Self) -> Result<Self, CompileError> {
        match (self, other) {
            (Self::Unset, next) => Ok(next),
            (current, Self::Unset) => Ok(current),
            (current, next) if current == next => Ok(current),
            _ => Err(CompileError::DomainConflict),
        }
    }

    fn classify(object_class: &str) -> Self {
        match object_class.to_ascii_lowercase().as_str() {
            "posixaccount" | "shadowaccount" | "users" | "person" | "inetorgperson"
            | "organizationalperson" => Self::Principals,
            "posixgroup" | "groups" => Self::Groups,
            _ => Self::Unset,
        }
    }
}

impl fmt::Display for QueryDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A filter compiled into a backend query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledQuery {
    domain: QueryDomain,
    expression: String,
}

impl CompiledQuery {
    /// Builds a compiled query from its parts.
    #[must_use]
    pub fn new(domain: QueryDomain, expression: impl Into<String>) -> Self {
        Self {
            domain,
            expression: expression.into(),
        }
    }

    /// Domain the query targets.
    #[must_use]
    pub const fn domain(&self) -> QueryDomain {
        self.domain
    }

    /// Backend expression; empty means "match all within the domain".
    #[must_use]
    pub fn expression(&self) -> &str {
        self.expression.as_str()
    }

    /// Consumes the query and returns its parts.
    #[must_use]
    pub fn into_parts(self) -> (QueryDomain, String) {
        (self.domain, self.expression)
    }
}

/// Errors raised while compiling a filter tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// The filter asserts on an attribute the backend cannot query.
    #[error("filter by attribute '{attribute}' is not supported")]
    UnsupportedAttribute {
        /// Case-folded attribute name.
        attribute: String,
    },
    /// Principal and group criteria were combined in one expression.
    #[error("cannot mix principal and group criteria in one expression")]
    DomainConflict,
    /// A negation did not carry exactly one child.
    #[error("not filter must have exactly one child, found {children}")]
    NotArity {
        /// Number of children found.
        children: usize,
    },
}

/// Compiles a filter tree into a backend query.
///
/// # Errors
///
/// Returns [`CompileError`] when the tree references an unsupported
/// attribute, mixes record domains, or contains a malformed negation.
pub fn compile(node: &FilterNode) -> Result<CompiledQuery, CompileError> {
    match node {
        FilterNode::Equality { attribute, value } => compile_equality(attribute, value),
        FilterNode::And(children) => compile_junction(children, " and "),
        FilterNode::Or(children) => compile_junction(children, " or "),
        FilterNode::Not(children) => compile_negation(children),
    }
}

/// Quotes a literal for interpolation between single quotes.
///
/// Single quotes are doubled; every other character passes through.
#[must_use]
pub fn escape_value(value: &str) -> String {
    value.replace('\'', "''")
}

/// Builds the credential check issued for a simple bind.
#[must_use]
pub fn credential_query(login: &str, password: &str) -> String {
    format!(
        "login eq '{}' and password eq '{}'",
        escape_value(login),
        escape_value(password)
    )
}

fn compile_equality(attribute: &str, value: &str) -> Result<CompiledQuery, CompileError> {
    let folded = attribute.to_ascii_lowercase();
    if folded == "objectclass" {
        return Ok(CompiledQuery::new(QueryDomain::classify(value), ""));
    }

    let Some(field) = backend_field(&folded) else {
        return Err(CompileError::UnsupportedAttribute { attribute: folded });
    };
    Ok(CompiledQuery::new(
        QueryDomain::Unset,
        format!("{field} eq '{}'", escape_value(value)),
    ))
}

fn backend_field(attribute: &str) -> Option<&'static str> {
    match attribute {
        "cn" | "uid" => Some("preferred_name"),
        "mail" => Some("mail"),
        "displayname" => Some("display_name"),
        "uidnumber" => Some("uid_number"),
        "gidnumber" => Some("gid_number"),
        "description" => Some("description"),
        _ => None,
    }
}

fn compile_junction(
    children: &[FilterNode],
    connective: &str,
) -> Result<CompiledQuery, CompileError> {
    let mut domain = QueryDomain::Unset;
    let mut clauses = Vec::with_capacity(children.len());
    for child in children {
        let (child_domain, clause) = compile(child)?.into_parts();
        domain = domain.reconcile(child_domain)?;
        if !clause.is_empty() {
            clauses.push(clause);
        }
    }
    Ok(CompiledQuery::new(domain, clauses.join(connective)))
}

fn compile_negation(children: &[FilterNode]) -> Result<CompiledQuery, CompileError> {
    let [child] = children else {
        return Err(CompileError::NotArity {
            children: children.len(),
        });
    };
    let (domain, clause) = compile(child)?.into_parts();
    if clause.is_empty() {
        return Ok(CompiledQuery::new(domain, clause));
    }
    Ok(CompiledQuery::new(domain, format!("not {clause}")))
}
