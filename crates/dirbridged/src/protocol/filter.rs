//! Mapping between wire search filters and [`FilterNode`] trees.

use dirbridge_filter::{FilterNode, MAX_FILTER_DEPTH};
use ldap3_proto::proto::LdapFilter;

use super::ProtocolError;

/// Converts a decoded wire filter into a [`FilterNode`].
///
/// # Errors
///
/// Returns [`ProtocolError::UnsupportedFilter`] for presence, substring,
/// ordering, approximate and extensible assertions, and
/// [`ProtocolError::FilterTooDeep`] once nesting passes [`MAX_FILTER_DEPTH`].
pub fn decode_filter(filter: &LdapFilter) -> Result<FilterNode, ProtocolError> {
    decode_at(filter, 1)
}

fn decode_at(filter: &LdapFilter, depth: usize) -> Result<FilterNode, ProtocolError> {
    if depth > MAX_FILTER_DEPTH {
        return Err(ProtocolError::FilterTooDeep {
            limit: MAX_FILTER_DEPTH,
        });
    }
    match filter {
        LdapFilter::And(children) => decode_children(children, depth).map(FilterNode::And),
        LdapFilter::Or(children) => decode_children(children, depth).map(FilterNode::Or),
        LdapFilter::Not(child) => decode_at(child, depth + 1).map(FilterNode::not),
        LdapFilter::Equality(attribute, value) => Ok(FilterNode::equality(attribute, value)),
        LdapFilter::Present(_) => Err(ProtocolError::UnsupportedFilter { kind: "presence" }),
        LdapFilter::Substring(..) => Err(ProtocolError::UnsupportedFilter { kind: "substring" }),
        _ => Err(ProtocolError::UnsupportedFilter {
            kind: "matching rule",
        }),
    }
}

fn decode_children(
    children: &[LdapFilter],
    depth: usize,
) -> Result<Vec<FilterNode>, ProtocolError> {
    children
        .iter()
        .map(|child| decode_at(child, depth + 1))
        .collect()
}

/// Builds the wire form of `node`, as a client would send it.
#[cfg(test)]
pub(crate) fn encode_filter(node: &FilterNode) -> LdapFilter {
    match node {
        FilterNode::Equality { attribute, value } => {
            LdapFilter::Equality(attribute.clone(), value.clone())
        }
        FilterNode::And(children) => LdapFilter::And(children.iter().map(encode_filter).collect()),
        FilterNode::Or(children) => LdapFilter::Or(children.iter().map(encode_filter).collect()),
        FilterNode::Not(children) => match children.as_slice() {
            [child] => LdapFilter::Not(Box::new(encode_filter(child))),
            _ => panic!("a wire negation carries exactly one operand"),
        },
    }
}
