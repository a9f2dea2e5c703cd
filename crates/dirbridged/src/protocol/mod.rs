//! LDAPv3 wire mapping.
//!
//! BER framing and encoding belong to `ldap3_proto`'s codec. A
//! [`MessageReader`] feeds it from a blocking connection, [`LdapMessage`]
//! converts each envelope into a bridge [`Request`] and [`write_response`]
//! sends the answers back. Search filters keep their wire form until the
//! directory handler calls [`decode_filter`].

mod codec;
mod errors;
mod filter;
mod message;
mod result_code;

pub use self::codec::{MAX_MESSAGE_BYTES, MessageReader, encode_message, write_response};
pub use self::errors::ProtocolError;
pub use self::filter::decode_filter;
#[cfg(test)]
pub(crate) use self::filter::encode_filter;
pub use self::message::{
    BindCredentials, BindRequest, LdapMessage, OperationKind, Request, Response, SearchRequest,
    SearchScope,
};
#[cfg(test)]
pub(crate) use self::message::{DecodedResponse, encode_request};
pub use self::result_code::{LdapResult, ResultCode};
