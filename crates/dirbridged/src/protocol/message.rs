//! Bridge requests and responses, and their mapping onto `ldap3_proto`
//! envelopes.

use ldap3_proto::proto::{
    LdapBindCred, LdapBindResponse, LdapExtendedResponse, LdapFilter, LdapMsg, LdapOp,
    LdapPartialAttribute, LdapSearchRequest, LdapSearchResultEntry, LdapSearchScope,
};

use crate::directory::DirectoryEntry;

use super::ProtocolError;
use super::result_code::LdapResult;

/// A decoded `LDAPMessage`.
#[derive(Debug, Clone, PartialEq)]
pub struct LdapMessage {
    /// Identifier echoed on every response.
    pub message_id: i32,
    /// The request carried by the envelope.
    pub request: Request,
}

/// Client requests understood by the bridge.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// `BindRequest`.
    Bind(BindRequest),
    /// `UnbindRequest`.
    Unbind,
    /// `SearchRequest`.
    Search(SearchRequest),
    /// `AbandonRequest` naming the message to abandon.
    Abandon {
        /// Identifier of the abandoned message.
        message_id: i32,
    },
    /// A well-formed request the bridge declines to perform.
    Unsupported(OperationKind),
}

/// `BindRequest` fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindRequest {
    /// Distinguished name being bound.
    pub name: String,
    /// Authentication choice.
    pub credentials: BindCredentials,
}

/// Authentication choice of a bind request.
#[derive(Clone, PartialEq, Eq)]
pub enum BindCredentials {
    /// Simple password authentication.
    Simple(String),
    /// SASL authentication, which the bridge does not support.
    Sasl,
}

impl std::fmt::Debug for BindCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Simple(_) => f.write_str("Simple(<redacted>)"),
            Self::Sasl => f.write_str("Sasl"),
        }
    }
}

impl From<LdapBindCred> for BindCredentials {
    fn from(credentials: LdapBindCred) -> Self {
        match credentials {
            LdapBindCred::Simple(password) => Self::Simple(password),
            _ => Self::Sasl,
        }
    }
}

/// Search scope requested by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    /// `baseObject`.
    BaseObject,
    /// `singleLevel`.
    SingleLevel,
    /// `wholeSubtree`.
    WholeSubtree,
    /// `subordinateSubtree`, the subtree without its base.
    Subordinates,
}

impl From<LdapSearchScope> for SearchScope {
    fn from(scope: LdapSearchScope) -> Self {
        match scope {
            LdapSearchScope::Base => Self::BaseObject,
            LdapSearchScope::OneLevel => Self::SingleLevel,
            LdapSearchScope::Subtree => Self::WholeSubtree,
            _ => Self::Subordinates,
        }
    }
}

/// `SearchRequest` fields.
///
/// The filter keeps its wire form and is mapped by the directory handler,
/// so that an unsupported filter fails the search rather than the connection.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    /// Search base distinguished name.
    pub base_object: String,
    /// Requested scope.
    pub scope: SearchScope,
    /// Maximum number of entries the client wants; zero means no limit.
    pub size_limit: i64,
    /// Time limit in seconds; the bridge does not enforce it.
    pub time_limit: i64,
    /// Whether only attribute names should be returned.
    pub types_only: bool,
    /// Filter as decoded off the wire.
    pub filter: LdapFilter,
    /// Attribute selection list.
    pub attributes: Vec<String>,
}

impl From<LdapSearchRequest> for SearchRequest {
    fn from(search: LdapSearchRequest) -> Self {
        Self {
            base_object: search.base,
            scope: search.scope.into(),
            size_limit: i64::from(search.sizelimit),
            time_limit: i64::from(search.timelimit),
            types_only: search.typesonly,
            filter: search.filter,
            attributes: search.attrs,
        }
    }
}

/// Operations recognised on the wire but answered with `unwillingToPerform`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// `ModifyRequest`.
    Modify,
    /// `AddRequest`.
    Add,
    /// `DelRequest`.
    Delete,
    /// `ModifyDNRequest`.
    ModifyDn,
    /// `ExtendedRequest`.
    Extended,
}

impl OperationKind {
    /// Protocol name of the operation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Modify => "modify",
            Self::Add => "add",
            Self::Delete => "delete",
            Self::ModifyDn => "modify_dn",
            Self::Extended => "extended",
        }
    }

    fn response(self, result: LdapResult) -> LdapOp {
        let res = result.into();
        match self {
            Self::Modify => LdapOp::ModifyResponse(res),
            Self::Add => LdapOp::AddResponse(res),
            Self::Delete => LdapOp::DelResponse(res),
            Self::ModifyDn => LdapOp::ModifyDNResponse(res),
            Self::Extended => LdapOp::ExtendedResponse(LdapExtendedResponse {
                res,
                name: None,
                value: None,
            }),
        }
    }
}

impl TryFrom<LdapMsg> for LdapMessage {
    type Error = ProtocolError;

    /// Maps a decoded envelope onto a bridge request. Controls are ignored.
    fn try_from(message: LdapMsg) -> Result<Self, Self::Error> {
        if message.msgid < 0 {
            return Err(ProtocolError::InvalidMessageId {
                value: message.msgid,
            });
        }
        let request = match message.op {
            LdapOp::BindRequest(bind) => Request::Bind(BindRequest {
                name: bind.dn,
                credentials: bind.cred.into(),
            }),
            LdapOp::UnbindRequest => Request::Unbind,
            LdapOp::SearchRequest(search) => Request::Search(search.into()),
            LdapOp::AbandonRequest(message_id) => Request::Abandon { message_id },
            LdapOp::ModifyRequest(_) => Request::Unsupported(OperationKind::Modify),
            LdapOp::AddRequest(_) => Request::Unsupported(OperationKind::Add),
            LdapOp::DelRequest(_) => Request::Unsupported(OperationKind::Delete),
            LdapOp::ModifyDNRequest(_) => Request::Unsupported(OperationKind::ModifyDn),
            LdapOp::ExtendedRequest(_) => Request::Unsupported(OperationKind::Extended),
            _ => return Err(ProtocolError::UnexpectedOperation),
        };
        Ok(Self {
            message_id: message.msgid,
            request,
        })
    }
}

/// Server responses written by the session loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// `BindResponse`.
    Bind(LdapResult),
    /// `SearchResultEntry`.
    SearchEntry(DirectoryEntry),
    /// `SearchResultDone`.
    SearchDone(LdapResult),
    /// The response matching an unsupported request.
    Unsupported {
        /// Operation being answered.
        kind: OperationKind,
        /// Result to report.
        result: LdapResult,
    },
}

impl Response {
    /// Wraps the response in an envelope answering `message_id`.
    #[must_use]
    pub fn into_message(self, message_id: i32) -> LdapMsg {
        let op = match self {
            Self::Bind(result) => LdapOp::BindResponse(LdapBindResponse {
                res: result.into(),
                saslcreds: None,
            }),
            Self::SearchEntry(entry) => LdapOp::SearchResultEntry(search_entry(&entry)),
            Self::SearchDone(result) => LdapOp::SearchResultDone(result.into()),
            Self::Unsupported { kind, result } => kind.response(result),
        };
        LdapMsg {
            msgid: message_id,
            op,
            ctrl: Vec::new(),
        }
    }
}

fn search_entry(entry: &DirectoryEntry) -> LdapSearchResultEntry {
    LdapSearchResultEntry {
        dn: entry.dn().to_owned(),
        attributes: entry
            .attributes()
            .iter()
            .map(|attribute| LdapPartialAttribute {
                atype: attribute.name().to_owned(),
                vals: attribute
                    .values()
                    .iter()
                    .map(|value| value.as_bytes().to_vec())
                    .collect(),
            })
            .collect(),
    }
}

/// Encodes a request envelope as a client would.
#[cfg(test)]
pub(crate) fn encode_request(message_id: i32, request: &Request) -> Vec<u8> {
    use ldap3_proto::proto::{LdapBindRequest, LdapDerefAliases};

    let op = match request {
        Request::Bind(bind) => LdapOp::BindRequest(LdapBindRequest {
            dn: bind.name.clone(),
            cred: match &bind.credentials {
                BindCredentials::Simple(password) => LdapBindCred::Simple(password.clone()),
                BindCredentials::Sasl => panic!("SASL binds have no client encoding"),
            },
        }),
        Request::Unbind => LdapOp::UnbindRequest,
        Request::Search(search) => LdapOp::SearchRequest(LdapSearchRequest {
            base: search.base_object.clone(),
            scope: match search.scope {
                SearchScope::BaseObject => LdapSearchScope::Base,
                SearchScope::SingleLevel => LdapSearchScope::OneLevel,
                SearchScope::WholeSubtree | SearchScope::Subordinates => LdapSearchScope::Subtree,
            },
            aliases: LdapDerefAliases::Never,
            sizelimit: i32::try_from(search.size_limit).expect("size limit fits the wire"),
            timelimit: i32::try_from(search.time_limit).expect("time limit fits the wire"),
            typesonly: search.types_only,
            filter: search.filter.clone(),
            attrs: search.attributes.clone(),
        }),
        Request::Abandon { message_id } => LdapOp::AbandonRequest(*message_id),
        Request::Unsupported(OperationKind::Delete) => LdapOp::DelRequest(String::new()),
        Request::Unsupported(kind) => panic!("no client encoding for {kind:?} requests"),
    };
    let message = LdapMsg {
        msgid: message_id,
        op,
        ctrl: Vec::new(),
    };
    super::codec::encode_message(message)
        .expect("client request encodes")
        .to_vec()
}

/// Decoded view of a server response as a client sees it.
#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DecodedResponse {
    /// Identifier of the answered request.
    pub(crate) message_id: i32,
    /// The response ends a search.
    pub(crate) search_done: bool,
    /// Result code and diagnostic for `LDAPResult`-bearing responses.
    pub(crate) result: Option<(super::ResultCode, String)>,
    /// Entry name and attributes for `SearchResultEntry`.
    pub(crate) entry: Option<(String, Vec<(String, Vec<String>)>)>,
}

#[cfg(test)]
impl From<LdapMsg> for DecodedResponse {
    fn from(message: LdapMsg) -> Self {
        let result = |res: ldap3_proto::proto::LdapResult| {
            let code = super::ResultCode::from_wire(&res.code)
                .unwrap_or_else(|| panic!("unexpected result code {:?}", res.code));
            Some((code, res.message))
        };
        let mut decoded = Self {
            message_id: message.msgid,
            search_done: false,
            result: None,
            entry: None,
        };
        match message.op {
            LdapOp::SearchResultEntry(entry) => {
                let attributes = entry
                    .attributes
                    .into_iter()
                    .map(|attribute| {
                        let values = attribute
                            .vals
                            .into_iter()
                            .map(|value| String::from_utf8(value).expect("utf-8 value"))
                            .collect();
                        (attribute.atype, values)
                    })
                    .collect();
                decoded.entry = Some((entry.dn, attributes));
            }
            LdapOp::SearchResultDone(res) => {
                decoded.search_done = true;
                decoded.result = result(res);
            }
            LdapOp::BindResponse(bind) => decoded.result = result(bind.res),
            LdapOp::ExtendedResponse(extended) => decoded.result = result(extended.res),
            LdapOp::ModifyResponse(res)
            | LdapOp::AddResponse(res)
            | LdapOp::DelResponse(res)
            | LdapOp::ModifyDNResponse(res) => decoded.result = result(res),
            other => panic!("unexpected server operation {other:?}"),
        }
        decoded
    }
}
