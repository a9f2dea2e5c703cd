//! LDAP result codes returned by the bridge.

use std::fmt;

use ldap3_proto::proto::{self, LdapResultCode};

/// RFC 4511 result codes produced by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultCode {
    /// `success (0)`.
    Success,
    /// `operationsError (1)`.
    OperationsError,
    /// `sizeLimitExceeded (4)`.
    SizeLimitExceeded,
    /// `authMethodNotSupported (7)`.
    AuthMethodNotSupported,
    /// `invalidCredentials (49)`.
    InvalidCredentials,
    /// `insufficientAccessRights (50)`.
    InsufficientAccessRights,
    /// `unwillingToPerform (53)`.
    UnwillingToPerform,
    /// `other (80)`.
    Other,
}

impl ResultCode {
    /// Numeric value placed on the wire.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::Success => 0,
            Self::OperationsError => 1,
            Self::SizeLimitExceeded => 4,
            Self::AuthMethodNotSupported => 7,
            Self::InvalidCredentials => 49,
            Self::InsufficientAccessRights => 50,
            Self::UnwillingToPerform => 53,
            Self::Other => 80,
        }
    }

    /// RFC 4511 name of the code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::OperationsError => "operationsError",
            Self::SizeLimitExceeded => "sizeLimitExceeded",
            Self::AuthMethodNotSupported => "authMethodNotSupported",
            Self::InvalidCredentials => "invalidCredentials",
            Self::InsufficientAccessRights => "insufficientAccessRights",
            Self::UnwillingToPerform => "unwillingToPerform",
            Self::Other => "other",
        }
    }

    /// Maps a code read off the wire back to a code the bridge produces.
    #[cfg(test)]
    pub(crate) const fn from_wire(code: &LdapResultCode) -> Option<Self> {
        match code {
            LdapResultCode::Success => Some(Self::Success),
            LdapResultCode::OperationsError => Some(Self::OperationsError),
            LdapResultCode::SizeLimitExceeded => Some(Self::SizeLimitExceeded),
            LdapResultCode::AuthMethodNotSupported => Some(Self::AuthMethodNotSupported),
            LdapResultCode::InvalidCredentials => Some(Self::InvalidCredentials),
            LdapResultCode::InsufficentAccessRights => Some(Self::InsufficientAccessRights),
            LdapResultCode::UnwillingToPerform => Some(Self::UnwillingToPerform),
            LdapResultCode::Other => Some(Self::Other),
            _ => None,
        }
    }
}

impl From<ResultCode> for LdapResultCode {
    fn from(code: ResultCode) -> Self {
        match code {
            ResultCode::Success => Self::Success,
            ResultCode::OperationsError => Self::OperationsError,
            ResultCode::SizeLimitExceeded => Self::SizeLimitExceeded,
            ResultCode::AuthMethodNotSupported => Self::AuthMethodNotSupported,
            ResultCode::InvalidCredentials => Self::InvalidCredentials,
            ResultCode::InsufficientAccessRights => Self::InsufficentAccessRights,
            ResultCode::UnwillingToPerform => Self::UnwillingToPerform,
            ResultCode::Other => Self::Other,
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.as_str(), self.code())
    }
}

/// The `LDAPResult` carried by every response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LdapResult {
    /// Outcome of the operation.
    pub code: ResultCode,
    /// `matchedDN`; the bridge always leaves this empty.
    pub matched_dn: String,
    /// Human-readable diagnostic message.
    pub diagnostic: String,
}

impl LdapResult {
    /// A successful result with no diagnostic.
    #[must_use]
    pub fn success() -> Self {
        Self::new(ResultCode::Success, String::new())
    }

    /// A result carrying `code` and a diagnostic message.
    #[must_use]
    pub fn new(code: ResultCode, diagnostic: impl Into<String>) -> Self {
        Self {
            code,
            matched_dn: String::new(),
            diagnostic: diagnostic.into(),
        }
    }
}

impl From<LdapResult> for proto::LdapResult {
    fn from(result: LdapResult) -> Self {
        Self {
            code: result.code.into(),
            matcheddn: result.matched_dn,
            message: result.diagnostic,
            referral: Vec::new(),
        }
    }
}
