//! Authorization guard for binds and searches.
//!
//! Names are compared in ASCII lowercase; any name echoed back keeps the
//! casing the client sent.

use dirbridge_config::DirectoryNaming;
use thiserror::Error;

/// Errors raised when a request falls outside the served naming context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthzError {
    /// A search was attempted without a prior successful bind.
    #[error("anonymous search is not permitted")]
    AnonymousSearch,
    /// The bind name is not below the configured base.
    #[error("bind name '{bind_dn}' is not within base '{base_dn}'")]
    BindOutsideBase {
        /// Bind name as sent.
        bind_dn: String,
        /// Configured base.
        base_dn: String,
    },
    /// The search base is not within the configured base.
    #[error("search base '{search_base}' is not within base '{base_dn}'")]
    SearchOutsideBase {
        /// Search base as sent.
        search_base: String,
        /// Configured base.
        base_dn: String,
    },
    /// The bind name has more components below the base than a principal.
    #[error("bind name '{bind_dn}' has too many components")]
    MalformedBindName {
        /// Bind name as sent.
        bind_dn: String,
    },
}

/// The principal identified by an authorized bind name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindPrincipal {
    bind_dn: String,
    login: String,
}

impl BindPrincipal {
    /// Bind name as sent by the client.
    #[must_use]
    pub fn bind_dn(&self) -> &str {
        self.bind_dn.as_str()
    }

    /// Login presented to the credential check.
    #[must_use]
    pub fn login(&self) -> &str {
        self.login.as_str()
    }
}

/// Authorizes a search issued by `bind_dn` below `search_base`.
///
/// All three checks must pass: the session is bound, the bind name lies
/// below the base, and the search base lies within it.
///
/// # Errors
///
/// Returns the first [`AuthzError`] encountered.
pub fn authorize_search(
    bind_dn: &str,
    search_base: &str,
    naming: &DirectoryNaming,
) -> Result<(), AuthzError> {
    if bind_dn.is_empty() {
        return Err(AuthzError::AnonymousSearch);
    }
    principal_prefix(bind_dn, naming)?;

    let base = naming.base_dn_folded();
    if !search_base.to_ascii_lowercase().ends_with(base) {
        return Err(AuthzError::SearchOutsideBase {
            search_base: search_base.to_owned(),
            base_dn: naming.base_dn().to_owned(),
        });
    }
    Ok(())
}

/// Authorizes a bind name and extracts the login it names.
///
/// The part of the name above the base may hold at most two components; the
/// first names the principal, with a leading `<name attribute>=` removed.
///
/// # Errors
///
/// Returns [`AuthzError::BindOutsideBase`] or
/// [`AuthzError::MalformedBindName`].
pub fn authorize_bind(bind_dn: &str, naming: &DirectoryNaming) -> Result<BindPrincipal, AuthzError> {
    let prefix = principal_prefix(bind_dn, naming)?;
    let components: Vec<&str> = prefix.split(',').collect();
    if components.len() > 2 {
        return Err(AuthzError::MalformedBindName {
            bind_dn: bind_dn.to_owned(),
        });
    }

    let first = components.first().copied().unwrap_or_default();
    Ok(BindPrincipal {
        bind_dn: bind_dn.to_owned(),
        login: strip_name_attribute(first, naming.name_attribute()).to_owned(),
    })
}

/// Returns the original-case part of `bind_dn` in front of `,<base>`.
fn principal_prefix<'a>(bind_dn: &'a str, naming: &DirectoryNaming) -> Result<&'a str, AuthzError> {
    let suffix = format!(",{}", naming.base_dn_folded());
    let folded = bind_dn.to_ascii_lowercase();
    let outside = || AuthzError::BindOutsideBase {
        bind_dn: bind_dn.to_owned(),
        base_dn: naming.base_dn().to_owned(),
    };
    if !folded.ends_with(&suffix) {
        return Err(outside());
    }
    // ASCII folding preserves byte offsets.
    bind_dn
        .get(..bind_dn.len() - suffix.len())
        .ok_or_else(outside)
}

fn strip_name_attribute<'a>(component: &'a str, name_attribute: &str) -> &'a str {
    let Some((attribute, value)) = component.split_once('=') else {
        return component;
    };
    if attribute.trim().eq_ignore_ascii_case(name_attribute) {
        value
    } else {
        component
    }
}
