//! Naming conventions for directory entries served by the bridge.

use thiserror::Error;

use crate::Config;

/// Group container label used for every principal entry.
pub const USERS_CONTAINER: &str = "users";

/// Read-only naming inputs shared by authorization and entry projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryNaming {
    base_dn: String,
    base_dn_folded: String,
    name_attribute: String,
    group_attribute: String,
}

impl DirectoryNaming {
    /// Builds naming conventions from explicit values.
    ///
    /// Surrounding whitespace is trimmed from every value.
    pub fn new(
        base_dn: &str,
        name_attribute: &str,
        group_attribute: &str,
    ) -> Result<Self, NamingError> {
        let trimmed_base = non_empty(base_dn, "base_dn")?;
        let trimmed_name = non_empty(name_attribute, "name_format")?;
        let trimmed_group = non_empty(group_attribute, "group_format")?;
        Ok(Self {
            base_dn_folded: trimmed_base.to_ascii_lowercase(),
            base_dn: trimmed_base,
            name_attribute: trimmed_name,
            group_attribute: trimmed_group,
        })
    }

    /// Derives naming conventions from the loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, NamingError> {
        Self::new(
            config.base_dn(),
            config.name_format(),
            config.group_format(),
        )
    }

    /// Base distinguished name with its configured casing.
    #[must_use]
    pub fn base_dn(&self) -> &str {
        self.base_dn.as_str()
    }

    /// Base distinguished name folded to ASCII lowercase for comparisons.
    #[must_use]
    pub fn base_dn_folded(&self) -> &str {
        self.base_dn_folded.as_str()
    }

    /// Attribute naming a principal's RDN, e.g. `cn`.
    #[must_use]
    pub fn name_attribute(&self) -> &str {
        self.name_attribute.as_str()
    }

    /// Attribute naming the group container RDN, e.g. `ou`.
    #[must_use]
    pub fn group_attribute(&self) -> &str {
        self.group_attribute.as_str()
    }

    /// Formats the distinguished name of a principal entry.
    #[must_use]
    pub fn principal_dn(&self, preferred_name: &str) -> String {
        format!(
            "{}={preferred_name},{}={USERS_CONTAINER},{}",
            self.name_attribute, self.group_attribute, self.base_dn
        )
    }
}

/// Errors raised when naming conventions are unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NamingError {
    /// A required naming value was empty.
    #[error("configuration value '{field}' must not be empty")]
    Empty {
        /// Name of the configuration field.
        field: &'static str,
    },
}

fn non_empty(value: &str, field: &'static str) -> Result<String, NamingError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(NamingError::Empty { field });
    }
    Ok(trimmed.to_owned())
}
