//! Directory entries emitted in search results.

/// One attribute of a [`DirectoryEntry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryAttribute {
    name: String,
    values: Vec<String>,
}

impl EntryAttribute {
    /// Builds an attribute from its description and values.
    #[must_use]
    pub fn new(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Attribute description as emitted on the wire.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Attribute values in emission order.
    #[must_use]
    pub fn values(&self) -> &[String] {
        &self.values
    }
}

/// An entry returned by a search, built fresh for each response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    dn: String,
    attributes: Vec<EntryAttribute>,
}

impl DirectoryEntry {
    /// Builds an entry from its distinguished name and ordered attributes.
    #[must_use]
    pub fn new(dn: impl Into<String>, attributes: Vec<EntryAttribute>) -> Self {
        Self {
            dn: dn.into(),
            attributes,
        }
    }

    /// Distinguished name of the entry.
    #[must_use]
    pub fn dn(&self) -> &str {
        self.dn.as_str()
    }

    /// Attributes in emission order.
    #[must_use]
    pub fn attributes(&self) -> &[EntryAttribute] {
        &self.attributes
    }

    /// Looks up an attribute by case-insensitive name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&EntryAttribute> {
        self.attributes
            .iter()
            .find(|attribute| attribute.name.eq_ignore_ascii_case(name))
    }

    /// Applies a search request's attribute list and `typesOnly` flag.
    #[must_use]
    pub fn select(mut self, selection: &AttributeSelection, types_only: bool) -> Self {
        match selection {
            AttributeSelection::All => {}
            AttributeSelection::NoAttributes => self.attributes.clear(),
            AttributeSelection::Named(names) => self.attributes.retain(|attribute| {
                names
                    .iter()
                    .any(|name| name.eq_ignore_ascii_case(&attribute.name))
            }),
        }
        if types_only {
            for attribute in &mut self.attributes {
                attribute.values.clear();
            }
        }
        self
    }
}

/// Attribute selection requested by a search (RFC 4511 §4.5.1.8).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeSelection {
    /// Every user attribute; an empty list or `*`.
    All,
    /// No attributes; the special name `1.1`.
    NoAttributes,
    /// Only the named attributes, compared case-insensitively.
    Named(Vec<String>),
}

impl AttributeSelection {
    /// Interprets a search request's attribute list.
    #[must_use]
    pub fn from_request(attributes: &[String]) -> Self {
        if attributes.is_empty() || attributes.iter().any(|name| name == "*") {
            return Self::All;
        }
        if attributes.iter().all(|name| name == "1.1") {
            return Self::NoAttributes;
        }
        Self::Named(
            attributes
                .iter()
                .filter(|name| name.as_str() != "1.1")
                .cloned()
                .collect(),
        )
    }
}
