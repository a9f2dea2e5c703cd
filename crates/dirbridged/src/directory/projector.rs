//! Projection of account records onto directory entries.

use dirbridge_config::DirectoryNaming;

use crate::accounts::AccountRecord;

use super::{DirectoryEntry, EntryAttribute};

/// Object classes carried by every principal entry, in emission order.
pub const PRINCIPAL_OBJECT_CLASSES: [&str; 5] = [
    "posixAccount",
    "inetOrgPerson",
    "organizationalPerson",
    "Person",
    "top",
];

/// Builds the directory entry for `record`.
///
/// `cn`, `uid` and `sn` always carry the preferred name. Optional attributes
/// are emitted only for non-empty strings and non-zero numbers.
#[must_use]
pub fn project(record: &AccountRecord, naming: &DirectoryNaming) -> DirectoryEntry {
    let name = || vec![record.preferred_name.clone()];
    let mut attributes = vec![
        EntryAttribute::new(
            "objectClass",
            PRINCIPAL_OBJECT_CLASSES.iter().map(|class| (*class).to_owned()).collect(),
        ),
        EntryAttribute::new("cn", name()),
        EntryAttribute::new("uid", name()),
        EntryAttribute::new("sn", name()),
    ];

    push_text(&mut attributes, "displayName", &record.display_name);
    push_text(&mut attributes, "mail", &record.mail);
    push_number(&mut attributes, "uidNumber", record.uid_number);
    push_number(&mut attributes, "gidNumber", record.gid_number);
    push_text(&mut attributes, "description", &record.description);

    DirectoryEntry::new(naming.principal_dn(&record.preferred_name), attributes)
}

fn push_text(attributes: &mut Vec<EntryAttribute>, name: &str, value: &str) {
    if !value.is_empty() {
        attributes.push(EntryAttribute::new(name, vec![value.to_owned()]));
    }
}

fn push_number(attributes: &mut Vec<EntryAttribute>, name: &str, value: i64) {
    if value != 0 {
        attributes.push(EntryAttribute::new(name, vec![value.to_string()]));
    }
}
