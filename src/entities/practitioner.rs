// 👩‍⚕️ Practitioner Entity
//
// Identifiers are run-local: practitioners are never reconciled
// against a remote system.

use super::{i18n, I18n};
use crate::intern::InternTable;
use crate::normalize::canonical_practitioner_name;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Practitioner {
    pub id: i64,

    /// Canonical display name, e.g. "Dr. Anna Zakhozha"
    pub name: String,

    pub name_i18n: I18n,
}

impl Practitioner {
    pub fn new(id: i64, locale: &str, name: &str) -> Self {
        Practitioner {
            id,
            name: name.to_string(),
            name_i18n: i18n(locale, name),
        }
    }
}

/// Deduplicates practitioners by their canonical, normalized name
pub struct PractitionerRegistry {
    table: InternTable,
    practitioners: Vec<Practitioner>,
    locale: String,
}

impl PractitionerRegistry {
    pub fn new(locale: &str) -> Self {
        PractitionerRegistry {
            table: InternTable::new(),
            practitioners: Vec::new(),
            locale: locale.to_string(),
        }
    }

    /// Identifier for `name`, creating the practitioner on first sight.
    /// "Dr.Anna Zakhozha" and "Dr. Anna Zakhozha" resolve to the same one.
    pub fn resolve(&mut self, name: &str) -> i64 {
        let canonical = canonical_practitioner_name(name);
        let interned = self.table.intern(&canonical);

        if interned.is_new {
            log::debug!("New practitioner #{}: {}", interned.id, canonical);
            self.practitioners
                .push(Practitioner::new(interned.id, &self.locale, &canonical));
        }

        interned.id
    }

    pub fn into_practitioners(self) -> Vec<Practitioner> {
        self.practitioners
    }
}
