// Entity Models
//
// Four flat record types, related only through integer foreign keys:
// - Category (identifier may be rewritten by reconciliation)
// - Practitioner (run-local identifier)
// - Service (one per source row)
// - ServicePractitioner (join table edge)
//
// Categories and practitioners come with a registry that deduplicates
// by normalized name and assigns sequential identifiers.

pub mod category;
pub mod practitioner;
pub mod service;

pub use category::{Category, CategoryRegistry};
pub use practitioner::{Practitioner, PractitionerRegistry};
pub use service::{Branch, PriceType, Service, ServicePractitioner};

use std::collections::BTreeMap;

/// Locale code → text
pub type I18n = BTreeMap<String, String>;

/// Single-locale map; empty text gives an empty map, never `{locale: ""}`
pub fn i18n(locale: &str, text: &str) -> I18n {
    let mut map = I18n::new();
    if !text.is_empty() {
        map.insert(locale.to_string(), text.to_string());
    }
    map
}
