// 💉 Service Entity + ServicePractitioner edge

use super::I18n;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ============================================================================
// BRANCH
// ============================================================================

/// Clinic locations a service can be offered at
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Branch {
    Jumeirah,
    Srz,
}

impl Branch {
    pub fn all() -> BTreeSet<Branch> {
        [Branch::Jumeirah, Branch::Srz].into_iter().collect()
    }
}

// ============================================================================
// PRICE TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceType {
    /// price_min == price_max
    Fixed,
    /// No price in the source
    Unknown,
}

// ============================================================================
// SERVICE ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: i64,

    /// Foreign key to Category
    pub category_id: i64,

    pub name_i18n: I18n,
    pub description_i18n: I18n,
    pub duration_minutes: u32,
    pub price_type: PriceType,

    // Both set or both null
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,

    pub price_note_i18n: I18n,
    pub branches: BTreeSet<Branch>,
}

impl Service {
    pub fn has_price(&self) -> bool {
        self.price_min.is_some() && self.price_max.is_some()
    }
}

/// Many-to-many edge between Service and Practitioner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServicePractitioner {
    pub service_id: i64,
    pub practitioner_id: i64,
}
