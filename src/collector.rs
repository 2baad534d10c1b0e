// 🗂️ Entity Collector
// Ordered IntermediateRecords → Dataset with dense sequential identifiers.
// All counters live in one EntityCollector; nothing outlives the run.

use crate::config::PipelineConfig;
use crate::dataset::Dataset;
use crate::entities::{
    i18n, CategoryRegistry, I18n, PractitionerRegistry, PriceType, Service,
    ServicePractitioner,
};
use crate::parser::IntermediateRecord;
use std::collections::HashSet;

pub struct EntityCollector {
    locale: String,
    vat_note: String,
    categories: CategoryRegistry,
    practitioners: PractitionerRegistry,
    services: Vec<Service>,
    links: Vec<ServicePractitioner>,
    seen_links: HashSet<ServicePractitioner>,
}

impl EntityCollector {
    pub fn new(config: &PipelineConfig) -> Self {
        EntityCollector {
            locale: config.locale.clone(),
            vat_note: config.vat_note.clone(),
            categories: CategoryRegistry::new(&config.locale),
            practitioners: PractitionerRegistry::new(&config.locale),
            services: Vec::new(),
            links: Vec::new(),
            seen_links: HashSet::new(),
        }
    }

    /// Add one record; returns the identifier of the service it created
    pub fn push(&mut self, record: IntermediateRecord) -> i64 {
        let category_id = self.categories.resolve(&record.category);
        let service_id = self.services.len() as i64 + 1;

        let price_note = build_price_note(
            record.price.excludes_vat,
            record.note.as_deref(),
            &self.vat_note,
        );

        let price_type = if record.price.amount.is_some() {
            PriceType::Fixed
        } else {
            PriceType::Unknown
        };

        self.services.push(Service {
            id: service_id,
            category_id,
            name_i18n: i18n(&self.locale, &record.name),
            description_i18n: record
                .description
                .as_deref()
                .map(|d| i18n(&self.locale, d))
                .unwrap_or_default(),
            duration_minutes: record.duration_minutes,
            price_type,
            price_min: record.price.amount,
            price_max: record.price.amount,
            price_note_i18n: price_note
                .map(|note| i18n(&self.locale, &note))
                .unwrap_or_else(I18n::new),
            branches: record.branches,
        });

        for name in &record.practitioners {
            let practitioner_id = self.practitioners.resolve(name);
            let link = ServicePractitioner {
                service_id,
                practitioner_id,
            };

            // Same practitioner listed twice in one row
            if self.seen_links.insert(link) {
                self.links.push(link);
            } else {
                log::debug!(
                    "Row {}: practitioner '{}' already linked to service {}",
                    record.line_number,
                    name,
                    service_id
                );
            }
        }

        service_id
    }

    pub fn finish(self) -> Dataset {
        let dataset = Dataset {
            categories: self.categories.into_categories(),
            practitioners: self.practitioners.into_practitioners(),
            services: self.services,
            service_practitioners: self.links,
        };
        log::info!("Collected {}", dataset.summary());
        dataset
    }
}

/// Build the full dataset from records in source order
pub fn collect<I>(records: I, config: &PipelineConfig) -> Dataset
where
    I: IntoIterator<Item = IntermediateRecord>,
{
    let mut collector = EntityCollector::new(config);
    for record in records {
        collector.push(record);
    }
    collector.finish()
}

/// VAT sentence first, then the Note column, joined by ". "
pub fn build_price_note(excludes_vat: bool, note: Option<&str>, vat_note: &str) -> Option<String> {
    let mut parts = Vec::new();
    if excludes_vat {
        parts.push(vat_note);
    }
    if let Some(note) = note.map(str::trim).filter(|n| !n.is_empty()) {
        parts.push(note);
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(". "))
    }
}

// ============================================================================
// TESTS
// ============================================================================
