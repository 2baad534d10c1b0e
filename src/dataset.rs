// 📦 Dataset - the four linked collections + integrity checks

use crate::entities::{Category, Practitioner, Service, ServicePractitioner};
use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub categories: Vec<Category>,
    pub practitioners: Vec<Practitioner>,
    pub services: Vec<Service>,
    pub service_practitioners: Vec<ServicePractitioner>,
}

impl Dataset {
    pub fn summary(&self) -> String {
        format!(
            "{} categories, {} practitioners, {} services, {} service-practitioner links",
            self.categories.len(),
            self.practitioners.len(),
            self.services.len(),
            self.service_practitioners.len()
        )
    }

    /// Check identifier uniqueness and every foreign key.
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let category_ids = unique_ids("category", self.categories.iter().map(|c| c.id))?;
        let practitioner_ids =
            unique_ids("practitioner", self.practitioners.iter().map(|p| p.id))?;
        let service_ids = unique_ids("service", self.services.iter().map(|s| s.id))?;

        for service in &self.services {
            if !category_ids.contains(&service.category_id) {
                return Err(PipelineError::dangling(
                    "service",
                    service.id,
                    format!("category {}", service.category_id),
                ));
            }
        }

        let mut seen_links = HashSet::new();
        for link in &self.service_practitioners {
            if !service_ids.contains(&link.service_id) {
                return Err(PipelineError::dangling(
                    "service_practitioner",
                    link.practitioner_id,
                    format!("service {}", link.service_id),
                ));
            }
            if !practitioner_ids.contains(&link.practitioner_id) {
                return Err(PipelineError::dangling(
                    "service_practitioner",
                    link.service_id,
                    format!("practitioner {}", link.practitioner_id),
                ));
            }
            if !seen_links.insert(*link) {
                return Err(PipelineError::dangling(
                    "service_practitioner",
                    link.service_id,
                    format!("duplicate edge to practitioner {}", link.practitioner_id),
                ));
            }
        }

        Ok(())
    }
}

fn unique_ids(
    entity: &str,
    ids: impl Iterator<Item = i64>,
) -> Result<HashSet<i64>, PipelineError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(PipelineError::dangling(
                entity,
                id,
                "unique identifier (duplicate id)".to_string(),
            ));
        }
    }
    Ok(seen)
}
