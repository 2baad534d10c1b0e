// ⚖️ Reconciliation Engine - Merge local category IDs with remote ones
//
// Local identifiers are placeholders valid for one run. Each local category is
// matched by normalized name against a snapshot of the remote categories:
//   matched   → final id = remote id
//   no match  → final id = max remote id + n (n = 1, 2, ... per new category)
//   ambiguous → unresolved, no final id
// A remote id already taken, or no id left to mint, also leaves the
// category unresolved.
// Service foreign keys are then rewritten through a single old → final map.

use crate::entities::{Category, Service};
use crate::error::PipelineError;
use crate::normalize::normalize_name;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap, HashSet};

// ============================================================================
// REMOTE SNAPSHOT
// ============================================================================

/// One category as known by the remote system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RemoteCategoryWire")]
pub struct RemoteCategory {
    pub id: i64,
    pub name: String,
    pub is_archived: bool,
}

impl RemoteCategory {
    pub fn new(id: i64, name: &str) -> Self {
        RemoteCategory {
            id,
            name: name.to_string(),
            is_archived: false,
        }
    }
}

/// Accepts both `{id, name}` and the API shape `{id, name_i18n: {en}, is_archived}`
#[derive(Deserialize)]
struct RemoteCategoryWire {
    id: i64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    name_i18n: BTreeMap<String, String>,
    #[serde(default)]
    is_archived: bool,
}

impl From<RemoteCategoryWire> for RemoteCategory {
    fn from(wire: RemoteCategoryWire) -> Self {
        let name = wire
            .name
            .filter(|name| !name.trim().is_empty())
            .or_else(|| wire.name_i18n.get("en").cloned())
            .or_else(|| wire.name_i18n.values().next().cloned())
            .unwrap_or_default();

        RemoteCategory {
            id: wire.id,
            name,
            is_archived: wire.is_archived,
        }
    }
}

/// SHA-256 over the snapshot's (id, name) pairs, order-independent
pub fn snapshot_fingerprint(remote: &[RemoteCategory]) -> String {
    let mut entries: Vec<String> = remote
        .iter()
        .map(|c| format!("{}\t{}", c.id, normalize_name(&c.name)))
        .collect();
    entries.sort();

    let mut hasher = Sha256::new();
    for entry in &entries {
        hasher.update(entry.as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// PER-CATEGORY OUTCOME
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CategoryOutcome {
    /// Bound to an existing remote category
    Matched {
        local_id: i64,
        name: String,
        remote_id: i64,
        remote_name: String,
        is_archived: bool,
    },

    /// Not in the remote list; minted above the max remote id
    New {
        local_id: i64,
        name: String,
        final_id: i64,
    },

    /// Left without a final id; `remote_ids` lists the candidates, if any
    Unresolved {
        local_id: i64,
        name: String,
        remote_ids: Vec<i64>,
    },
}

impl CategoryOutcome {
    pub fn local_id(&self) -> i64 {
        match self {
            CategoryOutcome::Matched { local_id, .. }
            | CategoryOutcome::New { local_id, .. }
            | CategoryOutcome::Unresolved { local_id, .. } => *local_id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            CategoryOutcome::Matched { name, .. }
            | CategoryOutcome::New { name, .. }
            | CategoryOutcome::Unresolved { name, .. } => name,
        }
    }

    pub fn final_id(&self) -> Option<i64> {
        match self {
            CategoryOutcome::Matched { remote_id, .. } => Some(*remote_id),
            CategoryOutcome::New { final_id, .. } => Some(*final_id),
            CategoryOutcome::Unresolved { .. } => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.final_id().is_some()
    }
}

// ============================================================================
// RECONCILIATION RESULT
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Reconciliation {
    /// Resolved categories carrying their final identifiers
    pub categories: Vec<Category>,

    /// Services whose category_id now holds a final identifier
    pub services: Vec<Service>,

    /// Services of unresolved categories, untouched
    pub held_services: Vec<Service>,

    pub outcomes: Vec<CategoryOutcome>,

    /// local id → final id, resolved categories only
    pub id_mapping: BTreeMap<i64, i64>,

    pub errors: Vec<PipelineError>,
}

impl Reconciliation {
    pub fn summary(&self) -> String {
        let matched = self
            .outcomes
            .iter()
            .filter(|o| matches!(o, CategoryOutcome::Matched { .. }))
            .count();
        let new = self
            .outcomes
            .iter()
            .filter(|o| matches!(o, CategoryOutcome::New { .. }))
            .count();
        format!(
            "Reconciled {} categories: {} matched, {} new, {} unresolved",
            self.outcomes.len(),
            matched,
            new,
            self.outcomes.len() - matched - new
        )
    }
}

/// Lookup outcome for one name
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteMatch<'a> {
    None,
    Single(&'a RemoteCategory),
    Ambiguous(Vec<i64>),
}

// ============================================================================
// RECONCILIATION ENGINE
// ============================================================================

pub struct ReconciliationEngine<'a> {
    remote: &'a [RemoteCategory],

    /// normalized name → indices into `remote`
    index: HashMap<String, Vec<usize>>,

    max_remote_id: i64,
}

impl<'a> ReconciliationEngine<'a> {
    pub fn new(remote: &'a [RemoteCategory]) -> Self {
        let mut index: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, category) in remote.iter().enumerate() {
            let key = normalize_name(&category.name);
            if !key.is_empty() {
                index.entry(key).or_default().push(i);
            }
        }

        ReconciliationEngine {
            remote,
            index,
            max_remote_id: remote.iter().map(|c| c.id).max().unwrap_or(0),
        }
    }

    /// Largest identifier in the whole remote list (0 when empty)
    pub fn max_remote_id(&self) -> i64 {
        self.max_remote_id
    }

    /// Exact match on normalized name. Entries repeating the same id count once.
    pub fn find_match(&self, name: &str) -> RemoteMatch<'a> {
        let Some(indices) = self.index.get(&normalize_name(name)) else {
            return RemoteMatch::None;
        };

        let mut ids: Vec<i64> = indices.iter().map(|&i| self.remote[i].id).collect();
        ids.sort_unstable();
        ids.dedup();

        if ids.len() == 1 {
            RemoteMatch::Single(&self.remote[indices[0]])
        } else {
            RemoteMatch::Ambiguous(ids)
        }
    }

    /// Assign final identifiers, then rewrite service foreign keys.
    ///
    /// Deterministic in (local names, remote list): running it again with the
    /// same inputs yields the same identifiers.
    pub fn reconcile(
        &self,
        categories: &[Category],
        services: &[Service],
        locale: &str,
    ) -> Reconciliation {
        let mut result = Reconciliation::default();
        // None once the id space above the remote maximum is used up
        let mut next_new_id = self.max_remote_id.checked_add(1);
        let mut claimed: HashSet<i64> = HashSet::new();

        for category in categories {
            let local_id = category.id;
            let name = category.display_name(locale).to_string();

            let (outcome, error) = match self.find_match(&name) {
                RemoteMatch::Single(remote) if claimed.contains(&remote.id) => (
                    CategoryOutcome::Unresolved {
                        local_id,
                        name: name.clone(),
                        remote_ids: vec![remote.id],
                    },
                    Some(PipelineError::RemoteIdTaken {
                        category: name,
                        local_id,
                        remote_id: remote.id,
                    }),
                ),
                RemoteMatch::Single(remote) => (
                    CategoryOutcome::Matched {
                        local_id,
                        name,
                        remote_id: remote.id,
                        remote_name: remote.name.clone(),
                        is_archived: remote.is_archived,
                    },
                    None,
                ),
                RemoteMatch::None => match next_new_id {
                    Some(final_id) => {
                        next_new_id = final_id.checked_add(1);
                        log::info!("New category '{}' → id {}", name, final_id);
                        (
                            CategoryOutcome::New {
                                local_id,
                                name,
                                final_id,
                            },
                            None,
                        )
                    }
                    None => (
                        CategoryOutcome::Unresolved {
                            local_id,
                            name: name.clone(),
                            remote_ids: Vec::new(),
                        },
                        Some(PipelineError::IdSpaceExhausted {
                            category: name,
                            local_id,
                            max_remote_id: self.max_remote_id,
                        }),
                    ),
                },
                RemoteMatch::Ambiguous(remote_ids) => (
                    CategoryOutcome::Unresolved {
                        local_id,
                        name: name.clone(),
                        remote_ids: remote_ids.clone(),
                    },
                    Some(PipelineError::AmbiguousMatch {
                        category: name,
                        local_id,
                        remote_ids,
                    }),
                ),
            };

            if let Some(final_id) = outcome.final_id() {
                claimed.insert(final_id);
                result.id_mapping.insert(local_id, final_id);
                result.categories.push(category.with_id(final_id));
            }

            if let Some(error) = error {
                log::warn!("Category left unresolved: {}", error);
                result.errors.push(error);
            }

            result.outcomes.push(outcome);
        }

        let (services, held_services) =
            rewrite_category_ids(services, &result.id_mapping, &result.outcomes);
        result.services = services;
        result.held_services = held_services;

        log::info!("{}", result.summary());
        result
    }
}

/// One rewrite pass over services through the old → final map.
///
/// Services of unresolved categories are held back. A service whose category
/// is unknown to both is passed through unchanged so the integrity check
/// downstream reports it.
pub fn rewrite_category_ids(
    services: &[Service],
    id_mapping: &BTreeMap<i64, i64>,
    outcomes: &[CategoryOutcome],
) -> (Vec<Service>, Vec<Service>) {
    let unresolved: HashSet<i64> = outcomes
        .iter()
        .filter(|o| !o.is_resolved())
        .map(|o| o.local_id())
        .collect();

    let mut rewritten = Vec::with_capacity(services.len());
    let mut held = Vec::new();

    for service in services {
        if let Some(&final_id) = id_mapping.get(&service.category_id) {
            rewritten.push(Service {
                category_id: final_id,
                ..service.clone()
            });
        } else if unresolved.contains(&service.category_id) {
            held.push(service.clone());
        } else {
            rewritten.push(service.clone());
        }
    }

    (rewritten, held)
}

// ============================================================================
// TESTS
// ============================================================================
