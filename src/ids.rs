// 🔢 Service ID Assignment - Stable ids for persisted JSON snapshots
//
// Existing unique ids are preserved. For a duplicated id the first
// occurrence keeps it and later ones are reassigned. Missing ids are filled
// with the smallest unused id ≥ start_id. Running it again changes nothing.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssignError {
    #[error("item {index} is not a JSON object")]
    NotAnObject { index: usize },

    #[error("item {index} has a non-integer '{field}': {value}")]
    InvalidId {
        index: usize,
        field: String,
        value: String,
    },

    #[error("expected a JSON array of items")]
    NotAnArray,

    #[error("no unused id left at or above {start_id}")]
    IdSpaceExhausted { start_id: i64 },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignSummary {
    pub total_items: usize,
    pub had_id: usize,
    pub assigned_new: usize,
    pub reassigned_conflicts: usize,
    pub conflicts_found: usize,
    pub max_id: Option<i64>,
}

/// Assign ids in place; `id_field` is usually "id"
pub fn assign_ids(
    items: &mut [Value],
    id_field: &str,
    start_id: i64,
) -> Result<AssignSummary, AssignError> {
    // id → indices carrying it, in order
    let mut occurrences: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    let mut missing: Vec<usize> = Vec::new();

    for (index, item) in items.iter().enumerate() {
        let object = item.as_object().ok_or(AssignError::NotAnObject { index })?;
        match object.get(id_field) {
            None | Some(Value::Null) => missing.push(index),
            Some(value) => {
                let id = value.as_i64().ok_or_else(|| AssignError::InvalidId {
                    index,
                    field: id_field.to_string(),
                    value: value.to_string(),
                })?;
                occurrences.entry(id).or_default().push(index);
            }
        }
    }

    let conflicts: Vec<(i64, &Vec<usize>)> = occurrences
        .iter()
        .filter(|(_, indices)| indices.len() > 1)
        .map(|(id, indices)| (*id, indices))
        .collect();

    for (id, indices) in &conflicts {
        log::warn!("ID {} appears {} times at indices {:?}", id, indices.len(), indices);
    }

    let mut needs_id: Vec<usize> = missing.clone();
    for (_, indices) in &conflicts {
        needs_id.extend(indices.iter().skip(1));
    }
    needs_id.sort_unstable();

    let mut used: HashSet<i64> = occurrences.keys().copied().collect();
    let mut next_id = start_id;
    let mut summary = AssignSummary {
        total_items: items.len(),
        had_id: items.len() - missing.len(),
        conflicts_found: conflicts.len(),
        ..AssignSummary::default()
    };

    // Plan every id before touching the items
    let mut planned = Vec::with_capacity(needs_id.len());
    for index in needs_id {
        while used.contains(&next_id) {
            next_id = next_id
                .checked_add(1)
                .ok_or(AssignError::IdSpaceExhausted { start_id })?;
        }
        used.insert(next_id);
        planned.push((index, next_id));
    }

    for (index, new_id) in planned {
        if let Some(object) = items[index].as_object_mut() {
            let old = object.insert(id_field.to_string(), Value::from(new_id));
            match old {
                Some(old) if !old.is_null() => {
                    summary.reassigned_conflicts += 1;
                    log::info!("Reassigned item {}: {} → {}", index, old, new_id);
                }
                _ => summary.assigned_new += 1,
            }
        }
    }

    summary.max_id = items
        .iter()
        .filter_map(|item| item.get(id_field).and_then(Value::as_i64))
        .max();

    Ok(summary)
}

/// Rewrite a JSON array file in place
pub fn assign_ids_in_file<P: AsRef<Path>>(
    path: P,
    id_field: &str,
    start_id: i64,
) -> Result<AssignSummary> {
    let path = path.as_ref();
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;

    let mut document: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON in {:?}", path))?;

    let items = document
        .as_array_mut()
        .ok_or(AssignError::NotAnArray)
        .with_context(|| format!("Invalid snapshot {:?}", path))?;

    let summary = assign_ids(items, id_field, start_id)
        .with_context(|| format!("Invalid snapshot {:?}", path))?;

    let json = serde_json::to_string_pretty(&document)?;
    fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))?;

    log::info!("Assigned ids in {:?}: {:?}", path, summary);
    Ok(summary)
}
