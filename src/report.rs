// 📋 Sync Reporter - What reconciliation did, for operator review
// Read-only: built from the reconciler's outcomes, never touches the dataset.

use crate::reconciliation::{snapshot_fingerprint, CategoryOutcome, Reconciliation, RemoteCategory};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedEntry {
    pub name: String,
    pub remote_name: String,
    pub old_id: i64,
    pub remote_id: i64,
    pub is_archived: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEntry {
    pub name: String,
    pub old_id: i64,
    pub new_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnresolvedEntry {
    pub name: String,
    pub old_id: i64,
    pub remote_ids: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub remote_fingerprint: String,

    pub total_local: usize,
    pub total_remote: usize,

    pub matched_count: usize,
    pub matched: Vec<MatchedEntry>,

    pub new_count: usize,
    pub new: Vec<NewEntry>,

    pub unresolved_count: usize,
    pub unresolved: Vec<UnresolvedEntry>,

    /// old local id → final id
    pub id_mapping: BTreeMap<i64, i64>,

    /// Why unresolved categories were left without an id
    pub errors: Vec<String>,
}

impl SyncReport {
    pub fn build(run_id: Uuid, reconciliation: &Reconciliation, remote: &[RemoteCategory]) -> Self {
        let mut matched = Vec::new();
        let mut new = Vec::new();
        let mut unresolved = Vec::new();

        for outcome in &reconciliation.outcomes {
            match outcome {
                CategoryOutcome::Matched {
                    local_id,
                    name,
                    remote_id,
                    remote_name,
                    is_archived,
                } => matched.push(MatchedEntry {
                    name: name.clone(),
                    remote_name: remote_name.clone(),
                    old_id: *local_id,
                    remote_id: *remote_id,
                    is_archived: *is_archived,
                }),
                CategoryOutcome::New {
                    local_id,
                    name,
                    final_id,
                } => new.push(NewEntry {
                    name: name.clone(),
                    old_id: *local_id,
                    new_id: *final_id,
                }),
                CategoryOutcome::Unresolved {
                    local_id,
                    name,
                    remote_ids,
                } => unresolved.push(UnresolvedEntry {
                    name: name.clone(),
                    old_id: *local_id,
                    remote_ids: remote_ids.clone(),
                }),
            }
        }

        let errors = reconciliation.errors.iter().map(|e| e.to_string()).collect();

        SyncReport {
            run_id,
            generated_at: Utc::now(),
            remote_fingerprint: snapshot_fingerprint(remote),
            total_local: reconciliation.outcomes.len(),
            total_remote: remote.len(),
            matched_count: matched.len(),
            matched,
            new_count: new.len(),
            new,
            unresolved_count: unresolved.len(),
            unresolved,
            id_mapping: reconciliation.id_mapping.clone(),
            errors,
        }
    }

    pub fn has_unresolved(&self) -> bool {
        self.unresolved_count > 0
    }

    pub fn summary(&self) -> String {
        format!(
            "{} local / {} remote categories: {} matched, {} new, {} unresolved",
            self.total_local,
            self.total_remote,
            self.matched_count,
            self.new_count,
            self.unresolved_count
        )
    }

    /// Human-readable block printed by the CLI
    pub fn render(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "📋 Category sync report");
        let _ = writeln!(out, "   Run:      {}", self.run_id);
        let short_fingerprint = self
            .remote_fingerprint
            .get(..12)
            .unwrap_or(&self.remote_fingerprint);
        let _ = writeln!(out, "   Remote:   {}", short_fingerprint);
        let _ = writeln!(out, "   {}", self.summary());

        if !self.matched.is_empty() {
            let _ = writeln!(out, "\n✓ Matched ({}):", self.matched_count);
            for entry in &self.matched {
                let _ = write!(out, "   {} → {}", entry.name, entry.remote_id);
                if entry.remote_name != entry.name {
                    let _ = write!(out, " (remote: {})", entry.remote_name);
                }
                if entry.is_archived {
                    let _ = write!(out, " ⚠️ archived");
                }
                out.push('\n');
            }
        }

        if !self.new.is_empty() {
            let _ = writeln!(out, "\n+ New ({}):", self.new_count);
            for entry in &self.new {
                let _ = writeln!(out, "   {} → {}", entry.name, entry.new_id);
            }
        }

        if !self.unresolved.is_empty() {
            let _ = writeln!(out, "\n❌ Unresolved ({}):", self.unresolved_count);
            for entry in &self.unresolved {
                let _ = writeln!(out, "   {} (candidates: {:?})", entry.name, entry.remote_ids);
            }
        }

        let _ = writeln!(out, "\nID mapping:");
        for (old, new) in &self.id_mapping {
            let _ = writeln!(out, "   {} → {}", old, new);
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Category;
    use crate::reconciliation::ReconciliationEngine;

    fn reconcile(local: &[&str], remote: &[RemoteCategory]) -> Reconciliation {
        let categories: Vec<Category> = local
            .iter()
            .enumerate()
            .map(|(i, n)| Category::new(i as i64 + 1, "en", n, i as i64 + 1))
            .collect();
        ReconciliationEngine::new(remote).reconcile(&categories, &[], "en")
    }

    #[test]
    fn test_report_counts_and_entries() {
        let remote = vec![RemoteCategory::new(5, "BOTOX")];
        let result = reconcile(&["Botox", "Fillers"], &remote);
        let report = SyncReport::build(Uuid::new_v4(), &result, &remote);

        assert_eq!(report.total_local, 2);
        assert_eq!(report.total_remote, 1);
        assert_eq!(report.matched_count, 1);
        assert_eq!(report.new_count, 1);
        assert_eq!(report.unresolved_count, 0);

        assert_eq!(report.matched[0].name, "Botox");
        assert_eq!(report.matched[0].remote_name, "BOTOX");
        assert_eq!(report.matched[0].remote_id, 5);
        assert_eq!(report.new[0].name, "Fillers");
        assert_eq!(report.new[0].new_id, 6);
        assert_eq!(report.id_mapping, BTreeMap::from([(1, 5), (2, 6)]));
        assert!(!report.has_unresolved());
    }

    #[test]
    fn test_report_lists_ambiguous_errors() {
        let remote = vec![RemoteCategory::new(3, "Laser"), RemoteCategory::new(8, "laser")];
        let result = reconcile(&["Laser"], &remote);
        let report = SyncReport::build(Uuid::new_v4(), &result, &remote);

        assert!(report.has_unresolved());
        assert_eq!(report.unresolved[0].remote_ids, vec![3, 8]);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("Laser"));
        assert!(report.id_mapping.is_empty());
    }

    #[test]
    fn test_report_lists_taken_remote_id() {
        let remote = vec![RemoteCategory::new(3, "Botox"), RemoteCategory::new(3, "Fillers")];
        let result = reconcile(&["Botox", "Fillers"], &remote);
        let report = SyncReport::build(Uuid::new_v4(), &result, &remote);

        assert_eq!(report.matched_count, 1);
        assert_eq!(report.unresolved_count, 1);
        assert_eq!(report.unresolved[0].name, "Fillers");
        assert_eq!(
            report.errors,
            vec!["category 'Fillers' matches remote id 3, already taken"]
        );
    }

    #[test]
    fn test_render_flags_archived_and_spelling() {
        let mut archived = RemoteCategory::new(5, "BOTOX");
        archived.is_archived = true;
        let remote = vec![archived];
        let result = reconcile(&["Botox", "Fillers"], &remote);
        let text = SyncReport::build(Uuid::new_v4(), &result, &remote).render();

        assert!(text.contains("Botox → 5 (remote: BOTOX) ⚠️ archived"));
        assert!(text.contains("Fillers → 6"));
        assert!(text.contains("1 → 5"));

        println!("{}", text);
    }

    #[test]
    fn test_report_serializes_for_persistence() {
        let remote = vec![RemoteCategory::new(5, "BOTOX")];
        let result = reconcile(&["Botox"], &remote);
        let report = SyncReport::build(Uuid::new_v4(), &result, &remote);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["matched_count"], 1);
        assert_eq!(json["id_mapping"]["1"], 5);
        assert_eq!(json["remote_fingerprint"].as_str().unwrap().len(), 64);
    }
}
