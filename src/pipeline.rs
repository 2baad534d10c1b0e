// 🔄 Pipeline - Extract → Collect → Reconcile → Report
//
// One run is a pure function of (rows, remote snapshot, config). Row and
// reconciliation errors come back in RunOutput::errors; an integrity
// violation is returned as Err and nothing is published.

use crate::collector::collect;
use crate::config::PipelineConfig;
use crate::dataset::Dataset;
use crate::entities::{Category, Practitioner, Service, ServicePractitioner};
use crate::error::PipelineError;
use crate::parser::{RawRow, RecordExtractor};
use crate::reconciliation::{snapshot_fingerprint, ReconciliationEngine, RemoteCategory};
use crate::report::SyncReport;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunInfo {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub source_rows: usize,
    pub remote_categories: usize,
    pub remote_fingerprint: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunOutput {
    pub run: RunInfo,

    pub categories: Vec<Category>,
    pub practitioners: Vec<Practitioner>,
    pub services: Vec<Service>,
    pub service_practitioners: Vec<ServicePractitioner>,

    /// Services of unresolved categories and their edges, not published
    pub held_services: Vec<Service>,
    pub held_service_practitioners: Vec<ServicePractitioner>,

    pub report: SyncReport,

    /// Row validation and reconciliation errors
    pub errors: Vec<PipelineError>,
}

impl RunOutput {
    /// The published collections as one dataset
    pub fn dataset(&self) -> Dataset {
        Dataset {
            categories: self.categories.clone(),
            practitioners: self.practitioners.clone(),
            services: self.services.clone(),
            service_practitioners: self.service_practitioners.clone(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Run the whole pipeline over one batch of rows
pub fn run(
    rows: &[RawRow],
    remote: &[RemoteCategory],
    config: &PipelineConfig,
) -> Result<RunOutput, PipelineError> {
    let run = RunInfo {
        run_id: Uuid::new_v4(),
        started_at: Utc::now(),
        source_rows: rows.len(),
        remote_categories: remote.len(),
        remote_fingerprint: snapshot_fingerprint(remote),
    };
    log::info!(
        "Run {} started: {} rows, {} remote categories",
        run.run_id,
        rows.len(),
        remote.len()
    );

    // 1. Extract
    let batch = RecordExtractor::new(config.clone()).extract_all(rows);
    let mut errors = batch.errors;

    // 2. Collect
    let local = collect(batch.records, config);
    local.validate()?;

    // 3. Reconcile
    let engine = ReconciliationEngine::new(remote);
    let reconciliation = engine.reconcile(&local.categories, &local.services, &config.locale);

    let held_ids: HashSet<i64> = reconciliation.held_services.iter().map(|s| s.id).collect();
    let (held_links, links): (Vec<ServicePractitioner>, Vec<ServicePractitioner>) = local
        .service_practitioners
        .into_iter()
        .partition(|link| held_ids.contains(&link.service_id));

    let published = Dataset {
        categories: reconciliation.categories.clone(),
        practitioners: local.practitioners,
        services: reconciliation.services.clone(),
        service_practitioners: links,
    };
    published.validate()?;

    // 4. Report
    let report = SyncReport::build(run.run_id, &reconciliation, remote);
    errors.extend(reconciliation.errors.iter().cloned());

    log::info!("Run {} finished: {}", run.run_id, published.summary());

    Ok(RunOutput {
        run,
        categories: published.categories,
        practitioners: published.practitioners,
        services: published.services,
        service_practitioners: published.service_practitioners,
        held_services: reconciliation.held_services,
        held_service_practitioners: held_links,
        report,
        errors,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Branch;
    use crate::error::RowError;

    fn row(
        line: usize,
        category: &str,
        name: &str,
        doctors: &str,
        price: &str,
        duration: &str,
    ) -> RawRow {
        RawRow::from_pairs(
            line,
            &[
                ("ID", ""),
                ("Category", category),
                ("Service Name", name),
                ("Doctor name", doctors),
                ("Price", price),
                ("Duration", duration),
                ("Note", ""),
                ("Available In Branches", "Both"),
            ],
        )
    }

    #[test]
    fn test_botox_end_to_end() {
        let rows = vec![
            row(2, "Botox", "Forehead", "Dr.Anna Zakhozha", "500 + VAT", "30 min"),
            row(3, "BOTOX", "Full face", "Dr. Anna Zakhozha", "1,200", "1 hour"),
        ];

        let output = run(&rows, &[], &PipelineConfig::default()).unwrap();

        assert_eq!(output.categories.len(), 1);
        assert_eq!(output.practitioners.len(), 1);
        assert_eq!(output.practitioners[0].name, "Dr. Anna Zakhozha");
        assert_eq!(output.services.len(), 2);
        assert_eq!(output.service_practitioners.len(), 2);
        assert_eq!(output.services[1].duration_minutes, 60);
        assert_eq!(output.services[1].price_min, Some(1200.0));
        assert_eq!(output.services[0].branches, Branch::all());
        assert!(!output.has_errors());
        assert!(output.dataset().validate().is_ok());

        println!("✅ {}", output.report.summary());
    }

    #[test]
    fn test_reconciliation_scenario() {
        let rows = vec![
            row(2, "Botox", "Forehead", "", "", "30 min"),
            row(3, "Fillers", "Lips", "", "", "45 min"),
            row(4, "Fillers", "Cheeks", "", "", "45 min"),
        ];
        let remote = vec![RemoteCategory::new(5, "BOTOX")];

        let output = run(&rows, &remote, &PipelineConfig::default()).unwrap();

        let ids: Vec<i64> = output.categories.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![5, 6]);

        let refs: Vec<i64> = output.services.iter().map(|s| s.category_id).collect();
        assert_eq!(refs, vec![5, 6, 6]);

        assert_eq!(output.report.matched_count, 1);
        assert_eq!(output.report.new_count, 1);
        assert_eq!(output.report.id_mapping.get(&2), Some(&6));
    }

    #[test]
    fn test_bad_rows_collected_not_fatal() {
        let rows = vec![
            row(2, "Botox", "Forehead", "", "", "30 min"),
            row(3, "", "Orphan", "", "", "30 min"),
            row(4, "Botox", "Chin", "", "", "Individual"),
        ];

        let output = run(&rows, &[], &PipelineConfig::default()).unwrap();

        assert_eq!(output.services.len(), 1);
        assert_eq!(output.errors.len(), 2);
        assert!(matches!(output.errors[0], PipelineError::RowValidation { row: 3, .. }));
        assert!(matches!(
            &output.errors[1],
            PipelineError::RowValidation {
                row: 4,
                reason: RowError::UnrecognizedDuration { .. }
            }
        ));
    }

    #[test]
    fn test_ambiguous_category_held_back() {
        let rows = vec![
            row(2, "Laser", "Hair removal", "Dr. X", "", "30 min"),
            row(3, "Botox", "Forehead", "Dr. X", "", "30 min"),
        ];
        let remote = vec![
            RemoteCategory::new(3, "Laser"),
            RemoteCategory::new(8, "LASER"),
            RemoteCategory::new(4, "Botox"),
        ];

        let output = run(&rows, &remote, &PipelineConfig::default()).unwrap();

        assert_eq!(output.categories.len(), 1);
        assert_eq!(output.categories[0].id, 4);
        assert_eq!(output.services.len(), 1);
        assert_eq!(output.held_services.len(), 1);
        assert_eq!(output.service_practitioners.len(), 1);
        assert_eq!(output.held_service_practitioners.len(), 1);
        assert!(matches!(output.errors[0], PipelineError::AmbiguousMatch { .. }));
        assert!(output.dataset().validate().is_ok());
    }

    #[test]
    fn test_every_new_id_above_remote_max() {
        let rows = vec![
            row(2, "Peels", "A", "", "", "30 min"),
            row(3, "Massage", "B", "", "", "30 min"),
        ];
        let remote = vec![RemoteCategory::new(17, "Botox"), RemoteCategory::new(2, "Laser")];

        let output = run(&rows, &remote, &PipelineConfig::default()).unwrap();
        assert!(output.categories.iter().all(|c| c.id > 17));
    }

    #[test]
    fn test_fixture_end_to_end() {
        use crate::source::{load_remote_snapshot, CsvRowSource, RowSource};
        use std::path::Path;

        let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures");
        let rows = CsvRowSource::new(fixtures.join("raw_services.csv")).rows().unwrap();
        let remote = load_remote_snapshot(fixtures.join("remote_categories.json")).unwrap();

        // Repeated header row dropped
        assert_eq!(rows.len(), 7);

        let output = run(&rows, &remote, &PipelineConfig::default()).unwrap();

        // BOTOX matched, Fillers minted above 5, the two dermatology spellings matched to 2
        let ids: Vec<i64> = output.categories.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![5, 6, 2]);
        assert_eq!(output.categories[0].display_name("en"), "BOTOX");

        let names: Vec<&str> = output.practitioners.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Dr. Anna Zakhozha", "Dr. Sarah Mohamed", "Dr. Omar Khalid"]);

        assert_eq!(output.services.len(), 5);
        assert_eq!(output.service_practitioners.len(), 5);

        let full_face = &output.services[0];
        assert_eq!(full_face.name_i18n.get("en").unwrap(), "Full face");
        assert_eq!(
            full_face.description_i18n.get("en").unwrap(),
            "Includes: Forehead, Crow's feet"
        );
        assert_eq!(full_face.price_min, Some(1500.0));
        assert_eq!(
            full_face.price_note_i18n.get("en").unwrap(),
            "Price excludes VAT. Per session"
        );

        let masseter = &output.services[1];
        assert_eq!(masseter.name_i18n.get("en").unwrap(), "Masseter");
        assert_eq!(masseter.description_i18n.get("en").unwrap(), "jaw slimming");
        assert_eq!(masseter.branches, [Branch::Jumeirah].into_iter().collect());

        let lips = &output.services[2];
        assert_eq!(lips.category_id, 6);
        assert!(!lips.has_price());
        assert_eq!(lips.duration_minutes, 60);

        let peel = &output.services[3];
        assert_eq!(peel.category_id, 2);
        assert_eq!(peel.duration_minutes, 90);
        assert_eq!(peel.branches, [Branch::Srz].into_iter().collect());

        assert_eq!(output.services[4].duration_minutes, 75);
        assert_eq!(output.services[4].branches, Branch::all());

        // Blank service name and "Individual" duration
        assert_eq!(output.errors.len(), 2);
        assert!(output.dataset().validate().is_ok());

        assert_eq!(output.report.matched_count, 2);
        assert_eq!(output.report.new_count, 1);
        assert_eq!(output.report.total_remote, 3);
    }

    #[test]
    fn test_run_info() {
        let rows = vec![row(2, "Botox", "Forehead", "", "", "30 min")];
        let remote = vec![RemoteCategory::new(1, "Botox")];
        let output = run(&rows, &remote, &PipelineConfig::default()).unwrap();

        assert_eq!(output.run.source_rows, 1);
        assert_eq!(output.run.remote_categories, 1);
        assert_eq!(output.run.remote_fingerprint, output.report.remote_fingerprint);
        assert_eq!(output.run.run_id, output.report.run_id);
    }
}
