// Service Catalog Sync - Core Library
// Spreadsheet rows → categories, practitioners, services and their links,
// with category ids reconciled against the remote system.
// Exposes all modules for use in CLI, API server, and tests

pub mod config;
pub mod error;
pub mod normalize;
pub mod intern;
pub mod entities;
pub mod parser;         // Record Extractor
pub mod dataset;
pub mod collector;      // Entity Collector
pub mod reconciliation; // ID Reconciler
pub mod report;         // Sync Reporter
pub mod pipeline;
pub mod source;
pub mod output;
pub mod ids;

// Re-export commonly used types
pub use config::{ColumnLabels, PipelineConfig};
pub use error::{PipelineError, RowError};
pub use entities::{
    Branch, Category, CategoryRegistry, I18n, Practitioner, PractitionerRegistry, PriceType,
    Service, ServicePractitioner,
};
pub use parser::{ExtractionBatch, IntermediateRecord, PriceQuote, RawRow, RecordExtractor};
pub use dataset::Dataset;
pub use collector::{collect, EntityCollector};
pub use reconciliation::{
    CategoryOutcome, Reconciliation, ReconciliationEngine, RemoteCategory, RemoteMatch,
};
pub use report::SyncReport;
pub use pipeline::{run, RunInfo, RunOutput};
pub use source::{load_remote_snapshot, CsvRowSource, RowSource};
pub use output::write_run;
pub use ids::{assign_ids, assign_ids_in_file, AssignError, AssignSummary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
