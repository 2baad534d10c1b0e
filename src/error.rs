// 🚨 Pipeline Errors
// Row failures and ambiguous matches are collected; integrity violations are fatal.

use serde::Serialize;
use thiserror::Error;

/// Why a single source row could not be turned into a record
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowError {
    #[error("required column '{column}' is missing or blank")]
    MissingField { column: String },

    #[error("duration is blank")]
    MissingDuration,

    #[error("unrecognized duration '{value}'")]
    UnrecognizedDuration { value: String },
}

// ============================================================================
// PIPELINE ERROR
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineError {
    /// Row excluded from the batch; extraction continues with the next row
    #[error("row {row}: {reason}")]
    RowValidation {
        row: usize,
        #[source]
        reason: RowError,
    },

    /// Remote list binds this category to more than one identifier
    #[error("category '{category}' matches several remote categories: {remote_ids:?}")]
    AmbiguousMatch {
        category: String,
        local_id: i64,
        remote_ids: Vec<i64>,
    },

    /// Remote id already bound to an earlier local category
    #[error("category '{category}' matches remote id {remote_id}, already taken")]
    RemoteIdTaken {
        category: String,
        local_id: i64,
        remote_id: i64,
    },

    /// No identifier left above the largest remote id
    #[error("no identifier left for new category '{category}' above remote id {max_remote_id}")]
    IdSpaceExhausted {
        category: String,
        local_id: i64,
        max_remote_id: i64,
    },

    /// A foreign key does not resolve. Always a bug, never bad input.
    #[error("{entity} {id} references missing {reference}")]
    ReferentialIntegrity {
        entity: String,
        id: i64,
        reference: String,
    },
}

impl PipelineError {
    pub fn row(row: usize, reason: RowError) -> Self {
        PipelineError::RowValidation { row, reason }
    }

    pub fn dangling(entity: &str, id: i64, reference: String) -> Self {
        PipelineError::ReferentialIntegrity {
            entity: entity.to_string(),
            id,
            reference,
        }
    }

    /// Fatal errors abort the run instead of being collected
    pub fn is_fatal(&self) -> bool {
        matches!(self, PipelineError::ReferentialIntegrity { .. })
    }
}
