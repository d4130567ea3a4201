//! Structural failures of a store build.
//!
//! Every variant aborts the build before the write transaction commits, so
//! the previously persisted store stays active. Per-row anomalies (bad
//! prices, unresolvable links) are absorbed by the pipeline and never show
//! up here.

use std::path::PathBuf;
use thiserror::Error;

use crate::models::SourceTag;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("{source_tag} extract ({}) not found: {}", source_tag.dataset_code(), path.display())]
    MissingInput {
        source_tag: SourceTag,
        path: PathBuf,
    },

    #[error("{source_tag} extract is missing column '{column}'")]
    SchemaMismatch {
        source_tag: SourceTag,
        column: String,
    },

    #[error("{source_tag} archive {} contains no .csv entry", path.display())]
    EmptyArchive {
        source_tag: SourceTag,
        path: PathBuf,
    },

    #[error("CSV read failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("ZIP read failed: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, IngestError>;
