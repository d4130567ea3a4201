//! Build orchestration.
//!
//! Coordinates one full rebuild: both extracts are located and decoded,
//! normalized into titles, owners and links, then written over the previous
//! store. Structural errors stop the build before the write transaction
//! commits, so a failed build leaves the previous store active.
//!
//! Callers must not query the store while a build is running.

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use std::path::PathBuf;
use tracing::info;

use crate::config::Config;
use crate::dataset::{self, DatasetPaths};
use crate::db;
use crate::error;
use crate::models::SourceTag;
use crate::progress::{BuildProgressEvent, BuildProgressReporter, ProgressMode};
use crate::store::{self, WriteSummary};
use crate::tables::build_tables;

/// Run the pipeline against `pool`.
pub async fn build_store(
    pool: &SqlitePool,
    paths: &DatasetPaths,
    delimiter: u8,
    progress: &dyn BuildProgressReporter,
) -> error::Result<WriteSummary> {
    paths.ensure_present()?;

    // Domestic rows first, then overseas; identifiers follow this order.
    let mut records = Vec::new();
    for source in SourceTag::ALL {
        progress.report(BuildProgressEvent::Loading { source });
        records.extend(dataset::load_extract(
            paths.path_for(source),
            source,
            delimiter,
        )?);
    }

    progress.report(BuildProgressEvent::Normalizing {
        records: records.len() as u64,
    });
    let tables = build_tables(&records);
    drop(records);

    store::replace_store(pool, &tables, progress).await
}

/// CLI entry point for `landreg build`.
pub async fn run_build(
    config: &Config,
    domestic: Option<PathBuf>,
    overseas: Option<PathBuf>,
    progress: ProgressMode,
) -> Result<()> {
    let mut paths = config.datasets.paths();
    if let Some(path) = domestic {
        paths.domestic = path;
    }
    if let Some(path) = overseas {
        paths.overseas = path;
    }

    info!(
        domestic = %paths.domestic.display(),
        overseas = %paths.overseas.display(),
        "starting build"
    );

    let pool = db::connect(config).await?;
    let reporter = progress.reporter();
    let result = build_store(
        &pool,
        &paths,
        config.datasets.delimiter_byte(),
        reporter.as_ref(),
    )
    .await;
    pool.close().await;

    let summary =
        result.with_context(|| "build did not complete; the previous store is still active")?;

    println!("build");
    println!("  domestic extract: {}", paths.domestic.display());
    println!("  overseas extract: {}", paths.overseas.display());
    println!("  titles written: {}", summary.titles);
    println!("  owners written: {}", summary.owners);
    println!("  links written: {}", summary.links);
    println!("ok");

    Ok(())
}
