//! Export the owner-name list as JSON for autocomplete front-ends.
//!
//! Produces an `owners.json` file containing every canonical owner name in
//! identifier order, so a browser or desktop search box can do prefix
//! matching without a round-trip per keystroke.

use anyhow::Result;
use serde::Serialize;
use std::path::Path;

use crate::config::Config;
use crate::query::Registry;

#[derive(Serialize)]
struct OwnerListExport<'a> {
    count: usize,
    owners: &'a [String],
}

/// Serialize an owner list to pretty JSON.
pub fn owners_json(owners: &[String]) -> Result<String> {
    let data = OwnerListExport {
        count: owners.len(),
        owners,
    };
    Ok(serde_json::to_string_pretty(&data)?)
}

/// Export owner names as JSON.
///
/// If `output` is `Some`, writes to that file path. Otherwise writes
/// to stdout for piping.
pub async fn run_export(config: &Config, output: Option<&Path>) -> Result<()> {
    let registry = Registry::open(config).await?;
    let owners = registry.owner_names().await;
    registry.close().await;
    let owners = owners?;

    let json = owners_json(&owners)?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(path, &json)?;
            eprintln!("Exported {} owners to {}", owners.len(), path.display());
        }
        None => {
            println!("{}", json);
        }
    }

    Ok(())
}
