//! Lookups against the persisted store.
//!
//! [`Registry`] is the explicit store handle: it is opened once per process
//! and passed to whatever needs read access. Title and owner lookups are
//! exact matches on the natural key, joined through `titles_owners`. Owner
//! autocomplete loads every owner name once into an [`OwnerIndex`] and
//! filters client-side.
//!
//! Used by the `landreg title`, `landreg owner` and `landreg complete`
//! commands.

use anyhow::Result;
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::config::Config;
use crate::db;
use crate::models::effective_country;
use crate::progress::format_number;
use crate::tables::{owner_key, title_key};

/// A title as listed under an owner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitleSummary {
    pub title_number: String,
    pub address: Option<String>,
    pub price: Option<f64>,
}

/// An owner as listed under a title.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnerSummary {
    pub owner: String,
    pub country: Option<String>,
    pub source: String,
    /// Country after applying the home-jurisdiction rule.
    pub effective_country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnerReport {
    pub owner: String,
    pub country: Option<String>,
    pub source: String,
    pub effective_country: Option<String>,
    pub titles: Vec<TitleSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitleReport {
    pub title_number: String,
    pub address: Option<String>,
    pub price: Option<f64>,
    pub owners: Vec<OwnerSummary>,
}

/// Read handle over a built store.
#[derive(Clone)]
pub struct Registry {
    pool: SqlitePool,
}

impl Registry {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn open(config: &Config) -> Result<Self> {
        Ok(Self::new(db::connect(config).await?))
    }

    pub async fn close(self) {
        self.pool.close().await;
    }

    /// Owner metadata and linked titles for an exact canonical owner name.
    pub async fn owner(&self, owner: &str) -> sqlx::Result<Option<OwnerReport>> {
        let row = sqlx::query("SELECT owner_id, owner, country, source FROM owners WHERE owner = ?")
            .bind(owner)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let owner_id: i64 = row.get("owner_id");
        let country: Option<String> = row.get("country");
        let source: String = row.get("source");

        let titles: Vec<TitleSummary> = sqlx::query(
            r#"
            SELECT DISTINCT t.title_id, t.title_number, t.address, CAST(t.price AS REAL) AS price
            FROM titles t
            JOIN titles_owners l ON l.title_id = t.title_id
            WHERE l.owner_id = ?
            ORDER BY t.title_id
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(title_summary)
        .collect();

        Ok(Some(OwnerReport {
            owner: row.get("owner"),
            effective_country: effective_country(country.as_deref(), &source),
            country,
            source,
            titles,
        }))
    }

    /// Address, price and linked owners for an exact canonical title number.
    pub async fn title(&self, title_number: &str) -> sqlx::Result<Option<TitleReport>> {
        let row = sqlx::query(
            "SELECT title_id, title_number, address, CAST(price AS REAL) AS price FROM titles WHERE title_number = ?",
        )
        .bind(title_number)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let title_id: i64 = row.get("title_id");

        let owners: Vec<OwnerSummary> = sqlx::query(
            r#"
            SELECT DISTINCT o.owner_id, o.owner, o.country, o.source
            FROM owners o
            JOIN titles_owners l ON l.owner_id = o.owner_id
            WHERE l.title_id = ?
            ORDER BY o.owner_id
            "#,
        )
        .bind(title_id)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(owner_summary)
        .collect();

        let summary = title_summary(&row);
        Ok(Some(TitleReport {
            title_number: summary.title_number,
            address: summary.address,
            price: summary.price,
            owners,
        }))
    }

    /// Every owner name in identifier order.
    pub async fn owner_names(&self) -> sqlx::Result<Vec<String>> {
        sqlx::query_scalar("SELECT owner FROM owners ORDER BY owner_id")
            .fetch_all(&self.pool)
            .await
    }

    pub async fn owner_index(&self) -> sqlx::Result<OwnerIndex> {
        Ok(OwnerIndex::new(self.owner_names().await?))
    }
}

fn title_summary(row: &SqliteRow) -> TitleSummary {
    TitleSummary {
        title_number: row.get("title_number"),
        address: row.get("address"),
        price: row.get("price"),
    }
}

fn owner_summary(row: &SqliteRow) -> OwnerSummary {
    let country: Option<String> = row.get("country");
    let source: String = row.get("source");
    OwnerSummary {
        owner: row.get("owner"),
        effective_country: effective_country(country.as_deref(), &source),
        country,
        source,
    }
}

/// All owner names, held in memory for prefix search.
///
/// Scanning the full list is acceptable because the owner set is bounded
/// and loaded once per session.
#[derive(Debug, Clone, Default)]
pub struct OwnerIndex {
    names: Vec<String>,
    folded: Vec<String>,
}

impl OwnerIndex {
    pub fn new(names: Vec<String>) -> Self {
        let folded = names.iter().map(|n| n.to_lowercase()).collect();
        Self { names, folded }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names starting with `prefix`, compared case-insensitively, in store
    /// order. An empty prefix matches nothing.
    pub fn complete(&self, prefix: &str, limit: usize) -> Vec<&str> {
        if prefix.is_empty() {
            return Vec::new();
        }
        let prefix = prefix.to_lowercase();
        self.folded
            .iter()
            .zip(&self.names)
            .filter(|(folded, _)| folded.starts_with(&prefix))
            .map(|(_, name)| name.as_str())
            .take(limit)
            .collect()
    }
}

/// Display form of a price: `GBP 250,000`, or `No data` when absent.
pub fn format_price(price: Option<f64>) -> String {
    match price {
        Some(p) => format!("GBP {}", format_number(p.trunc() as u64)),
        None => "No data".to_string(),
    }
}

// ─── CLI entry points ───────────────────────────────────────────────

pub async fn run_title(config: &Config, title_number: &str, json: bool) -> Result<()> {
    let registry = Registry::open(config).await?;
    let key = title_key(title_number);
    let report = registry.title(&key).await?;
    registry.close().await;

    let Some(report) = report else {
        println!("No results for title number '{}'", key);
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("--- Title ---");
    println!("title_number: {}", report.title_number);
    println!(
        "address:      {}",
        report.address.as_deref().unwrap_or("No data")
    );
    println!("price:        {}", format_price(report.price));
    println!();
    println!("--- Owners ({}) ---", report.owners.len());
    for owner in &report.owners {
        println!(
            "{}  [{}]",
            owner.owner,
            owner.effective_country.as_deref().unwrap_or("No data")
        );
    }

    Ok(())
}

pub async fn run_owner(config: &Config, owner: &str, json: bool) -> Result<()> {
    let registry = Registry::open(config).await?;
    let key = owner_key(owner);
    let report = registry.owner(&key).await?;
    registry.close().await;

    let Some(report) = report else {
        println!("No results for company '{}'", key);
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("--- Owner ---");
    println!("owner:   {}", report.owner);
    match report.effective_country.as_deref() {
        Some(country) => println!("country: {} is incorporated in {}.", report.owner, country),
        None => println!("country: No data"),
    }
    println!("source:  {}", report.source);
    println!();
    println!("--- Titles ({} results) ---", report.titles.len());
    for title in &report.titles {
        println!(
            "{:<12} {:<16} {}",
            title.title_number,
            format_price(title.price),
            title.address.as_deref().unwrap_or("No data")
        );
    }

    Ok(())
}

pub async fn run_complete(config: &Config, prefix: &str, limit: Option<usize>) -> Result<()> {
    let registry = Registry::open(config).await?;
    let index = registry.owner_index().await?;
    registry.close().await;
    debug!(owners = index.len(), "loaded owner index");

    let limit = limit.unwrap_or(config.search.autocomplete_limit);
    let matches = index.complete(prefix, limit);
    if matches.is_empty() {
        println!("No matches.");
        return Ok(());
    }
    for name in matches {
        println!("{}", name);
    }
    Ok(())
}
