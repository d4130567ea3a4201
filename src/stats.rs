//! Store statistics and health overview.
//!
//! Provides a quick summary of what the last build produced: title, owner
//! and link counts, orphan titles, a per-source owner breakdown and when the
//! store was last rebuilt. Used by `landreg stats`.

use anyhow::Result;
use sqlx::{Row, SqlitePool};

use crate::config::Config;
use crate::db;
use crate::migrate::{self, Relation};
use crate::progress::format_number;

/// Counts describing a built store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreStats {
    pub titles: i64,
    pub owners: i64,
    pub links: i64,
    pub orphan_titles: i64,
    /// (source, owner count), largest first.
    pub owners_by_source: Vec<(String, i64)>,
    pub last_build: Option<i64>,
}

pub async fn collect_stats(pool: &SqlitePool) -> Result<StoreStats> {
    let mut conn = pool.acquire().await?;
    for relation in Relation::ALL {
        if !migrate::relation_exists(&mut conn, relation).await? {
            anyhow::bail!(
                "relation '{}' not found. Run `landreg init` or `landreg build` first.",
                relation.table_name()
            );
        }
    }
    let has_build_log: bool = sqlx::query_scalar(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='builds'",
    )
    .fetch_one(&mut *conn)
    .await?;
    drop(conn);

    let titles: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM titles")
        .fetch_one(pool)
        .await?;
    let owners: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM owners")
        .fetch_one(pool)
        .await?;
    let links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM titles_owners")
        .fetch_one(pool)
        .await?;
    let orphan_titles: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM titles t WHERE NOT EXISTS (SELECT 1 FROM titles_owners l WHERE l.title_id = t.title_id)",
    )
    .fetch_one(pool)
    .await?;

    let owners_by_source: Vec<(String, i64)> = sqlx::query(
        "SELECT source, COUNT(*) AS n FROM owners GROUP BY source ORDER BY n DESC, source",
    )
    .fetch_all(pool)
    .await?
    .iter()
    .map(|row| (row.get("source"), row.get("n")))
    .collect();

    let last_build: Option<i64> = if has_build_log {
        sqlx::query_scalar("SELECT MAX(built_at) FROM builds")
            .fetch_one(pool)
            .await?
    } else {
        None
    };

    Ok(StoreStats {
        titles,
        owners,
        links,
        orphan_titles,
        owners_by_source,
        last_build,
    })
}

/// Run the stats command: query the store and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let stats = collect_stats(&pool).await;
    pool.close().await;
    let stats = stats?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Land Registry: Store Stats");
    println!("===========================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!(
        "  Last build:  {}",
        stats
            .last_build
            .map(format_ts_iso)
            .unwrap_or_else(|| "never".to_string())
    );
    println!();
    println!("  Titles:      {}", format_number(stats.titles as u64));
    println!("  Owners:      {}", format_number(stats.owners as u64));
    println!("  Links:       {}", format_number(stats.links as u64));
    println!(
        "  Orphans:     {} (titles with no owner)",
        format_number(stats.orphan_titles as u64)
    );

    if !stats.owners_by_source.is_empty() {
        println!();
        println!("  Owners by source:");
        println!("  {:<12} {:>10}", "SOURCE", "OWNERS");
        println!("  {}", "-".repeat(23));
        for (source, n) in &stats.owners_by_source {
            println!("  {:<12} {:>10}", source, format_number(*n as u64));
        }
    }

    println!();
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| ts.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Owner, SourceTag, Tables, Title, TitleOwnerLink};
    use crate::progress::NoProgress;
    use crate::store::replace_store;
    use sqlx::sqlite::SqlitePoolOptions;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn test_format_ts_iso() {
        assert_eq!(format_ts_iso(0), "1970-01-01 00:00 UTC");
    }

    #[tokio::test]
    async fn test_collect_stats_counts_orphans_and_sources() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        let title = |id: i64| Title {
            title_id: id,
            title_number: format!("T{}", id),
            address: None,
            price: None,
        };
        let owner = |id: i64, source| Owner {
            owner_id: id,
            owner: format!("O{}", id),
            country: None,
            source,
        };
        let tables = Tables {
            titles: vec![title(1), title(2), title(3)],
            owners: vec![
                owner(1, SourceTag::Domestic),
                owner(2, SourceTag::Domestic),
                owner(3, SourceTag::Overseas),
            ],
            links: vec![
                TitleOwnerLink { title_id: 1, owner_id: 1 },
                TitleOwnerLink { title_id: 2, owner_id: 3 },
            ],
        };
        replace_store(&pool, &tables, &NoProgress).await.unwrap();

        let stats = collect_stats(&pool).await.unwrap();
        assert_eq!(stats.titles, 3);
        assert_eq!(stats.owners, 3);
        assert_eq!(stats.links, 2);
        assert_eq!(stats.orphan_titles, 1);
        assert_eq!(
            stats.owners_by_source,
            vec![("domestic".to_string(), 2), ("overseas".to_string(), 1)]
        );
        assert!(stats.last_build.is_some());
    }

    #[tokio::test]
    async fn test_collect_stats_requires_schema() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        assert!(collect_stats(&pool).await.is_err());
    }
}
