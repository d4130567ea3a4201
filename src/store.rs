//! Persistence of a freshly built [`Tables`] set.
//!
//! A build replaces the whole store. All three relations are dropped,
//! recreated, filled and indexed inside one transaction, so readers that
//! connect after the commit see the new data and a failure at any point
//! leaves the previous store untouched.

use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::Result;
use crate::migrate::{self, Relation};
use crate::models::{Owner, Tables, Title, TitleOwnerLink};
use crate::progress::{BuildProgressEvent, BuildProgressReporter};

/// Rows per multi-row INSERT. Four columns per row keeps this well under
/// SQLite's bound-parameter limit.
const INSERT_BATCH_SIZE: usize = 500;

/// Emit a progress event every this many batches.
const PROGRESS_EVERY_BATCHES: usize = 100;

/// Counts recorded for a committed build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteSummary {
    pub built_at: i64,
    pub titles: u64,
    pub owners: u64,
    pub links: u64,
}

/// Replace the persisted store with `tables`.
pub async fn replace_store(
    pool: &SqlitePool,
    tables: &Tables,
    progress: &dyn BuildProgressReporter,
) -> Result<WriteSummary> {
    let mut tx = pool.begin().await?;

    for relation in Relation::ALL {
        migrate::drop_relation(&mut tx, relation).await?;
        migrate::create_relation(&mut tx, relation).await?;
        match relation {
            Relation::Titles => insert_titles(&mut tx, &tables.titles, progress).await?,
            Relation::Owners => insert_owners(&mut tx, &tables.owners, progress).await?,
            Relation::TitlesOwners => insert_links(&mut tx, &tables.links, progress).await?,
        }
        migrate::create_indexes(&mut tx, relation).await?;
        debug!(relation = relation.table_name(), "relation replaced");
    }

    let summary = WriteSummary {
        built_at: chrono::Utc::now().timestamp(),
        titles: tables.titles.len() as u64,
        owners: tables.owners.len() as u64,
        links: tables.links.len() as u64,
    };
    record_build(&mut tx, &summary).await?;

    tx.commit().await?;

    info!(
        titles = summary.titles,
        owners = summary.owners,
        links = summary.links,
        "store replaced"
    );
    Ok(summary)
}

async fn insert_titles(
    conn: &mut SqliteConnection,
    titles: &[Title],
    progress: &dyn BuildProgressReporter,
) -> sqlx::Result<()> {
    let total = titles.len() as u64;
    for (i, batch) in titles.chunks(INSERT_BATCH_SIZE).enumerate() {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("INSERT INTO titles (title_id, title_number, address, price) ");
        qb.push_values(batch, |mut b, title| {
            b.push_bind(title.title_id)
                .push_bind(title.title_number.clone())
                .push_bind(title.address.clone())
                .push_bind(title.price);
        });
        qb.build().execute(&mut *conn).await?;
        report_batch(progress, "titles", i, batch.len(), total);
    }
    Ok(())
}

async fn insert_owners(
    conn: &mut SqliteConnection,
    owners: &[Owner],
    progress: &dyn BuildProgressReporter,
) -> sqlx::Result<()> {
    let total = owners.len() as u64;
    for (i, batch) in owners.chunks(INSERT_BATCH_SIZE).enumerate() {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("INSERT INTO owners (owner_id, owner, country, source) ");
        qb.push_values(batch, |mut b, owner| {
            b.push_bind(owner.owner_id)
                .push_bind(owner.owner.clone())
                .push_bind(owner.country.clone())
                .push_bind(owner.source.as_str());
        });
        qb.build().execute(&mut *conn).await?;
        report_batch(progress, "owners", i, batch.len(), total);
    }
    Ok(())
}

async fn insert_links(
    conn: &mut SqliteConnection,
    links: &[TitleOwnerLink],
    progress: &dyn BuildProgressReporter,
) -> sqlx::Result<()> {
    let total = links.len() as u64;
    for (i, batch) in links.chunks(INSERT_BATCH_SIZE).enumerate() {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("INSERT INTO titles_owners (title_id, owner_id) ");
        qb.push_values(batch, |mut b, link| {
            b.push_bind(link.title_id).push_bind(link.owner_id);
        });
        qb.build().execute(&mut *conn).await?;
        report_batch(progress, "titles_owners", i, batch.len(), total);
    }
    Ok(())
}

fn report_batch(
    progress: &dyn BuildProgressReporter,
    relation: &'static str,
    batch_index: usize,
    batch_len: usize,
    total: u64,
) {
    let n = (batch_index * INSERT_BATCH_SIZE + batch_len) as u64;
    if (batch_index + 1) % PROGRESS_EVERY_BATCHES == 0 || n == total {
        progress.report(BuildProgressEvent::Writing { relation, n, total });
    }
}

async fn record_build(conn: &mut SqliteConnection, summary: &WriteSummary) -> sqlx::Result<()> {
    migrate::create_build_log(conn).await?;
    sqlx::query("INSERT INTO builds (built_at, titles, owners, links) VALUES (?, ?, ?, ?)")
        .bind(summary.built_at)
        .bind(summary.titles as i64)
        .bind(summary.owners as i64)
        .bind(summary.links as i64)
        .execute(&mut *conn)
        .await?;
    Ok(())
}
