//! Schema and index definitions for the persisted store.
//!
//! The three relations are dropped and recreated on every build, so the
//! DDL lives here rather than in a versioned migration list. `init` creates
//! them empty so the query commands work against a store that has never
//! been built.

use anyhow::Result;
use sqlx::SqliteConnection;

use crate::config::Config;
use crate::db;

/// A relation written by the store writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Titles,
    Owners,
    TitlesOwners,
}

impl Relation {
    /// Write order used by a build.
    pub const ALL: [Relation; 3] = [Relation::Titles, Relation::Owners, Relation::TitlesOwners];

    pub fn table_name(&self) -> &'static str {
        match self {
            Relation::Titles => "titles",
            Relation::Owners => "owners",
            Relation::TitlesOwners => "titles_owners",
        }
    }

    fn create_sql(&self) -> &'static str {
        match self {
            Relation::Titles => {
                r#"
                CREATE TABLE IF NOT EXISTS titles (
                    title_id INTEGER NOT NULL,
                    title_number TEXT NOT NULL UNIQUE,
                    address TEXT,
                    price NUMERIC
                )
                "#
            }
            Relation::Owners => {
                r#"
                CREATE TABLE IF NOT EXISTS owners (
                    owner_id INTEGER NOT NULL,
                    owner TEXT NOT NULL UNIQUE,
                    country TEXT,
                    source TEXT NOT NULL
                )
                "#
            }
            // No uniqueness on (title_id, owner_id): a title naming the same
            // owner in two proprietor slots produces two rows.
            Relation::TitlesOwners => {
                r#"
                CREATE TABLE IF NOT EXISTS titles_owners (
                    title_id INTEGER NOT NULL,
                    owner_id INTEGER NOT NULL
                )
                "#
            }
        }
    }

    fn index_sql(&self) -> &'static [&'static str] {
        match self {
            Relation::Titles => &[
                "CREATE INDEX IF NOT EXISTS idx_titles_title_id ON titles(title_id)",
                "CREATE INDEX IF NOT EXISTS idx_titles_title_number ON titles(title_number)",
            ],
            Relation::Owners => &[
                "CREATE INDEX IF NOT EXISTS idx_owners ON owners(owner)",
                "CREATE INDEX IF NOT EXISTS idx_owners_owner_id ON owners(owner_id)",
            ],
            Relation::TitlesOwners => &[
                "CREATE INDEX IF NOT EXISTS idx_titles_owners_owner_id ON titles_owners(owner_id)",
                "CREATE INDEX IF NOT EXISTS idx_titles_owners_title_id ON titles_owners(title_id)",
            ],
        }
    }
}

const CREATE_BUILDS: &str = r#"
    CREATE TABLE IF NOT EXISTS builds (
        built_at INTEGER NOT NULL,
        titles INTEGER NOT NULL,
        owners INTEGER NOT NULL,
        links INTEGER NOT NULL
    )
"#;

/// Create every relation and index that does not exist yet.
pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let mut conn = pool.acquire().await?;
    create_schema(&mut conn).await?;
    drop(conn);
    pool.close().await;
    Ok(())
}

pub async fn create_schema(conn: &mut SqliteConnection) -> sqlx::Result<()> {
    for relation in Relation::ALL {
        create_relation(conn, relation).await?;
        create_indexes(conn, relation).await?;
    }
    create_build_log(conn).await?;
    Ok(())
}

/// One row per committed build, kept across rebuilds.
pub async fn create_build_log(conn: &mut SqliteConnection) -> sqlx::Result<()> {
    sqlx::query(CREATE_BUILDS).execute(&mut *conn).await?;
    Ok(())
}

pub async fn create_relation(conn: &mut SqliteConnection, relation: Relation) -> sqlx::Result<()> {
    sqlx::query(relation.create_sql()).execute(&mut *conn).await?;
    Ok(())
}

pub async fn drop_relation(conn: &mut SqliteConnection, relation: Relation) -> sqlx::Result<()> {
    sqlx::query(&format!("DROP TABLE IF EXISTS {}", relation.table_name()))
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn relation_exists(conn: &mut SqliteConnection, relation: Relation) -> sqlx::Result<bool> {
    sqlx::query_scalar("SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name = ?")
        .bind(relation.table_name())
        .fetch_one(&mut *conn)
        .await
}

/// Create the lookup indexes for `relation`. Safe to re-run; does nothing
/// when the relation is absent.
pub async fn create_indexes(conn: &mut SqliteConnection, relation: Relation) -> sqlx::Result<bool> {
    if !relation_exists(conn, relation).await? {
        return Ok(false);
    }
    for statement in relation.index_sql() {
        sqlx::query(statement).execute(&mut *conn).await?;
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqliteConnectOptions;
    use sqlx::{ConnectOptions, Row};
    use std::str::FromStr;

    async fn memory_conn() -> SqliteConnection {
        SqliteConnectOptions::from_str("sqlite::memory:")
            .unwrap()
            .connect()
            .await
            .unwrap()
    }

    async fn index_names(conn: &mut SqliteConnection) -> Vec<String> {
        sqlx::query("SELECT name FROM sqlite_master WHERE type='index' AND name LIKE 'idx_%' ORDER BY name")
            .fetch_all(&mut *conn)
            .await
            .unwrap()
            .iter()
            .map(|row| row.get("name"))
            .collect()
    }

    #[tokio::test]
    async fn test_schema_idempotent() {
        let mut conn = memory_conn().await;
        create_schema(&mut conn).await.unwrap();
        create_schema(&mut conn).await.unwrap();
        assert_eq!(
            index_names(&mut conn).await,
            vec![
                "idx_owners",
                "idx_owners_owner_id",
                "idx_titles_owners_owner_id",
                "idx_titles_owners_title_id",
                "idx_titles_title_id",
                "idx_titles_title_number",
            ]
        );
    }

    #[tokio::test]
    async fn test_indexes_skipped_for_absent_relation() {
        let mut conn = memory_conn().await;
        let created = create_indexes(&mut conn, Relation::Owners).await.unwrap();
        assert!(!created);
        assert!(index_names(&mut conn).await.is_empty());
    }

    #[tokio::test]
    async fn test_drop_then_recreate() {
        let mut conn = memory_conn().await;
        create_relation(&mut conn, Relation::Titles).await.unwrap();
        assert!(relation_exists(&mut conn, Relation::Titles).await.unwrap());
        drop_relation(&mut conn, Relation::Titles).await.unwrap();
        assert!(!relation_exists(&mut conn, Relation::Titles).await.unwrap());
    }
}
