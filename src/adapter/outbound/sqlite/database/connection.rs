//! Database connection management using Diesel ORM.
//!
//! Provides connection pooling, migration support and the one-time upgrade
//! of tables written by older deployments.

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel::sql_types::Text;
use diesel::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::warn;

use crate::error::PersistenceError;

/// Embedded database migrations compiled from the migrations/ directory.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Type alias for a SQLite connection pool.
pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

const LEGACY_TABLE: &str = "cumulative_legacy";

/// Applies pragmas to every connection the pool hands out.
#[derive(Debug, Clone, Copy)]
struct SqlitePragmas;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        configure_sqlite_connection(conn).map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Create a connection pool for the given database URL.
///
/// # Errors
/// Returns an error if the pool cannot be created.
pub fn create_pool(database_url: &str) -> Result<DbPool, PersistenceError> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    Pool::builder()
        .max_size(5)
        .connection_customizer(Box::new(SqlitePragmas))
        .build(manager)
        .map_err(|e| PersistenceError::Connection(e.to_string()))
}

/// Upgrade legacy tables, then run all pending migrations.
///
/// # Errors
/// Returns an error if the upgrade or a migration fails.
pub fn run_migrations(pool: &DbPool) -> Result<(), PersistenceError> {
    let mut conn = pool
        .get()
        .map_err(|e| PersistenceError::Connection(e.to_string()))?;
    upgrade_legacy_schema(&mut conn)?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| PersistenceError::Migration(e.to_string()))?;
    Ok(())
}

/// Set the lock wait and journal mode for concurrent writers.
///
/// # Errors
/// Returns an error if a pragma fails to apply.
pub fn configure_sqlite_connection(conn: &mut SqliteConnection) -> QueryResult<()> {
    conn.batch_execute("PRAGMA busy_timeout = 5000; PRAGMA journal_mode = WAL;")
}

#[derive(QueryableByName)]
struct ColumnName {
    #[diesel(sql_type = Text)]
    name: String,
}

fn table_columns(conn: &mut SqliteConnection, table: &str) -> QueryResult<Vec<String>> {
    let rows: Vec<ColumnName> =
        diesel::sql_query(format!("PRAGMA table_info({table})")).load(conn)?;
    Ok(rows.into_iter().map(|c| c.name).collect())
}

/// Move a `cumulative` table without the `selection_id` key aside.
///
/// Rows keyed by team label alone cannot be mapped to selections, so the
/// table is renamed and kept rather than migrated in place. Returns the name
/// it was moved to.
///
/// # Errors
/// Returns an error if the table cannot be inspected or renamed.
pub fn upgrade_legacy_schema(
    conn: &mut SqliteConnection,
) -> Result<Option<String>, PersistenceError> {
    let db_err = |e: diesel::result::Error| PersistenceError::Migration(e.to_string());

    let columns = table_columns(conn, "cumulative").map_err(db_err)?;
    if columns.is_empty() || columns.iter().any(|c| c == "selection_id") {
        return Ok(None);
    }

    let mut target = LEGACY_TABLE.to_string();
    let mut suffix = 1;
    while !table_columns(conn, &target).map_err(db_err)?.is_empty() {
        suffix += 1;
        target = format!("{LEGACY_TABLE}_{suffix}");
    }

    conn.batch_execute(&format!(
        "DROP INDEX IF EXISTS idx_cumulative_market; ALTER TABLE cumulative RENAME TO {target};"
    ))
    .map_err(db_err)?;

    warn!(table = %target, "Moved cumulative table without selection_id aside");
    Ok(Some(target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn file_pool() -> (TempDir, DbPool) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stakeflow.db");
        let pool = create_pool(path.to_str().unwrap()).unwrap();
        (dir, pool)
    }

    #[derive(QueryableByName)]
    struct TableName {
        #[diesel(sql_type = Text)]
        name: String,
    }

    fn tables(conn: &mut SqliteConnection) -> Vec<String> {
        diesel::sql_query(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name != '__diesel_schema_migrations' ORDER BY name",
        )
        .load::<TableName>(conn)
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect()
    }

    #[test]
    fn run_migrations_creates_cumulative_table() {
        let (_dir, pool) = file_pool();
        run_migrations(&pool).unwrap();

        let mut conn = pool.get().unwrap();
        assert_eq!(tables(&mut conn), vec!["cumulative"]);
        let columns = table_columns(&mut conn, "cumulative").unwrap();
        assert!(columns.contains(&"selection_id".to_string()));
        assert!(!columns.contains(&"net_back".to_string()));
    }

    #[test]
    fn run_migrations_is_idempotent() {
        let (_dir, pool) = file_pool();
        run_migrations(&pool).unwrap();
        run_migrations(&pool).unwrap();

        let mut conn = pool.get().unwrap();
        assert_eq!(tables(&mut conn), vec!["cumulative"]);
    }

    #[test]
    fn pooled_connections_use_wal() {
        #[derive(QueryableByName)]
        struct JournalMode {
            #[diesel(sql_type = Text)]
            journal_mode: String,
        }

        let (_dir, pool) = file_pool();
        let mut conn = pool.get().unwrap();
        let mode: Vec<JournalMode> = diesel::sql_query("PRAGMA journal_mode")
            .load(&mut conn)
            .unwrap();
        assert_eq!(mode[0].journal_mode.to_lowercase(), "wal");
    }

    #[test]
    fn legacy_table_is_renamed_once() {
        let (_dir, pool) = file_pool();
        let mut conn = pool.get().unwrap();
        conn.batch_execute(
            "CREATE TABLE cumulative (market_id TEXT, team_label TEXT, in_back REAL, \
             PRIMARY KEY (market_id, team_label));",
        )
        .unwrap();

        assert_eq!(
            upgrade_legacy_schema(&mut conn).unwrap().as_deref(),
            Some("cumulative_legacy")
        );
        assert_eq!(upgrade_legacy_schema(&mut conn).unwrap(), None);
        assert_eq!(tables(&mut conn), vec!["cumulative_legacy"]);
    }

    #[test]
    fn keyed_table_is_kept() {
        let (_dir, pool) = file_pool();
        let mut conn = pool.get().unwrap();
        conn.batch_execute(
            "CREATE TABLE cumulative (market_id TEXT NOT NULL, selection_id TEXT NOT NULL, \
             team_label TEXT NOT NULL, PRIMARY KEY (market_id, selection_id));",
        )
        .unwrap();

        assert_eq!(upgrade_legacy_schema(&mut conn).unwrap(), None);
        assert_eq!(tables(&mut conn), vec!["cumulative"]);
    }
}
