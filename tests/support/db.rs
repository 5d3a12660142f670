use std::path::{Path, PathBuf};

use stakeflow::adapter::outbound::sqlite::{
    create_pool, run_migrations, DbPool, SqliteCumulativeStore,
};
use tempfile::TempDir;

/// Temporary SQLite database for integration tests.
///
/// The directory, and every WAL side file with it, is removed on drop.
pub struct TempDb {
    _dir: TempDir,
    path: PathBuf,
}

impl TempDb {
    pub fn create() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("stakeflow.db");
        Self { _dir: dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn url(&self) -> String {
        self.path.display().to_string()
    }

    /// Open a fresh pool over the database, running migrations.
    pub fn pool(&self) -> DbPool {
        let pool = create_pool(&self.url()).expect("create sqlite pool");
        run_migrations(&pool).expect("run migrations");
        pool
    }

    /// Open a store over a fresh pool, as a restarted process would.
    pub fn store(&self) -> SqliteCumulativeStore {
        SqliteCumulativeStore::new(self.pool())
    }
}
