//! SQLite cumulative store implementation.
//!
//! Diesel calls are blocking, so each operation runs on the blocking pool
//! with its own pooled connection. Writes to different keys only contend
//! on SQLite's own lock, which WAL and the busy timeout absorb.

use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel::SqliteConnection;

use crate::adapter::outbound::sqlite::database::connection::DbPool;
use crate::adapter::outbound::sqlite::database::model::CumulativeRow;
use crate::adapter::outbound::sqlite::database::schema::cumulative;
use crate::domain::{MarketId, SelectionId, SelectionKey, SelectionState, Side, SideFlow};
use crate::error::PersistenceError;
use crate::port::outbound::store::CumulativeStore;

/// SQLite-backed cumulative store.
#[derive(Clone)]
pub struct SqliteCumulativeStore {
    pool: DbPool,
}

impl SqliteCumulativeStore {
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn with_conn<T, F>(&self, op: F) -> Result<T, PersistenceError>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T, PersistenceError> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|e| PersistenceError::Connection(e.to_string()))?;
            op(&mut conn)
        })
        .await
        .map_err(|e| PersistenceError::Database(e.to_string()))?
    }

    fn to_row(state: &SelectionState) -> CumulativeRow {
        CumulativeRow {
            market_id: state.key().market_id.to_string(),
            selection_id: state.key().selection_id.to_string(),
            team_label: state.team_label().to_string(),
            in_back: state.in_back(),
            in_lay: state.in_lay(),
            out_back: state.out_back(),
            out_lay: state.out_lay(),
            last_back_stake: state.last_back_stake(),
            last_lay_stake: state.last_lay_stake(),
            updated_at: state.updated_at().to_rfc3339(),
        }
    }

    fn from_row(row: CumulativeRow) -> Result<SelectionState, PersistenceError> {
        let corrupt = |reason: String| PersistenceError::CorruptRow {
            market_id: row.market_id.clone(),
            selection_id: row.selection_id.clone(),
            reason,
        };

        let back = SideFlow::restore(row.in_back, row.out_back, row.last_back_stake, Side::Back)
            .map_err(|e| corrupt(e.to_string()))?;
        let lay = SideFlow::restore(row.in_lay, row.out_lay, row.last_lay_stake, Side::Lay)
            .map_err(|e| corrupt(e.to_string()))?;
        let updated_at = parse_timestamp(&row.updated_at)
            .ok_or_else(|| corrupt(format!("invalid updated_at {:?}", row.updated_at)))?;

        let key = SelectionKey::new(
            MarketId::new(row.market_id),
            SelectionId::new(row.selection_id),
        );
        Ok(SelectionState::restore(key, row.team_label, back, lay, updated_at))
    }
}

/// Rows written by older deployments carry naive ISO timestamps.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn db_error(e: diesel::result::Error) -> PersistenceError {
    PersistenceError::Database(e.to_string())
}

impl CumulativeStore for SqliteCumulativeStore {
    async fn get(&self, key: &SelectionKey) -> Result<Option<SelectionState>, PersistenceError> {
        let market_id = key.market_id.to_string();
        let selection_id = key.selection_id.to_string();

        let row = self
            .with_conn(move |conn| {
                cumulative::table
                    .find((market_id, selection_id))
                    .select(CumulativeRow::as_select())
                    .first(conn)
                    .optional()
                    .map_err(db_error)
            })
            .await?;

        row.map(Self::from_row).transpose()
    }

    async fn upsert(&self, state: &SelectionState) -> Result<(), PersistenceError> {
        let row = Self::to_row(state);
        self.with_conn(move |conn| {
            diesel::replace_into(cumulative::table)
                .values(&row)
                .execute(conn)
                .map_err(db_error)?;
            Ok(())
        })
        .await
    }

    async fn reset(&self, market_id: &MarketId) -> Result<usize, PersistenceError> {
        let market_id = market_id.to_string();
        self.with_conn(move |conn| {
            diesel::delete(cumulative::table.filter(cumulative::market_id.eq(market_id)))
                .execute(conn)
                .map_err(db_error)
        })
        .await
    }

    async fn list_by_market(
        &self,
        market_id: &MarketId,
    ) -> Result<Vec<SelectionState>, PersistenceError> {
        let market_id = market_id.to_string();
        let rows: Vec<CumulativeRow> = self
            .with_conn(move |conn| {
                cumulative::table
                    .filter(cumulative::market_id.eq(market_id))
                    .order(cumulative::selection_id.asc())
                    .select(CumulativeRow::as_select())
                    .load(conn)
                    .map_err(db_error)
            })
            .await?;

        rows.into_iter().map(Self::from_row).collect()
    }
}
