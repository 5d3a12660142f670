//! SQLite store against databases written by earlier tracker versions.

mod support;

use chrono::{TimeZone, Utc};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Text};
use diesel::SqliteConnection;
use stakeflow::domain::{MarketId, SelectionId, SelectionKey, SelectionState};
use stakeflow::port::outbound::store::CumulativeStore;
use support::db::TempDb;

const KEYED_SCHEMA: &str = "
CREATE TABLE cumulative (
    market_id TEXT NOT NULL,
    selection_id TEXT NOT NULL,
    team_label TEXT NOT NULL,
    in_back REAL DEFAULT 0,
    in_lay REAL DEFAULT 0,
    out_back REAL DEFAULT 0,
    out_lay REAL DEFAULT 0,
    net_back REAL DEFAULT 0,
    net_lay REAL DEFAULT 0,
    last_back_stake REAL DEFAULT 0,
    last_lay_stake REAL DEFAULT 0,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (market_id, selection_id)
);
CREATE INDEX IF NOT EXISTS idx_cumulative_market ON cumulative(market_id);
INSERT INTO cumulative VALUES
    ('1.001', '349', 'India', 195, 140, 40, 0, 155, 140, 155, 140, '2025-03-01T18:30:00.250000');
";

const LABEL_KEYED_SCHEMA: &str = "
CREATE TABLE cumulative (
    market_id TEXT,
    team_label TEXT,
    in_back REAL DEFAULT 0,
    in_lay REAL DEFAULT 0,
    out_back REAL DEFAULT 0,
    out_lay REAL DEFAULT 0,
    net_back REAL DEFAULT 0,
    net_lay REAL DEFAULT 0,
    updated_at INTEGER,
    PRIMARY KEY (market_id, team_label)
);
INSERT INTO cumulative (market_id, team_label, in_back) VALUES ('1.001', 'India', 10);
";

#[derive(QueryableByName)]
struct Count {
    #[diesel(sql_type = BigInt)]
    n: i64,
}

#[derive(QueryableByName)]
struct Name {
    #[diesel(sql_type = Text)]
    name: String,
}

fn seed(db: &TempDb, sql: &str) {
    let mut conn = SqliteConnection::establish(&db.url()).expect("open seed connection");
    conn.batch_execute(sql).expect("seed legacy schema");
}

fn key() -> SelectionKey {
    SelectionKey::new(MarketId::from("1.001"), SelectionId::from("349"))
}

#[tokio::test]
async fn keyed_rows_from_earlier_versions_stay_readable() {
    let db = TempDb::create();
    seed(&db, KEYED_SCHEMA);
    let store = db.store();

    let state = store.get(&key()).await.unwrap().unwrap();
    assert_eq!(state.team_label(), "India");
    assert_eq!(state.in_back(), 195.0);
    assert_eq!(state.out_back(), 40.0);
    assert_eq!(state.net_back(), 155.0);
    assert_eq!(state.last_lay_stake(), 140.0);
    assert_eq!(
        state.updated_at(),
        Utc.with_ymd_and_hms(2025, 3, 1, 18, 30, 0).unwrap()
            + chrono::Duration::milliseconds(250)
    );

    let mut next = state.clone();
    next.observe(175.0, 140.0, Utc::now());
    store.upsert(&next).await.unwrap();
    let reread = store.get(&key()).await.unwrap().unwrap();
    assert_eq!(reread.in_back(), 215.0);
    assert_eq!(reread.out_back(), 40.0);
}

#[tokio::test]
async fn label_keyed_table_is_moved_aside() {
    let db = TempDb::create();
    seed(&db, LABEL_KEYED_SCHEMA);
    let store = db.store();

    assert!(store.get(&key()).await.unwrap().is_none());
    let state = SelectionState::first_sighting(key(), "India", 50.0, 20.0, Utc::now());
    store.upsert(&state).await.unwrap();
    let rows = store.list_by_market(&MarketId::from("1.001")).await.unwrap();
    assert_eq!(rows.len(), 1);

    let pool = db.pool();
    let mut conn = pool.get().unwrap();
    let kept: Vec<Count> = diesel::sql_query("SELECT COUNT(*) AS n FROM cumulative_legacy")
        .load(&mut conn)
        .unwrap();
    assert_eq!(kept[0].n, 1);

    let tables: Vec<Name> = diesel::sql_query(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name LIKE 'cumulative%' ORDER BY name",
    )
    .load(&mut conn)
    .unwrap();
    let names: Vec<String> = tables.into_iter().map(|t| t.name).collect();
    assert_eq!(names, vec!["cumulative", "cumulative_legacy"]);
}

#[tokio::test]
async fn reopening_does_not_touch_current_tables() {
    let db = TempDb::create();
    let state = SelectionState::first_sighting(key(), "India", 50.0, 20.0, Utc::now());
    db.store().upsert(&state).await.unwrap();

    let reopened = db.store();
    assert_eq!(reopened.get(&key()).await.unwrap(), Some(state));
}
