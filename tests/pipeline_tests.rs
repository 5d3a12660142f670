//! End-to-end flow through the scheduler into SQLite.

mod support;

use std::sync::Arc;

use chrono::{Duration, Utc};
use stakeflow::domain::{MarketId, SelectionId, SelectionKey};
use stakeflow::infrastructure::config::settings::Config;
use stakeflow::infrastructure::runtime;
use stakeflow::port::outbound::store::CumulativeStore;
use stakeflow::testkit::domain::{live_market, WireBuilder};
use stakeflow::testkit::feed::{ScriptedDiscovery, ScriptedMarketData};
use support::db::TempDb;
use support::scheduler::{scheduler, settings};

const MARKET: &str = "1.001";

fn key(selection: &str) -> SelectionKey {
    SelectionKey::new(MarketId::from(MARKET), SelectionId::from(selection))
}

fn wire(home_back: &[f64]) -> String {
    WireBuilder::new(MARKET)
        .total_matched(500.0)
        .selection("349", home_back, &[80.0, 40.0, 20.0])
        .selection("16606", &[10.0, 10.0, 10.0], &[5.0, 5.0, 5.0])
        .build()
}

fn feeds() -> (ScriptedDiscovery, ScriptedMarketData) {
    let discovery = ScriptedDiscovery::new(vec![live_market(MARKET, "India v Australia")]);
    let market_data = ScriptedMarketData::new();
    (discovery, market_data)
}

#[tokio::test]
async fn inflow_then_outflow_across_three_ticks() {
    let db = TempDb::create();
    let store = Arc::new(db.store());
    let (discovery, market_data) = feeds();
    let mut scheduler = scheduler(&discovery, &market_data, Arc::clone(&store), settings());
    let t0 = Utc::now();

    market_data.set_raw(MARKET, wire(&[100.0, 50.0, 25.0]));
    let report = scheduler.tick_at(t0).await;
    assert!(report.discovery_refreshed);
    assert_eq!(report.markets_updated, 1);
    assert_eq!(report.selections_updated, 2);

    let home = store.get(&key("349")).await.unwrap().unwrap();
    assert_eq!(home.team_label(), "India");
    assert_eq!(home.in_back(), 175.0);
    assert_eq!(home.in_lay(), 140.0);
    assert_eq!(home.out_back(), 0.0);
    let away = store.get(&key("16606")).await.unwrap().unwrap();
    assert_eq!(away.team_label(), "Australia");
    assert_eq!(away.in_back(), 30.0);

    market_data.set_raw(MARKET, wire(&[120.0, 50.0, 25.0]));
    scheduler.tick_at(t0 + Duration::seconds(1)).await;
    let home = store.get(&key("349")).await.unwrap().unwrap();
    assert_eq!(home.in_back(), 195.0);
    assert_eq!(home.out_back(), 0.0);

    market_data.set_raw(MARKET, wire(&[80.0, 50.0, 25.0]));
    scheduler.tick_at(t0 + Duration::seconds(2)).await;
    let home = store.get(&key("349")).await.unwrap().unwrap();
    assert_eq!(home.in_back(), 195.0);
    assert_eq!(home.out_back(), 40.0);
    assert_eq!(home.net_back(), 155.0);
    assert_eq!(home.last_back_stake(), 155.0);
    assert_eq!(home.in_lay(), 140.0);
    assert_eq!(home.out_lay(), 0.0);

    let away = store.get(&key("16606")).await.unwrap().unwrap();
    assert_eq!(away.in_back(), 30.0);
    assert_eq!(away.out_back(), 0.0);
}

#[tokio::test]
async fn suspended_runner_does_not_shift_labels() {
    let db = TempDb::create();
    let store = Arc::new(db.store());
    let (discovery, market_data) = feeds();
    let mut scheduler = scheduler(&discovery, &market_data, Arc::clone(&store), settings());
    let t0 = Utc::now();

    let active = wire(&[100.0, 50.0, 25.0]);
    market_data.set_raw(MARKET, active.clone());
    scheduler.tick_at(t0).await;

    market_data.set_raw(MARKET, active.replace("349|ACTIVE", "349|SUSPENDED"));
    let report = scheduler.tick_at(t0 + Duration::seconds(1)).await;
    assert_eq!(report.selections_updated, 1);

    let away = store.get(&key("16606")).await.unwrap().unwrap();
    assert_eq!(away.team_label(), "Australia");
    let home = store.get(&key("349")).await.unwrap().unwrap();
    assert_eq!(home.team_label(), "India");

    market_data.set_raw(MARKET, active);
    scheduler.tick_at(t0 + Duration::seconds(2)).await;
    let rows = store.list_by_market(&MarketId::from(MARKET)).await.unwrap();
    let labels: Vec<(&str, &str)> = rows
        .iter()
        .map(|row| (row.key().selection_id.as_str(), row.team_label()))
        .collect();
    assert!(labels.contains(&("349", "India")));
    assert!(labels.contains(&("16606", "Australia")));
}

#[tokio::test]
async fn totals_survive_restart() {
    let db = TempDb::create();
    let (discovery, market_data) = feeds();
    let t0 = Utc::now();

    {
        let store = Arc::new(db.store());
        let mut scheduler = scheduler(&discovery, &market_data, store, settings());
        market_data.set_raw(MARKET, wire(&[100.0, 50.0, 25.0]));
        scheduler.tick_at(t0).await;
        market_data.set_raw(MARKET, wire(&[120.0, 50.0, 25.0]));
        scheduler.tick_at(t0 + Duration::seconds(1)).await;
    }

    let store = Arc::new(db.store());
    let mut restarted = scheduler(&discovery, &market_data, Arc::clone(&store), settings());
    market_data.set_raw(MARKET, wire(&[80.0, 50.0, 25.0]));
    let report = restarted.tick_at(t0 + Duration::seconds(2)).await;
    assert_eq!(report.resets, 0);

    let home = store.get(&key("349")).await.unwrap().unwrap();
    assert_eq!(home.in_back(), 195.0);
    assert_eq!(home.out_back(), 40.0);
    assert_eq!(home.net_back(), 155.0);
}

#[tokio::test]
async fn show_reads_what_the_loop_wrote() {
    let db = TempDb::create();
    let (discovery, market_data) = feeds();
    let store = Arc::new(db.store());
    let mut scheduler = scheduler(&discovery, &market_data, store, settings());
    market_data.set_raw(MARKET, wire(&[100.0, 50.0, 25.0]));
    scheduler.tick_at(Utc::now()).await;

    let config = Config {
        database: db.url(),
        ..Config::default()
    };
    let summary = runtime::show_market(&config, &MarketId::from(MARKET))
        .await
        .unwrap();

    assert_eq!(summary.selections.len(), 2);
    assert_eq!(summary.selections[0].selection_id, SelectionId::from("16606"));
    assert_eq!(summary.selections[1].team_label, "India");
    assert_eq!(summary.totals.in_back, 205.0);
    assert_eq!(summary.totals.net_lay, 155.0);
}
