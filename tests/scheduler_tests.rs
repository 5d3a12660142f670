//! Poll loop behaviour under partial failure and shutdown.

mod support;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use stakeflow::adapter::outbound::memory::MemoryCumulativeStore;
use stakeflow::domain::{MarketId, SelectionKey, SelectionState};
use stakeflow::error::{FetchError, PersistenceError};
use stakeflow::port::outbound::store::CumulativeStore;
use stakeflow::testkit::domain::{live_market, scheduled_market, WireBuilder};
use stakeflow::testkit::feed::{ScriptedDiscovery, ScriptedMarketData};
use support::scheduler::{scheduler, settings};
use tokio::sync::watch;

fn wire(market: &str, back: &[f64]) -> String {
    WireBuilder::new(market)
        .selection("1", back, &[5.0, 5.0, 5.0])
        .selection("2", &[1.0, 1.0, 1.0], &[1.0, 1.0, 1.0])
        .build()
}

fn two_markets() -> ScriptedDiscovery {
    ScriptedDiscovery::new(vec![
        live_market("1.001", "India v Australia"),
        live_market("1.002", "England v Pakistan"),
    ])
}

/// Memory store that refuses writes for one market and can refuse resets.
#[derive(Default)]
struct FlakyStore {
    inner: MemoryCumulativeStore,
    broken_market: Option<MarketId>,
    refuse_resets: AtomicBool,
}

impl CumulativeStore for FlakyStore {
    async fn get(&self, key: &SelectionKey) -> Result<Option<SelectionState>, PersistenceError> {
        self.inner.get(key).await
    }

    async fn upsert(&self, state: &SelectionState) -> Result<(), PersistenceError> {
        if self.broken_market.as_ref() == Some(&state.key().market_id) {
            return Err(PersistenceError::Database("disk I/O error".into()));
        }
        self.inner.upsert(state).await
    }

    async fn reset(&self, market_id: &MarketId) -> Result<usize, PersistenceError> {
        if self.refuse_resets.load(Ordering::SeqCst) {
            return Err(PersistenceError::Database("database is locked".into()));
        }
        self.inner.reset(market_id).await
    }

    async fn list_by_market(
        &self,
        market_id: &MarketId,
    ) -> Result<Vec<SelectionState>, PersistenceError> {
        self.inner.list_by_market(market_id).await
    }
}

#[tokio::test]
async fn all_active_markets_share_one_fetch() {
    let store = Arc::new(MemoryCumulativeStore::new());
    let market_data = ScriptedMarketData::new();
    market_data.set_raw("1.001", wire("1.001", &[10.0, 10.0, 10.0]));
    market_data.set_raw("1.002", wire("1.002", &[20.0, 20.0, 20.0]));
    let mut scheduler = scheduler(&two_markets(), &market_data, Arc::clone(&store), settings());

    let report = scheduler.tick_at(Utc::now()).await;

    assert_eq!(report.markets_requested, 2);
    assert_eq!(report.markets_updated, 2);
    assert_eq!(report.selections_updated, 4);
    let requests = market_data.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].len(), 2);
    assert_eq!(store.len(), 4);
}

#[tokio::test]
async fn unparsable_and_missing_markets_do_not_block_others() {
    let store = Arc::new(MemoryCumulativeStore::new());
    let discovery = ScriptedDiscovery::new(vec![
        live_market("1.001", "India v Australia"),
        live_market("1.002", "England v Pakistan"),
        live_market("1.003", "Chennai v Mumbai"),
    ]);
    let market_data = ScriptedMarketData::new();
    market_data.set_raw("1.001", wire("1.001", &[10.0, 10.0, 10.0]));
    market_data.set_raw("1.002", "1.002|x|x|x|x|0|SUSPENDED");
    market_data.push_extra("9.999|x|x|x|x|0|1|ACTIVE|1.5|10");
    let mut scheduler = scheduler(&discovery, &market_data, Arc::clone(&store), settings());

    let report = scheduler.tick_at(Utc::now()).await;

    assert_eq!(report.markets_updated, 1);
    assert_eq!(report.parse_failures, 1);
    assert_eq!(report.missing, 2);
    assert_eq!(store.len(), 2);
    assert!(store
        .list_by_market(&MarketId::from("9.999"))
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn persistence_failure_is_confined_to_its_market() {
    let store = Arc::new(FlakyStore {
        broken_market: Some(MarketId::from("1.002")),
        ..FlakyStore::default()
    });
    let market_data = ScriptedMarketData::new();
    market_data.set_raw("1.001", wire("1.001", &[10.0, 10.0, 10.0]));
    market_data.set_raw("1.002", wire("1.002", &[20.0, 20.0, 20.0]));
    let mut scheduler = scheduler(&two_markets(), &market_data, Arc::clone(&store), settings());

    let report = scheduler.tick_at(Utc::now()).await;

    assert_eq!(report.markets_updated, 1);
    assert_eq!(report.persistence_failures, 1);
    assert_eq!(store.inner.len(), 2);
    let polled = scheduler.lifecycle().get(&MarketId::from("1.002")).unwrap();
    assert_eq!(polled.last_polled_at, None);
}

#[tokio::test]
async fn failed_reset_holds_the_market_back_until_it_succeeds() {
    let store = Arc::new(FlakyStore::default());
    let now = Utc::now();
    let discovery = ScriptedDiscovery::new(vec![scheduled_market(
        "1.001",
        "India v Australia",
        now + chrono::Duration::seconds(1),
    )]);
    let market_data = ScriptedMarketData::new();
    market_data.set_raw("1.001", wire("1.001", &[10.0, 10.0, 10.0]));
    let mut scheduler = scheduler(&discovery, &market_data, Arc::clone(&store), settings());

    scheduler.tick_at(now).await;
    store.refuse_resets.store(true, Ordering::SeqCst);
    let report = scheduler.tick_at(now + chrono::Duration::seconds(2)).await;
    assert_eq!(report.resets, 0);
    assert_eq!(report.markets_requested, 0);

    store.refuse_resets.store(false, Ordering::SeqCst);
    market_data.set_raw("1.001", wire("1.001", &[5.0, 5.0, 5.0]));
    let report = scheduler.tick_at(now + chrono::Duration::seconds(3)).await;
    assert_eq!(report.resets, 1);
    assert_eq!(report.markets_updated, 1);
    let rows = store.list_by_market(&MarketId::from("1.001")).await.unwrap();
    assert_eq!(rows[0].in_back(), 15.0);
    assert_eq!(rows[0].out_back(), 0.0);
}

#[tokio::test]
async fn fetch_failure_and_timeout_skip_the_tick() {
    let store = Arc::new(MemoryCumulativeStore::new());
    let market_data = ScriptedMarketData::new();
    market_data.set_raw("1.001", wire("1.001", &[10.0, 10.0, 10.0]));
    let mut scheduler = scheduler(&two_markets(), &market_data, Arc::clone(&store), settings());
    let t0 = Utc::now();

    market_data.fail_next(FetchError::Status { status: 503 });
    let report = scheduler.tick_at(t0).await;
    assert!(report.fetch_failed);
    assert!(store.is_empty());

    market_data.set_delay(Some(Duration::from_millis(500)));
    let report = scheduler.tick_at(t0 + chrono::Duration::seconds(1)).await;
    assert!(report.fetch_failed);
    assert!(store.is_empty());

    market_data.set_delay(None);
    let report = scheduler.tick_at(t0 + chrono::Duration::seconds(2)).await;
    assert!(!report.fetch_failed);
    assert_eq!(report.markets_updated, 1);
}

#[tokio::test]
async fn run_stops_on_shutdown_signal() {
    let store = Arc::new(MemoryCumulativeStore::new());
    let market_data = ScriptedMarketData::new();
    market_data.set_raw("1.001", wire("1.001", &[10.0, 10.0, 10.0]));
    let mut scheduler = scheduler(&two_markets(), &market_data, Arc::clone(&store), settings());
    let (tx, rx) = watch::channel(false);

    let stopper = async {
        tokio::time::sleep(Duration::from_millis(180)).await;
        tx.send(true).unwrap();
    };
    tokio::time::timeout(Duration::from_secs(5), async {
        tokio::join!(scheduler.run(rx), stopper);
    })
    .await
    .expect("poll loop did not stop");

    assert!(scheduler.ticks() >= 2);
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn run_stops_when_sender_is_dropped() {
    let store = Arc::new(MemoryCumulativeStore::new());
    let market_data = ScriptedMarketData::new();
    let mut scheduler = scheduler(&two_markets(), &market_data, store, settings());
    let (tx, rx) = watch::channel(false);

    let dropper = async move {
        tokio::time::sleep(Duration::from_millis(60)).await;
        drop(tx);
    };
    tokio::time::timeout(Duration::from_secs(5), async {
        tokio::join!(scheduler.run(rx), dropper);
    })
    .await
    .expect("poll loop did not stop");

    assert!(scheduler.ticks() >= 1);
}

/// Run the loop on a paused clock until `stop_after` has elapsed and return
/// the gaps between consecutive fetches.
async fn fetch_gaps(fetch_delay: Duration, stop_after: Duration) -> Vec<Duration> {
    let store = Arc::new(MemoryCumulativeStore::new());
    let market_data = ScriptedMarketData::new();
    market_data.set_raw("1.001", wire("1.001", &[10.0, 10.0, 10.0]));
    market_data.set_delay(Some(fetch_delay));
    let mut settings = settings();
    settings.poll.interval_ms = 100;
    settings.fetch_timeout = Duration::from_millis(500);
    let mut scheduler = scheduler(&two_markets(), &market_data, store, settings);
    let (tx, rx) = watch::channel(false);

    let stopper = async {
        tokio::time::sleep(stop_after).await;
        tx.send(true).unwrap();
    };
    tokio::join!(scheduler.run(rx), stopper);

    market_data
        .request_times()
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .collect()
}

#[tokio::test(start_paused = true)]
async fn tick_cadence_absorbs_fetch_time() {
    let gaps = fetch_gaps(Duration::from_millis(60), Duration::from_millis(450)).await;

    assert!(gaps.len() >= 3, "too few ticks: {gaps:?}");
    for gap in gaps {
        assert!(
            gap >= Duration::from_millis(95) && gap <= Duration::from_millis(105),
            "tick start drifted: {gap:?}"
        );
    }
}

#[tokio::test(start_paused = true)]
async fn slow_tick_starts_next_one_immediately() {
    let gaps = fetch_gaps(Duration::from_millis(150), Duration::from_millis(500)).await;

    assert!(gaps.len() >= 2, "too few ticks: {gaps:?}");
    for gap in gaps {
        assert!(
            gap >= Duration::from_millis(145) && gap <= Duration::from_millis(155),
            "slow tick was followed by a pause: {gap:?}"
        );
    }
}
