use std::sync::Arc;
use std::time::Duration;

use stakeflow::adapter::outbound::wire::WireParser;
use stakeflow::application::config::{LifecycleConfig, PollConfig};
use stakeflow::application::scheduler::{PollScheduler, SchedulerSettings};
use stakeflow::port::outbound::store::CumulativeStore;
use stakeflow::testkit::feed::{ScriptedDiscovery, ScriptedMarketData};

/// Default settings with a short tick and short timeouts.
pub fn settings() -> SchedulerSettings {
    SchedulerSettings {
        poll: PollConfig {
            interval_ms: 50,
            ..PollConfig::default()
        },
        lifecycle: LifecycleConfig::default(),
        parser: WireParser::default(),
        fetch_timeout: Duration::from_millis(200),
        discovery_timeout: Duration::from_millis(200),
    }
}

pub fn scheduler<S: CumulativeStore>(
    discovery: &ScriptedDiscovery,
    market_data: &ScriptedMarketData,
    store: Arc<S>,
    settings: SchedulerSettings,
) -> PollScheduler<S> {
    PollScheduler::new(
        Arc::new(discovery.clone()),
        Arc::new(market_data.clone()),
        store,
        settings,
    )
}
