use embassy_executor::task;

use variometer::bus::{Bus, SampleLink};
use variometer::config::SignalConfig;
use variometer::processing::{self, VarioEngine};

#[task]
pub async fn signal_task(link: &'static SampleLink, bus: &'static Bus) {
    let config = SignalConfig::default();
    if let Err(e) = config.validate() {
        defmt::error!("signal: bad config: {}", e);
        return;
    }
    processing::run(VarioEngine::new(config), link, bus).await
}
