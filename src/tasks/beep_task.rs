use embassy_executor::task;

use variometer::beep::BeepController;
use variometer::bus::Bus;
use variometer::config::BeepConfig;

use crate::board::Buzzer;

/// Beeper task: plays the startup chirps, then follows the climb rate until
/// shutdown.
#[task]
pub async fn beep_task(buzzer: Buzzer, bus: &'static Bus) {
    let config = BeepConfig::default();
    if let Err(e) = config.validate() {
        defmt::error!("beep: bad config: {}", e);
        return;
    }
    BeepController::new(config, buzzer, bus).run().await;
}
