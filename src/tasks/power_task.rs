use embassy_executor::task;
use embassy_stm32::gpio::{AnyPin, Output};

use variometer::bus::Bus;

/// Holds the power rail until the beeper reports the shutdown melody done.
#[task]
pub async fn power_task(mut latch: Output<'static, AnyPin>, bus: &'static Bus) {
    bus.shutdown_complete.wait().await;
    defmt::info!("power: releasing latch");
    latch.set_low();
}
