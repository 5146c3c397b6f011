use embassy_executor::task;
use embassy_time::{Duration, Timer};

use variometer::bus::Bus;
use variometer::sim;

#[task]
pub async fn sim_task(bus: &'static Bus) {
    Timer::after(Duration::from_secs(2)).await;
    sim::run(bus).await
}
