use embassy_executor::task;
use embassy_stm32::peripherals::SPI1;
use embassy_time::{Duration, Timer};

use variometer::bus::SampleLink;
use variometer::drivers::ms5611::Ms5611;
use variometer::sensor;

/// Sensor task: back-to-back MS5611 conversions (~50 Hz), each handed to the
/// signal engine. Blocks until the engine has taken the sample.
#[task]
pub async fn sensor_task(mut baro: Ms5611<'static, SPI1>, link: &'static SampleLink) {
    while let Err(e) = baro.start().await {
        defmt::error!("ms5611: PROM load failed: {}", e);
        Timer::after(Duration::from_secs(1)).await;
    }
    defmt::info!("ms5611: calibrated");

    sensor::acquire(&mut baro, link).await
}
