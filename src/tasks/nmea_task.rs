use embassy_executor::task;
use embassy_stm32::peripherals::{DMA2_CH7, USART1};
use embassy_stm32::usart::UartTx;
use embassy_time::{Duration, Ticker};

use variometer::bus::Bus;
use variometer::nmea;

/// NMEA task: 1 Hz LXWP0 sentence to the flight computer.
#[task]
pub async fn nmea_task(mut tx: UartTx<'static, USART1, DMA2_CH7>, bus: &'static Bus) {
    let mut ticker = Ticker::every(Duration::from_secs(1));
    loop {
        ticker.next().await;

        let snapshot = bus.read_snapshot();
        match nmea::lxwp0(&snapshot) {
            Ok(sentence) => {
                let _ = tx.write(sentence.as_bytes()).await;
                let _ = tx.write(b"\r\n").await;
            }
            Err(_) => defmt::warn!("nmea: sentence overflow"),
        }
    }
}
