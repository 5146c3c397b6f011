#![no_std]
#![no_main]

mod board;
mod tasks;

use embassy_executor::Spawner;
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{Input, Level, OutputType, Output, Pin, Pull, Speed};
use embassy_stm32::time::Hertz as TimeHertz;
use embassy_stm32::timer::simple_pwm::{PwmPin, SimplePwm};
use embassy_stm32::timer::CountingMode;
use embassy_time::{Duration, Timer};
use {defmt_rtt as _, panic_probe as _};

use variometer::bus::Bus;

use crate::board::{Board, Buzzer};

// ── Shared state ──────────────────────────────────────────────────────────────
static BUS: Bus = Bus::new();
#[cfg(not(feature = "simulator"))]
static SAMPLES: variometer::bus::SampleLink = variometer::bus::SampleLink::new();

// ── Main ──────────────────────────────────────────────────────────────────────
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    // 1. Board init (168 MHz PLL)
    let board = Board::init();
    let p = board.p;

    // 2. Power latch: ignore accidental presses, then hold the rail on
    let mut latch = Output::new(p.PA1.degrade(), Level::Low, Speed::Low);
    Timer::after(Duration::from_millis(2000)).await;
    latch.set_high();
    spawner.spawn(tasks::power_task::power_task(latch, &BUS)).unwrap();

    // 3. Buzzer on TIM4_CH1 (PB6)
    let ch1 = PwmPin::new_ch1(p.PB6, OutputType::PushPull);
    let pwm = SimplePwm::new(
        p.TIM4,
        Some(ch1), None, None, None,
        TimeHertz(board::BUZZER_IDLE_HZ),
        CountingMode::EdgeAlignedUp,
    );
    spawner.spawn(tasks::beep_task::beep_task(Buzzer::new(pwm), &BUS)).unwrap();

    // 4. Pressure path: MS5611 on SPI1 (mode 3) -> signal engine
    #[cfg(not(feature = "simulator"))]
    {
        use embassy_stm32::dma::NoDma;
        use embassy_stm32::spi::{Config as SpiConfig, Spi, MODE_3};
        use variometer::drivers::ms5611::Ms5611;

        let mut spi_config = SpiConfig::default();
        spi_config.frequency = TimeHertz(board::MS5611_SPI_HZ);
        spi_config.mode = MODE_3;
        let spi = Spi::new(
            p.SPI1,
            p.PA5, p.PA7, p.PA6,
            NoDma, NoDma,
            spi_config,
        );
        let cs = Output::new(p.PA4.degrade(), Level::High, Speed::VeryHigh);

        spawner.spawn(tasks::signal_task::signal_task(&SAMPLES, &BUS)).unwrap();
        spawner.spawn(tasks::sensor_task::sensor_task(Ms5611::new(spi, cs), &SAMPLES)).unwrap();
    }
    #[cfg(feature = "simulator")]
    spawner.spawn(tasks::sim_task::sim_task(&BUS)).unwrap();

    // 5. Button on PB8 (EXTI8, active low)
    let button = ExtiInput::new(Input::new(p.PB8, Pull::Up), p.EXTI8);
    spawner.spawn(tasks::button_task::button_task(button, &BUS)).unwrap();

    // 6. NMEA out on USART1_TX (PA9)
    let mut uart_config = embassy_stm32::usart::Config::default();
    uart_config.baudrate = board::NMEA_BAUD;
    match embassy_stm32::usart::UartTx::new(p.USART1, p.PA9, p.DMA2_CH7, uart_config) {
        Ok(tx) => spawner.spawn(tasks::nmea_task::nmea_task(tx, &BUS)).unwrap(),
        Err(_) => defmt::error!("nmea: usart config rejected"),
    }

    // 7. Heartbeat LED @ 1 Hz
    let mut led = Output::new(p.PC13, Level::High, Speed::Low);
    loop {
        led.toggle();
        Timer::after(Duration::from_millis(500)).await;
    }
}
