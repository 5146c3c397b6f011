use embassy_executor::task;
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::peripherals::PB8;
use embassy_time::{Instant, Timer};

use variometer::bus::Bus;
use variometer::button::{self, PressTimer, HOLDOFF};

/// Button task: times each press from the falling to the rising edge.
#[task]
pub async fn button_task(mut button: ExtiInput<'static, PB8>, bus: &'static Bus) {
    let mut timer = PressTimer::new();
    loop {
        button.wait_for_falling_edge().await;
        timer.press(Instant::now());

        button.wait_for_rising_edge().await;
        if let Some(press) = timer.release(Instant::now()) {
            if button::dispatch(press, bus).is_some() {
                Timer::after(HOLDOFF).await;
            }
        }
    }
}
