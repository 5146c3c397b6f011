use embassy_stm32::peripherals::TIM4;
use embassy_stm32::rcc::*;
use embassy_stm32::time::Hertz as TimeHertz;
use embassy_stm32::timer::simple_pwm::SimplePwm;
use embassy_stm32::timer::Channel;
use embassy_stm32::Config;

use variometer::beep::{ToneOutput, Volume};

// ── Board wiring ──────────────────────────────────────────────────────────────
//  Buzzer   TIM4_CH1  PB6
//  MS5611   SPI1      SCK=PA5 MOSI=PA7 MISO=PA6 CS=PA4 (mode 3)
//  Button   EXTI8     PB8 (active low)
//  Latch    PA1       high = keep power rail on
//  NMEA     USART1_TX PA9 @ 9600
//  LED      PC13

pub const MS5611_SPI_HZ: u32 = 1_000_000;
pub const NMEA_BAUD: u32 = 9_600;
pub const BUZZER_IDLE_HZ: u32 = 2_000;

pub struct Board {
    pub p: embassy_stm32::Peripherals,
}

impl Board {
    pub fn init() -> Self {
        let mut config = Config::default();
        config.rcc.hse = Some(Hse {
            freq: TimeHertz(8_000_000),
            mode: HseMode::Oscillator,
        });
        config.rcc.pll_src = PllSource::HSE;
        config.rcc.pll = Some(Pll {
            prediv: PllPreDiv::DIV4,
            mul: PllMul::MUL168,
            divp: Some(PllPDiv::DIV2), // 168 MHz
            divq: Some(PllQDiv::DIV7),
            divr: None,
        });
        config.rcc.sys = Sysclk::PLL1_P;
        config.rcc.ahb_pre = AHBPrescaler::DIV1;
        config.rcc.apb1_pre = APBPrescaler::DIV4;
        config.rcc.apb2_pre = APBPrescaler::DIV2;

        let p = embassy_stm32::init(config);

        Self { p }
    }
}

/// Piezo driven by one PWM channel; pitch = timer frequency, loudness = duty.
pub struct Buzzer {
    pwm: SimplePwm<'static, TIM4>,
}

impl Buzzer {
    pub fn new(mut pwm: SimplePwm<'static, TIM4>) -> Self {
        pwm.set_duty(Channel::Ch1, 0);
        pwm.disable(Channel::Ch1);
        Self { pwm }
    }
}

impl ToneOutput for Buzzer {
    fn tone(&mut self, freq_hz: u32, volume: Volume) {
        if freq_hz == 0 || volume == Volume::Zero {
            self.mute();
            return;
        }
        self.pwm.set_frequency(TimeHertz(freq_hz));
        let max = self.pwm.get_max_duty() as u32;
        let duty = max * volume.duty_permyriad() as u32 / 10_000;
        self.pwm.set_duty(Channel::Ch1, duty as u16);
        self.pwm.enable(Channel::Ch1);
    }

    fn mute(&mut self) {
        self.pwm.set_duty(Channel::Ch1, 0);
        self.pwm.disable(Channel::Ch1);
    }
}
