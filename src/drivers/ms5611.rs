//! MS5611 barometric pressure sensor.
//!
//! The compensation math is plain integer arithmetic and always compiled; the
//! SPI transport is only built with the `firmware` feature.

pub const CMD_RESET: u8 = 0x1E;
pub const CMD_CONVERT_D1_OSR4096: u8 = 0x48;
pub const CMD_CONVERT_D2_OSR4096: u8 = 0x58;
pub const CMD_ADC_READ: u8 = 0x00;
pub const CMD_PROM_READ_BASE: u8 = 0xA0;

/// Conversion time at OSR 4096 is 9.04 ms max.
pub const CONVERSION_MS: u64 = 10;
/// PROM reload after reset.
pub const RESET_MS: u64 = 250;

/// PROM read command for coefficient `index` (1..=6).
pub const fn prom_read_cmd(index: u8) -> u8 {
    CMD_PROM_READ_BASE | (index << 1)
}

/// Factory calibration words C1..C6.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    /// Pressure sensitivity.
    pub c1: u16,
    /// Pressure offset.
    pub c2: u16,
    /// Temperature coefficient of pressure sensitivity.
    pub c3: u16,
    /// Temperature coefficient of pressure offset.
    pub c4: u16,
    /// Reference temperature.
    pub c5: u16,
    /// Temperature coefficient of the temperature.
    pub c6: u16,
}

impl Calibration {
    /// Builds the compensated reading from raw pressure (`d1`) and temperature
    /// (`d2`) conversions.
    ///
    /// Returns pressure in Pa and temperature in hundredths of a degree Celsius,
    /// including the second-order correction below 20 °C.
    pub fn compensate(&self, d1: u32, d2: u32) -> (u32, i32) {
        let d1 = d1 as i64;
        let dt = d2 as i64 - ((self.c5 as i64) << 8);
        let mut temp = 2000 + ((dt * self.c6 as i64) >> 23);
        let mut off = ((self.c2 as i64) << 16) + ((self.c4 as i64 * dt) >> 7);
        let mut sens = ((self.c1 as i64) << 15) + ((self.c3 as i64 * dt) >> 8);

        if temp < 2000 {
            let t2 = (dt * dt) >> 31;
            let cold = (temp - 2000) * (temp - 2000);
            let mut off2 = (5 * cold) >> 1;
            let mut sens2 = (5 * cold) >> 2;

            if temp < -1500 {
                let very_cold = (temp + 1500) * (temp + 1500);
                off2 += 7 * very_cold;
                sens2 += (11 * very_cold) >> 1;
            }

            temp -= t2;
            off -= off2;
            sens -= sens2;
        }

        let pressure = (((d1 * sens) >> 21) - off) >> 15;
        (pressure.max(0) as u32, temp as i32)
    }
}

#[cfg(feature = "firmware")]
pub use self::spi::Ms5611;

#[cfg(feature = "firmware")]
mod spi {
    use embassy_stm32::dma::NoDma;
    use embassy_stm32::gpio::{AnyPin, Output};
    use embassy_stm32::spi::{Error, Instance, Spi};
    use embassy_time::{Duration, Timer};

    use super::*;
    use crate::sensor::PressureSensor;

    pub struct Ms5611<'d, T: Instance> {
        spi: Spi<'d, T, NoDma, NoDma>,
        cs: Output<'d, AnyPin>,
        calibration: Calibration,
    }

    impl<'d, T: Instance> Ms5611<'d, T> {
        pub fn new(spi: Spi<'d, T, NoDma, NoDma>, cs: Output<'d, AnyPin>) -> Self {
            Self { spi, cs, calibration: Calibration::default() }
        }

        fn command(&mut self, cmd: u8) -> Result<(), Error> {
            self.cs.set_low();
            let res = self.spi.blocking_write(&[cmd]);
            self.cs.set_high();
            res
        }

        fn read<const N: usize>(&mut self, cmd: u8) -> Result<[u8; N], Error> {
            let mut rx = [0u8; N];
            self.cs.set_low();
            let res = self
                .spi
                .blocking_write(&[cmd])
                .and_then(|_| self.spi.blocking_read(&mut rx));
            self.cs.set_high();
            res.map(|_| rx)
        }

        /// Resets the sensor and loads the PROM coefficients.
        pub async fn start(&mut self) -> Result<Calibration, Error> {
            self.command(CMD_RESET)?;
            Timer::after(Duration::from_millis(RESET_MS)).await;

            let mut words = [0u16; 6];
            for (i, word) in words.iter_mut().enumerate() {
                let raw: [u8; 2] = self.read(prom_read_cmd(i as u8 + 1))?;
                *word = u16::from_be_bytes(raw);
            }
            self.calibration = Calibration {
                c1: words[0],
                c2: words[1],
                c3: words[2],
                c4: words[3],
                c5: words[4],
                c6: words[5],
            };
            Ok(self.calibration)
        }

        async fn convert(&mut self, cmd: u8) -> Result<u32, Error> {
            self.command(cmd)?;
            Timer::after(Duration::from_millis(CONVERSION_MS)).await;
            let raw: [u8; 3] = self.read(CMD_ADC_READ)?;
            Ok(u32::from_be_bytes([0, raw[0], raw[1], raw[2]]))
        }

        /// One pressure + temperature conversion pair (~20 ms).
        pub async fn measure(&mut self) -> Result<(u32, i32), Error> {
            let d1 = self.convert(CMD_CONVERT_D1_OSR4096).await?;
            let d2 = self.convert(CMD_CONVERT_D2_OSR4096).await?;
            Ok(self.calibration.compensate(d1, d2))
        }
    }

    impl<'d, T: Instance> PressureSensor for Ms5611<'d, T> {
        type Error = Error;

        async fn measure(&mut self) -> Result<(u32, i32), Error> {
            Ms5611::measure(self).await.inspect_err(|e| warn!("ms5611: conversion failed: {}", e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Typical values from the MS5611-01BA03 datasheet.
    const DATASHEET: Calibration = Calibration {
        c1: 40127,
        c2: 36924,
        c3: 23317,
        c4: 23282,
        c5: 33464,
        c6: 28312,
    };

    #[test]
    fn datasheet_example() {
        assert_eq!(DATASHEET.compensate(9_085_466, 8_569_150), (100_009, 2007));
    }

    #[test]
    fn second_order_below_twenty_degrees() {
        assert_eq!(DATASHEET.compensate(9_085_466, 8_000_000), (95_989, -62));
    }

    #[test]
    fn very_low_temperature_branch() {
        assert_eq!(DATASHEET.compensate(9_085_466, 7_000_000), (85_693, -4431));
    }

    #[test]
    fn prom_commands() {
        assert_eq!(prom_read_cmd(1), 0xA2);
        assert_eq!(prom_read_cmd(6), 0xAC);
    }
}
