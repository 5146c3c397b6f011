#![cfg_attr(not(test), no_std)]

//! Variometer core: turns barometric pressure samples into a climb rate and
//! drives an audible tone from it.
//!
//! The library is hardware-agnostic and host-testable. `src/main.rs` (feature
//! `firmware`) binds it to the STM32 peripherals.

#[macro_use]
mod fmt;

pub mod beep;
pub mod bus;
pub mod button;
pub mod config;
pub mod drivers;
pub mod nmea;
pub mod processing;
pub mod sensor;
pub mod sim;
pub mod state;
pub mod ticks;
