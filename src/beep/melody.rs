//! Fixed confirmation sequences. The beeper is deaf to notifications while one
//! of these plays.

use embassy_time::{Duration, Timer};

use super::controller::ToneOutput;
use super::tone::Volume;

/// One step of a melody; `freq_hz == 0` is a rest.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Note {
    pub freq_hz: u32,
    pub duration: Duration,
}

const CHIRP_HZ: u32 = 2000;

const fn note(freq_hz: u32, ms: u64) -> Note {
    Note { freq_hz, duration: Duration::from_millis(ms) }
}

const fn rest(ms: u64) -> Note {
    note(0, ms)
}

pub static STARTUP: &[Note] = &[note(CHIRP_HZ, 50), rest(50), note(CHIRP_HZ, 50), rest(50)];

pub static SHUTDOWN: &[Note] = &[
    Note { freq_hz: 0, duration: Duration::from_micros(500) },
    note(CHIRP_HZ, 50),
    rest(50),
    note(CHIRP_HZ, 50),
    rest(50),
    note(CHIRP_HZ, 50),
    rest(50),
    note(CHIRP_HZ, 50),
    rest(50),
    note(CHIRP_HZ, 50),
    rest(50),
];

pub static VOLUME_SET: &[Note] = &[rest(50), note(CHIRP_HZ, 200), rest(50)];

/// Plays `notes` to completion and leaves the output muted.
pub async fn play<T: ToneOutput>(out: &mut T, notes: &[Note], volume: Volume) {
    for n in notes {
        if n.freq_hz == 0 {
            out.mute();
        } else {
            out.tone(n.freq_hz, volume);
        }
        Timer::after(n.duration).await;
    }
    out.mute();
}
