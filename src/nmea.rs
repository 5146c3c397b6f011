//! LXWP0 sentences for flight computers that read a serial vario feed.

use core::fmt::{self, Write};

use crate::state::SignalSnapshot;

pub const MAX_SENTENCE: usize = 96;

pub type Sentence = heapless::String<MAX_SENTENCE>;

/// XOR of every byte between `$` and `*`.
pub fn checksum(body: &[u8]) -> u8 {
    body.iter().fold(0, |acc, b| acc ^ b)
}

/// `$LXWP0,N,,<alt>,<vario>,,,,,,,,*HH`, altitude in m and vario in m/s.
pub fn lxwp0(snapshot: &SignalSnapshot) -> Result<Sentence, fmt::Error> {
    let mut s = Sentence::new();
    write!(
        s,
        "$LXWP0,N,,{:.2},{:.2},,,,,,,,",
        snapshot.baro_altitude, snapshot.vario
    )?;
    let cs = checksum(&s.as_bytes()[1..]);
    write!(s, "*{:02X}", cs)?;
    Ok(s)
}
