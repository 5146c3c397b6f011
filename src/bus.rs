//! Coordination between the sample source, the signal engine and the beeper.
//!
//! Everything here is `const`-constructible so the firmware can hold it in
//! statics, and every primitive is usable from interrupt context except the
//! async waits.

use core::cell::Cell;
use core::future::poll_fn;
use core::ops::BitOr;
use core::task::Poll;

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use embassy_sync::waitqueue::AtomicWaker;
use embassy_time::{Duration, Instant, Timer};

use crate::state::{RawSample, SignalSnapshot};

// ── Event flags ───────────────────────────────────────────────────────────────

/// Set of beeper events. Raising an event twice before the consumer wakes
/// yields a single wake-up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Events(u8);

impl Events {
    pub const NONE: Self = Self(0);
    pub const RESULT_READY: Self = Self(1 << 0);
    pub const STEP_VOLUME: Self = Self(1 << 1);
    pub const SHUTDOWN: Self = Self(1 << 2);

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }
}

impl BitOr for Events {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Coalescing event flags with a single waiting consumer.
pub struct EventFlags {
    pending: Mutex<CriticalSectionRawMutex, Cell<Events>>,
    waker: AtomicWaker,
}

impl EventFlags {
    pub const fn new() -> Self {
        Self {
            pending: Mutex::new(Cell::new(Events::NONE)),
            waker: AtomicWaker::new(),
        }
    }

    pub fn raise(&self, events: Events) {
        self.pending.lock(|p| p.set(p.get() | events));
        self.waker.wake();
    }

    /// Returns and clears everything raised since the last take.
    pub fn take(&self) -> Events {
        self.pending.lock(|p| p.replace(Events::NONE))
    }

    /// Waits until at least one event is pending, then takes the whole set.
    pub async fn wait(&self) -> Events {
        poll_fn(|cx| {
            self.waker.register(cx.waker());
            let events = self.take();
            if events.is_empty() {
                Poll::Pending
            } else {
                Poll::Ready(events)
            }
        })
        .await
    }
}

impl Default for EventFlags {
    fn default() -> Self {
        Self::new()
    }
}

// ── Snapshot ──────────────────────────────────────────────────────────────────

/// Single-slot, last-write-wins holder of the engine output.
pub struct SnapshotCell {
    inner: Mutex<CriticalSectionRawMutex, Cell<SignalSnapshot>>,
}

impl SnapshotCell {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(Cell::new(SignalSnapshot {
                vario: 0.0,
                baro_altitude: 0.0,
                filtered_pressure: 0.0,
            })),
        }
    }

    pub fn write(&self, snapshot: SignalSnapshot) {
        self.inner.lock(|s| s.set(snapshot));
    }

    pub fn read(&self) -> SignalSnapshot {
        self.inner.lock(|s| s.get())
    }
}

impl Default for SnapshotCell {
    fn default() -> Self {
        Self::new()
    }
}

// ── One-shot timer ────────────────────────────────────────────────────────────

#[derive(Clone, Copy)]
struct TimerSlot {
    deadline: Option<Instant>,
    generation: u32,
}

/// One-shot timer with at most one pending expiry.
///
/// Arming replaces any pending expiry. `cancel` and the expiry are settled
/// under the same critical section: whichever runs first wins, and a cancel
/// that loses finds nothing left to cancel.
pub struct OneShot {
    slot: Mutex<CriticalSectionRawMutex, Cell<TimerSlot>>,
    waker: AtomicWaker,
}

impl OneShot {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(Cell::new(TimerSlot { deadline: None, generation: 0 })),
            waker: AtomicWaker::new(),
        }
    }

    pub fn arm(&self, after: Duration) {
        self.arm_at(Instant::now() + after);
    }

    pub fn arm_at(&self, deadline: Instant) {
        self.slot.lock(|s| {
            let cur = s.get();
            s.set(TimerSlot {
                deadline: Some(deadline),
                generation: cur.generation.wrapping_add(1),
            });
        });
        self.waker.wake();
    }

    /// Drops the pending expiry. Returns `false` if nothing was pending.
    pub fn cancel(&self) -> bool {
        let was_armed = self.slot.lock(|s| {
            let cur = s.get();
            s.set(TimerSlot {
                deadline: None,
                generation: cur.generation.wrapping_add(1),
            });
            cur.deadline.is_some()
        });
        self.waker.wake();
        was_armed
    }

    pub fn is_armed(&self) -> bool {
        self.slot.lock(|s| s.get().deadline.is_some())
    }

    /// Consumes the pending expiry if it is due at `now`.
    #[cfg(test)]
    fn poll_expired(&self, now: Instant) -> bool {
        self.slot.lock(|s| {
            let cur = s.get();
            match cur.deadline {
                Some(deadline) if deadline <= now => {
                    s.set(TimerSlot { deadline: None, ..cur });
                    true
                }
                _ => false,
            }
        })
    }

    fn fire(&self, generation: u32) -> bool {
        self.slot.lock(|s| {
            let cur = s.get();
            if cur.generation == generation && cur.deadline.is_some() {
                s.set(TimerSlot { deadline: None, ..cur });
                true
            } else {
                false
            }
        })
    }

    async fn changed(&self, generation: u32) {
        poll_fn(|cx| {
            self.waker.register(cx.waker());
            if self.slot.lock(|s| s.get().generation) != generation {
                Poll::Ready(())
            } else {
                Poll::Pending
            }
        })
        .await
    }

    /// Resolves when the current (or a later) arming expires.
    pub async fn expired(&self) {
        loop {
            let slot = self.slot.lock(|s| s.get());
            match slot.deadline {
                None => self.changed(slot.generation).await,
                Some(deadline) => {
                    match select(Timer::at(deadline), self.changed(slot.generation)).await {
                        Either::First(()) => {
                            if self.fire(slot.generation) {
                                return;
                            }
                        }
                        Either::Second(()) => {}
                    }
                }
            }
        }
    }
}

impl Default for OneShot {
    fn default() -> Self {
        Self::new()
    }
}

// ── Sample hand-off ───────────────────────────────────────────────────────────

/// Rendezvous between the sensor and the engine: `send` returns only once the
/// engine has taken the sample, so at most one sample is ever in flight.
pub struct SampleLink {
    slot: Channel<CriticalSectionRawMutex, RawSample, 1>,
    taken: Signal<CriticalSectionRawMutex, ()>,
}

impl SampleLink {
    pub const fn new() -> Self {
        Self { slot: Channel::new(), taken: Signal::new() }
    }

    pub async fn send(&self, sample: RawSample) {
        self.taken.reset();
        self.slot.send(sample).await;
        self.taken.wait().await;
    }

    pub async fn receive(&self) -> RawSample {
        let sample = self.slot.receive().await;
        self.taken.signal(());
        sample
    }
}

impl Default for SampleLink {
    fn default() -> Self {
        Self::new()
    }
}

// ── Bus ───────────────────────────────────────────────────────────────────────

/// Everything the engine, the beeper and the peripherals share.
pub struct Bus {
    pub snapshot: SnapshotCell,
    pub beeper: EventFlags,
    pub beep_timer: OneShot,
    pub shutdown_complete: Signal<CriticalSectionRawMutex, ()>,
}

impl Bus {
    pub const fn new() -> Self {
        Self {
            snapshot: SnapshotCell::new(),
            beeper: EventFlags::new(),
            beep_timer: OneShot::new(),
            shutdown_complete: Signal::new(),
        }
    }

    /// Stores a fresh engine result and tells the beeper about it.
    pub fn publish(&self, snapshot: SignalSnapshot) {
        self.snapshot.write(snapshot);
        self.beeper.raise(Events::RESULT_READY);
    }

    /// Latest engine result, zeroed before the first one.
    pub fn read_snapshot(&self) -> SignalSnapshot {
        self.snapshot.read()
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}
