//! Wall clock used by every window in the process.
//!
//! Production code only ever reads [`now`]. Tests swap the time source with a
//! [`MockClock`], which freezes `now` at an instant they control.

use std::sync::atomic::Ordering::Relaxed;
use std::sync::atomic::{AtomicBool, AtomicI64};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

static MOCKED: AtomicBool = AtomicBool::new(false);
static MOCK_MILLIS: AtomicI64 = AtomicI64::new(0);
static MOCK_OWNER: Mutex<()> = Mutex::new(());

/// Milliseconds since the Unix epoch. Instants before the epoch come back negative.
#[inline]
pub fn now() -> i64 {
    if MOCKED.load(Relaxed) {
        return MOCK_MILLIS.load(Relaxed);
    }
    system_now()
}

fn system_now() -> i64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(since) => since.as_millis() as i64,
        Err(before) => -(before.duration().as_millis() as i64),
    }
}

/// Freezes [`now`] for the lifetime of the guard.
///
/// Only one mock clock exists at a time: `start` blocks until any other mock is
/// dropped, so tests that drive time themselves never interleave. Windows must be
/// quiescent while the clock moves backwards or jumps.
pub struct MockClock {
    _owner: MutexGuard<'static, ()>,
}

impl MockClock {
    pub fn start(at_millis: i64) -> Self {
        Self::freeze(|| at_millis)
    }

    /// Freezes the clock at the current system time.
    pub fn start_now() -> Self {
        Self::freeze(system_now)
    }

    fn freeze(at: impl FnOnce() -> i64) -> Self {
        let owner = MOCK_OWNER.lock().unwrap_or_else(PoisonError::into_inner);
        MOCK_MILLIS.store(at(), Relaxed);
        MOCKED.store(true, Relaxed);
        Self { _owner: owner }
    }

    pub fn now(&self) -> i64 {
        MOCK_MILLIS.load(Relaxed)
    }

    pub fn set(&self, at_millis: i64) {
        MOCK_MILLIS.store(at_millis, Relaxed);
    }

    pub fn advance(&self, by: Duration) {
        MOCK_MILLIS.fetch_add(by.as_millis() as i64, Relaxed);
    }

    pub fn rewind(&self, by: Duration) {
        MOCK_MILLIS.fetch_sub(by.as_millis() as i64, Relaxed);
    }
}

impl Drop for MockClock {
    fn drop(&mut self) {
        MOCKED.store(false, Relaxed);
    }
}
