//! Thread-safe tick counter for broadcast pass numbering.
//!
//! Every broadcast pass is stamped with a monotonically increasing integer,
//! the *tick*. The tick is embedded in every marker id generated during that
//! pass, which is what makes marker ids unique per pass: a marker for the
//! same entity on the next pass gets a new id, so the client retires the old
//! one and renders the fresh one (fresh distance label included).
//!
//! Out-of-band passes (a connect pass for a new viewer, a disconnect purge)
//! draw from the same counter, so a tick number is never reused anywhere in
//! the process lifetime.
//!
//! # Thread safety
//!
//! The counter uses `AtomicU64` internally. The scheduler task and the host's
//! connect/disconnect callbacks can both call [`TickCounter::next`]
//! simultaneously without a lock and without ever producing the same value
//! twice.

use std::sync::atomic::{AtomicU64, Ordering};

/// A thread-safe, monotonically increasing counter for broadcast tick numbers.
///
/// Ticks start at 0 and increment by 1 with each call to [`next`]. The counter
/// wraps around at `u64::MAX` back to 0 without panicking; at one tick per
/// 500 ms that is not a practical concern.
///
/// # Examples
///
/// ```rust
/// use radar_core::TickCounter;
///
/// let counter = TickCounter::new();
/// assert_eq!(counter.next(), 0);
/// assert_eq!(counter.next(), 1);
/// ```
///
/// [`next`]: TickCounter::next
#[derive(Debug, Default)]
pub struct TickCounter {
    inner: AtomicU64,
}

impl TickCounter {
    /// Creates a new counter starting at 0.
    pub fn new() -> Self {
        Self {
            inner: AtomicU64::new(0),
        }
    }

    /// Returns the next tick number and atomically increments the counter.
    ///
    /// `Ordering::Relaxed` is sufficient: tick numbers only need to be unique
    /// and increasing, they are not used to synchronise memory between
    /// threads.
    pub fn next(&self) -> u64 {
        self.inner.fetch_add(1, Ordering::Relaxed)
    }

    /// Returns the current value without incrementing.
    ///
    /// For logging and diagnostics only; another thread may advance the
    /// counter before the caller uses the returned value.
    pub fn current(&self) -> u64 {
        self.inner.load(Ordering::Relaxed)
    }
}
