//! Timer system for scheduling delayed and repeating callbacks
//!
//! Timers are processed every frame and can be configured to:
//! - Fire once after a delay
//! - Repeat at a fixed interval
//! - Be automatically cleaned up when the game data is reset
//!
//! [`Timers::sleep`] turns a delay into a future, which is how async hooks
//! wait for a number of frames' worth of time.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use hackkit_core::timers::{Timers, TimerFlags};
//!
//! let timers = Timers::new();
//!
//! // One-shot timer
//! let key = timers.add_timer(Duration::from_secs(5), || {
//!     println!("5 seconds passed!");
//! });
//!
//! // Repeating timer
//! let key = timers.add_repeating_timer(Duration::from_millis(100), || {
//!     println!("Tick!");
//! });
//!
//! // Cancel a timer
//! timers.remove_timer(key);
//! ```

mod sleep;
mod timer;

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use slotmap::SlotMap;

pub use sleep::Sleep;
pub use timer::{TimerFlags, TimerKey};
use timer::Timer;

/// Timer registry
#[derive(Default)]
pub struct Timers {
    timers: RwLock<SlotMap<TimerKey, Arc<Timer>>>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a one-shot timer that fires after the specified delay
    ///
    /// # Returns
    /// A key that can be used to cancel the timer via `remove_timer`
    pub fn add_timer<F>(&self, delay: Duration, callback: F) -> TimerKey
    where
        F: FnMut() + Send + 'static,
    {
        self.add_timer_with_flags(delay, TimerFlags::empty(), callback)
    }

    /// Add a repeating timer that fires at the specified interval
    ///
    /// The timer will continue firing until cancelled via `remove_timer`.
    pub fn add_repeating_timer<F>(&self, interval: Duration, callback: F) -> TimerKey
    where
        F: FnMut() + Send + 'static,
    {
        self.add_timer_with_flags(interval, TimerFlags::REPEAT, callback)
    }

    /// Add a timer with custom flags
    ///
    /// # Example
    ///
    /// ```ignore
    /// // Repeating timer that stops when the game resets
    /// let key = timers.add_timer_with_flags(
    ///     Duration::from_secs(1),
    ///     TimerFlags::REPEAT | TimerFlags::STOP_ON_RESET,
    ///     || { /* ... */ }
    /// );
    /// ```
    pub fn add_timer_with_flags<F>(&self, interval: Duration, flags: TimerFlags, callback: F) -> TimerKey
    where
        F: FnMut() + Send + 'static,
    {
        let timer = Timer::new(interval, flags, callback);
        self.timers.write().insert(Arc::new(timer))
    }

    /// Remove/cancel a timer
    ///
    /// # Returns
    /// `true` if the timer was found and removed, `false` if not found
    pub fn remove_timer(&self, key: TimerKey) -> bool {
        self.timers.write().remove(key).is_some()
    }

    /// Number of live timers
    pub fn len(&self) -> usize {
        self.timers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.read().is_empty()
    }

    /// Future resolving once `duration` has passed
    ///
    /// The sleep is driven by [`Timers::process`]; it never resolves if the
    /// timers stop being processed.
    pub fn sleep(&self, duration: Duration) -> Sleep {
        let (sleep, wake) = Sleep::pair();
        self.add_timer(duration, move || wake.fire());
        sleep
    }

    /// Process all timers as of `now`
    ///
    /// Fires every timer that is due. One-shot timers are removed after firing,
    /// while repeating timers are rescheduled. Callbacks run without the
    /// registry locked, so they may add or remove timers.
    /// Returns the number of timers fired.
    pub fn process(&self, now: Instant) -> usize {
        let due: Vec<(TimerKey, Arc<Timer>)> = self
            .timers
            .read()
            .iter()
            .filter(|(_, timer)| timer.is_due(now))
            .map(|(key, timer)| (key, timer.clone()))
            .collect();

        for (_, timer) in &due {
            timer.fire();
        }

        let mut timers = self.timers.write();
        for (key, timer) in &due {
            if !timer.reschedule(now) {
                timers.remove(*key);
            }
        }

        due.len()
    }

    /// Remove all timers with the STOP_ON_RESET flag
    pub fn remove_reset_timers(&self) -> usize {
        let mut timers = self.timers.write();
        let before = timers.len();
        timers.retain(|_, timer| timer.survives_reset());
        let removed = before - timers.len();
        if removed > 0 {
            tracing::debug!("Removed {} timers on reset", removed);
        }
        removed
    }
}
