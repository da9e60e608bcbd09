//! A single scheduled callback

use std::time::{Duration, Instant};

use bitflags::bitflags;
use parking_lot::Mutex;
use slotmap::new_key_type;

new_key_type! {
    /// Handle returned when a timer is scheduled
    pub struct TimerKey;
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TimerFlags: u32 {
        /// Fire every interval instead of once
        const REPEAT = 0x01;
        /// Cancelled when the game clears its data (a new game or a reload),
        /// see [`crate::Scheduler::clear_on_reset`]
        const STOP_ON_RESET = 0x02;
    }
}

pub(crate) struct Timer {
    interval: Duration,
    flags: TimerFlags,
    callback: Mutex<Box<dyn FnMut() + Send + 'static>>,
    deadline: Mutex<Instant>,
}

impl Timer {
    pub fn new<F>(interval: Duration, flags: TimerFlags, callback: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        Self {
            interval,
            flags,
            callback: Mutex::new(Box::new(callback)),
            deadline: Mutex::new(Instant::now() + interval),
        }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= *self.deadline.lock()
    }

    pub fn fire(&self) {
        (*self.callback.lock())();
    }

    /// Push the deadline one interval past `now`.
    ///
    /// Returns `false` for one-shot timers, which are finished once fired.
    pub fn reschedule(&self, now: Instant) -> bool {
        if !self.flags.contains(TimerFlags::REPEAT) {
            return false;
        }
        *self.deadline.lock() = now + self.interval;
        true
    }

    pub fn survives_reset(&self) -> bool {
        !self.flags.contains(TimerFlags::STOP_ON_RESET)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_shot_is_not_rescheduled() {
        let timer = Timer::new(Duration::from_millis(10), TimerFlags::empty(), || {});
        let later = Instant::now() + Duration::from_millis(20);
        assert!(timer.is_due(later));
        assert!(!timer.reschedule(later));
    }

    #[test]
    fn test_repeating_deadline_moves_from_now() {
        let timer = Timer::new(Duration::from_millis(10), TimerFlags::REPEAT, || {});
        let later = Instant::now() + Duration::from_millis(50);
        assert!(timer.reschedule(later));
        assert!(!timer.is_due(later));
        assert!(timer.is_due(later + Duration::from_millis(10)));
    }

    #[test]
    fn test_reset_flag() {
        let plain = Timer::new(Duration::ZERO, TimerFlags::REPEAT, || {});
        let scoped = Timer::new(Duration::ZERO, TimerFlags::STOP_ON_RESET, || {});
        assert!(plain.survives_reset());
        assert!(!scoped.survives_reset());
    }
}
