//! Timer-driven sleep future

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

use parking_lot::Mutex;

#[derive(Default)]
struct SleepState {
    done: AtomicBool,
    waker: Mutex<Option<Waker>>,
}

/// Future returned by [`super::Timers::sleep`]
pub struct Sleep {
    state: Arc<SleepState>,
}

/// Timer side of a sleep
pub(super) struct SleepWake {
    state: Arc<SleepState>,
}

impl Sleep {
    pub(super) fn pair() -> (Sleep, SleepWake) {
        let state = Arc::new(SleepState::default());
        (
            Sleep {
                state: state.clone(),
            },
            SleepWake { state },
        )
    }

    /// Whether the timer already fired
    pub fn is_elapsed(&self) -> bool {
        self.state.done.load(Ordering::Acquire)
    }
}

impl SleepWake {
    pub(super) fn fire(&self) {
        self.state.done.store(true, Ordering::Release);
        if let Some(waker) = self.state.waker.lock().take() {
            waker.wake();
        }
    }
}

impl Future for Sleep {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.is_elapsed() {
            return Poll::Ready(());
        }

        *self.state.waker.lock() = Some(cx.waker().clone());

        // The timer may have fired between the check and storing the waker
        if self.is_elapsed() {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::Timers;
    use std::future::Future;
    use std::time::{Duration, Instant};

    #[test]
    fn test_sleep_resolves_when_timer_fires() {
        let timers = Timers::new();
        let mut sleep = timers.sleep(Duration::from_millis(5));
        let waker = futures::task::noop_waker();
        let mut cx = std::task::Context::from_waker(&waker);

        assert!(std::pin::Pin::new(&mut sleep).poll(&mut cx).is_pending());

        timers.process(Instant::now() + Duration::from_millis(10));
        assert!(sleep.is_elapsed());
        assert!(std::pin::Pin::new(&mut sleep).poll(&mut cx).is_ready());
    }
}
