//! Frame-driven scheduler
//!
//! The game calls [`Scheduler::frame`] once per frame from its update loop.
//! Each frame runs queued tasks, then due timers, then polls every suspended
//! call handed to [`Scheduler::spawn`].

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use hackkit_engine::{Call, CallFuture, Value};
use hackkit_sdk::Phase;

use crate::hooks::{Hook, HookError, HookRegistry};
use crate::tasks::{QueueError, TaskQueue, TaskSender};
use crate::timers::{Sleep, TimerFlags, TimerKey, Timers};

/// Cooperative scheduler for one program instance
#[derive(Default)]
pub struct Scheduler {
    tasks: TaskQueue,
    timers: Timers,
    pending: Mutex<Vec<CallFuture>>,
    frame_count: AtomicU64,
    last_frame_time_ns: AtomicU64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a task for the next frame
    pub fn queue_task<F>(&self, task: F) -> Result<(), QueueError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.tasks.queue_task(task)
    }

    /// Handle for queueing tasks from other threads
    pub fn task_sender(&self) -> TaskSender {
        self.tasks.sender()
    }

    /// Add a one-shot timer
    pub fn add_timer<F>(&self, delay: Duration, callback: F) -> TimerKey
    where
        F: FnMut() + Send + 'static,
    {
        self.timers.add_timer(delay, callback)
    }

    /// Add a repeating timer
    pub fn add_repeating_timer<F>(&self, interval: Duration, callback: F) -> TimerKey
    where
        F: FnMut() + Send + 'static,
    {
        self.timers.add_repeating_timer(interval, callback)
    }

    /// Add a timer with custom flags
    pub fn add_timer_with_flags<F>(&self, interval: Duration, flags: TimerFlags, callback: F) -> TimerKey
    where
        F: FnMut() + Send + 'static,
    {
        self.timers.add_timer_with_flags(interval, flags, callback)
    }

    /// Cancel a timer
    pub fn remove_timer(&self, key: TimerKey) -> bool {
        self.timers.remove_timer(key)
    }

    /// Drop timers flagged `STOP_ON_RESET`
    pub fn remove_reset_timers(&self) -> usize {
        self.timers.remove_reset_timers()
    }

    /// Drop `STOP_ON_RESET` timers whenever the game clears its data
    ///
    /// Registers an after-hook on the registry's clear-game-data target. The
    /// hook holds the scheduler weakly and does nothing once it is gone.
    pub fn clear_on_reset(self: &Arc<Self>, registry: &HookRegistry) -> Result<(), HookError> {
        let scheduler: Weak<Scheduler> = Arc::downgrade(self);
        registry.register(
            registry.dialog_config().clear_game_data.as_str(),
            Phase::After,
            Hook::sync(move |_| {
                if let Some(scheduler) = scheduler.upgrade() {
                    scheduler.remove_reset_timers();
                }
                Ok(Value::Null)
            }),
            None,
        )
    }

    /// Future resolving after `duration`, measured in frames' time
    pub fn sleep(&self, duration: Duration) -> Sleep {
        self.timers.sleep(duration)
    }

    /// Keep driving a call until it completes
    ///
    /// A call that already completed is dropped. Errors from suspended calls
    /// are logged when they surface.
    pub fn spawn(&self, call: Call) {
        if let Call::Pending(future) = call {
            self.pending.lock().push(future);
        }
    }

    /// Number of suspended calls still being driven
    pub fn pending_calls(&self) -> usize {
        self.pending.lock().len()
    }

    /// Get the current frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count.load(Ordering::Relaxed)
    }

    /// Get the last frame processing time in nanoseconds
    pub fn last_frame_time_ns(&self) -> u64 {
        self.last_frame_time_ns.load(Ordering::Relaxed)
    }

    /// Run one frame
    pub fn frame(&self) {
        self.frame_at(Instant::now());
    }

    /// Run one frame as of `now`
    pub fn frame_at(&self, now: Instant) {
        let start = Instant::now();
        let frame = self.frame_count.fetch_add(1, Ordering::Relaxed) + 1;

        // Process queued tasks from other threads
        let tasks_processed = self.tasks.process();
        if tasks_processed > 0 {
            tracing::trace!("Processed {} queued tasks", tasks_processed);
        }

        self.timers.process(now);
        self.poll_pending();

        let elapsed = start.elapsed().as_nanos() as u64;
        self.last_frame_time_ns.store(elapsed, Ordering::Relaxed);

        // Warn if frame took too long (> 1ms)
        if elapsed > 1_000_000 {
            tracing::warn!("Frame took {}ms (frame {})", elapsed / 1_000_000, frame);
        }
    }

    fn poll_pending(&self) {
        // Polled without the lock held so resumed stages can spawn more calls
        let pending = std::mem::take(&mut *self.pending.lock());
        if pending.is_empty() {
            return;
        }

        let mut cx = Context::from_waker(futures::task::noop_waker_ref());
        let mut still_pending = Vec::with_capacity(pending.len());

        for mut future in pending {
            match future.as_mut().poll(&mut cx) {
                Poll::Ready(Ok(_)) => {}
                Poll::Ready(Err(e)) => tracing::error!("Suspended call failed: {}", e),
                Poll::Pending => still_pending.push(future),
            }
        }

        self.pending.lock().extend(still_pending);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::{apply_hooks, Hook, HookRegistry};
    use hackkit_engine::{Program, ProgramError};
    use serde_json::json;

    #[test]
    fn test_frame_order() {
        let scheduler = Scheduler::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let l = log.clone();
        scheduler.add_timer(Duration::ZERO, move || l.lock().push("timer"));
        let l = log.clone();
        scheduler.queue_task(move || l.lock().push("task")).unwrap();

        scheduler.frame_at(Instant::now() + Duration::from_millis(1));
        assert_eq!(*log.lock(), vec!["task", "timer"]);
        assert_eq!(scheduler.frame_count(), 1);
    }

    #[test]
    fn test_hook_sleeps_across_frames() {
        let scheduler = Arc::new(Scheduler::new());
        let program = Program::new();
        let registry = HookRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let l = log.clone();
        program
            .define_fn("startNarrating", move |_| {
                l.lock().push("narrate");
                Ok(Value::Null)
            })
            .unwrap();

        let s = scheduler.clone();
        registry
            .before(
                "startNarrating",
                Hook::async_fn(move |_| {
                    let sleep = s.sleep(Duration::from_millis(50));
                    async move {
                        sleep.await;
                        Ok::<Value, ProgramError>(json!(null))
                    }
                }),
            )
            .unwrap();
        apply_hooks(&program, &registry).unwrap();

        let start = Instant::now();
        scheduler.spawn(program.call("startNarrating", vec![]).unwrap());
        assert_eq!(scheduler.pending_calls(), 1);

        scheduler.frame_at(start);
        assert!(log.lock().is_empty());

        scheduler.frame_at(start + Duration::from_millis(100));
        assert_eq!(*log.lock(), vec!["narrate"]);
        assert_eq!(scheduler.pending_calls(), 0);
    }

    #[test]
    fn test_ready_calls_are_not_kept() {
        let scheduler = Scheduler::new();
        scheduler.spawn(Call::ready(json!(1)));
        assert_eq!(scheduler.pending_calls(), 0);
    }

    #[test]
    fn test_failed_call_is_dropped() {
        let scheduler = Scheduler::new();
        let call = Call::Pending(Box::pin(async {
            hackkit_engine::function::YieldOnce::new().await;
            Err::<Value, ProgramError>(ProgramError::failed("lost"))
        }));
        scheduler.spawn(call);

        scheduler.frame();
        assert_eq!(scheduler.pending_calls(), 1);
        scheduler.frame();
        assert_eq!(scheduler.pending_calls(), 0);
    }

    #[test]
    fn test_reset_timers_cleared_with_game_data() {
        let program = Program::new();
        let registry = HookRegistry::new();
        let scheduler = Arc::new(Scheduler::new());
        program.define_fn("clearGameData", |_| Ok(Value::Null)).unwrap();

        scheduler.add_timer_with_flags(Duration::from_secs(60), TimerFlags::STOP_ON_RESET, || {});
        scheduler.add_timer(Duration::from_secs(60), || {});
        scheduler.clear_on_reset(&registry).unwrap();
        apply_hooks(&program, &registry).unwrap();

        program.call("clearGameData", vec![]).unwrap().wait().unwrap();
        assert_eq!(scheduler.timers.len(), 1);

        drop(scheduler);
        program.call("clearGameData", vec![]).unwrap().wait().unwrap();
    }
}
