//! Frame task queue
//!
//! Allows other threads (asset loaders, network fetches in peripheral hacks)
//! to queue work that must run on the game's frame loop.
//! Tasks are processed at the start of every [`crate::Scheduler::frame`].

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

/// A task to execute on the frame loop
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Capacity of the task queue per frame
pub const QUEUE_CAPACITY: usize = 1024;

/// Why a task could not be queued
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    #[error("Task queue full, task dropped")]
    Full,

    #[error("Task queue disconnected")]
    Disconnected,
}

/// Cloneable handle for queueing tasks from any thread
#[derive(Clone)]
pub struct TaskSender {
    sender: Sender<Task>,
}

impl TaskSender {
    /// Queue a task to execute on the next frame
    pub fn queue_task<F>(&self, task: F) -> Result<(), QueueError>
    where
        F: FnOnce() + Send + 'static,
    {
        try_queue(&self.sender, Box::new(task))
    }
}

/// Task queue channels
pub struct TaskQueue {
    sender: Sender<Task>,
    receiver: Receiver<Task>,
    capacity: usize,
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::with_capacity(QUEUE_CAPACITY)
    }
}

fn try_queue(sender: &Sender<Task>, task: Task) -> Result<(), QueueError> {
    match sender.try_send(task) {
        Ok(()) => Ok(()),
        Err(TrySendError::Full(_)) => {
            tracing::warn!("Task queue full, dropping task");
            Err(QueueError::Full)
        }
        Err(TrySendError::Disconnected(_)) => {
            tracing::error!("Task queue disconnected");
            Err(QueueError::Disconnected)
        }
    }
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a queue holding at most `capacity` tasks
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Handle for queueing from other threads
    pub fn sender(&self) -> TaskSender {
        TaskSender {
            sender: self.sender.clone(),
        }
    }

    /// Queue a task to execute on the next frame
    ///
    /// This is safe to call from any thread.
    pub fn queue_task<F>(&self, task: F) -> Result<(), QueueError>
    where
        F: FnOnce() + Send + 'static,
    {
        try_queue(&self.sender, Box::new(task))
    }

    /// Queue a task, blocking if the queue is full
    ///
    /// # Warning
    /// Only call from background threads, never from the frame loop
    /// (would deadlock if the queue is full and waiting for a frame to process)
    pub fn queue_task_blocking<F>(&self, task: F) -> Result<(), QueueError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.sender.send(Box::new(task)).map_err(|e| {
            tracing::error!("Failed to queue task (blocking): {}", e);
            QueueError::Disconnected
        })
    }

    /// Process queued tasks
    ///
    /// Runs at most one queue's worth of tasks, so tasks queueing more tasks
    /// cannot starve the frame. Returns the number of tasks processed.
    pub fn process(&self) -> usize {
        let mut count = 0;

        while let Ok(task) = self.receiver.try_recv() {
            task();
            count += 1;

            if count >= self.capacity {
                break;
            }
        }

        count
    }

    /// Check how many tasks are currently queued
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_tasks_run_in_order() {
        let queue = TaskQueue::new();
        let log = Arc::new(parking_lot::Mutex::new(Vec::new()));

        for i in 0..3 {
            let log = log.clone();
            queue.queue_task(move || log.lock().push(i)).unwrap();
        }

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.process(), 3);
        assert_eq!(*log.lock(), vec![0, 1, 2]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_full_queue_drops_task() {
        let queue = TaskQueue::with_capacity(1);
        queue.queue_task(|| {}).unwrap();
        assert_eq!(queue.queue_task(|| {}), Err(QueueError::Full));
    }

    #[test]
    fn test_sender_from_other_thread() {
        let queue = TaskQueue::new();
        let sender = queue.sender();
        let count = Arc::new(AtomicUsize::new(0));

        let c = count.clone();
        std::thread::spawn(move || {
            sender
                .queue_task(move || {
                    c.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
        })
        .join()
        .unwrap();

        assert_eq!(queue.process(), 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
