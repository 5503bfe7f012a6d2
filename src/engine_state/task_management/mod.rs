//! # Task Management System
//!
//! This module provides a small task management system for executing work on a
//! pool of worker threads and applying the results back on the owning thread.
//!
//! ## Architecture Overview
//!
//! - `TaskManager<C>`: Central coordinator for task distribution and worker management
//! - `Task<C>`: A unit of work that can be executed asynchronously
//! - `TaskResult<C>`: The result of a completed task, applied to a context `C`
//! - `TaskChannel<C>`: Communication channel between the owning thread and one worker
//!
//! Every worker owns a dedicated pair of `std::sync::mpsc` channels. Tasks are
//! distributed round-robin with at most `MAX_TASKS_IN_FLIGHT` per worker; the rest
//! wait in a FIFO queue.
//!
//! ## Task Lifecycle
//! 1. Tasks are published via `TaskManager::publish_task()`
//! 2. The manager sends them to available workers, or queues them
//! 3. Workers call `Task::process` and send back the result
//! 4. `process_completed_tasks(context)` applies results on the owning thread
//! 5. Results can spawn new tasks, which are published in turn
//!
//! ## Example Usage
//! ```
//! use octacubic::engine_state::task_management::{
//!     task::{Task, TaskResult},
//!     TaskManager,
//! };
//!
//! struct Square(u64);
//! struct Squared(u64);
//!
//! impl Task<Vec<u64>> for Square {
//!     fn process(&self) -> Box<dyn TaskResult<Vec<u64>> + Send> {
//!         Box::new(Squared(self.0 * self.0))
//!     }
//! }
//!
//! impl TaskResult<Vec<u64>> for Squared {
//!     fn handle_result(self: Box<Self>, out: &mut Vec<u64>) -> Vec<Box<dyn Task<Vec<u64>> + Send>> {
//!         out.push(self.0);
//!         Vec::new()
//!     }
//! }
//!
//! let mut task_manager: TaskManager<Vec<u64>> = TaskManager::new(2);
//! for i in 1..=4 {
//!     task_manager.publish_task(Box::new(Square(i)));
//! }
//!
//! let mut out = Vec::new();
//! task_manager.wait_for_all(&mut out);
//! out.sort();
//! assert_eq!(out, vec![1, 4, 9, 16]);
//! ```

pub mod task;

use std::collections::VecDeque;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{self, JoinHandle};

use log::{info, warn};
use task::{Task, TaskResult};

/// A communication channel between the owning thread and a worker thread.
///
/// # Fields
/// - `task_sender`: Sends tasks from the owning thread to the worker
/// - `result_receiver`: Receives task results from the worker
/// - `num_tasks_in_flight`: Tracks number of tasks currently being processed
/// - `_worker`: Handle to the worker thread; the worker exits once `task_sender` is dropped
pub struct TaskChannel<C> {
    task_sender: Sender<Box<dyn Task<C> + Send>>,
    result_receiver: Receiver<Box<dyn TaskResult<C> + Send>>,
    num_tasks_in_flight: usize,
    _worker: JoinHandle<()>,
}

/// Manages a pool of worker threads and coordinates task execution.
///
/// # Fields
/// - `channels`: Set of active worker channels
/// - `queued_tasks`: Tasks waiting for an available worker
/// - `current_channel`: Index for round-robin scheduling
pub struct TaskManager<C> {
    channels: Vec<TaskChannel<C>>,
    queued_tasks: VecDeque<Box<dyn Task<C> + Send>>,
    current_channel: usize,
}

/// Maximum number of tasks that can be in flight per worker channel.
///
/// This is set to 1 to ensure tasks are processed in order within each channel.
pub const MAX_TASKS_IN_FLIGHT: usize = 1;

impl<C: 'static> TaskManager<C> {
    /// Creates a new `TaskManager` with the specified number of worker threads.
    pub fn new(num_workers: usize) -> Self {
        let mut channels = Vec::with_capacity(num_workers);

        info!(
            "Starting {} workers, available parallelism: {:?}",
            num_workers,
            thread::available_parallelism()
        );

        for _ in 0..num_workers {
            let (task_tx, task_rx) = channel::<Box<dyn Task<C> + Send>>();
            let (result_tx, result_rx) = channel::<Box<dyn TaskResult<C> + Send>>();

            let worker = thread::spawn(move || {
                while let Ok(task) = task_rx.recv() {
                    let result = task.process();
                    if result_tx.send(result).is_err() {
                        break;
                    }
                }
            });

            channels.push(TaskChannel {
                task_sender: task_tx,
                result_receiver: result_rx,
                num_tasks_in_flight: 0,
                _worker: worker,
            });
        }

        TaskManager {
            channels,
            queued_tasks: VecDeque::new(),
            current_channel: 0,
        }
    }

    /// Number of worker threads.
    pub fn num_workers(&self) -> usize {
        self.channels.len()
    }

    /// Tasks queued or in flight.
    pub fn pending_tasks(&self) -> usize {
        self.queued_tasks.len()
            + self
                .channels
                .iter()
                .map(|channel| channel.num_tasks_in_flight)
                .sum::<usize>()
    }

    /// Attempts to send a task to a specific worker channel.
    ///
    /// # Returns
    /// - `Ok(())` if the task was sent; the in-flight counter is incremented
    /// - `Err(task)` if the worker disconnected, handing the task back for requeueing
    fn try_send_task(
        &mut self,
        task: Box<dyn Task<C> + Send>,
        channel_idx: usize,
    ) -> Result<(), Box<dyn Task<C> + Send>> {
        match self.channels[channel_idx].task_sender.send(task) {
            Ok(_) => {
                self.channels[channel_idx].num_tasks_in_flight += 1;
                Ok(())
            }
            Err(task) => Err(task.0),
        }
    }

    /// Finds an available worker channel, round-robin from the last used one.
    fn find_available_channel(&self) -> Option<usize> {
        if self.channels.is_empty() {
            return None;
        }

        let start_channel = self.current_channel;
        let mut current = start_channel;

        loop {
            if self.channels[current].num_tasks_in_flight < MAX_TASKS_IN_FLIGHT {
                return Some(current);
            }
            current = (current + 1) % self.channels.len();
            if current == start_channel {
                return None;
            }
        }
    }

    /// Publishes a new task for execution.
    ///
    /// # Returns
    /// - `true` if the task was immediately sent to a worker
    /// - `false` if the task was queued because all workers are busy
    pub fn publish_task(&mut self, task: Box<dyn Task<C> + Send>) -> bool {
        match self.find_available_channel() {
            Some(channel_idx) => match self.try_send_task(task, channel_idx) {
                Ok(_) => {
                    self.current_channel = (channel_idx + 1) % self.channels.len();
                    true
                }
                Err(task) => {
                    warn!("Worker {} disconnected, queueing task", channel_idx);
                    self.queued_tasks.push_back(task);
                    false
                }
            },
            None => {
                self.queued_tasks.push_back(task);
                false
            }
        }
    }

    /// Sends queued tasks to workers until the queue is empty or every worker is busy.
    pub fn process_queued_tasks(&mut self) {
        while let Some(channel_idx) = self.find_available_channel() {
            let Some(task) = self.queued_tasks.pop_front() else {
                return;
            };
            match self.try_send_task(task, channel_idx) {
                Ok(_) => self.current_channel = (channel_idx + 1) % self.channels.len(),
                Err(task) => {
                    self.queued_tasks.push_front(task);
                    return;
                }
            }
        }
    }

    /// Applies every result that has arrived so far to `context`, without blocking.
    ///
    /// Tasks spawned by the results are published afterwards.
    ///
    /// # Returns
    /// The number of results applied.
    pub fn process_completed_tasks(&mut self, context: &mut C) -> usize {
        let mut tasks_to_queue = Vec::new();
        let mut handled = 0;

        for channel in &mut self.channels {
            while let Ok(result) = channel.result_receiver.try_recv() {
                channel.num_tasks_in_flight -= 1;
                tasks_to_queue.extend(result.handle_result(context));
                handled += 1;
            }
        }

        for task in tasks_to_queue {
            self.publish_task(task);
        }

        handled
    }

    /// Blocks until every queued and in-flight task has completed, applying each
    /// result to `context`.
    pub fn wait_for_all(&mut self, context: &mut C) {
        loop {
            self.process_queued_tasks();

            let mut tasks_to_queue = Vec::new();
            let mut waited = false;
            for channel in &mut self.channels {
                while channel.num_tasks_in_flight > 0 {
                    waited = true;
                    match channel.result_receiver.recv() {
                        Ok(result) => {
                            channel.num_tasks_in_flight -= 1;
                            tasks_to_queue.extend(result.handle_result(context));
                        }
                        Err(_) => {
                            warn!("Worker exited with {} tasks in flight", channel.num_tasks_in_flight);
                            channel.num_tasks_in_flight = 0;
                        }
                    }
                }
            }

            for task in tasks_to_queue {
                self.publish_task(task);
            }

            if !waited {
                // Nothing was in flight after dispatching, so no worker can take the queue.
                if !self.queued_tasks.is_empty() {
                    warn!("Dropping {} queued tasks, no workers left", self.queued_tasks.len());
                    self.queued_tasks.clear();
                }
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Push(u32);
    struct Pushed(u32);

    impl Task<Vec<u32>> for Push {
        fn process(&self) -> Box<dyn TaskResult<Vec<u32>> + Send> {
            Box::new(Pushed(self.0))
        }
    }

    impl TaskResult<Vec<u32>> for Pushed {
        fn handle_result(self: Box<Self>, out: &mut Vec<u32>) -> Vec<Box<dyn Task<Vec<u32>> + Send>> {
            out.push(self.0);
            // Values above 100 spawn one follow-up task.
            if self.0 > 100 {
                vec![Box::new(Push(self.0 - 100))]
            } else {
                Vec::new()
            }
        }
    }

    #[test]
    fn test_all_tasks_complete_and_spawn_follow_ups() {
        let mut task_manager: TaskManager<Vec<u32>> = TaskManager::new(3);
        for i in 0..10 {
            task_manager.publish_task(Box::new(Push(i)));
        }
        task_manager.publish_task(Box::new(Push(150)));
        assert!(task_manager.pending_tasks() > 0);

        let mut out = Vec::new();
        task_manager.wait_for_all(&mut out);
        out.sort();

        assert_eq!(out, vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 50, 150]);
        assert_eq!(task_manager.pending_tasks(), 0);
    }

    #[test]
    fn test_in_flight_is_bounded_per_worker() {
        let mut task_manager: TaskManager<Vec<u32>> = TaskManager::new(2);
        let sent: Vec<bool> = (0..5)
            .map(|i| task_manager.publish_task(Box::new(Push(i))))
            .collect();

        assert_eq!(sent, vec![true, true, false, false, false]);
        assert_eq!(task_manager.pending_tasks(), 5);

        let mut out = Vec::new();
        task_manager.wait_for_all(&mut out);
        assert_eq!(out.len(), 5);
    }

    #[test]
    fn test_zero_workers_keeps_tasks_queued() {
        let mut task_manager: TaskManager<Vec<u32>> = TaskManager::new(0);
        assert!(!task_manager.publish_task(Box::new(Push(1))));

        let mut out = Vec::new();
        assert_eq!(task_manager.process_completed_tasks(&mut out), 0);
        task_manager.wait_for_all(&mut out);
        assert!(out.is_empty());
        assert_eq!(task_manager.pending_tasks(), 0);
    }
}
