//! # Task System Core Traits
//!
//! This module defines the fundamental building blocks of the task system,
//! which provides a framework for executing work asynchronously across multiple threads.
//!
//! ## Core Components
//! - `Task`: Represents a unit of work that can be executed asynchronously
//! - `TaskResult`: Represents the result of a completed task
//!
//! ## Task Lifecycle
//! 1. A `Task` is created and scheduled via `TaskManager::publish_task()`
//! 2. The task's `process()` method is called on a worker thread
//! 3. The task returns a boxed `TaskResult`
//! 4. The result's `handle_result()` is called on the owning thread with the context `C`
//! 5. The result can spawn new tasks
//!
//! ## Thread Safety
//! - `Task` must be `Send` to be transferred between threads
//! - `TaskResult` must be `Send` to be transferred back to the owning thread
//! - The context `C` never crosses threads

/// A unit of work that can be executed on a worker thread.
///
/// Tasks should own all the data they need; they never see the context `C`.
pub trait Task<C>: Send {
    /// Processes the task and returns a result.
    ///
    /// Runs on a background thread. Should handle any errors internally and
    /// return an appropriate result.
    fn process(&self) -> Box<dyn TaskResult<C> + Send>;
}

/// The result of processing a `Task`, applied to the context on the owning thread.
pub trait TaskResult<C>: Send {
    /// Applies the result to `context`.
    ///
    /// # Returns
    /// New tasks to schedule (can be empty).
    fn handle_result(self: Box<Self>, context: &mut C) -> Vec<Box<dyn Task<C> + Send>>;
}
