//! Queue module: the in-memory task queue and its in-flight guard.

mod task_queue;

pub use task_queue::{InFlight, QueueSnapshot, TaskQueue};
