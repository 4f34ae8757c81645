//! State module for tracking per-node crawl progress
//!
//! # Components
//!
//! - `TaskState`: where a single crawl task is in its lifecycle
//! - `NodeOutcome`: how a task that reached `Done` (or gave up) ended

mod outcome;
mod task_state;

// Re-export main types
pub use outcome::NodeOutcome;
pub use task_state::TaskState;
