//! State module for tracking polling progress
//!
//! # Components
//!
//! - `SchedulerState`: Lifecycle of the polling loop (idle, running, sleeping, stopped)
//! - `CycleStatus`: Outcome of one scrape cycle (succeeded, failed)

mod cycle_status;
mod scheduler_state;

// Re-export main types
pub use cycle_status::CycleStatus;
pub use scheduler_state::SchedulerState;
