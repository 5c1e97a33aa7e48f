/// Scheduler state definitions for the polling loop
///
/// The loop moves `Idle -> Running -> (Sleeping -> Running)* -> Stopped`.
use std::fmt;

/// Represents the current state of the polling scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchedulerState {
    /// Scheduler has been built but not started
    Idle,

    /// A scrape cycle is in progress
    Running,

    /// Waiting for the next interval tick
    Sleeping,

    /// Loop has ended (stop signal or fatal error)
    Stopped,
}

impl SchedulerState {
    /// Returns true if the scheduler can move from `self` to `next`
    ///
    /// `Stopped` is reachable from every live state, but nothing leaves it.
    pub fn can_transition_to(&self, next: SchedulerState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Running, Self::Sleeping)
                | (Self::Sleeping, Self::Running)
                | (Self::Idle, Self::Stopped)
                | (Self::Running, Self::Stopped)
                | (Self::Sleeping, Self::Stopped)
        )
    }

    /// Returns true if this is the terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped)
    }

    /// Returns the lowercase name used in log output
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Sleeping => "sleeping",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
