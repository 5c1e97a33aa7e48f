use std::fmt;

/// Outcome of a single fetch-parse-emit pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CycleStatus {
    /// Items were parsed and handed to the emitter
    Succeeded,

    /// Fetch, parse or emit failed; nothing was published
    Failed,
}

impl CycleStatus {
    /// Returns true if this represents a successful cycle
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for CycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_success() {
        assert!(CycleStatus::Succeeded.is_success());
        assert!(!CycleStatus::Failed.is_success());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", CycleStatus::Succeeded), "succeeded");
        assert_eq!(format!("{}", CycleStatus::Failed), "failed");
    }
}
