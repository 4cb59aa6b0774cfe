use std::fmt;

/// Where a [`Registry`](super::Registry) is in its lifecycle
///
/// ```text
/// Unstarted → Starting → Running ─┐
///                  └──→ StartFailed ─┴→ ShuttingDown → ShutDown
/// Unstarted ───────────────────────────→ ShuttingDown
///                          ShutdownInterrupted ⇄ ShuttingDown
/// ```
///
/// A `start` that is cancelled or panics ends in `StartFailed`. A
/// `shutdown` that is cancelled ends in `ShutdownInterrupted`, from which the
/// next `shutdown` resumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LifecycleState {
    #[default]
    Unstarted,
    Starting,
    Running,
    StartFailed,
    ShuttingDown,
    ShutdownInterrupted,
    ShutDown,
}

impl LifecycleState {
    /// Whether `start` has been called at some point
    pub fn has_started(self) -> bool {
        !matches!(self, Self::Unstarted)
    }

    /// Whether shutdown has begun, finished or not
    pub fn is_shutting_down(self) -> bool {
        matches!(
            self,
            Self::ShuttingDown | Self::ShutdownInterrupted | Self::ShutDown
        )
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unstarted => "unstarted",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::StartFailed => "start-failed",
            Self::ShuttingDown => "shutting down",
            Self::ShutdownInterrupted => "shutdown-interrupted",
            Self::ShutDown => "shut down",
        };
        f.write_str(s)
    }
}
