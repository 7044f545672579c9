use std::fmt;

use super::error::CaptureError;

/// Which backend is producing blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Real,
    Mock,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Real => f.write_str("real"),
            Self::Mock => f.write_str("mock"),
        }
    }
}

/// Capture engine state machine.
///
/// State transitions:
/// ```text
/// idle → starting → running(real | mock) → stopping → idle
///            ↓
///         failed → starting (retry)
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureState {
    Idle,
    Starting,
    Running(BackendKind),
    Stopping,
    Failed(CaptureError),
}

impl CaptureState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// The active backend, if running.
    pub fn backend(&self) -> Option<BackendKind> {
        match self {
            Self::Running(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Short lowercase name, for logs and UI.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Running(_) => "running",
            Self::Stopping => "stopping",
            Self::Failed(_) => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_reports_backend() {
        let state = CaptureState::Running(BackendKind::Mock);
        assert!(state.is_running());
        assert_eq!(state.backend(), Some(BackendKind::Mock));
        assert_eq!(CaptureState::Idle.backend(), None);
    }

    #[test]
    fn failed_is_not_running() {
        let state = CaptureState::Failed(CaptureError::DeviceUnavailable("gone".into()));
        assert!(state.is_failed());
        assert!(!state.is_running());
        assert_eq!(state.name(), "failed");
    }
}
