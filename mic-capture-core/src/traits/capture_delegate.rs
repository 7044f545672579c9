use crate::models::state::CaptureState;

/// Event delegate for capture engine notifications.
///
/// Called from the thread driving `start`/`stop`, never from the audio thread.
pub trait CaptureDelegate: Send + Sync {
    /// Called on every engine state transition.
    fn on_state_changed(&self, state: &CaptureState);
}
