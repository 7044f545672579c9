use thiserror::Error;

/// Errors that can occur during audio capture operations.
///
/// `DeviceUnavailable`, `FormatUnsupported` and `TransportError` are only
/// produced while opening a backend, never mid-stream. `CallbackFailure` is
/// never returned to a caller: it is logged and counted by the dispatcher.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("device not available: {0}")]
    DeviceUnavailable(String),

    #[error("format not supported: {0}")]
    FormatUnsupported(String),

    #[error("transport error: {0}")]
    TransportError(String),

    #[error("callback failed: {0}")]
    CallbackFailure(String),

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),
}
