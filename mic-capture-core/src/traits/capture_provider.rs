use std::sync::Arc;

use crate::models::config::CaptureConfig;
use crate::models::error::CaptureError;

/// Receiver for blocks produced by a `CaptureProvider`.
///
/// Implemented by the engine's dispatcher. Every method may be called from a
/// realtime thread the provider does not own, so implementations do only
/// bounded, non-blocking work and never panic back into the caller.
pub trait BlockSink: Send + Sync {
    /// Deliver one block of 16-bit LE PCM.
    fn push_block(&self, pcm: &[u8]);

    /// Deliver one block together with a level to report instead of the one
    /// computed from `pcm`.
    fn push_block_with_level(&self, pcm: &[u8], level: f32);

    /// Report a non-fatal stream condition (overrun, underrun, driver status).
    fn report_stream_warning(&self, message: &str);
}

/// Interface for a source of audio blocks.
///
/// Implemented by:
/// - `MockCapture` (synthetic silence, this crate)
/// - `CpalCapture` (microphone via cpal, `mic-capture-cpal`)
pub trait CaptureProvider: Send + Sync {
    /// Whether the underlying transport can be used at all.
    fn is_available(&self) -> bool;

    /// Open a stream in the configured format, delivering blocks to `sink`.
    ///
    /// Blocks may arrive on a thread the provider does not own. Open-time
    /// failures are the only errors a provider reports.
    fn open(&mut self, config: &CaptureConfig, sink: Arc<dyn BlockSink>) -> Result<(), CaptureError>;

    /// Stop the stream and release resources. No block is delivered after
    /// this returns. Calling it when not open is a no-op.
    fn close(&mut self) -> Result<(), CaptureError>;

    /// Human-readable name for logs.
    fn name(&self) -> String;
}
