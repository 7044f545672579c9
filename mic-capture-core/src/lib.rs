//! # mic-capture-core
//!
//! Platform-agnostic microphone capture core library.
//!
//! Delivers 16 kHz mono 16-bit PCM in fixed 100 ms blocks to a consumer
//! callback, with a per-block loudness level for UI meters. Real backends
//! (e.g. `mic-capture-cpal`) implement the `CaptureProvider` trait and plug
//! into the generic `CaptureEngine`; a synthetic `MockCapture` is built in as
//! an opt-in fallback.
//!
//! ## Architecture
//!
//! ```text
//! mic-capture-core (this crate)
//! ├── traits/       ← CaptureProvider, BlockSink, DeviceCatalog, CaptureDelegate
//! ├── models/       ← CaptureError, CaptureState, CaptureConfig, DeviceDescriptor
//! ├── processing/   ← LevelMeter
//! ├── providers/    ← MockCapture
//! └── session/      ← CaptureEngine, Dispatcher
//! ```

pub mod models;
pub mod processing;
pub mod providers;
pub mod session;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::audio_models::{CaptureDiagnostics, DeviceDescriptor};
pub use models::config::{CaptureConfig, SampleEncoding, BLOCK_SIZE, CHANNELS, SAMPLE_RATE};
pub use models::error::CaptureError;
pub use models::state::{BackendKind, CaptureState};
pub use processing::level_meter::{compute_level, LevelMeter};
pub use providers::mock::MockCapture;
pub use session::dispatch::{AudioCallback, Dispatcher, LevelCallback};
pub use session::engine::CaptureEngine;
pub use traits::capture_delegate::CaptureDelegate;
pub use traits::capture_provider::{BlockSink, CaptureProvider};
pub use traits::device_catalog::DeviceCatalog;
