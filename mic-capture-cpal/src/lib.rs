//! # mic-capture-cpal
//!
//! cpal backend for mic-capture.
//!
//! Provides:
//! - `CpalCapture`: Microphone capture via the default cpal host
//! - `CpalDeviceCatalog`: Input device enumeration
//!
//! ## Usage
//! ```no_run
//! use mic_capture_core::{CaptureConfig, CaptureEngine};
//! use mic_capture_cpal::CpalCapture;
//!
//! let config = CaptureConfig::default().with_mock_fallback(true);
//! let mut engine = CaptureEngine::new(CpalCapture::new(), config);
//! engine.on_audio(|pcm: &[u8]| println!("{} bytes", pcm.len()));
//! engine.start().unwrap();
//! ```

pub mod block_accumulator;
pub mod cpal_input;
pub mod device_catalog;

pub use block_accumulator::BlockAccumulator;
pub use cpal_input::CpalCapture;
pub use device_catalog::CpalDeviceCatalog;
