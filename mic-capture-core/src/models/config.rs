use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Sample rate every backend must deliver.
pub const SAMPLE_RATE: u32 = 16_000;

/// Mono.
pub const CHANNELS: u16 = 1;

/// Samples per block: 100 ms at 16 kHz.
pub const BLOCK_SIZE: usize = 1_600;

/// RMS value that maps to a level of 1.0. Chosen below i16 full scale so
/// ordinary speech moves the meter.
pub const DEFAULT_LEVEL_REFERENCE: f32 = 10_000.0;

/// Upper bound (exclusive) of the random level the mock backend reports.
pub const DEFAULT_MOCK_LEVEL_CEILING: f32 = 0.1;

/// How long `close` waits for the mock thread to exit.
pub const DEFAULT_MOCK_STOP_TIMEOUT_MS: u64 = 1_000;

/// PCM sample encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleEncoding {
    /// Signed 16-bit little-endian.
    I16Le,
}

impl SampleEncoding {
    pub fn bytes_per_sample(&self) -> usize {
        match self {
            Self::I16Le => 2,
        }
    }
}

/// Configuration for a capture engine.
///
/// The audio format fields are fixed; `validate` rejects anything else.
/// The engine holds its own copy, so a config is effectively immutable once
/// capture starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Sample rate in Hz (16000).
    pub sample_rate: u32,

    /// Channel count (1).
    pub channels: u16,

    /// Sample encoding (signed 16-bit LE).
    pub encoding: SampleEncoding,

    /// Samples per delivered block (1600).
    pub block_size: usize,

    /// Transport device index, or None for the system default input.
    pub device_index: Option<usize>,

    /// Fall back to the mock backend if the real one cannot be opened.
    pub allow_mock: bool,

    /// RMS amplitude that maps to level 1.0.
    pub level_reference: f32,

    /// Mock backend reports levels in `[0.0, mock_level_ceiling)`.
    pub mock_level_ceiling: f32,

    /// Bounded wait for the mock thread on close, in milliseconds.
    pub mock_stop_timeout_ms: u64,
}

impl CaptureConfig {
    pub fn with_device(mut self, index: Option<usize>) -> Self {
        self.device_index = index;
        self
    }

    pub fn with_mock_fallback(mut self, allow: bool) -> Self {
        self.allow_mock = allow;
        self
    }

    /// Size in bytes of one block.
    pub fn block_bytes(&self) -> usize {
        self.block_size * self.channels as usize * self.encoding.bytes_per_sample()
    }

    /// Nominal wall-clock length of one block.
    pub fn block_duration(&self) -> Duration {
        Duration::from_secs_f64(self.block_size as f64 / self.sample_rate as f64)
    }

    pub fn mock_stop_timeout(&self) -> Duration {
        Duration::from_millis(self.mock_stop_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate != SAMPLE_RATE {
            return Err(format!("unsupported sample rate: {}", self.sample_rate));
        }
        if self.channels != CHANNELS {
            return Err(format!("unsupported channel count: {}", self.channels));
        }
        if self.block_size != BLOCK_SIZE {
            return Err(format!("unsupported block size: {}", self.block_size));
        }
        if self.level_reference.is_nan() || self.level_reference <= 0.0 {
            return Err("level reference must be positive".into());
        }
        if !(0.0..=1.0).contains(&self.mock_level_ceiling) {
            return Err(format!(
                "mock level ceiling out of range: {}",
                self.mock_level_ceiling
            ));
        }
        Ok(())
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            channels: CHANNELS,
            encoding: SampleEncoding::I16Le,
            block_size: BLOCK_SIZE,
            device_index: None,
            allow_mock: false,
            level_reference: DEFAULT_LEVEL_REFERENCE,
            mock_level_ceiling: DEFAULT_MOCK_LEVEL_CEILING,
            mock_stop_timeout_ms: DEFAULT_MOCK_STOP_TIMEOUT_MS,
        }
    }
}
