use serde::{Deserialize, Serialize};

/// An input device reported by a `DeviceCatalog`.
///
/// `index` is the device's position in the transport's full device list and
/// is what `CaptureConfig::device_index` selects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub index: usize,
    pub name: String,
    pub max_input_channels: u16,
    pub default_sample_rate: u32,
}

/// Counters for debugging a capture engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CaptureDiagnostics {
    /// Blocks handed to callbacks while running.
    pub blocks_dispatched: u64,
    /// Blocks that arrived while the engine was not running.
    pub blocks_dropped: u64,
    /// Callback invocations that panicked.
    pub callback_failures: u64,
    /// Non-fatal stream errors reported by the transport.
    pub stream_warnings: u64,
}
