use crate::models::audio_models::DeviceDescriptor;

/// Lists the input devices a transport exposes.
pub trait DeviceCatalog: Send + Sync {
    /// Devices with at least one input channel.
    ///
    /// Queries the transport on every call. Returns an empty list when the
    /// transport is unavailable; never fails.
    fn list_input_devices(&self) -> Vec<DeviceDescriptor>;
}
