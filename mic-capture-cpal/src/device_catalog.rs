//! Input device enumeration via cpal.
//!
//! Indices are positions in the host's full device list (inputs and outputs),
//! so they stay stable when used as `CaptureConfig::device_index`.

use cpal::traits::{DeviceTrait, HostTrait};

use mic_capture_core::models::audio_models::DeviceDescriptor;
use mic_capture_core::traits::device_catalog::DeviceCatalog;

/// Device catalog backed by the default cpal host.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpalDeviceCatalog;

impl DeviceCatalog for CpalDeviceCatalog {
    fn list_input_devices(&self) -> Vec<DeviceDescriptor> {
        list_input_devices(&cpal::default_host())
    }
}

/// List devices on `host` that report at least one input channel.
///
/// Returns an empty list if the host cannot enumerate devices.
pub fn list_input_devices(host: &cpal::Host) -> Vec<DeviceDescriptor> {
    let devices = match host.devices() {
        Ok(devices) => devices,
        Err(e) => {
            log::warn!("Failed to enumerate audio devices: {}", e);
            return Vec::new();
        }
    };

    devices
        .enumerate()
        .filter_map(|(index, device)| describe(index, &device))
        .collect()
}

/// Look up a device by its catalog index.
pub fn device_at(host: &cpal::Host, index: usize) -> Option<cpal::Device> {
    host.devices().ok()?.nth(index)
}

fn describe(index: usize, device: &cpal::Device) -> Option<DeviceDescriptor> {
    let max_input_channels = device
        .supported_input_configs()
        .ok()?
        .map(|range| range.channels())
        .max()
        .unwrap_or(0);
    if max_input_channels == 0 {
        return None;
    }

    let name = device
        .name()
        .unwrap_or_else(|_| format!("Device {}", index));
    let default_sample_rate = device
        .default_input_config()
        .map(|c| c.sample_rate().0)
        .unwrap_or(0);

    Some(DeviceDescriptor {
        index,
        name,
        max_input_channels,
        default_sample_rate,
    })
}
