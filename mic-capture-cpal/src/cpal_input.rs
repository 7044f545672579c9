//! cpal microphone capture provider.
//!
//! Opens an input stream at 16 kHz mono (i16 preferred, f32 accepted and
//! converted) and delivers exact 1600-sample blocks via the `BlockSink`.

use std::sync::Arc;
use std::thread;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{
    BufferSize, BuildStreamError, PlayStreamError, SampleFormat, StreamConfig,
    SupportedBufferSize, SupportedStreamConfigsError,
};
use crossbeam_channel::{bounded, Sender};

use mic_capture_core::models::audio_models::DeviceDescriptor;
use mic_capture_core::models::config::CaptureConfig;
use mic_capture_core::models::error::CaptureError;
use mic_capture_core::traits::capture_provider::{BlockSink, CaptureProvider};
use mic_capture_core::traits::device_catalog::DeviceCatalog;

use crate::block_accumulator::{f32_to_i16, BlockAccumulator};
use crate::device_catalog;

/// Stream-owner thread for an open input stream.
///
/// cpal streams are not `Send` on every platform, so the stream is built,
/// played and dropped on this thread; the provider only holds the handle.
struct InputWorker {
    shutdown_tx: Sender<()>,
    handle: thread::JoinHandle<()>,
}

/// Microphone capture through the default cpal host.
pub struct CpalCapture {
    device_name: Option<String>,
    worker: Option<InputWorker>,
}

impl CpalCapture {
    pub fn new() -> Self {
        Self {
            device_name: None,
            worker: None,
        }
    }

    /// Name of the device opened by the last successful `open`.
    pub fn device_name(&self) -> Option<String> {
        self.device_name.clone()
    }
}

impl Default for CpalCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureProvider for CpalCapture {
    fn is_available(&self) -> bool {
        cpal::default_host()
            .input_devices()
            .map(|mut devices| devices.next().is_some())
            .unwrap_or(false)
    }

    fn open(&mut self, config: &CaptureConfig, sink: Arc<dyn BlockSink>) -> Result<(), CaptureError> {
        if self.worker.is_some() {
            return Err(CaptureError::ConfigurationFailed(
                "cpal capture already running".into(),
            ));
        }

        let (ready_tx, ready_rx) = bounded::<Result<String, CaptureError>>(1);
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
        let config = config.clone();

        let handle = thread::Builder::new()
            .name("cpal-input".into())
            .spawn(move || {
                let (stream, name) = match open_stream(&config, sink) {
                    Ok(opened) => opened,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(name));

                // Park until close() signals or the provider is dropped.
                let _ = shutdown_rx.recv();

                if let Err(e) = stream.pause() {
                    log::warn!("Failed to pause input stream: {}", e);
                }
                drop(stream);
            })
            .map_err(|e| CaptureError::TransportError(format!("failed to spawn input thread: {}", e)))?;

        match ready_rx.recv() {
            Ok(Ok(name)) => {
                log::info!("Using audio input device: {}", name);
                self.device_name = Some(name);
                self.worker = Some(InputWorker {
                    shutdown_tx,
                    handle,
                });
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                let _ = handle.join();
                Err(CaptureError::TransportError(
                    "input thread exited before the stream opened".into(),
                ))
            }
        }
    }

    fn close(&mut self) -> Result<(), CaptureError> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        let _ = worker.shutdown_tx.send(());
        worker
            .handle
            .join()
            .map_err(|_| CaptureError::TransportError("input thread panicked".into()))
    }

    fn name(&self) -> String {
        match self.device_name() {
            Some(name) => format!("cpal ({})", name),
            None => "cpal".into(),
        }
    }
}

impl DeviceCatalog for CpalCapture {
    fn list_input_devices(&self) -> Vec<DeviceDescriptor> {
        device_catalog::list_input_devices(&cpal::default_host())
    }
}

impl Drop for CpalCapture {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// Resolve the device, negotiate the format, build and start the stream.
fn open_stream(
    config: &CaptureConfig,
    sink: Arc<dyn BlockSink>,
) -> Result<(cpal::Stream, String), CaptureError> {
    let host = cpal::default_host();
    let device = match config.device_index {
        Some(index) => device_catalog::device_at(&host, index).ok_or_else(|| {
            CaptureError::DeviceUnavailable(format!("no audio device at index {}", index))
        })?,
        None => host
            .default_input_device()
            .ok_or_else(|| CaptureError::DeviceUnavailable("no default input device".into()))?,
    };
    let name = device
        .name()
        .unwrap_or_else(|_| "Unknown Device".to_string());

    let (stream_config, format) = negotiate_format(&device, config)?;
    log::debug!(
        "Input stream config: {} Hz, {} ch, {:?}, buffer {:?}",
        stream_config.sample_rate.0,
        stream_config.channels,
        format,
        stream_config.buffer_size
    );

    let stream = build_stream(&device, &stream_config, format, config.block_size, sink)?;
    stream.play().map_err(map_play_error)?;
    Ok((stream, name))
}

/// Pick a supported input config matching the fixed capture format.
fn negotiate_format(
    device: &cpal::Device,
    config: &CaptureConfig,
) -> Result<(StreamConfig, SampleFormat), CaptureError> {
    let ranges: Vec<_> = device
        .supported_input_configs()
        .map_err(map_configs_error)?
        .collect();

    let rate = config.sample_rate;
    let range = [SampleFormat::I16, SampleFormat::F32]
        .into_iter()
        .find_map(|format| {
            ranges.iter().find(|r| {
                r.channels() == config.channels
                    && r.sample_format() == format
                    && r.min_sample_rate().0 <= rate
                    && rate <= r.max_sample_rate().0
            })
        })
        .ok_or_else(|| {
            CaptureError::FormatUnsupported(format!(
                "device offers no {} Hz, {}-channel i16/f32 input",
                rate, config.channels
            ))
        })?;

    let block = config.block_size as u32;
    let buffer_size = match range.buffer_size() {
        SupportedBufferSize::Range { min, max } if (*min..=*max).contains(&block) => {
            BufferSize::Fixed(block)
        }
        _ => BufferSize::Default,
    };

    let stream_config = StreamConfig {
        channels: config.channels,
        sample_rate: cpal::SampleRate(rate),
        buffer_size,
    };
    Ok((stream_config, range.sample_format()))
}

fn build_stream(
    device: &cpal::Device,
    stream_config: &StreamConfig,
    format: SampleFormat,
    block_size: usize,
    sink: Arc<dyn BlockSink>,
) -> Result<cpal::Stream, CaptureError> {
    let status_sink = Arc::clone(&sink);
    let err_fn = move |err: cpal::StreamError| status_sink.report_stream_warning(&err.to_string());
    let mut accumulator = BlockAccumulator::new(block_size);

    let stream = match format {
        SampleFormat::I16 => device.build_input_stream(
            stream_config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                accumulator.push(data.iter().copied(), |block| sink.push_block(block));
            },
            err_fn,
            None,
        ),
        SampleFormat::F32 => device.build_input_stream(
            stream_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                accumulator.push(data.iter().map(|&s| f32_to_i16(s)), |block| {
                    sink.push_block(block)
                });
            },
            err_fn,
            None,
        ),
        other => {
            return Err(CaptureError::FormatUnsupported(format!(
                "unsupported sample format: {:?}",
                other
            )))
        }
    };

    stream.map_err(map_build_error)
}

pub(crate) fn map_build_error(err: BuildStreamError) -> CaptureError {
    match err {
        BuildStreamError::DeviceNotAvailable => {
            CaptureError::DeviceUnavailable(err.to_string())
        }
        BuildStreamError::StreamConfigNotSupported | BuildStreamError::InvalidArgument => {
            CaptureError::FormatUnsupported(err.to_string())
        }
        other => CaptureError::TransportError(other.to_string()),
    }
}

pub(crate) fn map_play_error(err: PlayStreamError) -> CaptureError {
    match err {
        PlayStreamError::DeviceNotAvailable => CaptureError::DeviceUnavailable(err.to_string()),
        other => CaptureError::TransportError(other.to_string()),
    }
}

pub(crate) fn map_configs_error(err: SupportedStreamConfigsError) -> CaptureError {
    match err {
        SupportedStreamConfigsError::DeviceNotAvailable => {
            CaptureError::DeviceUnavailable(err.to_string())
        }
        SupportedStreamConfigsError::InvalidArgument => {
            CaptureError::FormatUnsupported(err.to_string())
        }
        other => CaptureError::TransportError(other.to_string()),
    }
}
