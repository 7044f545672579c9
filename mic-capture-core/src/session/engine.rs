use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::audio_models::{CaptureDiagnostics, DeviceDescriptor};
use crate::models::config::CaptureConfig;
use crate::models::error::CaptureError;
use crate::models::state::{BackendKind, CaptureState};
use crate::providers::mock::MockCapture;
use crate::session::dispatch::Dispatcher;
use crate::traits::capture_delegate::CaptureDelegate;
use crate::traits::capture_provider::{BlockSink, CaptureProvider};
use crate::traits::device_catalog::DeviceCatalog;

/// Microphone capture orchestrator.
///
/// Generic over the real backend via the `CaptureProvider` trait; the mock
/// backend is built in and only used when the real one fails to open and the
/// config allows it. At most one backend is open at a time.
///
/// ```text
/// [Real Provider] ─┐
///                  ├→ [Dispatcher] → level meter → on_level
/// [MockCapture] ───┘               └→ on_audio
/// ```
pub struct CaptureEngine<R: CaptureProvider> {
    real: R,
    mock: MockCapture,
    config: CaptureConfig,
    state: Mutex<CaptureState>,
    dispatcher: Arc<Dispatcher>,
    delegate: Option<Arc<dyn CaptureDelegate>>,
}

impl<R: CaptureProvider> CaptureEngine<R> {
    pub fn new(real: R, config: CaptureConfig) -> Self {
        let dispatcher = Arc::new(Dispatcher::new());
        dispatcher.set_level_reference(config.level_reference);
        Self {
            real,
            mock: MockCapture::new(),
            config,
            state: Mutex::new(CaptureState::Idle),
            dispatcher,
            delegate: None,
        }
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn CaptureDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn state(&self) -> CaptureState {
        self.state.lock().clone()
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().is_running()
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    pub fn diagnostics(&self) -> CaptureDiagnostics {
        self.dispatcher.diagnostics()
    }

    /// The real backend, e.g. to inspect the device it opened.
    pub fn real_provider(&self) -> &R {
        &self.real
    }

    /// Replace the configuration. Only allowed while idle or failed.
    pub fn configure(&mut self, config: CaptureConfig) -> Result<(), CaptureError> {
        {
            let state = self.state.lock();
            if !state.is_idle() && !state.is_failed() {
                return Err(CaptureError::ConfigurationFailed(
                    "can only configure while idle".into(),
                ));
            }
        }
        config.validate().map_err(CaptureError::ConfigurationFailed)?;
        self.dispatcher.set_level_reference(config.level_reference);
        self.config = config;
        Ok(())
    }

    /// Register the consumer for raw blocks, replacing any previous one.
    ///
    /// Takes effect from the next block when called while running.
    pub fn on_audio<F>(&self, callback: F)
    where
        F: Fn(&[u8]) + Send + Sync + 'static,
    {
        self.dispatcher.set_audio_callback(Some(Arc::new(callback)));
    }

    /// Register the consumer for block levels, replacing any previous one.
    pub fn on_level<F>(&self, callback: F)
    where
        F: Fn(f32) + Send + Sync + 'static,
    {
        self.dispatcher.set_level_callback(Some(Arc::new(callback)));
    }

    pub fn clear_callbacks(&self) {
        self.dispatcher.set_audio_callback(None);
        self.dispatcher.set_level_callback(None);
    }

    /// Start capture. Transitions: idle/failed → starting → running.
    ///
    /// Tries the real backend first and falls back to the mock backend only if
    /// `allow_mock` is set. Returns the backend in use. Calling this while
    /// already running returns the active backend without reopening.
    pub fn start(&mut self) -> Result<BackendKind, CaptureError> {
        {
            let state = self.state.lock();
            if let Some(kind) = state.backend() {
                return Ok(kind);
            }
        }

        if let Err(e) = self.config.validate() {
            let error = CaptureError::ConfigurationFailed(e);
            self.set_state(CaptureState::Failed(error.clone()));
            return Err(error);
        }

        self.set_state(CaptureState::Starting);

        // Mark running before opening so the first block is not dropped.
        self.dispatcher.set_running(true);
        let sink: Arc<dyn BlockSink> = self.dispatcher.clone();

        let real_result = if self.real.is_available() {
            self.real.open(&self.config, Arc::clone(&sink))
        } else {
            Err(CaptureError::TransportError(format!(
                "{} is not available",
                self.real.name()
            )))
        };

        let error = match real_result {
            Ok(()) => {
                log::info!("Audio capture started on {}", self.real.name());
                self.set_state(CaptureState::Running(BackendKind::Real));
                return Ok(BackendKind::Real);
            }
            Err(e) => e,
        };

        log::error!("Failed to start audio capture: {}", error);

        if self.config.allow_mock {
            log::warn!("Falling back to simulated audio (mock mode)");
            match self.mock.open(&self.config, sink) {
                Ok(()) => {
                    self.set_state(CaptureState::Running(BackendKind::Mock));
                    return Ok(BackendKind::Mock);
                }
                Err(mock_error) => {
                    log::error!("Mock capture failed to start: {}", mock_error);
                }
            }
        }

        self.dispatcher.set_running(false);
        self.set_state(CaptureState::Failed(error.clone()));
        Err(error)
    }

    /// Stop capture. Transitions: running → stopping → idle.
    ///
    /// Never fails: teardown errors are logged. A no-op unless running.
    /// Once this returns no callback fires until the next `start`.
    pub fn stop(&mut self) {
        let active = {
            let state = self.state.lock();
            match state.backend() {
                Some(kind) => kind,
                None => return,
            }
        };

        self.set_state(CaptureState::Stopping);
        self.dispatcher.set_running(false);

        let result = match active {
            BackendKind::Real => self.real.close(),
            BackendKind::Mock => self.mock.close(),
        };
        if let Err(e) = result {
            log::warn!("Error closing {} backend: {}", active, e);
        }

        log::info!("Audio capture stopped");
        self.set_state(CaptureState::Idle);
    }

    fn set_state(&self, new_state: CaptureState) {
        {
            let mut s = self.state.lock();
            *s = new_state.clone();
        }
        if let Some(ref delegate) = self.delegate {
            delegate.on_state_changed(&new_state);
        }
    }
}

impl<R: CaptureProvider + DeviceCatalog> CaptureEngine<R> {
    /// Input devices exposed by the real backend's transport.
    pub fn list_devices(&self) -> Vec<DeviceDescriptor> {
        self.real.list_input_devices()
    }
}

impl<R: CaptureProvider> Drop for CaptureEngine<R> {
    fn drop(&mut self) {
        self.stop();
    }
}
