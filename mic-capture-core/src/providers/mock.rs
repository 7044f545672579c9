//! Synthetic capture provider.
//!
//! Emits one block of silence per block period on its own thread, paired with
//! a small random level so UI meters show activity. Used when no microphone
//! can be opened and the caller allowed a fallback.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};

use crate::models::config::{CaptureConfig, DEFAULT_MOCK_STOP_TIMEOUT_MS};
use crate::models::error::CaptureError;
use crate::traits::capture_provider::{BlockSink, CaptureProvider};

/// Mock capture provider producing silent blocks with wall-clock pacing.
pub struct MockCapture {
    shutdown_tx: Option<Sender<()>>,
    exited_rx: Option<Receiver<()>>,
    handle: Option<thread::JoinHandle<()>>,
    stop_timeout: Duration,
}

impl MockCapture {
    pub fn new() -> Self {
        Self {
            shutdown_tx: None,
            exited_rx: None,
            handle: None,
            stop_timeout: Duration::from_millis(DEFAULT_MOCK_STOP_TIMEOUT_MS),
        }
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }
}

impl Default for MockCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureProvider for MockCapture {
    fn is_available(&self) -> bool {
        true
    }

    /// Only fails if already open or if the OS refuses to spawn a thread.
    fn open(&mut self, config: &CaptureConfig, sink: Arc<dyn BlockSink>) -> Result<(), CaptureError> {
        if self.is_open() {
            return Err(CaptureError::ConfigurationFailed(
                "mock capture already running".into(),
            ));
        }

        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
        let (exited_tx, exited_rx) = bounded::<()>(1);
        let period = config.block_duration();
        let block_bytes = config.block_bytes();
        let level_ceiling = config.mock_level_ceiling;

        let handle = thread::Builder::new()
            .name("mock-capture".into())
            .spawn(move || {
                // Dropped on exit, which disconnects the channel and tells
                // `close` the loop is done.
                let _exited = exited_tx;
                mock_loop(sink, shutdown_rx, period, block_bytes, level_ceiling);
            })
            .map_err(|e| CaptureError::TransportError(format!("failed to spawn mock thread: {}", e)))?;

        self.shutdown_tx = Some(shutdown_tx);
        self.exited_rx = Some(exited_rx);
        self.handle = Some(handle);
        self.stop_timeout = config.mock_stop_timeout();
        log::info!(
            "Mock capture started ({} bytes every {:?})",
            block_bytes,
            period
        );
        Ok(())
    }

    fn close(&mut self) -> Result<(), CaptureError> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };

        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.try_send(());
        }

        let exited = match self.exited_rx.take() {
            Some(rx) => !matches!(rx.recv_timeout(self.stop_timeout), Err(RecvTimeoutError::Timeout)),
            None => true,
        };

        if exited {
            if handle.join().is_err() {
                log::warn!("Mock capture thread panicked");
            }
        } else {
            log::warn!(
                "Mock capture thread did not exit within {:?}; detaching",
                self.stop_timeout
            );
        }
        Ok(())
    }

    fn name(&self) -> String {
        "Mock (silence)".into()
    }
}

impl Drop for MockCapture {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

fn mock_loop(
    sink: Arc<dyn BlockSink>,
    shutdown_rx: Receiver<()>,
    period: Duration,
    block_bytes: usize,
    level_ceiling: f32,
) {
    let silence = vec![0u8; block_bytes];

    loop {
        let started = Instant::now();

        let level = rand::random::<f32>() * level_ceiling;
        sink.push_block_with_level(&silence, level);

        let remaining = period.saturating_sub(started.elapsed());
        match shutdown_rx.recv_timeout(remaining) {
            Err(RecvTimeoutError::Timeout) => continue,
            // Shutdown requested or the provider was dropped.
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    log::debug!("Mock capture loop exited");
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        blocks: Mutex<Vec<(usize, bool, f32)>>,
    }

    impl BlockSink for RecordingSink {
        fn push_block(&self, pcm: &[u8]) {
            self.blocks
                .lock()
                .push((pcm.len(), pcm.iter().all(|&b| b == 0), 0.0));
        }

        fn push_block_with_level(&self, pcm: &[u8], level: f32) {
            self.blocks
                .lock()
                .push((pcm.len(), pcm.iter().all(|&b| b == 0), level));
        }

        fn report_stream_warning(&self, _message: &str) {}
    }

    #[test]
    fn emits_paced_silent_blocks() {
        let sink = Arc::new(RecordingSink::default());
        let mut mock = MockCapture::new();

        mock.open(&CaptureConfig::default(), sink.clone()).unwrap();
        thread::sleep(Duration::from_millis(1000));
        mock.close().unwrap();

        let blocks = sink.blocks.lock();
        assert!(
            (9..=11).contains(&blocks.len()),
            "expected ~10 blocks, got {}",
            blocks.len()
        );
        for &(len, silent, level) in blocks.iter() {
            assert_eq!(len, 3200);
            assert!(silent);
            assert!((0.0..0.1).contains(&level), "level {} out of range", level);
        }
    }

    #[test]
    fn close_stops_promptly_and_is_final() {
        let sink = Arc::new(RecordingSink::default());
        let mut mock = MockCapture::new();
        mock.open(&CaptureConfig::default(), sink.clone()).unwrap();
        thread::sleep(Duration::from_millis(150));

        let started = Instant::now();
        mock.close().unwrap();
        assert!(started.elapsed() < Duration::from_millis(500));
        assert!(!mock.is_open());

        let count = sink.blocks.lock().len();
        thread::sleep(Duration::from_millis(250));
        assert_eq!(sink.blocks.lock().len(), count);
    }

    #[test]
    fn close_when_not_open_is_noop() {
        let mut mock = MockCapture::new();
        assert!(mock.close().is_ok());
    }

    #[test]
    fn double_open_is_rejected() {
        let sink = Arc::new(RecordingSink::default());
        let mut mock = MockCapture::new();
        mock.open(&CaptureConfig::default(), sink.clone()).unwrap();
        assert!(mock.open(&CaptureConfig::default(), sink).is_err());
        mock.close().unwrap();
    }

    #[test]
    fn level_ceiling_is_configurable() {
        let sink = Arc::new(RecordingSink::default());
        let mut mock = MockCapture::new();
        let config = CaptureConfig {
            mock_level_ceiling: 0.0,
            ..Default::default()
        };
        mock.open(&config, sink.clone()).unwrap();
        thread::sleep(Duration::from_millis(50));
        mock.close().unwrap();

        assert!(sink.blocks.lock().iter().all(|&(_, _, level)| level == 0.0));
    }
}
