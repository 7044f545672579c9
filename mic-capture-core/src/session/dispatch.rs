use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::models::audio_models::CaptureDiagnostics;
use crate::models::config::DEFAULT_LEVEL_REFERENCE;
use crate::models::error::CaptureError;
use crate::processing::level_meter::LevelMeter;
use crate::traits::capture_provider::BlockSink;

/// Consumer callback for raw blocks (16-bit LE PCM, mono, 16 kHz).
///
/// The slice is only valid for the duration of the call.
pub type AudioCallback = Arc<dyn Fn(&[u8]) + Send + Sync + 'static>;

/// Consumer callback for block levels in `[0.0, 1.0]`.
pub type LevelCallback = Arc<dyn Fn(f32) + Send + Sync + 'static>;

/// Fans each block out to the level meter and the registered callbacks.
///
/// Shared between the engine (which flips `running` and swaps callbacks) and
/// whichever backend is producing blocks. Callback slots are replaced under a
/// short write lock; the producer only holds the read lock long enough to
/// clone the `Arc`, so a callback never runs with a lock held.
///
/// Every callback runs inside a panic boundary: a panicking consumer is
/// logged as a `CallbackFailure` and the next block is dispatched as usual.
pub struct Dispatcher {
    running: AtomicBool,
    level_reference: AtomicU32,
    audio_callback: RwLock<Option<AudioCallback>>,
    level_callback: RwLock<Option<LevelCallback>>,

    blocks_dispatched: AtomicU64,
    blocks_dropped: AtomicU64,
    callback_failures: AtomicU64,
    stream_warnings: AtomicU64,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            level_reference: AtomicU32::new(DEFAULT_LEVEL_REFERENCE.to_bits()),
            audio_callback: RwLock::new(None),
            level_callback: RwLock::new(None),
            blocks_dispatched: AtomicU64::new(0),
            blocks_dropped: AtomicU64::new(0),
            callback_failures: AtomicU64::new(0),
            stream_warnings: AtomicU64::new(0),
        }
    }

    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn set_level_reference(&self, reference: f32) {
        self.level_reference.store(reference.to_bits(), Ordering::Relaxed);
    }

    pub fn set_audio_callback(&self, callback: Option<AudioCallback>) {
        *self.audio_callback.write() = callback;
    }

    pub fn set_level_callback(&self, callback: Option<LevelCallback>) {
        *self.level_callback.write() = callback;
    }

    pub fn diagnostics(&self) -> CaptureDiagnostics {
        CaptureDiagnostics {
            blocks_dispatched: self.blocks_dispatched.load(Ordering::Relaxed),
            blocks_dropped: self.blocks_dropped.load(Ordering::Relaxed),
            callback_failures: self.callback_failures.load(Ordering::Relaxed),
            stream_warnings: self.stream_warnings.load(Ordering::Relaxed),
        }
    }

    /// Dispatch one block. `level` overrides the computed level when set.
    ///
    /// `running` is checked before each callback: a slow level callback can
    /// outlast `stop`, and the rest of that block must then be dropped.
    pub fn dispatch(&self, pcm: &[u8], level: Option<f32>) {
        if !self.is_running() {
            self.blocks_dropped.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let level_callback = self.level_callback.read().clone();
        if let Some(callback) = level_callback {
            let value = match level {
                Some(v) => v.clamp(0.0, 1.0),
                None => self.meter().compute_level(pcm),
            };
            self.isolate("level", || callback(value));
        }

        if !self.is_running() {
            self.blocks_dropped.fetch_add(1, Ordering::Relaxed);
            return;
        }

        let audio_callback = self.audio_callback.read().clone();
        if let Some(callback) = audio_callback {
            self.isolate("audio", || callback(pcm));
        }

        self.blocks_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    fn meter(&self) -> LevelMeter {
        LevelMeter::new(f32::from_bits(self.level_reference.load(Ordering::Relaxed)))
    }

    fn isolate<F: FnOnce()>(&self, kind: &str, f: F) {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(f)) {
            self.callback_failures.fetch_add(1, Ordering::Relaxed);
            let error = CaptureError::CallbackFailure(format!(
                "{} callback panicked: {}",
                kind,
                panic_message(payload.as_ref())
            ));
            log::error!("{}", error);
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockSink for Dispatcher {
    fn push_block(&self, pcm: &[u8]) {
        self.dispatch(pcm, None);
    }

    fn push_block_with_level(&self, pcm: &[u8], level: f32) {
        self.dispatch(pcm, Some(level));
    }

    fn report_stream_warning(&self, message: &str) {
        self.stream_warnings.fetch_add(1, Ordering::Relaxed);
        log::warn!("Audio stream status: {}", message);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".into()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use parking_lot::Mutex;

    use super::*;

    fn loud_block() -> Vec<u8> {
        5000i16.to_le_bytes().repeat(1600)
    }

    #[test]
    fn drops_blocks_when_not_running() {
        let dispatcher = Dispatcher::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        dispatcher.set_audio_callback(Some(Arc::new(move |_: &[u8]| {
            c.fetch_add(1, Ordering::SeqCst);
        })));

        dispatcher.push_block(&[0u8; 3200]);

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(dispatcher.diagnostics().blocks_dropped, 1);
    }

    #[test]
    fn delivers_level_and_audio() {
        let dispatcher = Dispatcher::new();
        dispatcher.set_running(true);

        let levels = Arc::new(Mutex::new(Vec::new()));
        let bytes = Arc::new(AtomicUsize::new(0));
        let l = Arc::clone(&levels);
        let b = Arc::clone(&bytes);
        dispatcher.set_level_callback(Some(Arc::new(move |level: f32| l.lock().push(level))));
        dispatcher.set_audio_callback(Some(Arc::new(move |pcm: &[u8]| {
            b.fetch_add(pcm.len(), Ordering::SeqCst);
        })));

        dispatcher.push_block(&loud_block());

        assert_eq!(bytes.load(Ordering::SeqCst), 3200);
        let levels = levels.lock();
        assert_eq!(levels.len(), 1);
        assert!((levels[0] - 0.5).abs() < 1e-6);
        assert_eq!(dispatcher.diagnostics().blocks_dispatched, 1);
    }

    #[test]
    fn level_override_replaces_computed_level() {
        let dispatcher = Dispatcher::new();
        dispatcher.set_running(true);
        let levels = Arc::new(Mutex::new(Vec::new()));
        let l = Arc::clone(&levels);
        dispatcher.set_level_callback(Some(Arc::new(move |level: f32| l.lock().push(level))));

        dispatcher.push_block_with_level(&[0u8; 3200], 0.05);
        dispatcher.push_block_with_level(&[0u8; 3200], 7.0);

        assert_eq!(*levels.lock(), vec![0.05, 1.0]);
    }

    #[test]
    fn level_reference_is_applied() {
        let dispatcher = Dispatcher::new();
        dispatcher.set_running(true);
        dispatcher.set_level_reference(20_000.0);
        let levels = Arc::new(Mutex::new(Vec::new()));
        let l = Arc::clone(&levels);
        dispatcher.set_level_callback(Some(Arc::new(move |level: f32| l.lock().push(level))));

        dispatcher.push_block(&loud_block());

        assert!((levels.lock()[0] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn panicking_callback_is_isolated() {
        let dispatcher = Dispatcher::new();
        dispatcher.set_running(true);
        let delivered = Arc::new(AtomicUsize::new(0));
        let d = Arc::clone(&delivered);
        dispatcher.set_level_callback(Some(Arc::new(|_: f32| panic!("meter exploded"))));
        dispatcher.set_audio_callback(Some(Arc::new(move |_: &[u8]| {
            d.fetch_add(1, Ordering::SeqCst);
        })));

        for _ in 0..3 {
            dispatcher.push_block(&[0u8; 3200]);
        }

        // Audio still flows even though the level callback fails every time.
        assert_eq!(delivered.load(Ordering::SeqCst), 3);
        let diag = dispatcher.diagnostics();
        assert_eq!(diag.callback_failures, 3);
        assert_eq!(diag.blocks_dispatched, 3);
    }

    #[test]
    fn replacing_callback_takes_effect_next_block() {
        let dispatcher = Dispatcher::new();
        dispatcher.set_running(true);
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let f = Arc::clone(&first);
        dispatcher.set_audio_callback(Some(Arc::new(move |_: &[u8]| {
            f.fetch_add(1, Ordering::SeqCst);
        })));
        dispatcher.push_block(&[0u8; 3200]);

        let s = Arc::clone(&second);
        dispatcher.set_audio_callback(Some(Arc::new(move |_: &[u8]| {
            s.fetch_add(1, Ordering::SeqCst);
        })));
        dispatcher.push_block(&[0u8; 3200]);

        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn stopping_during_level_callback_drops_audio() {
        let dispatcher = Arc::new(Dispatcher::new());
        dispatcher.set_running(true);
        let delivered = Arc::new(AtomicUsize::new(0));
        let d = Arc::clone(&delivered);
        let owner = Arc::clone(&dispatcher);
        dispatcher.set_level_callback(Some(Arc::new(move |_: f32| owner.set_running(false))));
        dispatcher.set_audio_callback(Some(Arc::new(move |_: &[u8]| {
            d.fetch_add(1, Ordering::SeqCst);
        })));

        dispatcher.push_block(&[0u8; 3200]);

        assert_eq!(delivered.load(Ordering::SeqCst), 0);
        let diag = dispatcher.diagnostics();
        assert_eq!(diag.blocks_dropped, 1);
        assert_eq!(diag.blocks_dispatched, 0);

        // Break the dispatcher -> callback -> dispatcher cycle.
        dispatcher.set_level_callback(None);
    }

    #[test]
    fn stream_warnings_are_counted() {
        let dispatcher = Dispatcher::new();
        dispatcher.report_stream_warning("input overflow");
        assert_eq!(dispatcher.diagnostics().stream_warnings, 1);
    }
}
