use crate::models::config::DEFAULT_LEVEL_REFERENCE;

/// RMS loudness meter for 16-bit LE PCM blocks.
///
/// Level = `min(1.0, rms / reference)`. Pure: the same block always yields the
/// same level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelMeter {
    pub reference: f32,
}

impl LevelMeter {
    pub fn new(reference: f32) -> Self {
        Self { reference }
    }

    /// Normalized level of `pcm` in `[0.0, 1.0]`.
    ///
    /// An empty or all-zero block yields exactly `0.0`. A trailing odd byte
    /// is ignored.
    pub fn compute_level(&self, pcm: &[u8]) -> f32 {
        let rms = Self::rms(pcm);
        if rms == 0.0 {
            return 0.0;
        }
        (rms / self.reference as f64).min(1.0) as f32
    }

    /// Root-mean-square amplitude of the samples in `pcm`, in i16 units.
    pub fn rms(pcm: &[u8]) -> f64 {
        let samples = pcm.chunks_exact(2);
        let count = samples.len();
        if count == 0 {
            return 0.0;
        }
        let sum_sq: f64 = samples
            .map(|b| {
                let s = i16::from_le_bytes([b[0], b[1]]) as f64;
                s * s
            })
            .sum();
        (sum_sq / count as f64).sqrt()
    }
}

impl Default for LevelMeter {
    fn default() -> Self {
        Self::new(DEFAULT_LEVEL_REFERENCE)
    }
}

/// Level of `pcm` against the default reference ceiling.
pub fn compute_level(pcm: &[u8]) -> f32 {
    LevelMeter::default().compute_level(pcm)
}
