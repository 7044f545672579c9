/// Re-chunks whatever frame counts the transport delivers into exact blocks.
///
/// The buffer is allocated once; pushing samples never reallocates, so this
/// is safe to drive from the transport's realtime callback.
#[derive(Debug)]
pub struct BlockAccumulator {
    block: Vec<u8>,
    block_bytes: usize,
}

impl BlockAccumulator {
    /// Accumulator for blocks of `block_size` 16-bit samples.
    pub fn new(block_size: usize) -> Self {
        let block_bytes = block_size * 2;
        Self {
            block: Vec::with_capacity(block_bytes),
            block_bytes,
        }
    }

    /// Append samples, calling `emit` with each block as it fills.
    pub fn push<I, F>(&mut self, samples: I, mut emit: F)
    where
        I: IntoIterator<Item = i16>,
        F: FnMut(&[u8]),
    {
        for sample in samples {
            self.block.extend_from_slice(&sample.to_le_bytes());
            if self.block.len() >= self.block_bytes {
                emit(&self.block);
                self.block.clear();
            }
        }
    }

    /// Samples waiting for the current block to fill.
    pub fn pending_samples(&self) -> usize {
        self.block.len() / 2
    }
}

/// Convert a float sample in `[-1.0, 1.0]` to i16, clamping out-of-range input.
pub fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emits_exact_blocks_across_callbacks() {
        let mut acc = BlockAccumulator::new(4);
        let mut blocks: Vec<Vec<u8>> = Vec::new();

        acc.push([1i16, 2, 3], |b| blocks.push(b.to_vec()));
        assert!(blocks.is_empty());
        assert_eq!(acc.pending_samples(), 3);

        acc.push([4i16, 5, 6, 7, 8, 9], |b| blocks.push(b.to_vec()));
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0], vec![1, 0, 2, 0, 3, 0, 4, 0]);
        assert_eq!(blocks[1], vec![5, 0, 6, 0, 7, 0, 8, 0]);
        assert_eq!(acc.pending_samples(), 1);
    }

    #[test]
    fn samples_are_little_endian() {
        let mut acc = BlockAccumulator::new(1);
        let mut out = Vec::new();
        acc.push([-2i16], |b| out.extend_from_slice(b));
        assert_eq!(out, vec![0xfe, 0xff]);
    }

    #[test]
    fn full_block_size_is_3200_bytes() {
        let mut acc = BlockAccumulator::new(1600);
        let mut sizes = Vec::new();
        acc.push(std::iter::repeat(0i16).take(4000), |b| sizes.push(b.len()));
        assert_eq!(sizes, vec![3200, 3200]);
        assert_eq!(acc.pending_samples(), 800);
    }

    #[test]
    fn float_conversion_clamps() {
        assert_eq!(f32_to_i16(0.0), 0);
        assert_eq!(f32_to_i16(1.0), i16::MAX);
        assert_eq!(f32_to_i16(-1.0), -i16::MAX);
        assert_eq!(f32_to_i16(2.0), i16::MAX);
        assert_eq!(f32_to_i16(-2.0), -i16::MAX);
    }
}
