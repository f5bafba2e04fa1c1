//! Edition capability profiles.
//!
//! Each edition publishes a profile describing its buffer shape and which
//! half of the pipeline it implements, so the host driver can choose the
//! command sequence instead of hardcoding per-edition knowledge.

use crate::model::Edition;
use cfu_chip::geometry::{
    FRAME_CAPACITY, KERNEL_CAPACITY, MAX_INPUT_SIZE, WINDOW_CAPACITY,
};

/// What the edition produces and where.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// Full output frame, requantized to i8 in-engine.
    QuantizedFrame,
    /// Full output frame of raw i32 accumulator sums.
    RawFrame,
    /// Single retained i32 accumulator, one position per computation.
    Accumulator,
}

/// Capability record for one edition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// Which edition this is.
    pub edition: Edition,
    /// Input buffer capacity in samples.
    pub input_capacity: usize,
    /// Kernel buffer capacity in weights.
    pub kernel_capacity: usize,
    /// Output shape and domain.
    pub output: OutputKind,
    /// Whether the engine adds the `bias` register itself.
    pub engine_bias: bool,
    /// Whether the input buffer is a sliding window the host must feed
    /// between computations.
    pub windowed: bool,
}

impl Profile {
    /// Build the profile for an edition.
    #[must_use]
    pub const fn for_edition(edition: Edition) -> Self {
        match edition {
            Edition::FullFrameQuant => Self {
                edition,
                input_capacity: FRAME_CAPACITY,
                kernel_capacity: KERNEL_CAPACITY,
                output: OutputKind::QuantizedFrame,
                engine_bias: true,
                windowed: false,
            },
            Edition::FullFrame => Self {
                edition,
                input_capacity: FRAME_CAPACITY,
                kernel_capacity: KERNEL_CAPACITY,
                output: OutputKind::RawFrame,
                engine_bias: true,
                windowed: false,
            },
            Edition::Streaming => Self {
                edition,
                input_capacity: FRAME_CAPACITY,
                kernel_capacity: KERNEL_CAPACITY,
                output: OutputKind::Accumulator,
                engine_bias: false,
                windowed: false,
            },
            Edition::Ring => Self {
                edition,
                input_capacity: WINDOW_CAPACITY,
                kernel_capacity: KERNEL_CAPACITY,
                output: OutputKind::Accumulator,
                engine_bias: false,
                windowed: true,
            },
        }
    }

    /// Whether the host must requantize read-back values itself.
    #[must_use]
    pub const fn host_requantizes(&self) -> bool {
        !matches!(self.output, OutputKind::QuantizedFrame)
    }

    /// Modeled on-chip memory footprint in bytes: input + kernel + output
    /// storage as the hardware would provision them.
    #[must_use]
    pub const fn ram_bytes(&self) -> usize {
        let output_bytes = match self.output {
            OutputKind::QuantizedFrame => MAX_INPUT_SIZE,
            OutputKind::RawFrame => MAX_INPUT_SIZE * 4,
            OutputKind::Accumulator => 4,
        };
        self.input_capacity + self.kernel_capacity + output_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_is_the_memory_minimal_edition() {
        let ring = Profile::for_edition(Edition::Ring);
        for edition in [Edition::FullFrame, Edition::FullFrameQuant, Edition::Streaming] {
            assert!(
                ring.ram_bytes() < Profile::for_edition(edition).ram_bytes(),
                "{edition:?}"
            );
        }
    }

    #[test]
    fn accumulator_editions_need_host_requantization() {
        assert!(!Profile::for_edition(Edition::FullFrameQuant).host_requantizes());
        assert!(Profile::for_edition(Edition::FullFrame).host_requantizes());
        assert!(Profile::for_edition(Edition::Streaming).host_requantizes());
        assert!(Profile::for_edition(Edition::Ring).host_requantizes());
    }

    #[test]
    fn only_ring_is_windowed() {
        assert!(Profile::for_edition(Edition::Ring).windowed);
        assert!(!Profile::for_edition(Edition::Streaming).windowed);
    }
}
