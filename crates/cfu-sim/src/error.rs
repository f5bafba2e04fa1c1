//! Error types for the host-facing half of the simulator.
//!
//! The dispatch path itself never returns `Result` — a hardware register
//! interface has no failure channel distinct from wrong data. Errors exist
//! only where the host driver validates layer descriptions and blobs before
//! touching the model.

use thiserror::Error;

/// Result type alias for CFU host operations.
pub type Result<T> = std::result::Result<T, CfuError>;

/// Errors that can occur while validating or loading layer descriptions.
#[derive(Debug, Error)]
pub enum CfuError {
    /// Layer declares a different number of filters than output channels.
    #[error("filter count mismatch: {got} filters for output_depth {expected}")]
    FilterCountMismatch {
        /// Declared output depth
        expected: usize,
        /// Number of filters provided
        got: usize,
    },

    /// A filter's weight count does not match `KERNEL_LENGTH × input_depth`.
    #[error("weight count mismatch in filter {channel}: got {got}, expected {expected}")]
    WeightCountMismatch {
        /// Output channel index
        channel: usize,
        /// Expected weight count
        expected: usize,
        /// Provided weight count
        got: usize,
    },

    /// Frame width exceeds the modeled hardware's input buffer.
    #[error("frame width {width} exceeds hardware maximum {max}")]
    FrameTooWide {
        /// Requested width
        width: usize,
        /// Hardware maximum
        max: usize,
    },

    /// Channel count exceeds the modeled hardware's channel capacity.
    #[error("input depth {depth} exceeds hardware maximum {max}")]
    TooManyChannels {
        /// Requested depth
        depth: usize,
        /// Hardware maximum
        max: usize,
    },

    /// Input slice length does not match `width × input_depth`.
    #[error("input size mismatch: got {got} samples, expected {expected}")]
    InputSizeMismatch {
        /// Expected sample count
        expected: usize,
        /// Provided sample count
        got: usize,
    },

    /// Layer blob ended before the declared contents.
    #[error("layer blob truncated: needed {needed} bytes, got {got}")]
    BlobTruncated {
        /// Bytes required by the header
        needed: usize,
        /// Bytes actually present
        got: usize,
    },

    /// Layer blob does not start with the expected magic.
    #[error("bad layer blob magic: {got:#010x}")]
    BadMagic {
        /// Magic value found
        got: u32,
    },
}
