//! Layer descriptions and the packed blob format.
//!
//! A [`Conv1dLayer`] is everything the host needs to drive one convolution
//! layer through a CFU: frame geometry, quantization offsets, and one
//! [`Filter`] per output channel. Weights are expected to be
//! int8-quantized already, and each filter's `multiplier`/`shift` pair to
//! come from the standard fixed-point rescale calculation
//! ([`cfu_chip::quant::quantize_multiplier`]).
//!
//! The blob format is a compact little-endian serialization for tools and
//! benches:
//!
//! ```text
//! [magic u32]["CFU1"]
//! [input_depth u32][output_depth u32][width u32]
//! [input_offset i32][output_offset i32][act_min i32][act_max i32]
//! per output channel:
//!   [bias i32][multiplier i32][shift i32]
//!   [KERNEL_LENGTH × input_depth weight bytes]
//! ```

use crate::error::{CfuError, Result};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use cfu_chip::geometry::{KERNEL_LENGTH, MAX_INPUT_CHANNELS, MAX_INPUT_SIZE};

/// Blob magic, "CFU1" little-endian.
pub const LAYER_MAGIC: u32 = u32::from_le_bytes(*b"CFU1");

/// One output channel's filter: weights in `[tap][channel]` order plus
/// its requantization parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    /// `KERNEL_LENGTH × input_depth` weights, tap-major.
    pub weights: Vec<i8>,
    /// Bias added to the accumulator.
    pub bias: i32,
    /// Fixed-point requantization multiplier.
    pub multiplier: i32,
    /// Fixed-point requantization shift.
    pub shift: i32,
}

/// Complete description of one conv1d layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conv1dLayer {
    /// Number of input channels.
    pub input_depth: usize,
    /// Number of output channels (= number of filters).
    pub output_depth: usize,
    /// Frame width, shared by input and output.
    pub width: usize,
    /// Offset added to every input sample.
    pub input_offset: i32,
    /// Offset added after requantization.
    pub output_offset: i32,
    /// Lower clamp bound.
    pub activation_min: i32,
    /// Upper clamp bound.
    pub activation_max: i32,
    /// One filter per output channel.
    pub filters: Vec<Filter>,
}

impl Conv1dLayer {
    /// Check the description against the modeled hardware's capacities.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame is too wide, has too many channels,
    /// or the filter/weight counts are inconsistent.
    pub fn validate(&self) -> Result<()> {
        if self.width > MAX_INPUT_SIZE {
            return Err(CfuError::FrameTooWide {
                width: self.width,
                max: MAX_INPUT_SIZE,
            });
        }
        if self.input_depth > MAX_INPUT_CHANNELS {
            return Err(CfuError::TooManyChannels {
                depth: self.input_depth,
                max: MAX_INPUT_CHANNELS,
            });
        }
        if self.filters.len() != self.output_depth {
            return Err(CfuError::FilterCountMismatch {
                expected: self.output_depth,
                got: self.filters.len(),
            });
        }
        let expected = KERNEL_LENGTH * self.input_depth;
        for (channel, filter) in self.filters.iter().enumerate() {
            if filter.weights.len() != expected {
                return Err(CfuError::WeightCountMismatch {
                    channel,
                    expected,
                    got: filter.weights.len(),
                });
            }
        }
        Ok(())
    }

    /// Number of input samples one frame carries.
    #[must_use]
    pub const fn input_len(&self) -> usize {
        self.width * self.input_depth
    }

    /// Serialize to the packed blob format.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn pack(&self) -> Bytes {
        let per_filter = 12 + KERNEL_LENGTH * self.input_depth;
        let mut buf = BytesMut::with_capacity(32 + self.filters.len() * per_filter);
        buf.put_u32_le(LAYER_MAGIC);
        buf.put_u32_le(self.input_depth as u32);
        buf.put_u32_le(self.output_depth as u32);
        buf.put_u32_le(self.width as u32);
        buf.put_i32_le(self.input_offset);
        buf.put_i32_le(self.output_offset);
        buf.put_i32_le(self.activation_min);
        buf.put_i32_le(self.activation_max);
        for filter in &self.filters {
            buf.put_i32_le(filter.bias);
            buf.put_i32_le(filter.multiplier);
            buf.put_i32_le(filter.shift);
            for &w in &filter.weights {
                buf.put_i8(w);
            }
        }
        buf.freeze()
    }

    /// Parse a packed blob.
    ///
    /// # Errors
    ///
    /// Returns an error on a bad magic, a truncated blob, or a layer that
    /// fails [`Self::validate`].
    pub fn from_blob(blob: &[u8]) -> Result<Self> {
        let mut buf = blob;
        if buf.remaining() < 32 {
            return Err(CfuError::BlobTruncated {
                needed: 32,
                got: blob.len(),
            });
        }
        let magic = buf.get_u32_le();
        if magic != LAYER_MAGIC {
            return Err(CfuError::BadMagic { got: magic });
        }
        let input_depth = buf.get_u32_le() as usize;
        let output_depth = buf.get_u32_le() as usize;
        let width = buf.get_u32_le() as usize;
        let input_offset = buf.get_i32_le();
        let output_offset = buf.get_i32_le();
        let activation_min = buf.get_i32_le();
        let activation_max = buf.get_i32_le();

        let weight_count = KERNEL_LENGTH * input_depth;
        let per_filter = 12 + weight_count;
        let needed = 32 + output_depth * per_filter;
        if blob.len() < needed {
            return Err(CfuError::BlobTruncated {
                needed,
                got: blob.len(),
            });
        }

        let mut filters = Vec::with_capacity(output_depth);
        for _ in 0..output_depth {
            let bias = buf.get_i32_le();
            let multiplier = buf.get_i32_le();
            let shift = buf.get_i32_le();
            let mut weights = Vec::with_capacity(weight_count);
            for _ in 0..weight_count {
                weights.push(buf.get_i8());
            }
            filters.push(Filter {
                weights,
                bias,
                multiplier,
                shift,
            });
        }

        let layer = Self {
            input_depth,
            output_depth,
            width,
            input_offset,
            output_offset,
            activation_min,
            activation_max,
            filters,
        };
        layer.validate()?;
        Ok(layer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_layer() -> Conv1dLayer {
        Conv1dLayer {
            input_depth: 2,
            output_depth: 3,
            width: 16,
            input_offset: 4,
            output_offset: -128,
            activation_min: -128,
            activation_max: 127,
            filters: (0..3)
                .map(|oc: i8| Filter {
                    weights: (0..KERNEL_LENGTH * 2).map(|i| i as i8 - oc).collect(),
                    bias: i32::from(oc) * 100,
                    multiplier: 1 << 30,
                    shift: 1,
                })
                .collect(),
        }
    }

    #[test]
    fn pack_and_parse_round_trip() {
        let layer = sample_layer();
        let blob = layer.pack();
        let parsed = Conv1dLayer::from_blob(&blob).unwrap();
        assert_eq!(parsed, layer);
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut blob = sample_layer().pack().to_vec();
        blob[0] ^= 0xFF;
        assert!(matches!(
            Conv1dLayer::from_blob(&blob),
            Err(CfuError::BadMagic { .. })
        ));
    }

    #[test]
    fn truncated_blob_is_rejected() {
        let blob = sample_layer().pack();
        assert!(matches!(
            Conv1dLayer::from_blob(&blob[..blob.len() - 1]),
            Err(CfuError::BlobTruncated { .. })
        ));
    }

    #[test]
    fn weight_count_is_validated() {
        let mut layer = sample_layer();
        layer.filters[1].weights.pop();
        assert!(matches!(
            layer.validate(),
            Err(CfuError::WeightCountMismatch { channel: 1, .. })
        ));
    }

    #[test]
    fn filter_count_is_validated() {
        let mut layer = sample_layer();
        layer.filters.pop();
        assert!(matches!(
            layer.validate(),
            Err(CfuError::FilterCountMismatch { .. })
        ));
    }

    #[test]
    fn hardware_capacities_are_validated() {
        let mut layer = sample_layer();
        layer.width = MAX_INPUT_SIZE + 1;
        assert!(matches!(
            layer.validate(),
            Err(CfuError::FrameTooWide { .. })
        ));
    }
}
