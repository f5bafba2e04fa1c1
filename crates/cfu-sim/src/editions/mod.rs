//! The buffer-management edition family.
//!
//! All editions run the same receptive-field accumulation; they differ
//! only in what the input buffer holds and where results land. The shared
//! loop lives here and takes the buffer strategy as a sample lookup: a
//! lookup returning `None` means the tap falls outside the image and
//! contributes exactly zero (explicit zero-padding).

mod full_frame;
mod ring;
mod streaming;

pub use full_frame::FullFrameCfu;
pub use ring::RingCfu;
pub use streaming::StreamingCfu;

use cfu_chip::geometry::KERNEL_LENGTH;

/// Accumulate one receptive field in i32:
/// `Σ kernel[tap][ch] × (sample(tap, ch) + input_offset)` over all taps
/// and `depth` channels. Tap-major, channel-minor order — the RTL's
/// accumulation order, kept because reordering changes overflow behavior.
pub(crate) fn accumulate<F>(kernel: &[i8], depth: usize, input_offset: i32, sample: F) -> i32
where
    F: Fn(usize, usize) -> Option<i8>,
{
    let mut acc = 0i32;
    for tap in 0..KERNEL_LENGTH {
        for ch in 0..depth {
            if let Some(value) = sample(tap, ch) {
                let weight = i32::from(kernel[tap * depth + ch]);
                acc += weight * (i32::from(value) + input_offset);
            }
        }
    }
    acc
}

/// Truncate a 32-bit payload to the stored i8 sample, the way the
/// hardware write port does.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn payload_to_i8(value: u32) -> i8 {
    value as u8 as i8
}

/// Sign-extend a stored i8 for the 32-bit read port.
#[allow(clippy::cast_sign_loss)]
pub(crate) fn sign_extend(value: i8) -> u32 {
    i32::from(value) as u32
}
