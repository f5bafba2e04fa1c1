//! Buffer geometry baked into the gateware.
//!
//! The accelerator is a fixed-function block: one kernel length, fixed
//! maximum frame width and channel count. Buffer capacities and the padding
//! rule derive from these.

/// Number of taps in the convolution kernel.
pub const KERNEL_LENGTH: usize = 8;

/// Maximum number of input (and output) positions in one frame.
pub const MAX_INPUT_SIZE: usize = 1024;

/// Maximum number of input channels.
pub const MAX_INPUT_CHANNELS: usize = 128;

/// Half the kernel length; the padding rule below is derived from it.
pub const PADDING: usize = KERNEL_LENGTH / 2;

/// Left padding applied by the engine: the receptive field for output
/// position `x` starts at `x - PAD_LEFT`. "Same"-style padding for an
/// even kernel length.
pub const PAD_LEFT: i32 = (PADDING as i32) - 1;

/// Capacity of the full-frame input buffer, in samples.
pub const FRAME_CAPACITY: usize = MAX_INPUT_SIZE * MAX_INPUT_CHANNELS;

/// Capacity of the kernel weight buffer, in weights.
pub const KERNEL_CAPACITY: usize = KERNEL_LENGTH * MAX_INPUT_CHANNELS;

/// Capacity of the ring edition's input window, in samples. The window
/// holds exactly one receptive field per channel.
pub const WINDOW_CAPACITY: usize = KERNEL_LENGTH * MAX_INPUT_CHANNELS;

/// Capacity of the output buffer, in entries (one per output position).
pub const OUTPUT_CAPACITY: usize = MAX_INPUT_SIZE;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_matches_kernel_length() {
        assert_eq!(PADDING, 4);
        assert_eq!(PAD_LEFT, 3);
    }

    #[test]
    fn window_is_one_receptive_field() {
        assert_eq!(WINDOW_CAPACITY, KERNEL_LENGTH * MAX_INPUT_CHANNELS);
        assert!(WINDOW_CAPACITY < FRAME_CAPACITY);
    }
}
