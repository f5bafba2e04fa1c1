//! Scalar configuration register file.
//!
//! Every edition owns one of these. Registers are zero at construction,
//! persist across computations, and are cleared only by the reset command.
//! Unwritten configuration is not an error — computation with reset-value
//! scalars is deterministic and meaningless, exactly like the hardware.

use crate::command::ScalarReg;
use cfu_chip::geometry::{MAX_INPUT_CHANNELS, MAX_INPUT_SIZE};

/// The scalar register file shared by all editions.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Registers {
    /// Offset added to every input sample before multiplication.
    pub input_offset: i32,
    /// Offset added after requantization.
    pub output_offset: i32,
    /// Lower clamp bound for requantized output.
    pub output_activation_min: i32,
    /// Upper clamp bound for requantized output.
    pub output_activation_max: i32,
    /// Number of output channels.
    pub output_depth: i32,
    /// Frame width (input and output share it).
    pub input_output_width: i32,
    /// Number of input channels.
    pub input_depth: i32,
    /// Bias added to the accumulator.
    pub bias: i32,
    /// Fixed-point requantization multiplier.
    pub output_multiplier: i32,
    /// Fixed-point requantization shift.
    pub output_shift: i32,
}

impl Registers {
    /// Clear every register to its reset value.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Apply a scalar write and produce the dispatch return value: the
    /// stored value for echoing registers, 0 otherwise.
    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    pub fn write(&mut self, reg: ScalarReg, value: u32) -> u32 {
        let v = value as i32;
        let slot = match reg {
            ScalarReg::InputOffset => &mut self.input_offset,
            ScalarReg::OutputOffset => &mut self.output_offset,
            ScalarReg::ActivationMin => &mut self.output_activation_min,
            ScalarReg::ActivationMax => &mut self.output_activation_max,
            ScalarReg::OutputDepth => &mut self.output_depth,
            ScalarReg::InputOutputWidth => &mut self.input_output_width,
            ScalarReg::InputDepth => &mut self.input_depth,
            ScalarReg::Bias => &mut self.bias,
            ScalarReg::OutputMultiplier => &mut self.output_multiplier,
            ScalarReg::OutputShift => &mut self.output_shift,
        };
        *slot = v;
        if reg.echoes() {
            *slot as u32
        } else {
            0
        }
    }

    /// Frame width as a buffer extent.
    ///
    /// # Panics
    ///
    /// Panics if the configured width exceeds the hardware frame capacity.
    #[allow(clippy::cast_sign_loss)]
    pub fn width(&self) -> usize {
        let width = self.input_output_width.max(0) as usize;
        assert!(
            width <= MAX_INPUT_SIZE,
            "input_output_width {width} exceeds frame capacity {MAX_INPUT_SIZE}"
        );
        width
    }

    /// Channel count as a buffer extent.
    ///
    /// # Panics
    ///
    /// Panics if the configured depth exceeds the hardware channel capacity.
    #[allow(clippy::cast_sign_loss)]
    pub fn depth(&self) -> usize {
        let depth = self.input_depth.max(0) as usize;
        assert!(
            depth <= MAX_INPUT_CHANNELS,
            "input_depth {depth} exceeds channel capacity {MAX_INPUT_CHANNELS}"
        );
        depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_echo_per_decode_table() {
        let mut regs = Registers::default();
        assert_eq!(regs.write(ScalarReg::InputOffset, -5i32 as u32), -5i32 as u32);
        assert_eq!(regs.input_offset, -5);
        assert_eq!(regs.write(ScalarReg::InputOutputWidth, 64), 64);
        assert_eq!(regs.write(ScalarReg::Bias, 7), 0);
        assert_eq!(regs.bias, 7);
        assert_eq!(regs.write(ScalarReg::OutputMultiplier, 123), 0);
        assert_eq!(regs.write(ScalarReg::OutputShift, -3i32 as u32), 0);
        assert_eq!(regs.output_shift, -3);
    }

    #[test]
    fn reset_restores_defaults() {
        let mut regs = Registers::default();
        regs.write(ScalarReg::InputOffset, 128);
        regs.write(ScalarReg::ActivationMax, 127);
        regs.reset();
        assert_eq!(regs, Registers::default());
    }

    #[test]
    fn negative_extents_clamp_to_zero() {
        let mut regs = Registers::default();
        regs.write(ScalarReg::InputOutputWidth, -1i32 as u32);
        regs.write(ScalarReg::InputDepth, -4i32 as u32);
        assert_eq!(regs.width(), 0);
        assert_eq!(regs.depth(), 0);
    }
}
