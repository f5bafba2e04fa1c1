//! Typed view of the funct7 decode table.
//!
//! The hardware decodes funct7 with a flat switch; the model decodes it
//! into a command enum once and lets each edition match on the commands it
//! wires. An unrecognized funct7 decodes to `None`, which every edition
//! answers with 0 — permissive decode, not an error.

use cfu_chip::opcodes;

/// One decoded CFU command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Zero all buffers and scalar registers.
    Reset,
    /// Store payload (truncated to i8) at a flat input-buffer index.
    WriteInput,
    /// Store payload (truncated to i8) at a flat kernel-buffer index.
    WriteKernel,
    /// Read an output-buffer entry.
    ReadOutput,
    /// Read an input-buffer entry, sign-extended.
    ReadInput,
    /// Read a kernel-buffer entry, sign-extended.
    ReadKernel,
    /// Zero the output buffer only.
    ZeroOutput,
    /// Write one scalar configuration register.
    WriteScalar(ScalarReg),
    /// Run the convolution over every output position.
    StartFrame,
    /// Run the convolution for a single position into the accumulator.
    StartSingle,
    /// Set the receptive-field origin (signed payload).
    WriteInXOrigin,
    /// Read the retained accumulator.
    ReadAccumulator,
    /// Set the ring window phase.
    WriteWindowPhase,
}

/// Scalar configuration registers addressable through the decode table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarReg {
    /// Offset added to every input sample before multiplication.
    InputOffset,
    /// Offset added after requantization.
    OutputOffset,
    /// Lower clamp bound for requantized output.
    ActivationMin,
    /// Upper clamp bound for requantized output.
    ActivationMax,
    /// Number of output channels.
    OutputDepth,
    /// Frame width (input and output share it).
    InputOutputWidth,
    /// Number of input channels.
    InputDepth,
    /// Bias added to the accumulator.
    Bias,
    /// Fixed-point requantization multiplier.
    OutputMultiplier,
    /// Fixed-point requantization shift.
    OutputShift,
}

impl ScalarReg {
    /// Whether a write to this register echoes the stored value back.
    /// Registers 20–26 echo; bias/multiplier/shift return 0. The asymmetry
    /// is part of the published decode table.
    #[must_use]
    pub const fn echoes(self) -> bool {
        !matches!(
            self,
            Self::Bias | Self::OutputMultiplier | Self::OutputShift
        )
    }
}

impl Command {
    /// Decode a funct7 value. Returns `None` for anything outside the
    /// table; callers answer that with 0.
    #[must_use]
    pub const fn decode(funct7: u32) -> Option<Self> {
        Some(match funct7 {
            opcodes::RESET => Self::Reset,
            opcodes::WRITE_INPUT => Self::WriteInput,
            opcodes::WRITE_KERNEL => Self::WriteKernel,
            opcodes::READ_OUTPUT => Self::ReadOutput,
            opcodes::READ_INPUT => Self::ReadInput,
            opcodes::READ_KERNEL => Self::ReadKernel,
            opcodes::ZERO_OUTPUT => Self::ZeroOutput,
            opcodes::WRITE_INPUT_OFFSET => Self::WriteScalar(ScalarReg::InputOffset),
            opcodes::WRITE_OUTPUT_OFFSET => Self::WriteScalar(ScalarReg::OutputOffset),
            opcodes::WRITE_ACTIVATION_MIN => Self::WriteScalar(ScalarReg::ActivationMin),
            opcodes::WRITE_ACTIVATION_MAX => Self::WriteScalar(ScalarReg::ActivationMax),
            opcodes::WRITE_OUTPUT_DEPTH => Self::WriteScalar(ScalarReg::OutputDepth),
            opcodes::WRITE_INPUT_OUTPUT_WIDTH => Self::WriteScalar(ScalarReg::InputOutputWidth),
            opcodes::WRITE_INPUT_DEPTH => Self::WriteScalar(ScalarReg::InputDepth),
            opcodes::WRITE_BIAS => Self::WriteScalar(ScalarReg::Bias),
            opcodes::WRITE_OUTPUT_MULTIPLIER => Self::WriteScalar(ScalarReg::OutputMultiplier),
            opcodes::WRITE_OUTPUT_SHIFT => Self::WriteScalar(ScalarReg::OutputShift),
            opcodes::START_FRAME => Self::StartFrame,
            opcodes::START_SINGLE => Self::StartSingle,
            opcodes::WRITE_IN_X_ORIGIN => Self::WriteInXOrigin,
            opcodes::READ_ACCUMULATOR => Self::ReadAccumulator,
            opcodes::WRITE_WINDOW_PHASE => Self::WriteWindowPhase,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_covers_the_published_table() {
        assert_eq!(Command::decode(0), Some(Command::Reset));
        assert_eq!(Command::decode(10), Some(Command::WriteInput));
        assert_eq!(
            Command::decode(20),
            Some(Command::WriteScalar(ScalarReg::InputOffset))
        );
        assert_eq!(
            Command::decode(29),
            Some(Command::WriteScalar(ScalarReg::OutputShift))
        );
        assert_eq!(Command::decode(40), Some(Command::StartFrame));
        assert_eq!(Command::decode(44), Some(Command::WriteWindowPhase));
    }

    #[test]
    fn decode_rejects_gaps() {
        for funct7 in [1, 9, 16, 19, 30, 39, 45, 99, u32::MAX] {
            assert_eq!(Command::decode(funct7), None, "funct7 {funct7}");
        }
    }

    #[test]
    fn echo_asymmetry() {
        assert!(ScalarReg::InputOffset.echoes());
        assert!(ScalarReg::InputDepth.echoes());
        assert!(!ScalarReg::Bias.echoes());
        assert!(!ScalarReg::OutputMultiplier.echoes());
        assert!(!ScalarReg::OutputShift.echoes());
    }
}
