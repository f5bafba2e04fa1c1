// SPDX-License-Identifier: AGPL-3.0-only

//! Full-frame editions.
//!
//! The input buffer holds the entire padded row, and one start command
//! computes every output position. Simplest to reason about, largest
//! memory footprint — the baseline the memory-minimal editions are
//! measured against.
//!
//! Two output modes share the struct:
//!
//! - **quantized**: the engine runs the whole requantization pipeline
//!   (`bias` → fixed-point rescale → `output_offset` → clamp) and the
//!   output frame holds i8 values.
//! - **raw**: the engine stops after adding `bias`; the output frame
//!   holds raw i32 sums and the host requantizes on readback.

use crate::command::Command;
use crate::editions::{accumulate, payload_to_i8, sign_extend};
use crate::model::{CfuModel, Edition};
use crate::profile::{OutputKind, Profile};
use crate::registers::Registers;
use cfu_chip::geometry::{FRAME_CAPACITY, KERNEL_CAPACITY, OUTPUT_CAPACITY, PAD_LEFT};
use cfu_chip::opcodes::CONV1D_FAMILY;
use cfu_chip::quant::multiply_by_quantized_multiplier;

/// Full-frame CFU model (raw or quantized output mode).
#[derive(Debug)]
pub struct FullFrameCfu {
    regs: Registers,
    input: Vec<i8>,
    kernel: Vec<i8>,
    output: Vec<i32>,
    profile: Profile,
}

impl FullFrameCfu {
    /// Raw output mode: i32 sums, host-side requantization.
    #[must_use]
    pub fn raw() -> Self {
        Self::with_profile(Profile::for_edition(Edition::FullFrame))
    }

    /// Quantized output mode: the engine requantizes to i8.
    #[must_use]
    pub fn quantized() -> Self {
        Self::with_profile(Profile::for_edition(Edition::FullFrameQuant))
    }

    fn with_profile(profile: Profile) -> Self {
        Self {
            regs: Registers::default(),
            input: vec![0; FRAME_CAPACITY],
            kernel: vec![0; KERNEL_CAPACITY],
            output: vec![0; OUTPUT_CAPACITY],
            profile,
        }
    }

    fn reset(&mut self) {
        self.input.fill(0);
        self.kernel.fill(0);
        self.output.fill(0);
        self.regs.reset();
    }

    /// One full pass: fresh values for every position in
    /// `[0, input_output_width)`.
    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    fn start_frame(&mut self) {
        let width = self.regs.width();
        let depth = self.regs.depth();
        let input_offset = self.regs.input_offset;
        let bias = self.regs.bias;
        let quantized = self.profile.output == OutputKind::QuantizedFrame;
        let multiplier = self.regs.output_multiplier;
        let shift = self.regs.output_shift;
        let output_offset = self.regs.output_offset;
        let act_min = self.regs.output_activation_min;
        let act_max = self.regs.output_activation_max;

        let (input, kernel, output) = (&self.input, &self.kernel, &mut self.output);
        for out_x in 0..width {
            let origin = out_x as i32 - PAD_LEFT;
            let mut acc = accumulate(kernel, depth, input_offset, |tap, ch| {
                let in_x = origin + tap as i32;
                if in_x >= 0 && (in_x as usize) < width {
                    Some(input[in_x as usize * depth + ch])
                } else {
                    None
                }
            });
            acc += bias;
            if quantized {
                acc = multiply_by_quantized_multiplier(acc, multiplier, shift);
                acc += output_offset;
                acc = acc.max(act_min);
                acc = acc.min(act_max);
            }
            output[out_x] = acc;
        }
    }
}

impl CfuModel for FullFrameCfu {
    #[allow(clippy::cast_sign_loss)]
    fn dispatch(&mut self, funct3: u32, funct7: u32, rs1: u32, rs2: u32) -> u32 {
        if funct3 != CONV1D_FAMILY {
            return 0;
        }
        let Some(cmd) = Command::decode(funct7) else {
            return 0;
        };
        let addr = rs1 as usize;
        match cmd {
            Command::Reset => {
                self.reset();
                0
            }
            Command::WriteInput => {
                assert!(addr < FRAME_CAPACITY, "input address {addr} out of range");
                self.input[addr] = payload_to_i8(rs2);
                0
            }
            Command::WriteKernel => {
                assert!(addr < KERNEL_CAPACITY, "kernel address {addr} out of range");
                self.kernel[addr] = payload_to_i8(rs2);
                0
            }
            Command::ReadOutput => {
                assert!(addr < OUTPUT_CAPACITY, "output address {addr} out of range");
                self.output[addr] as u32
            }
            Command::ReadInput => {
                assert!(addr < FRAME_CAPACITY, "input address {addr} out of range");
                sign_extend(self.input[addr])
            }
            Command::ReadKernel => {
                assert!(addr < KERNEL_CAPACITY, "kernel address {addr} out of range");
                sign_extend(self.kernel[addr])
            }
            Command::ZeroOutput => {
                self.output.fill(0);
                0
            }
            Command::WriteScalar(reg) => self.regs.write(reg, rs2),
            Command::StartFrame => {
                self.start_frame();
                0
            }
            // Single-position machinery is not wired in this edition.
            Command::StartSingle
            | Command::WriteInXOrigin
            | Command::ReadAccumulator
            | Command::WriteWindowPhase => 0,
        }
    }

    fn profile(&self) -> &Profile {
        &self.profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfu_chip::opcodes;

    fn configured(width: u32, depth: u32) -> FullFrameCfu {
        let mut cfu = FullFrameCfu::raw();
        cfu.dispatch(0, opcodes::RESET, 0, 0);
        cfu.dispatch(0, opcodes::WRITE_INPUT_OUTPUT_WIDTH, 0, width);
        cfu.dispatch(0, opcodes::WRITE_INPUT_DEPTH, 0, depth);
        cfu
    }

    #[test]
    fn other_families_return_zero() {
        let mut cfu = FullFrameCfu::raw();
        cfu.dispatch(0, opcodes::WRITE_KERNEL, 0, 42);
        assert_eq!(cfu.dispatch(3, opcodes::READ_KERNEL, 0, 0), 0);
        assert_eq!(cfu.dispatch(0, opcodes::READ_KERNEL, 0, 0), 42);
    }

    #[test]
    fn read_after_write_sign_extends() {
        let mut cfu = configured(4, 1);
        cfu.dispatch(0, opcodes::WRITE_INPUT, 3, 0xFF);
        assert_eq!(cfu.dispatch(0, opcodes::READ_INPUT, 3, 0), 0xFFFF_FFFF);
        cfu.dispatch(0, opcodes::WRITE_KERNEL, 7, 0x7F);
        assert_eq!(cfu.dispatch(0, opcodes::READ_KERNEL, 7, 0), 127);
    }

    #[test]
    fn reset_is_idempotent() {
        let mut cfu = configured(8, 1);
        cfu.dispatch(0, opcodes::WRITE_INPUT, 0, 99);
        cfu.dispatch(0, opcodes::WRITE_BIAS, 0, 5);
        cfu.dispatch(0, opcodes::RESET, 0, 0);
        cfu.dispatch(0, opcodes::RESET, 0, 0);
        assert_eq!(cfu.dispatch(0, opcodes::READ_INPUT, 0, 0), 0);
        assert_eq!(cfu.regs, Registers::default());
    }

    #[test]
    fn golden_fixture_raw() {
        // All-2 kernel, depth 1, width 8, input [0,0,0,0,5,6,7,0]:
        // position 0 sees only the sample 5 → 2×5 = 10.
        let mut cfu = configured(8, 1);
        for tap in 0..8 {
            cfu.dispatch(0, opcodes::WRITE_KERNEL, tap, 2);
        }
        for (x, v) in [0u32, 0, 0, 0, 5, 6, 7, 0].into_iter().enumerate() {
            cfu.dispatch(0, opcodes::WRITE_INPUT, x as u32, v);
        }
        cfu.dispatch(0, opcodes::START_FRAME, 0, 0);
        let expected = [10, 22, 36, 36, 36, 36, 36, 36];
        for (x, want) in expected.into_iter().enumerate() {
            assert_eq!(
                cfu.dispatch(0, opcodes::READ_OUTPUT, x as u32, 0),
                want,
                "position {x}"
            );
        }
    }

    #[test]
    fn full_pass_overwrites_stale_output() {
        let mut cfu = configured(4, 1);
        cfu.dispatch(0, opcodes::WRITE_KERNEL, 0, 1);
        cfu.dispatch(0, opcodes::WRITE_INPUT, 0, 9);
        cfu.dispatch(0, opcodes::START_FRAME, 0, 0);
        let first = cfu.dispatch(0, opcodes::READ_OUTPUT, 3, 0);
        cfu.dispatch(0, opcodes::START_FRAME, 0, 0);
        assert_eq!(cfu.dispatch(0, opcodes::READ_OUTPUT, 3, 0), first);
    }

    #[test]
    fn quantized_mode_clamps_and_offsets() {
        let mut cfu = FullFrameCfu::quantized();
        cfu.dispatch(0, opcodes::WRITE_INPUT_OUTPUT_WIDTH, 0, 1);
        cfu.dispatch(0, opcodes::WRITE_INPUT_DEPTH, 0, 1);
        cfu.dispatch(0, opcodes::WRITE_ACTIVATION_MIN, 0, -128i32 as u32);
        cfu.dispatch(0, opcodes::WRITE_ACTIVATION_MAX, 0, 127);
        cfu.dispatch(0, opcodes::WRITE_OUTPUT_OFFSET, 0, -128i32 as u32);
        // Identity rescale.
        cfu.dispatch(0, opcodes::WRITE_OUTPUT_MULTIPLIER, 0, 1 << 30);
        cfu.dispatch(0, opcodes::WRITE_OUTPUT_SHIFT, 0, 1);
        cfu.dispatch(0, opcodes::WRITE_KERNEL, 3, 1);
        cfu.dispatch(0, opcodes::WRITE_INPUT, 0, 50);
        cfu.dispatch(0, opcodes::START_FRAME, 0, 0);
        // acc = 50, rescaled 50, offset -128 → -78.
        assert_eq!(cfu.dispatch(0, opcodes::READ_OUTPUT, 0, 0), -78i32 as u32);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn out_of_range_write_is_a_checked_precondition() {
        let mut cfu = FullFrameCfu::raw();
        cfu.dispatch(0, opcodes::WRITE_KERNEL, KERNEL_CAPACITY as u32, 1);
    }
}
