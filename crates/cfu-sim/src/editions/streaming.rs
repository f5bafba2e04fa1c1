// SPDX-License-Identifier: AGPL-3.0-only

//! Streaming edition: the output buffer is gone.
//!
//! The host iterates output positions itself, telling the engine where the
//! receptive field starts via the `in_x_origin` register and reading one
//! accumulator back per computation. The input buffer still holds the
//! whole row; only the output side shrinks to a single i32.
//!
//! Bias and requantization move to the host — this edition's decode table
//! wires only `input_offset`, `input_output_width` and `input_depth`.

use crate::command::{Command, ScalarReg};
use crate::editions::{accumulate, payload_to_i8, sign_extend};
use crate::model::{CfuModel, Edition};
use crate::profile::Profile;
use crate::registers::Registers;
use cfu_chip::geometry::{FRAME_CAPACITY, KERNEL_CAPACITY};
use cfu_chip::opcodes::CONV1D_FAMILY;

/// Streaming (single-accumulator) CFU model.
#[derive(Debug)]
pub struct StreamingCfu {
    regs: Registers,
    input: Vec<i8>,
    kernel: Vec<i8>,
    in_x_origin: i32,
    acc: i32,
    profile: Profile,
}

impl StreamingCfu {
    /// Fresh model with zeroed state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            regs: Registers::default(),
            input: vec![0; FRAME_CAPACITY],
            kernel: vec![0; KERNEL_CAPACITY],
            in_x_origin: 0,
            acc: 0,
            profile: Profile::for_edition(Edition::Streaming),
        }
    }

    fn reset(&mut self) {
        self.input.fill(0);
        self.kernel.fill(0);
        self.in_x_origin = 0;
        self.acc = 0;
        self.regs.reset();
    }

    /// Compute the single position whose receptive field starts at
    /// `in_x_origin`. No bias; the host adds it.
    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    fn start_single(&mut self) {
        let width = self.regs.width();
        let depth = self.regs.depth();
        let input_offset = self.regs.input_offset;
        let origin = self.in_x_origin;
        let (input, kernel) = (&self.input, &self.kernel);
        self.acc = accumulate(kernel, depth, input_offset, |tap, ch| {
            let in_x = origin + tap as i32;
            if in_x >= 0 && (in_x as usize) < width {
                Some(input[in_x as usize * depth + ch])
            } else {
                None
            }
        });
    }
}

impl Default for StreamingCfu {
    fn default() -> Self {
        Self::new()
    }
}

impl CfuModel for StreamingCfu {
    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
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
            Command::ReadInput => {
                assert!(addr < FRAME_CAPACITY, "input address {addr} out of range");
                sign_extend(self.input[addr])
            }
            Command::ReadKernel => {
                assert!(addr < KERNEL_CAPACITY, "kernel address {addr} out of range");
                sign_extend(self.kernel[addr])
            }
            Command::WriteScalar(
                reg @ (ScalarReg::InputOffset
                | ScalarReg::InputOutputWidth
                | ScalarReg::InputDepth),
            ) => self.regs.write(reg, rs2),
            Command::WriteInXOrigin => {
                self.in_x_origin = rs2 as i32;
                0
            }
            Command::StartSingle => {
                self.start_single();
                0
            }
            Command::ReadAccumulator => self.acc as u32,
            // No output frame, no other scalars in this edition.
            Command::WriteScalar(_)
            | Command::ReadOutput
            | Command::ZeroOutput
            | Command::StartFrame
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

    fn loaded() -> StreamingCfu {
        let mut cfu = StreamingCfu::new();
        cfu.dispatch(0, opcodes::WRITE_INPUT_OUTPUT_WIDTH, 0, 8);
        cfu.dispatch(0, opcodes::WRITE_INPUT_DEPTH, 0, 1);
        for tap in 0..8 {
            cfu.dispatch(0, opcodes::WRITE_KERNEL, tap, 2);
        }
        for (x, v) in [0u32, 0, 0, 0, 5, 6, 7, 0].into_iter().enumerate() {
            cfu.dispatch(0, opcodes::WRITE_INPUT, x as u32, v);
        }
        cfu
    }

    #[test]
    fn golden_fixture_position_zero() {
        let mut cfu = loaded();
        cfu.dispatch(0, opcodes::WRITE_IN_X_ORIGIN, 0, -3i32 as u32);
        cfu.dispatch(0, opcodes::START_SINGLE, 0, 0);
        assert_eq!(cfu.dispatch(0, opcodes::READ_ACCUMULATOR, 0, 0), 10);
    }

    #[test]
    fn negative_origin_pads_with_zero() {
        let mut cfu = loaded();
        // Origin far left: whole window out of image.
        cfu.dispatch(0, opcodes::WRITE_IN_X_ORIGIN, 0, -100i32 as u32);
        cfu.dispatch(0, opcodes::START_SINGLE, 0, 0);
        assert_eq!(cfu.dispatch(0, opcodes::READ_ACCUMULATOR, 0, 0), 0);
    }

    #[test]
    fn accumulator_persists_until_next_start() {
        let mut cfu = loaded();
        cfu.dispatch(0, opcodes::WRITE_IN_X_ORIGIN, 0, 0);
        cfu.dispatch(0, opcodes::START_SINGLE, 0, 0);
        let acc = cfu.dispatch(0, opcodes::READ_ACCUMULATOR, 0, 0);
        assert_eq!(cfu.dispatch(0, opcodes::READ_ACCUMULATOR, 0, 0), acc);
    }

    #[test]
    fn output_scalars_are_not_wired() {
        let mut cfu = StreamingCfu::new();
        assert_eq!(cfu.dispatch(0, opcodes::WRITE_BIAS, 0, 7), 0);
        assert_eq!(cfu.regs.bias, 0);
        // Width is wired, so it echoes.
        assert_eq!(cfu.dispatch(0, opcodes::WRITE_INPUT_OUTPUT_WIDTH, 0, 16), 16);
    }
}
