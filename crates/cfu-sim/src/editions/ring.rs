// SPDX-License-Identifier: AGPL-3.0-only

//! Ring edition: the input buffer shrinks to one receptive field.
//!
//! Instead of the whole padded row, the engine keeps `KERNEL_LENGTH` taps
//! per channel in a circular window. The `start_filter_x` phase register
//! names the slot holding the window's logical first tap; taps are read
//! modulo the window length. The engine holds no spatial-position
//! information at all — the host pads with `-input_offset` samples (which
//! contribute zero after the offset is added back) and rewrites the stale
//! slot before each single-position computation.
//!
//! O(width) memory becomes O(KERNEL_LENGTH), paid for with O(width)
//! additional host writes per channel.

use crate::command::{Command, ScalarReg};
use crate::editions::{accumulate, payload_to_i8, sign_extend};
use crate::model::{CfuModel, Edition};
use crate::profile::Profile;
use crate::registers::Registers;
use cfu_chip::geometry::{KERNEL_CAPACITY, KERNEL_LENGTH, WINDOW_CAPACITY};
use cfu_chip::opcodes::CONV1D_FAMILY;

/// Ring-window CFU model.
#[derive(Debug)]
pub struct RingCfu {
    regs: Registers,
    window: Vec<i8>,
    kernel: Vec<i8>,
    phase: usize,
    acc: i32,
    profile: Profile,
}

impl RingCfu {
    /// Fresh model with zeroed state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            regs: Registers::default(),
            window: vec![0; WINDOW_CAPACITY],
            kernel: vec![0; KERNEL_CAPACITY],
            phase: 0,
            acc: 0,
            profile: Profile::for_edition(Edition::Ring),
        }
    }

    fn reset(&mut self) {
        self.window.fill(0);
        self.kernel.fill(0);
        self.phase = 0;
        self.acc = 0;
        self.regs.reset();
    }

    /// Compute the position whose receptive field currently fills the
    /// window, first tap at slot `phase`, wrapping modulo the window.
    fn start_single(&mut self) {
        let depth = self.regs.depth();
        let input_offset = self.regs.input_offset;
        let phase = self.phase;
        let (window, kernel) = (&self.window, &self.kernel);
        self.acc = accumulate(kernel, depth, input_offset, |tap, ch| {
            let slot = (tap + phase) % KERNEL_LENGTH;
            Some(window[slot * depth + ch])
        });
    }
}

impl Default for RingCfu {
    fn default() -> Self {
        Self::new()
    }
}

impl CfuModel for RingCfu {
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
                assert!(addr < WINDOW_CAPACITY, "window address {addr} out of range");
                self.window[addr] = payload_to_i8(rs2);
                0
            }
            Command::WriteKernel => {
                assert!(addr < KERNEL_CAPACITY, "kernel address {addr} out of range");
                self.kernel[addr] = payload_to_i8(rs2);
                0
            }
            Command::ReadInput => {
                assert!(addr < WINDOW_CAPACITY, "window address {addr} out of range");
                sign_extend(self.window[addr])
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
            Command::WriteWindowPhase => {
                self.phase = rs2 as usize % KERNEL_LENGTH;
                0
            }
            Command::StartSingle => {
                self.start_single();
                0
            }
            Command::ReadAccumulator => self.acc as u32,
            // No output frame, no origin register, no other scalars.
            Command::WriteScalar(_)
            | Command::ReadOutput
            | Command::ZeroOutput
            | Command::StartFrame
            | Command::WriteInXOrigin => 0,
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

    /// Window pre-filled with taps 10,20,..,80 at slots 0..8, depth 1,
    /// all-1 kernel.
    fn loaded() -> RingCfu {
        let mut cfu = RingCfu::new();
        cfu.dispatch(0, opcodes::WRITE_INPUT_DEPTH, 0, 1);
        for tap in 0..8u32 {
            cfu.dispatch(0, opcodes::WRITE_KERNEL, tap, 1);
            cfu.dispatch(0, opcodes::WRITE_INPUT, tap, (tap + 1) * 10);
        }
        cfu
    }

    #[test]
    fn phase_rotates_tap_alignment() {
        let mut cfu = loaded();
        cfu.dispatch(0, opcodes::START_SINGLE, 0, 0);
        let sum = cfu.dispatch(0, opcodes::READ_ACCUMULATOR, 0, 0);
        assert_eq!(sum, 360); // 10+..+80, any rotation
        cfu.dispatch(0, opcodes::WRITE_WINDOW_PHASE, 0, 3);
        cfu.dispatch(0, opcodes::START_SINGLE, 0, 0);
        assert_eq!(cfu.dispatch(0, opcodes::READ_ACCUMULATOR, 0, 0), 360);
    }

    #[test]
    fn phase_alignment_with_asymmetric_kernel() {
        let mut cfu = RingCfu::new();
        cfu.dispatch(0, opcodes::WRITE_INPUT_DEPTH, 0, 1);
        // Only tap 0 weighted; window slots hold 1..=8.
        cfu.dispatch(0, opcodes::WRITE_KERNEL, 0, 1);
        for slot in 0..8u32 {
            cfu.dispatch(0, opcodes::WRITE_INPUT, slot, slot + 1);
        }
        for phase in 0..8u32 {
            cfu.dispatch(0, opcodes::WRITE_WINDOW_PHASE, 0, phase);
            cfu.dispatch(0, opcodes::START_SINGLE, 0, 0);
            // Tap 0 reads slot `phase`.
            assert_eq!(
                cfu.dispatch(0, opcodes::READ_ACCUMULATOR, 0, 0),
                phase + 1
            );
        }
    }

    #[test]
    fn window_capacity_is_one_receptive_field() {
        let mut cfu = RingCfu::new();
        let last = (WINDOW_CAPACITY - 1) as u32;
        cfu.dispatch(0, opcodes::WRITE_INPUT, last, 0x80);
        assert_eq!(cfu.dispatch(0, opcodes::READ_INPUT, last, 0), -128i32 as u32);
    }

    #[test]
    #[should_panic(expected = "window address")]
    fn frame_addresses_do_not_fit_the_window() {
        let mut cfu = RingCfu::new();
        cfu.dispatch(0, opcodes::WRITE_INPUT, WINDOW_CAPACITY as u32, 1);
    }

    #[test]
    fn reset_clears_phase_and_accumulator() {
        let mut cfu = loaded();
        cfu.dispatch(0, opcodes::WRITE_WINDOW_PHASE, 0, 5);
        cfu.dispatch(0, opcodes::START_SINGLE, 0, 0);
        cfu.dispatch(0, opcodes::RESET, 0, 0);
        assert_eq!(cfu.dispatch(0, opcodes::READ_ACCUMULATOR, 0, 0), 0);
        assert_eq!(cfu.phase, 0);
    }
}
