//! Command numbers for the conv1d CFU.
//!
//! The CFU sits on a RISC-V custom-instruction bus: every call carries two
//! opcode fields (`funct3` selects the accelerator family, `funct7` selects
//! the operation) and two 32-bit operands. These numbers are a published
//! wire contract — the hardware decode table is generated from them, so the
//! values are stable even where the spacing looks arbitrary.
//!
//! Operand conventions: `rs1` is a flat buffer address for buffer commands
//! and unused elsewhere; `rs2` carries the payload for writes and is unused
//! for reads and computation triggers.

// ── Family selector (funct3) ─────────────────────────────────────────────────

/// The conv1d family. Any other funct3 value belongs to a different
/// accelerator personality and returns 0 from this model.
pub const CONV1D_FAMILY: u32 = 0;

// ── Buffer commands ──────────────────────────────────────────────────────────

/// Zero all buffers and scalar registers.
pub const RESET: u32 = 0;

/// Store `rs2` (truncated to i8) at flat input-buffer index `rs1`.
pub const WRITE_INPUT: u32 = 10;
/// Store `rs2` (truncated to i8) at flat kernel-buffer index `rs1`.
pub const WRITE_KERNEL: u32 = 11;
/// Return the output-buffer entry at `rs1` (full-frame editions only).
pub const READ_OUTPUT: u32 = 12;
/// Return the input-buffer entry at `rs1`, sign-extended.
pub const READ_INPUT: u32 = 13;
/// Return the kernel-buffer entry at `rs1`, sign-extended.
pub const READ_KERNEL: u32 = 14;
/// Zero the output buffer only (full-frame editions only).
pub const ZERO_OUTPUT: u32 = 15;

// ── Scalar configuration ─────────────────────────────────────────────────────
// Writes 20–26 echo the stored value back; 27–29 return 0. The asymmetry is
// part of the decode table.

/// Write `input_offset`.
pub const WRITE_INPUT_OFFSET: u32 = 20;
/// Write `output_offset`.
pub const WRITE_OUTPUT_OFFSET: u32 = 21;
/// Write `output_activation_min`.
pub const WRITE_ACTIVATION_MIN: u32 = 22;
/// Write `output_activation_max`.
pub const WRITE_ACTIVATION_MAX: u32 = 23;
/// Write `output_depth`.
pub const WRITE_OUTPUT_DEPTH: u32 = 24;
/// Write `input_output_width`.
pub const WRITE_INPUT_OUTPUT_WIDTH: u32 = 25;
/// Write `input_depth`.
pub const WRITE_INPUT_DEPTH: u32 = 26;
/// Write `bias`.
pub const WRITE_BIAS: u32 = 27;
/// Write `output_multiplier`.
pub const WRITE_OUTPUT_MULTIPLIER: u32 = 28;
/// Write `output_shift`.
pub const WRITE_OUTPUT_SHIFT: u32 = 29;

// ── Computation ──────────────────────────────────────────────────────────────

/// Run the convolution over every output position (full-frame editions).
pub const START_FRAME: u32 = 40;
/// Run the convolution for a single position into the retained
/// accumulator (streaming and ring editions).
pub const START_SINGLE: u32 = 41;
/// Write the receptive-field origin `in_x_origin` (streaming edition;
/// `rs2` is interpreted as two's-complement i32 and may be negative).
pub const WRITE_IN_X_ORIGIN: u32 = 42;
/// Return the retained accumulator (streaming and ring editions).
pub const READ_ACCUMULATOR: u32 = 43;
/// Write the window phase `start_filter_x` — which window slot currently
/// holds the logical first tap (ring edition).
pub const WRITE_WINDOW_PHASE: u32 = 44;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_numbers_are_stable() {
        // Hardware decode tables depend on these exact values.
        assert_eq!(RESET, 0);
        assert_eq!(WRITE_INPUT, 10);
        assert_eq!(WRITE_KERNEL, 11);
        assert_eq!(READ_OUTPUT, 12);
        assert_eq!(ZERO_OUTPUT, 15);
        assert_eq!(WRITE_INPUT_OFFSET, 20);
        assert_eq!(WRITE_OUTPUT_SHIFT, 29);
        assert_eq!(START_FRAME, 40);
        assert_eq!(WRITE_WINDOW_PHASE, 44);
    }

    #[test]
    fn command_numbers_do_not_collide() {
        let all = [
            RESET,
            WRITE_INPUT,
            WRITE_KERNEL,
            READ_OUTPUT,
            READ_INPUT,
            READ_KERNEL,
            ZERO_OUTPUT,
            WRITE_INPUT_OFFSET,
            WRITE_OUTPUT_OFFSET,
            WRITE_ACTIVATION_MIN,
            WRITE_ACTIVATION_MAX,
            WRITE_OUTPUT_DEPTH,
            WRITE_INPUT_OUTPUT_WIDTH,
            WRITE_INPUT_DEPTH,
            WRITE_BIAS,
            WRITE_OUTPUT_MULTIPLIER,
            WRITE_OUTPUT_SHIFT,
            START_FRAME,
            START_SINGLE,
            WRITE_IN_X_ORIGIN,
            READ_ACCUMULATOR,
            WRITE_WINDOW_PHASE,
        ];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
