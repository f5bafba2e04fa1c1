//! Host-side layer driver.
//!
//! Issues the full command sequence a real host would issue to run one
//! conv1d layer through a CFU: kernel upload, scalar configuration, input
//! upload (whole frame, or ring prefill plus slide), computation, and
//! readback. For editions whose engine stops at the raw accumulator the
//! driver applies bias and requantization itself, with the same arithmetic
//! the quantizing engine uses — which is what makes the editions agree
//! bit-for-bit.
//!
//! The driver also counts every command it issues, making the
//! memory-vs-write-traffic tradeoff between editions measurable.

use crate::error::{CfuError, Result};
use crate::layer::{Conv1dLayer, Filter};
use crate::model::CfuModel;
use crate::profile::OutputKind;
use cfu_chip::geometry::{KERNEL_LENGTH, PAD_LEFT};
use cfu_chip::opcodes;
use cfu_chip::quant::multiply_by_quantized_multiplier;
use tracing::debug;

/// Command counts for one or more layer runs.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Traffic {
    /// Buffer writes (input and kernel).
    pub buffer_writes: u64,
    /// Scalar register writes (configuration, origin, phase).
    pub scalar_writes: u64,
    /// Buffer and accumulator reads.
    pub reads: u64,
    /// Computation triggers.
    pub computes: u64,
    /// Resets.
    pub resets: u64,
}

impl Traffic {
    /// Total commands issued.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.buffer_writes + self.scalar_writes + self.reads + self.computes + self.resets
    }
}

/// Drives layers through any [`CfuModel`], accumulating traffic counts.
#[derive(Debug, Default)]
pub struct LayerRunner {
    traffic: Traffic,
}

impl LayerRunner {
    /// Fresh runner with zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Command counts accumulated so far.
    #[must_use]
    pub const fn traffic(&self) -> &Traffic {
        &self.traffic
    }

    /// Run one layer over `input` (`width × input_depth` samples,
    /// position-major) and return the i8 output frame
    /// (`width × output_depth`, position-major).
    ///
    /// # Errors
    ///
    /// Returns an error if the layer fails validation or `input` has the
    /// wrong length.
    pub fn run(
        &mut self,
        cfu: &mut dyn CfuModel,
        layer: &Conv1dLayer,
        input: &[i8],
    ) -> Result<Vec<i8>> {
        layer.validate()?;
        if input.len() != layer.input_len() {
            return Err(CfuError::InputSizeMismatch {
                expected: layer.input_len(),
                got: input.len(),
            });
        }
        let profile = cfu.profile().clone();
        debug!(
            edition = %profile.edition,
            width = layer.width,
            input_depth = layer.input_depth,
            output_depth = layer.output_depth,
            "running layer"
        );

        self.op(cfu, opcodes::RESET, 0, 0);
        self.write_scalar(cfu, opcodes::WRITE_INPUT_OFFSET, layer.input_offset);
        self.write_scalar(cfu, opcodes::WRITE_INPUT_OUTPUT_WIDTH, layer.width as i32);
        self.write_scalar(cfu, opcodes::WRITE_INPUT_DEPTH, layer.input_depth as i32);

        let mut output = vec![0i8; layer.width * layer.output_depth];
        match profile.output {
            OutputKind::QuantizedFrame => self.run_quantized_frame(cfu, layer, input, &mut output),
            OutputKind::RawFrame => self.run_raw_frame(cfu, layer, input, &mut output),
            OutputKind::Accumulator if profile.windowed => {
                self.run_ring(cfu, layer, input, &mut output);
            }
            OutputKind::Accumulator => self.run_streaming(cfu, layer, input, &mut output),
        }
        Ok(output)
    }

    /// Engine requantizes: configure the whole pipeline, read back final
    /// i8 values.
    fn run_quantized_frame(
        &mut self,
        cfu: &mut dyn CfuModel,
        layer: &Conv1dLayer,
        input: &[i8],
        output: &mut [i8],
    ) {
        self.write_scalar(cfu, opcodes::WRITE_OUTPUT_OFFSET, layer.output_offset);
        self.write_scalar(cfu, opcodes::WRITE_ACTIVATION_MIN, layer.activation_min);
        self.write_scalar(cfu, opcodes::WRITE_ACTIVATION_MAX, layer.activation_max);
        self.write_scalar(cfu, opcodes::WRITE_OUTPUT_DEPTH, layer.output_depth as i32);
        self.load_frame(cfu, input);
        for (oc, filter) in layer.filters.iter().enumerate() {
            self.upload_kernel(cfu, filter);
            self.write_scalar(cfu, opcodes::WRITE_BIAS, filter.bias);
            self.write_scalar(cfu, opcodes::WRITE_OUTPUT_MULTIPLIER, filter.multiplier);
            self.write_scalar(cfu, opcodes::WRITE_OUTPUT_SHIFT, filter.shift);
            self.op(cfu, opcodes::START_FRAME, 0, 0);
            for x in 0..layer.width {
                let value = self.op(cfu, opcodes::READ_OUTPUT, x as u32, 0) as i32;
                output[x * layer.output_depth + oc] = value as i8;
            }
        }
    }

    /// Engine stops after bias: read raw i32 sums, requantize host-side.
    fn run_raw_frame(
        &mut self,
        cfu: &mut dyn CfuModel,
        layer: &Conv1dLayer,
        input: &[i8],
        output: &mut [i8],
    ) {
        self.load_frame(cfu, input);
        for (oc, filter) in layer.filters.iter().enumerate() {
            self.upload_kernel(cfu, filter);
            self.write_scalar(cfu, opcodes::WRITE_BIAS, filter.bias);
            self.op(cfu, opcodes::START_FRAME, 0, 0);
            for x in 0..layer.width {
                let acc = self.op(cfu, opcodes::READ_OUTPUT, x as u32, 0) as i32;
                output[x * layer.output_depth + oc] = requantize(acc, filter, layer);
            }
        }
    }

    /// No output buffer: position the origin register per output x.
    fn run_streaming(
        &mut self,
        cfu: &mut dyn CfuModel,
        layer: &Conv1dLayer,
        input: &[i8],
        output: &mut [i8],
    ) {
        self.load_frame(cfu, input);
        for (oc, filter) in layer.filters.iter().enumerate() {
            self.upload_kernel(cfu, filter);
            for x in 0..layer.width {
                let origin = x as i32 - PAD_LEFT;
                self.write_scalar(cfu, opcodes::WRITE_IN_X_ORIGIN, origin);
                self.op(cfu, opcodes::START_SINGLE, 0, 0);
                let mut acc = self.op(cfu, opcodes::READ_ACCUMULATOR, 0, 0) as i32;
                acc += filter.bias;
                output[x * layer.output_depth + oc] = requantize(acc, filter, layer);
            }
        }
    }

    /// Sliding-window protocol: prefill one receptive field, then rewrite
    /// exactly the stale slot before each next position. Padding samples
    /// are `-input_offset`, which contribute zero once the engine adds the
    /// offset back.
    fn run_ring(
        &mut self,
        cfu: &mut dyn CfuModel,
        layer: &Conv1dLayer,
        input: &[i8],
        output: &mut [i8],
    ) {
        let depth = layer.input_depth;
        for (oc, filter) in layer.filters.iter().enumerate() {
            self.upload_kernel(cfu, filter);

            // Prefill: taps for output position 0 cover in_x -PAD_LEFT ..
            let mut input_cur_x = -PAD_LEFT;
            for tap in 0..KERNEL_LENGTH {
                for ch in 0..depth {
                    let value = window_sample(layer, input, input_cur_x, ch);
                    self.op(
                        cfu,
                        opcodes::WRITE_INPUT,
                        (tap * depth + ch) as u32,
                        value as u32,
                    );
                }
                input_cur_x += 1;
            }

            let mut phase = 0u32;
            for x in 0..layer.width {
                self.write_scalar(cfu, opcodes::WRITE_WINDOW_PHASE, phase as i32);
                self.op(cfu, opcodes::START_SINGLE, 0, 0);
                let mut acc = self.op(cfu, opcodes::READ_ACCUMULATOR, 0, 0) as i32;
                acc += filter.bias;
                output[x * layer.output_depth + oc] = requantize(acc, filter, layer);

                // Slide: the slot holding the oldest tap takes the next
                // sample.
                if x + 1 < layer.width {
                    for ch in 0..depth {
                        let value = window_sample(layer, input, input_cur_x, ch);
                        self.op(
                            cfu,
                            opcodes::WRITE_INPUT,
                            (phase as usize * depth + ch) as u32,
                            value as u32,
                        );
                    }
                    input_cur_x += 1;
                    phase = (phase + 1) % KERNEL_LENGTH as u32;
                }
            }
        }
    }

    fn load_frame(&mut self, cfu: &mut dyn CfuModel, input: &[i8]) {
        for (addr, &sample) in input.iter().enumerate() {
            self.op(cfu, opcodes::WRITE_INPUT, addr as u32, sample as u32);
        }
    }

    fn upload_kernel(&mut self, cfu: &mut dyn CfuModel, filter: &Filter) {
        for (addr, &weight) in filter.weights.iter().enumerate() {
            self.op(cfu, opcodes::WRITE_KERNEL, addr as u32, weight as u32);
        }
    }

    fn write_scalar(&mut self, cfu: &mut dyn CfuModel, funct7: u32, value: i32) -> u32 {
        self.op(cfu, funct7, 0, value as u32)
    }

    /// Issue one command, classifying it for the traffic counters.
    fn op(&mut self, cfu: &mut dyn CfuModel, funct7: u32, rs1: u32, rs2: u32) -> u32 {
        match funct7 {
            opcodes::RESET => self.traffic.resets += 1,
            opcodes::WRITE_INPUT | opcodes::WRITE_KERNEL => self.traffic.buffer_writes += 1,
            opcodes::READ_OUTPUT
            | opcodes::READ_INPUT
            | opcodes::READ_KERNEL
            | opcodes::READ_ACCUMULATOR => self.traffic.reads += 1,
            opcodes::START_FRAME | opcodes::START_SINGLE => self.traffic.computes += 1,
            _ => self.traffic.scalar_writes += 1,
        }
        cfu.dispatch(opcodes::CONV1D_FAMILY, funct7, rs1, rs2)
    }
}

/// Host-side requantization: identical arithmetic and order to the
/// quantizing engine (rescale, offset, clamp — max then min).
#[allow(clippy::cast_possible_truncation)]
fn requantize(acc: i32, filter: &Filter, layer: &Conv1dLayer) -> i8 {
    let mut v = multiply_by_quantized_multiplier(acc, filter.multiplier, filter.shift);
    v += layer.output_offset;
    v = v.max(layer.activation_min);
    v = v.min(layer.activation_max);
    v as i8
}

/// The sample a window slot should hold for logical position `x`:
/// in-image samples come from the frame, out-of-image slots hold
/// `-input_offset` so they contribute zero.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn window_sample(layer: &Conv1dLayer, input: &[i8], x: i32, ch: usize) -> i8 {
    if x >= 0 && (x as usize) < layer.width {
        input[x as usize * layer.input_depth + ch]
    } else {
        (-layer.input_offset) as i8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{build_edition, Edition};

    /// The golden fixture as a layer: identity rescale, no offsets.
    fn golden_layer() -> Conv1dLayer {
        Conv1dLayer {
            input_depth: 1,
            output_depth: 1,
            width: 8,
            input_offset: 0,
            output_offset: 0,
            activation_min: -128,
            activation_max: 127,
            filters: vec![Filter {
                weights: vec![2; KERNEL_LENGTH],
                bias: 0,
                multiplier: 1 << 30,
                shift: 1,
            }],
        }
    }

    #[test]
    fn golden_fixture_through_every_edition() {
        let input = [0i8, 0, 0, 0, 5, 6, 7, 0];
        let expected = [10i8, 22, 36, 36, 36, 36, 36, 36];
        for edition in Edition::ALL {
            let mut cfu = build_edition(edition);
            let mut runner = LayerRunner::new();
            let out = runner.run(cfu.as_mut(), &golden_layer(), &input).unwrap();
            assert_eq!(out, expected, "{edition}");
        }
    }

    #[test]
    fn input_length_is_checked() {
        let mut cfu = build_edition(Edition::FullFrame);
        let mut runner = LayerRunner::new();
        let err = runner
            .run(cfu.as_mut(), &golden_layer(), &[0i8; 7])
            .unwrap_err();
        assert!(matches!(err, CfuError::InputSizeMismatch { .. }));
    }

    #[test]
    fn ring_costs_more_writes_but_less_memory() {
        let input = [1i8; 8];
        let layer = golden_layer();

        let mut full = build_edition(Edition::FullFrame);
        let mut full_runner = LayerRunner::new();
        full_runner.run(full.as_mut(), &layer, &input).unwrap();

        let mut ring = build_edition(Edition::Ring);
        let mut ring_runner = LayerRunner::new();
        ring_runner.run(ring.as_mut(), &layer, &input).unwrap();

        assert!(
            ring_runner.traffic().buffer_writes > full_runner.traffic().buffer_writes,
            "ring {:?} vs full {:?}",
            ring_runner.traffic(),
            full_runner.traffic()
        );
        assert!(ring.profile().ram_bytes() < full.profile().ram_bytes());
    }

    #[test]
    fn nonzero_input_offset_pads_correctly() {
        // With a nonzero input_offset the ring padding samples must still
        // contribute zero at the frame edges.
        let mut layer = golden_layer();
        layer.input_offset = 12;
        let input = [-12i8, -12, -12, -12, -7, -6, -5, -12];

        let mut reference = build_edition(Edition::FullFrame);
        let expected = LayerRunner::new()
            .run(reference.as_mut(), &layer, &input)
            .unwrap();

        let mut ring = build_edition(Edition::Ring);
        let got = LayerRunner::new().run(ring.as_mut(), &layer, &input).unwrap();
        assert_eq!(got, expected);
    }
}
