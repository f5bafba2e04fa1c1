// SPDX-License-Identifier: AGPL-3.0-only

//! validate_editions — exhaustive cross-edition agreement sweep.
//!
//! The full-frame edition is the ground truth the memory-reduced editions
//! are validated against: every edition must produce bit-identical i8
//! output for the same layer and input. This binary sweeps deterministic
//! pseudo-random layers across a grid of shapes and reports the first
//! divergence, if any.
//!
//! Usage:
//!   cargo run --bin validate_editions
//!   cargo run --bin validate_editions -- --rounds 500 --seed 7

use anyhow::{bail, Result};
use cfu_chip::geometry::KERNEL_LENGTH;
use cfu_chip::quant::quantize_multiplier;
use cfu_sim::prelude::*;
use tracing_subscriber::EnvFilter;

const DEFAULT_ROUNDS: usize = 200;

// ── PRNG ─────────────────────────────────────────────────────────────────────

struct Xoshiro {
    s: [u64; 4],
}

impl Xoshiro {
    fn new(seed: u64) -> Self {
        let s = [
            seed ^ 0x9e37_79b9_7f4a_7c15,
            seed.wrapping_add(0x6c62_272e_07bb_0142),
            seed.rotate_left(17),
            seed.rotate_right(5),
        ];
        let mut rng = Self { s };
        for _ in 0..20 {
            let _ = rng.next_u64();
        }
        rng
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.s[0].wrapping_add(self.s[3]))
            .rotate_left(23)
            .wrapping_add(self.s[0]);
        let t = self.s[1].wrapping_shl(17);
        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];
        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);
        result
    }

    fn below(&mut self, bound: u64) -> u64 {
        self.next_u64() % bound
    }
}

// ── Sweep ────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let rounds = parse_arg(&args, "--rounds", DEFAULT_ROUNDS as u64) as usize;
    let seed = parse_arg(&args, "--seed", 0xBEEF);

    println!("Cross-edition validation sweep");
    println!("==============================");
    println!("Rounds : {rounds}");
    println!("Seed   : {seed:#x}");
    println!();

    let mut rng = Xoshiro::new(seed);
    let mut checked = 0usize;

    for round in 0..rounds {
        let (layer, input) = random_layer(&mut rng);

        let mut reference = build_edition(Edition::FullFrame);
        let expected = LayerRunner::new().run(reference.as_mut(), &layer, &input)?;

        for edition in [Edition::FullFrameQuant, Edition::Streaming, Edition::Ring] {
            let mut cfu = build_edition(edition);
            let got = LayerRunner::new().run(cfu.as_mut(), &layer, &input)?;
            if got != expected {
                report_divergence(round, edition, &layer, &expected, &got);
                bail!("edition {edition} diverged in round {round}");
            }
            checked += 1;
        }

        if (round + 1) % 50 == 0 {
            println!("  {} rounds done", round + 1);
        }
    }

    println!();
    println!("PASS — {checked} edition runs, all bit-identical to full-frame");
    Ok(())
}

fn random_layer(rng: &mut Xoshiro) -> (Conv1dLayer, Vec<i8>) {
    let input_depth = 1 + rng.below(4) as usize;
    let output_depth = 1 + rng.below(4) as usize;
    let width = 1 + rng.below(96) as usize;

    let filters = (0..output_depth)
        .map(|_| {
            let scale = 0.001 + (rng.below(1000) as f64) / 2000.0;
            let (multiplier, shift) = quantize_multiplier(scale);
            Filter {
                weights: (0..KERNEL_LENGTH * input_depth)
                    .map(|_| rng.next_u64() as i8)
                    .collect(),
                bias: rng.below(1001) as i32 - 500,
                multiplier,
                shift,
            }
        })
        .collect();

    let layer = Conv1dLayer {
        input_depth,
        output_depth,
        width,
        input_offset: rng.below(255) as i32 - 127,
        output_offset: -(rng.below(129) as i32),
        activation_min: -128,
        activation_max: 127,
        filters,
    };
    let input = (0..layer.input_len()).map(|_| rng.next_u64() as i8).collect();
    (layer, input)
}

fn report_divergence(
    round: usize,
    edition: Edition,
    layer: &Conv1dLayer,
    expected: &[i8],
    got: &[i8],
) {
    println!("FAIL — round {round}, edition {edition}");
    println!(
        "  shape: width {}, input depth {}, output depth {}",
        layer.width, layer.input_depth, layer.output_depth
    );
    for (i, (e, g)) in expected.iter().zip(got.iter()).enumerate() {
        if e != g {
            println!("  first mismatch at index {i}: expected {e}, got {g}");
            break;
        }
    }
}

fn parse_arg(args: &[String], flag: &str, default: u64) -> u64 {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
