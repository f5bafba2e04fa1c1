//! Write-traffic accounting — the cost side of the ring edition's memory
//! saving.
//!
//! The ring edition shrinks the input buffer from O(width) to
//! O(kernel_length) but the host must rewrite one window slot per output
//! position per channel. This bench sweeps frame widths and reports the
//! command counts, so the tradeoff is measured rather than asserted.
//!
//! Usage:
//!   cargo run --bin bench_write_traffic
//!   cargo run --bin bench_write_traffic -- --depth 4 --output-depth 8

use anyhow::Result;
use cfu_chip::geometry::KERNEL_LENGTH;
use cfu_sim::prelude::*;
use tracing_subscriber::EnvFilter;

const WIDTHS: [usize; 4] = [64, 256, 512, 1024];
const DEFAULT_DEPTH: usize = 2;
const DEFAULT_OUTPUT_DEPTH: usize = 4;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let depth = parse_arg(&args, "--depth", DEFAULT_DEPTH);
    let output_depth = parse_arg(&args, "--output-depth", DEFAULT_OUTPUT_DEPTH);

    println!("Write-traffic benchmark");
    println!("=======================");
    println!("Input depth   : {depth}");
    println!("Output depth  : {output_depth}");
    println!();

    for width in WIDTHS {
        let layer = layer_of(width, depth, output_depth);
        let input = vec![0i8; layer.input_len()];

        println!("width {width}");
        println!(
            "  {:<18} {:>14} {:>14} {:>10} {:>11}",
            "edition", "buffer writes", "scalar writes", "computes", "ram bytes"
        );
        for edition in Edition::ALL {
            let mut cfu = build_edition(edition);
            let mut runner = LayerRunner::new();
            runner.run(cfu.as_mut(), &layer, &input)?;
            let t = runner.traffic();
            println!(
                "  {:<18} {:>14} {:>14} {:>10} {:>11}",
                edition.to_string(),
                t.buffer_writes,
                t.scalar_writes,
                t.computes,
                cfu.profile().ram_bytes()
            );
        }
        println!();
    }

    println!(
        "Ring input writes per channel ≈ ({KERNEL_LENGTH} + width - 1) × depth; full-frame"
    );
    println!("loads the row once per layer. Memory goes the other way; that is the tradeoff.");
    Ok(())
}

fn layer_of(width: usize, depth: usize, output_depth: usize) -> Conv1dLayer {
    Conv1dLayer {
        input_depth: depth,
        output_depth,
        width,
        input_offset: 0,
        output_offset: -128,
        activation_min: -128,
        activation_max: 127,
        filters: (0..output_depth)
            .map(|_| Filter {
                weights: vec![1; KERNEL_LENGTH * depth],
                bias: 0,
                multiplier: 1 << 30,
                shift: 1,
            })
            .collect(),
    }
}

fn parse_arg(args: &[String], flag: &str, default: usize) -> usize {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
