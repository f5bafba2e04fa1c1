//! `cfu` — command-line interface for the conv1d CFU software model.
//!
//! ```text
//! USAGE:
//!   cfu editions                     List editions and their profiles
//!   cfu run [--edition <name>] [--layer <file>]
//!                                    Run a layer through an edition
//!   cfu pack --out <file>            Write the demo layer as a packed blob
//!   cfu traffic [--width N] [--depth N] [--output-depth N]
//!                                    Compare command traffic across editions
//! ```

use anyhow::{Context, Result};
use cfu_chip::geometry::KERNEL_LENGTH;
use cfu_sim::prelude::*;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cfu", about = "conv1d CFU software model CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// List all editions and their capability profiles.
    Editions,
    /// Run a layer through one edition (the built-in demo layer unless
    /// a packed blob is given).
    Run {
        /// Edition name (full-frame, full-frame-quant, streaming, ring).
        #[arg(long, default_value = "ring")]
        edition: String,
        /// Packed layer blob to run instead of the demo layer.
        #[arg(long)]
        layer: Option<PathBuf>,
    },
    /// Write the demo layer to a packed blob file.
    Pack {
        /// Output path.
        #[arg(long)]
        out: PathBuf,
    },
    /// Compare host command traffic and modeled memory across editions.
    Traffic {
        /// Frame width (output positions).
        #[arg(long, default_value_t = 256)]
        width: usize,
        /// Input channel count.
        #[arg(long, default_value_t = 2)]
        depth: usize,
        /// Output channel count.
        #[arg(long, default_value_t = 4)]
        output_depth: usize,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Cmd::Editions => cmd_editions(),
        Cmd::Run { edition, layer } => cmd_run(&edition, layer.as_deref())?,
        Cmd::Pack { out } => cmd_pack(&out)?,
        Cmd::Traffic {
            width,
            depth,
            output_depth,
        } => cmd_traffic(width, depth, output_depth)?,
    }
    Ok(())
}

fn cmd_editions() {
    println!("{:<18} {:>12} {:>14} {:>11}", "edition", "input bytes", "output", "ram bytes");
    for edition in Edition::ALL {
        let profile = Profile::for_edition(edition);
        let output = match profile.output {
            cfu_sim::OutputKind::QuantizedFrame => "i8 frame",
            cfu_sim::OutputKind::RawFrame => "i32 frame",
            cfu_sim::OutputKind::Accumulator => "accumulator",
        };
        println!(
            "{:<18} {:>12} {:>14} {:>11}",
            edition.to_string(),
            profile.input_capacity,
            output,
            profile.ram_bytes()
        );
    }
}

fn cmd_run(edition: &str, blob_path: Option<&std::path::Path>) -> Result<()> {
    let edition: Edition = edition
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    let layer = match blob_path {
        Some(path) => {
            let blob = std::fs::read(path)
                .with_context(|| format!("reading layer blob {}", path.display()))?;
            Conv1dLayer::from_blob(&blob)?
        }
        None => demo_layer(),
    };
    // A small deterministic ramp when the layer doesn't come with data.
    let input: Vec<i8> = if blob_path.is_some() {
        (0..layer.input_len()).map(|i| (i % 17) as i8 - 8).collect()
    } else {
        vec![0, 0, 0, 0, 5, 6, 7, 0]
    };

    let mut cfu = build_edition(edition);
    let mut runner = LayerRunner::new();
    let output = runner.run(cfu.as_mut(), &layer, &input)?;

    println!("edition : {edition}");
    println!("input   : {input:?}");
    println!("output  : {output:?}");
    let t = runner.traffic();
    println!(
        "traffic : {} buffer writes, {} scalar writes, {} reads, {} computes",
        t.buffer_writes, t.scalar_writes, t.reads, t.computes
    );
    Ok(())
}

fn cmd_pack(out: &std::path::Path) -> Result<()> {
    let layer = demo_layer();
    let blob = layer.pack();
    std::fs::write(out, &blob)
        .with_context(|| format!("writing layer blob {}", out.display()))?;
    println!("wrote {} bytes to {}", blob.len(), out.display());
    Ok(())
}

fn cmd_traffic(width: usize, depth: usize, output_depth: usize) -> Result<()> {
    let layer = synthetic_layer(width, depth, output_depth);
    let input = vec![1i8; layer.input_len()];

    println!("width {width}, input depth {depth}, output depth {output_depth}");
    println!();
    println!(
        "{:<18} {:>14} {:>14} {:>10} {:>11}",
        "edition", "buffer writes", "scalar writes", "computes", "ram bytes"
    );
    for edition in Edition::ALL {
        let mut cfu = build_edition(edition);
        let mut runner = LayerRunner::new();
        runner.run(cfu.as_mut(), &layer, &input)?;
        let t = runner.traffic();
        println!(
            "{:<18} {:>14} {:>14} {:>10} {:>11}",
            edition.to_string(),
            t.buffer_writes,
            t.scalar_writes,
            t.computes,
            cfu.profile().ram_bytes()
        );
    }
    println!();
    println!("The ring edition trades O(width) memory for O(width) extra host writes.");
    Ok(())
}

/// The demo layer: all-2 kernel, identity rescale, no offsets.
fn demo_layer() -> Conv1dLayer {
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

/// A synthetic layer for traffic comparison; contents don't matter, shape
/// does.
fn synthetic_layer(width: usize, depth: usize, output_depth: usize) -> Conv1dLayer {
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
