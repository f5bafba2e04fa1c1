//! Software model of a conv1d CFU (Custom Function Unit).
//!
//! A drop-in stand-in for the accelerator hardware: host code written
//! against the four-argument custom-instruction call
//! (`dispatch(funct3, funct7, rs1, rs2) -> u32`) runs and is verified
//! against this model without silicon.
//!
//! # Edition family
//!
//! ```text
//! Baseline (largest memory, fewest host writes):
//!   FullFrameQuant — whole row in, i8 frame out, requantizes in-engine
//!   FullFrame      — whole row in, raw i32 frame out
//!
//! Memory-reduced:
//!   Streaming — whole row in, single accumulator, host iterates positions
//!   Ring      — one receptive field in a circular window, single
//!               accumulator; O(width) memory → O(kernel) at the cost of
//!               O(width) extra host writes
//! ```
//!
//! All editions share one accumulation algorithm and must agree
//! bit-for-bit — the equivalence tests in `tests/` hold them to it.
//!
//! # Quick start
//!
//! ```
//! use cfu_sim::{build_edition, Conv1dLayer, Edition, Filter, LayerRunner};
//!
//! # fn main() -> cfu_sim::Result<()> {
//! let layer = Conv1dLayer {
//!     input_depth: 1,
//!     output_depth: 1,
//!     width: 8,
//!     input_offset: 0,
//!     output_offset: 0,
//!     activation_min: -128,
//!     activation_max: 127,
//!     filters: vec![Filter {
//!         weights: vec![2; 8],
//!         bias: 0,
//!         multiplier: 1 << 30, // identity rescale
//!         shift: 1,
//!     }],
//! };
//! let mut cfu = build_edition(Edition::Ring);
//! let mut runner = LayerRunner::new();
//! let out = runner.run(cfu.as_mut(), &layer, &[0, 0, 0, 0, 5, 6, 7, 0])?;
//! assert_eq!(out[0], 10);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
// A register interface is 32-bit reinterpretation throughout; the casts
// are the semantics, not accidents.
#![allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap, clippy::cast_sign_loss)]

mod command;
mod driver;
mod editions;
mod error;
mod layer;
mod model;
mod profile;
mod registers;

pub use command::{Command, ScalarReg};
pub use driver::{LayerRunner, Traffic};
pub use editions::{FullFrameCfu, RingCfu, StreamingCfu};
pub use error::{CfuError, Result};
pub use layer::{Conv1dLayer, Filter, LAYER_MAGIC};
pub use model::{build_edition, CfuModel, Edition};
pub use profile::{OutputKind, Profile};
pub use registers::Registers;

/// Commonly used types.
pub mod prelude {
    pub use crate::{
        build_edition, CfuError, CfuModel, Conv1dLayer, Edition, Filter, LayerRunner, Profile,
        Result, Traffic,
    };
}
