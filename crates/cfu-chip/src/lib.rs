//! Silicon model for the conv1d CFU (Custom Function Unit).
//!
//! This crate has **no dependencies** and **no simulator state** — it is a
//! pure model of the accelerator's fixed surface: the command encoding the
//! decode table is built from, the buffer geometry baked into the gateware,
//! and the fixed-point requantization arithmetic the RTL implements.
//!
//! Everything here is a wire contract: hardware decode tables and the
//! requantization datapath depend on these exact values, so they must stay
//! stable once published.
//!
//! # Crate organisation
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`opcodes`] | funct3 family selector and the funct7 command numbers |
//! | [`geometry`] | Kernel length, buffer capacities, padding |
//! | [`quant`] | Bit-exact requantization primitives (gemmlowp-style) |

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod geometry;
pub mod opcodes;
pub mod quant;
