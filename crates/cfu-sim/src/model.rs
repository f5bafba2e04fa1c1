//! Model abstraction over the edition family.
//!
//! Every edition implements the same four-argument dispatch contract the
//! hardware exposes; the trait is what lets the host driver and the
//! equivalence tests run editions side by side.

use crate::editions::{FullFrameCfu, RingCfu, StreamingCfu};
use crate::profile::Profile;
use std::fmt;
use std::str::FromStr;

/// The CFU dispatch contract — one call per custom instruction.
///
/// `funct3` selects the accelerator family (anything but the conv1d family
/// returns 0), `funct7` the operation, `rs1`/`rs2` the operands. Side
/// effects are confined to the model's own buffers and registers; the call
/// is synchronous and returns one 32-bit word.
pub trait CfuModel: fmt::Debug {
    /// Execute one command. Unrecognized commands return 0.
    fn dispatch(&mut self, funct3: u32, funct7: u32, rs1: u32, rs2: u32) -> u32;

    /// The edition's capability record.
    fn profile(&self) -> &Profile;

    /// Which edition this model is.
    fn edition(&self) -> Edition {
        self.profile().edition
    }
}

/// Buffer-management edition selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edition {
    /// Whole input row, raw i32 output frame (engine adds bias, host
    /// requantizes).
    FullFrame,
    /// Whole input row, i8 output frame requantized in-engine.
    FullFrameQuant,
    /// Whole input row, single accumulator positioned by the
    /// `in_x_origin` register.
    Streaming,
    /// Sliding window of one receptive field, single accumulator,
    /// `start_filter_x` phase register.
    Ring,
}

impl Edition {
    /// All editions, in protocol-evolution order.
    pub const ALL: [Self; 4] = [
        Self::FullFrameQuant,
        Self::FullFrame,
        Self::Streaming,
        Self::Ring,
    ];
}

impl fmt::Display for Edition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FullFrame => "full-frame",
            Self::FullFrameQuant => "full-frame-quant",
            Self::Streaming => "streaming",
            Self::Ring => "ring",
        };
        write!(f, "{name}")
    }
}

impl FromStr for Edition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full-frame" | "full" => Ok(Self::FullFrame),
            "full-frame-quant" | "quant" => Ok(Self::FullFrameQuant),
            "streaming" | "stream" => Ok(Self::Streaming),
            "ring" | "window" => Ok(Self::Ring),
            other => Err(format!("unknown edition: {other}")),
        }
    }
}

/// Construct a boxed model for the requested edition.
#[must_use]
pub fn build_edition(edition: Edition) -> Box<dyn CfuModel> {
    tracing::debug!("building {edition} edition");
    match edition {
        Edition::FullFrame => Box::new(FullFrameCfu::raw()),
        Edition::FullFrameQuant => Box::new(FullFrameCfu::quantized()),
        Edition::Streaming => Box::new(StreamingCfu::new()),
        Edition::Ring => Box::new(RingCfu::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edition_names_round_trip() {
        for edition in Edition::ALL {
            let parsed: Edition = edition.to_string().parse().unwrap();
            assert_eq!(parsed, edition);
        }
    }

    #[test]
    fn unknown_edition_is_rejected()  {
        assert!("v9".parse::<Edition>().is_err());
    }

    #[test]
    fn build_edition_honors_selection() {
        for edition in Edition::ALL {
            assert_eq!(build_edition(edition).edition(), edition);
        }
    }
}
