// Playing positions and their parsing from upstream labels and codes.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Upstream element-type codes
// ---------------------------------------------------------------------------

pub const ELEMENT_TYPE_GK: u8 = 1;
pub const ELEMENT_TYPE_DEF: u8 = 2;
pub const ELEMENT_TYPE_MID: u8 = 3;
pub const ELEMENT_TYPE_FWD: u8 = 4;

/// Football positions used for quota accounting and volatility.
///
/// The derived ordering (GK < DEF < MID < FWD) is the order the quota phase
/// walks positions in and the order lineups are displayed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Position {
    #[serde(alias = "GKP")]
    GK,
    DEF,
    MID,
    FWD,
}

impl Position {
    /// All positions in quota/display order.
    pub const ALL: [Position; 4] = [Position::GK, Position::DEF, Position::MID, Position::FWD];

    /// Parse a position label or numeric element-type code.
    ///
    /// Accepts:
    /// - "GK"/"GKP"/"G", "DEF"/"D", "MID"/"M", "FWD"/"F" (case-insensitive)
    /// - "1".."4" -> GK, DEF, MID, FWD
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "GK" | "GKP" | "G" => Some(Position::GK),
            "DEF" | "D" => Some(Position::DEF),
            "MID" | "M" => Some(Position::MID),
            "FWD" | "F" => Some(Position::FWD),
            other => other.parse::<u8>().ok().and_then(Position::from_element_type),
        }
    }

    /// Map an upstream element-type code (1-4) to a position.
    pub fn from_element_type(code: u8) -> Option<Self> {
        match code {
            ELEMENT_TYPE_GK => Some(Position::GK),
            ELEMENT_TYPE_DEF => Some(Position::DEF),
            ELEMENT_TYPE_MID => Some(Position::MID),
            ELEMENT_TYPE_FWD => Some(Position::FWD),
            _ => None,
        }
    }

    /// Return the display string for this position.
    pub fn display_str(&self) -> &'static str {
        match self {
            Position::GK => "GK",
            Position::DEF => "DEF",
            Position::MID => "MID",
            Position::FWD => "FWD",
        }
    }

    /// Plural heading used when grouping a lineup by position.
    pub fn group_label(&self) -> &'static str {
        match self {
            Position::GK => "Goalkeeper",
            Position::DEF => "Defenders",
            Position::MID => "Midfielders",
            Position::FWD => "Forwards",
        }
    }

    /// Whether this position counts towards the outfield formation string.
    pub fn is_outfield(&self) -> bool {
        !matches!(self, Position::GK)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
