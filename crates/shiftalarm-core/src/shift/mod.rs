//! Shift labels and the repeating shift cycle.
//!
//! A [`ShiftPattern`] maps every calendar date onto one [`ShiftType`] by
//! counting whole days from its start date and reducing modulo the cycle
//! length.

mod pattern;
mod preset;

pub use pattern::{PatternUpdate, ShiftPattern, DEFAULT_SEARCH_HORIZON_DAYS};
pub use preset::PatternPreset;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Label assigned to a single calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftType {
    Day,
    Night,
    Off,
}

impl ShiftType {
    pub const ALL: [ShiftType; 3] = [ShiftType::Day, ShiftType::Night, ShiftType::Off];

    /// Substituted when a persisted code is not recognised.
    pub const FALLBACK: ShiftType = ShiftType::Off;

    pub fn display_name(self) -> &'static str {
        match self {
            ShiftType::Day => "Day",
            ShiftType::Night => "Night",
            ShiftType::Off => "Off",
        }
    }

    pub fn short_code(self) -> char {
        match self {
            ShiftType::Day => 'D',
            ShiftType::Night => 'N',
            ShiftType::Off => 'O',
        }
    }

    /// Case-insensitive lookup by short code.
    pub fn from_code(code: char) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.short_code().eq_ignore_ascii_case(&code))
    }

    /// Lenient lookup used when loading stored records: unknown codes map to
    /// [`ShiftType::FALLBACK`].
    pub fn from_code_or_default(code: char) -> Self {
        Self::from_code(code).unwrap_or_else(|| {
            tracing::warn!(code = %code, fallback = %Self::FALLBACK, "unknown shift code");
            Self::FALLBACK
        })
    }
}

impl fmt::Display for ShiftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Parse a cycle written as short codes, e.g. `"DDNNOO"` or `"D-D-N-N-O-O"`.
///
/// Whitespace, `-` and `,` are accepted as separators. Unknown codes are
/// rejected; the result may be empty.
pub fn parse_cycle(codes: &str) -> Result<Vec<ShiftType>, ValidationError> {
    codes
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != ',')
        .map(|c| ShiftType::from_code(c).ok_or_else(|| ValidationError::UnknownShiftCode(c.to_string())))
        .collect()
}

/// Inverse of [`parse_cycle`] without separators.
pub fn format_cycle(cycle: &[ShiftType]) -> String {
    cycle.iter().map(|s| s.short_code()).collect()
}
