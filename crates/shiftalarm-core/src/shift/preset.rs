use serde::{Deserialize, Serialize};

use super::{parse_cycle, ShiftType};

/// Common rotations offered when building a new pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternPreset {
    TwoDaysTwoNightsTwoOff,
    DayNightOff,
    FourOnFourOff,
    Panama,
    Weekdays,
}

impl PatternPreset {
    pub const ALL: [PatternPreset; 5] = [
        PatternPreset::TwoDaysTwoNightsTwoOff,
        PatternPreset::DayNightOff,
        PatternPreset::FourOnFourOff,
        PatternPreset::Panama,
        PatternPreset::Weekdays,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PatternPreset::TwoDaysTwoNightsTwoOff => "2 Days, 2 Nights, 2 Off",
            PatternPreset::DayNightOff => "Day / Night / Off",
            PatternPreset::FourOnFourOff => "4 On 4 Off",
            PatternPreset::Panama => "2-2-3 Panama",
            PatternPreset::Weekdays => "Weekdays",
        }
    }

    pub fn codes(self) -> &'static str {
        match self {
            PatternPreset::TwoDaysTwoNightsTwoOff => "DDNNOO",
            PatternPreset::DayNightOff => "DNO",
            PatternPreset::FourOnFourOff => "DDDDOOOO",
            PatternPreset::Panama => "DDOODDDOODDOOO",
            PatternPreset::Weekdays => "DDDDDOO",
        }
    }

    pub fn cycle(self) -> Vec<ShiftType> {
        // Preset code tables only use known codes.
        parse_cycle(self.codes()).unwrap_or_default()
    }

    /// Lookup by the serde name, e.g. `"four_on_four_off"`.
    pub fn from_key(key: &str) -> Option<Self> {
        serde_json::from_value(serde_json::Value::String(key.to_string())).ok()
    }
}
