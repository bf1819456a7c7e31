use std::fmt::{Display, Formatter};

use crate::Dbm;

/// Lowest usable receive power of the operating window.
pub const MIN_POWER: Dbm = -28.0;
/// Highest power of the operating window.
pub const MAX_POWER: Dbm = 3.0;
/// Below this value, power is still usable but has little margin left.
pub const MARGINAL_POWER: Dbm = -20.0;

/// The operating window used to normalize a power level to a percentage.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PowerWindow {
    pub min: Dbm,
    pub max: Dbm,
}

impl Default for PowerWindow {
    fn default() -> Self {
        Self {
            min: MIN_POWER,
            max: MAX_POWER,
        }
    }
}

/// Maps a power level onto the default operating window, see [`to_percent_in`].
pub fn to_percent(power: Dbm) -> u8 {
    to_percent_in(power, &PowerWindow::default())
}

/// Linear map from the operating window to `0..=100`, clamped at both ends and rounded to the nearest integer.
///
/// A degenerate window (`max <= min`) maps everything at or above `max` to 100 and everything else to 0.
pub fn to_percent_in(power: Dbm, window: &PowerWindow) -> u8 {
    let span = window.max - window.min;
    if span <= 0.0 {
        return if power >= window.max { 100 } else { 0 };
    }

    let percent = ((power - window.min) / span) * 100.0;

    // NaN saturates to 0
    percent.clamp(0.0, 100.0).round() as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerLevel {
    Adequate,
    Marginal,
    Insufficient,
}

impl PowerLevel {
    pub fn classify(power: Dbm) -> Self {
        if power < MIN_POWER {
            Self::Insufficient
        } else if power < MARGINAL_POWER {
            Self::Marginal
        } else {
            Self::Adequate
        }
    }
}

impl Display for PowerLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PowerLevel::Adequate => f.write_str("Adequate"),
            PowerLevel::Marginal => f.write_str("Marginal"),
            PowerLevel::Insufficient => f.write_str("Insufficient"),
        }
    }
}


#[cfg(test)]
mod power_level_tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0.0, PowerLevel::Adequate)]
    #[case(-20.0, PowerLevel::Adequate)]
    #[case(-20.1, PowerLevel::Marginal)]
    #[case(-28.0, PowerLevel::Marginal)]
    #[case(-28.1, PowerLevel::Insufficient)]
    fn classify(#[case] power: Dbm, #[case] expected: PowerLevel) {
        assert_eq!(PowerLevel::classify(power), expected);
    }
}
