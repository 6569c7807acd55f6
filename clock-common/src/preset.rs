use crate::clock_snapshot::secs_to_time_string;
use derivative::Derivative;
use enum_derive_2018::EnumDisplay;
use enum_iterator::Sequence;
use macro_attr_2018::macro_attr;
use serde::{Deserialize, Serialize};
use std::{str::FromStr, time::Duration};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PresetError {
    #[error("No preset is named {0:?}")]
    UnknownName(String),
    #[error("No preset has a total time of {0} ms")]
    UnknownTotal(u128),
}

macro_attr! {
    /// The fixed time controls offered to the players. Each side gets the full amount.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Derivative, Sequence, EnumDisplay!)]
    #[derivative(Default)]
    pub enum Preset {
        Rapid,
        #[derivative(Default)]
        Blitz,
        Bullet,
    }
}

impl Preset {
    pub const fn millis(self) -> u64 {
        match self {
            Self::Rapid => 1_500_000,
            Self::Blitz => 300_000,
            Self::Bullet => 120_000,
        }
    }

    pub const fn duration(self) -> Duration {
        Duration::from_millis(self.millis())
    }

    pub fn from_millis(millis: u64) -> Result<Self, PresetError> {
        Self::try_from(Duration::from_millis(millis))
    }

    /// Menu text, e.g. `Blitz (05:00)`
    pub fn label(self) -> String {
        format!("{self} ({})", secs_to_time_string(self.duration().as_secs()))
    }

    pub fn all() -> impl Iterator<Item = Self> {
        enum_iterator::all::<Self>()
    }
}

impl TryFrom<Duration> for Preset {
    type Error = PresetError;

    fn try_from(total: Duration) -> Result<Self, Self::Error> {
        Self::all()
            .find(|p| p.duration() == total)
            .ok_or(PresetError::UnknownTotal(total.as_millis()))
    }
}

/// Matches the display name, ignoring case and surrounding whitespace
impl FromStr for Preset {
    type Err = PresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::all()
            .find(|p| p.to_string().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| PresetError::UnknownName(wanted.to_string()))
    }
}
