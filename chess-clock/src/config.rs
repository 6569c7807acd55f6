use std::time::Duration;

use crate::sound_controller::SoundSettings;
use clock_common::preset::Preset;
use derivative::Derivative;
use serde::{Deserialize, Serialize};
use toml::Table;

#[derive(Derivative, Serialize, Deserialize)]
#[derivative(Clone, Debug, Default, PartialEq, Eq)]
pub struct Config {
    pub clock: ClockSettings,
    pub sound: SoundSettings,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockSettings {
    pub default_preset: Preset,
    /// How often the running clock is decremented
    #[serde(with = "millis_only_duration")]
    pub tick_interval: Duration,
}

impl Default for ClockSettings {
    fn default() -> Self {
        Self {
            default_preset: Preset::Blitz,
            tick_interval: Duration::from_millis(1000),
        }
    }
}

impl ClockSettings {
    pub fn migrate(old: &Table) -> Self {
        let Self {
            mut default_preset,
            mut tick_interval,
        } = Default::default();

        // Older files stored the preset as its total in milliseconds
        if let Some(value) = old.get("default_preset") {
            if let Some(value) = value.as_str().and_then(|s| s.parse().ok()) {
                default_preset = value;
            } else if let Some(value) = value
                .as_integer()
                .and_then(|i| u64::try_from(i).ok())
                .and_then(|i| Preset::from_millis(i).ok())
            {
                default_preset = value;
            }
        }

        if let Some(value) = old.get("tick_interval") {
            if let Some(value) = value.as_integer().and_then(|i| u64::try_from(i).ok()) {
                if value > 0 {
                    tick_interval = Duration::from_millis(value);
                }
            }
        }

        Self {
            default_preset,
            tick_interval,
        }
    }
}

mod millis_only_duration {
    use serde::{self, Deserialize, Deserializer, Serializer, de::Error};
    use std::time::Duration;

    pub fn serialize<S>(dur: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(dur.as_millis().try_into().unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        match u64::deserialize(deserializer)? {
            0 => Err(D::Error::custom("duration must be at least 1 ms")),
            millis => Ok(Duration::from_millis(millis)),
        }
    }
}

impl Config {
    pub fn migrate(old: &Table) -> Self {
        let Self {
            mut clock,
            mut sound,
        } = Default::default();

        if let Some(old_clock) = old.get("clock") {
            if let Some(old_clock) = old_clock.as_table() {
                clock = ClockSettings::migrate(old_clock);
            }
        }

        if let Some(old_sound) = old.get("sound") {
            if let Some(old_sound) = old_sound.as_table() {
                sound = SoundSettings::migrate(old_sound);
            }
        }

        Self { clock, sound }
    }
}
