use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Key of the difficulty setting.
pub const DIFFICULTY_KEY: &str = "diff";
/// Key of the level size setting.
pub const SIZE_KEY: &str = "size";
/// Key of the ambient mode setting.
pub const AMBIENT_KEY: &str = "ambient";
/// Key of the game mode setting.
pub const MODE_KEY: &str = "mode";

/// A value stored under a settings key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    /// Free text, used for named options.
    Text(String),
    /// A whole number.
    Integer(i64),
    /// An on/off switch.
    Flag(bool),
}

impl SettingValue {
    /// The text, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The number, if this is an integer value.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// The switch, if this is a flag value.
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(b) => Some(*b),
            _ => None,
        }
    }

    /// Parse a text value into a typed option.
    pub fn parse<T: FromStr>(&self) -> Option<T> {
        self.as_text()?.parse().ok()
    }
}

impl From<&str> for SettingValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<i64> for SettingValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<bool> for SettingValue {
    fn from(b: bool) -> Self {
        Self::Flag(b)
    }
}

/// Game difficulty. The index drives the mob cap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Difficulty {
    /// No hostile mobs.
    Peaceful,
    /// Lowest mob cap.
    Easy,
    /// Default mob cap.
    #[default]
    Normal,
    /// Highest mob cap.
    Hard,
}

impl Difficulty {
    /// Position in the difficulty ladder.
    pub fn index(self) -> u32 {
        match self {
            Self::Peaceful => 0,
            Self::Easy => 1,
            Self::Normal => 2,
            Self::Hard => 3,
        }
    }
}

/// Whether ambient cues play, and in which mood.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AmbientMode {
    /// Calm cues.
    Nice,
    /// Unsettling cues.
    Scary,
    /// No cues.
    #[default]
    Off,
}

/// Rules the player plays under.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum GameMode {
    /// Default rules.
    #[default]
    Survival,
    /// Enemies can be cleared wholesale, boss included.
    Creative,
    /// Survival with one life.
    Hardcore,
    /// Timed run for score.
    Score,
}

/// Error returned when a settings string names no known option.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} \"{value}\"")]
pub struct ParseSettingError {
    kind: &'static str,
    value: String,
}

macro_rules! parse_options {
    ($ty:ty, $kind:literal, [$($name:literal => $variant:expr),+ $(,)?]) => {
        impl FromStr for $ty {
            type Err = ParseSettingError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $(if s.eq_ignore_ascii_case($name) {
                    return Ok($variant);
                })+
                Err(ParseSettingError { kind: $kind, value: s.to_string() })
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                $(if *self == $variant {
                    return f.write_str($name);
                })+
                Ok(())
            }
        }
    };
}

parse_options!(Difficulty, "difficulty", [
    "Peaceful" => Difficulty::Peaceful,
    "Easy" => Difficulty::Easy,
    "Normal" => Difficulty::Normal,
    "Hard" => Difficulty::Hard,
]);

parse_options!(AmbientMode, "ambient mode", [
    "Nice" => AmbientMode::Nice,
    "Scary" => AmbientMode::Scary,
    "Off" => AmbientMode::Off,
]);

parse_options!(GameMode, "game mode", [
    "Survival" => GameMode::Survival,
    "Creative" => GameMode::Creative,
    "Hardcore" => GameMode::Hardcore,
    "Score" => GameMode::Score,
]);

/// Read-only settings lookup the kernel consults while ticking.
///
/// Implementors only provide [`Settings::get`]; the typed accessors fall
/// back to defaults for missing or malformed values.
pub trait Settings: fmt::Debug {
    /// Raw value stored under `key`.
    fn get(&self, key: &str) -> Option<SettingValue>;

    /// Configured difficulty, `Normal` when unset.
    fn difficulty(&self) -> Difficulty {
        self.get(DIFFICULTY_KEY)
            .and_then(|v| v.parse())
            .unwrap_or_default()
    }

    /// Configured ambient mode, `Off` when unset.
    fn ambient(&self) -> AmbientMode {
        self.get(AMBIENT_KEY)
            .and_then(|v| v.parse())
            .unwrap_or_default()
    }

    /// Configured game mode, `Survival` when unset.
    fn mode(&self) -> GameMode {
        self.get(MODE_KEY)
            .and_then(|v| v.parse())
            .unwrap_or_default()
    }

    /// Level edge length in tiles.
    fn size(&self) -> i32 {
        self.get(SIZE_KEY)
            .and_then(|v| v.as_integer())
            .and_then(|n| i32::try_from(n).ok())
            .filter(|n| *n > 0)
            .unwrap_or(128)
    }
}

/// In-memory settings.
#[derive(Debug, Clone, Default)]
pub struct MapSettings {
    values: BTreeMap<String, SettingValue>,
}

impl MapSettings {
    /// Empty settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`MapSettings::set`].
    pub fn with(mut self, key: &str, value: impl Into<SettingValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Store `value` under `key`.
    pub fn set(&mut self, key: &str, value: impl Into<SettingValue>) {
        self.values.insert(key.to_string(), value.into());
    }

    /// Builder for the difficulty key.
    pub fn with_difficulty(self, difficulty: Difficulty) -> Self {
        self.with(DIFFICULTY_KEY, difficulty.to_string().as_str())
    }

    /// Builder for the ambient mode key.
    pub fn with_ambient(self, ambient: AmbientMode) -> Self {
        self.with(AMBIENT_KEY, ambient.to_string().as_str())
    }

    /// Builder for the game mode key.
    pub fn with_mode(self, mode: GameMode) -> Self {
        self.with(MODE_KEY, mode.to_string().as_str())
    }
}

impl Settings for MapSettings {
    fn get(&self, key: &str) -> Option<SettingValue> {
        self.values.get(key).cloned()
    }
}
