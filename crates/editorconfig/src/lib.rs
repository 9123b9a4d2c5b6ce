use std::fmt;
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct EditorConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(
        default = "default_debounce",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub debounce: Duration,
    #[serde(
        default = "default_watch_interval",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub watch_interval: Duration,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    #[serde(default)]
    pub resolution: Resolution,
    #[serde(default)]
    pub chat: ChatSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ChatSettings {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_model: Option<String>,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            selected_model: None,
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            debounce: default_debounce(),
            watch_interval: default_watch_interval(),
            history_limit: default_history_limit(),
            resolution: Resolution::default(),
            chat: ChatSettings::default(),
        }
    }
}

/// Upper bound for `debounce` and `watch_interval`.
pub const MAX_INTERVAL: Duration = Duration::from_secs(60 * 60);

fn default_version() -> u32 {
    1
}

fn default_debounce() -> Duration {
    Duration::from_millis(500)
}

fn default_watch_interval() -> Duration {
    Duration::from_millis(100)
}

fn default_history_limit() -> usize {
    50
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_temperature() -> f32 {
    0.7
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Duration::from_secs(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs(v as u64))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_nan() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Duration::try_from_secs_f64(v)
                .map_err(|err| E::custom(format!("invalid duration {v}: {err}")))
        }
    }

    deserializer.deserialize_any(Visitor)
}

fn serialize_duration<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&humantime::format_duration(*duration).to_string())
}

impl EditorConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: EditorConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn resolution(&self) -> (u32, u32) {
        (self.resolution.width, self.resolution.height)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        if self.debounce.is_zero() {
            return Err(ConfigError::Invalid(
                "debounce must be greater than zero".into(),
            ));
        }

        if self.watch_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "watch_interval must be greater than zero".into(),
            ));
        }

        for (key, value) in [("debounce", self.debounce), ("watch_interval", self.watch_interval)] {
            if value > MAX_INTERVAL {
                return Err(ConfigError::Invalid(format!(
                    "{key} {} exceeds the {} limit",
                    humantime::format_duration(value),
                    humantime::format_duration(MAX_INTERVAL)
                )));
            }
        }

        if self.history_limit == 0 {
            return Err(ConfigError::Invalid(
                "history_limit must be at least 1".into(),
            ));
        }

        if self.resolution.width == 0 || self.resolution.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "resolution {}x{} must be non-zero in both dimensions",
                self.resolution.width, self.resolution.height
            )));
        }

        if self.chat.max_tokens == 0 {
            return Err(ConfigError::Invalid(
                "chat.max_tokens must be greater than zero".into(),
            ));
        }

        if !(0.0..=2.0).contains(&self.chat.temperature) {
            return Err(ConfigError::Invalid(format!(
                "chat.temperature {} must be within [0, 2]",
                self.chat.temperature
            )));
        }

        if let Some(model) = &self.chat.selected_model {
            if model.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "chat.selected_model may not be empty".into(),
                ));
            }
        }

        Ok(())
    }
}
