use chrono::{FixedOffset, Offset, Utc};
use config::{Config, Environment};
use serde::Deserialize;

use crate::errors::{to_env_var, SettingsError};
use crate::serialize::transcript::{InstructionOptions, DEFAULT_MAX_STRING};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TranscriptSettings {
    #[serde(default = "default_max_string")]
    pub max_string: usize,
    #[serde(default)]
    pub with_datetime: bool,
    /// `+HH:MM`, `-HH:MM` or `Z`
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,
}

impl Default for TranscriptSettings {
    fn default() -> Self {
        Self {
            max_string: default_max_string(),
            with_datetime: false,
            utc_offset: default_utc_offset(),
        }
    }
}

impl TranscriptSettings {
    pub fn parse_utc_offset(&self) -> Result<FixedOffset, SettingsError> {
        let offset = self.utc_offset.trim();
        if offset.eq_ignore_ascii_case("z") || offset.eq_ignore_ascii_case("utc") {
            return Ok(Utc.fix());
        }
        offset
            .parse::<FixedOffset>()
            .map_err(|_| SettingsError::InvalidValue {
                field: to_env_var("transcript.utc_offset"),
                value: self.utc_offset.clone(),
            })
    }

    pub fn to_options(&self) -> Result<InstructionOptions, SettingsError> {
        Ok(InstructionOptions {
            with_datetime: self.with_datetime,
            utc_offset: self.parse_utc_offset()?,
            max_string: self.max_string,
        })
    }
}

impl TryFrom<&TranscriptSettings> for InstructionOptions {
    type Error = SettingsError;

    fn try_from(settings: &TranscriptSettings) -> Result<Self, Self::Error> {
        settings.to_options()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub transcript: TranscriptSettings,
}

impl Settings {
    pub fn new() -> Result<Self, SettingsError> {
        Self::load_and_validate()
    }

    fn load_and_validate() -> Result<Self, SettingsError> {
        let config = Config::builder()
            .set_default("transcript.max_string", default_max_string() as i64)?
            .set_default("transcript.with_datetime", false)?
            .set_default("transcript.utc_offset", default_utc_offset())?
            // Layer on the environment variables
            .add_source(
                Environment::with_prefix("STR_MESSAGE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = config.try_deserialize().map_err(|err| {
            tracing::debug!("Configuration error: {:?}", &err);
            match err {
                config::ConfigError::NotFound(field) => SettingsError::MissingEnvVar {
                    env_var: to_env_var(&field),
                },
                err => SettingsError::Other(err),
            }
        })?;

        // Reject a bad offset at load time
        settings.transcript.parse_utc_offset()?;
        Ok(settings)
    }
}

fn default_max_string() -> usize {
    DEFAULT_MAX_STRING
}

fn default_utc_offset() -> String {
    "+00:00".to_string()
}
