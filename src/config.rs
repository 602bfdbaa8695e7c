use std::env;

use anyhow::{anyhow, Context as _, Result};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::logging::{scalar_tags, Level, Logger};

pub const LOG_LEVEL_ENV: &str = "FREDDIES_LOG_LEVEL";
pub const LOG_TAGS_ENV: &str = "FREDDIES_LOG_TAGS";

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ComposeOptions {
    pub log_level: Level,
    pub log_tags: Map<String, Value>,
}

impl ComposeOptions {
    pub fn from_value(value: Value) -> Result<Self> {
        let mut options: ComposeOptions =
            serde_json::from_value(value).context("invalid compose options")?;
        options.log_tags = scalar_tags(options.log_tags);
        Ok(options)
    }

    /// Reads `FREDDIES_LOG_LEVEL` and `FREDDIES_LOG_TAGS`; unset variables keep defaults.
    pub fn from_env() -> Result<Self> {
        let mut options = ComposeOptions::default();
        if let Ok(level) = env::var(LOG_LEVEL_ENV) {
            if !level.trim().is_empty() {
                options.log_level = Level::parse(&level)?;
            }
        }
        if let Ok(raw) = env::var(LOG_TAGS_ENV) {
            if !raw.trim().is_empty() {
                let parsed: Value = serde_json::from_str(&raw)
                    .with_context(|| format!("{LOG_TAGS_ENV} is not valid JSON"))?;
                let Value::Object(tags) = parsed else {
                    return Err(anyhow!("{LOG_TAGS_ENV} must be a JSON object"));
                };
                options.log_tags = scalar_tags(tags);
            }
        }
        Ok(options)
    }

    pub fn logger(&self) -> Logger {
        Logger::stdio(self.log_level).with_tags(self.log_tags.clone())
    }
}
