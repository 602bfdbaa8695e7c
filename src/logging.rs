use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;
use std::sync::Arc;
use std::time::SystemTime;

use anyhow::{anyhow, Result};
use humantime::format_rfc3339_millis;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
    Fatal,
    Off,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
            Level::Off => "off",
        }
    }

    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Level::Trace),
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            "fatal" => Ok(Level::Fatal),
            "off" => Ok(Level::Off),
            _ => Err(anyhow!("unsupported log level: {name}")),
        }
    }
}

impl FromStr for Level {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Level::parse(s)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives finished log entries.
pub trait LogSink: Send + Sync {
    fn write(&self, entry: &Map<String, Value>);
}

impl<F> LogSink for F
where
    F: Fn(&Map<String, Value>) + Send + Sync + 'static,
{
    fn write(&self, entry: &Map<String, Value>) {
        (self)(entry)
    }
}

/// One JSON line per entry; `error` and `fatal` go to stderr.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdioSink;

impl LogSink for StdioSink {
    fn write(&self, entry: &Map<String, Value>) {
        let level = entry
            .get("level")
            .and_then(Value::as_str)
            .and_then(|name| Level::parse(name).ok())
            .unwrap_or(Level::Info);
        let line = Value::Object(entry.clone());
        // Write failures are dropped.
        let _ = if level >= Level::Error {
            writeln!(io::stderr().lock(), "{line}")
        } else {
            writeln!(io::stdout().lock(), "{line}")
        };
    }
}

/// Keeps string, number and bool tags.
pub fn scalar_tags(mut tags: Map<String, Value>) -> Map<String, Value> {
    tags.retain(|_, value| matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_)));
    tags
}

#[derive(Clone)]
pub struct Logger {
    threshold: Level,
    tags: Arc<Map<String, Value>>,
    sink: Arc<dyn LogSink>,
}

impl Logger {
    pub fn new<S>(threshold: Level, sink: S) -> Self
    where
        S: LogSink + 'static,
    {
        Self {
            threshold,
            tags: Arc::new(Map::new()),
            sink: Arc::new(sink),
        }
    }

    pub fn stdio(threshold: Level) -> Self {
        Self::new(threshold, StdioSink)
    }

    pub fn with_tags(mut self, tags: Map<String, Value>) -> Self {
        let mut merged = (*self.tags).clone();
        merged.extend(scalar_tags(tags));
        self.tags = Arc::new(merged);
        self
    }

    pub fn threshold(&self) -> Level {
        self.threshold
    }

    pub fn enabled(&self, level: Level) -> bool {
        level != Level::Off && level >= self.threshold
    }

    /// Emits an entry; `data` is only evaluated when `level` is enabled.
    pub fn log<D>(&self, level: Level, message: &str, data: D)
    where
        D: FnOnce() -> Value,
    {
        if !self.enabled(level) {
            return;
        }
        let mut entry = Map::new();
        entry.insert("level".to_string(), Value::String(level.as_str().to_string()));
        entry.insert("message".to_string(), Value::String(message.to_string()));
        let data = data();
        if data.is_object() {
            entry.insert("data".to_string(), data);
        }
        if !self.tags.is_empty() {
            entry.insert("tags".to_string(), Value::Object((*self.tags).clone()));
        }
        let timestamp = format_rfc3339_millis(SystemTime::now()).to_string();
        entry.insert("timestamp".to_string(), Value::String(timestamp));
        self.sink.write(&entry);
    }

    pub fn trace<D: FnOnce() -> Value>(&self, message: &str, data: D) {
        self.log(Level::Trace, message, data);
    }

    pub fn debug<D: FnOnce() -> Value>(&self, message: &str, data: D) {
        self.log(Level::Debug, message, data);
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::stdio(Level::default())
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("threshold", &self.threshold)
            .field("tags", &self.tags)
            .finish()
    }
}
