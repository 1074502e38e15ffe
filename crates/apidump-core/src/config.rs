use serde::{Deserialize, Serialize};

use crate::error::LayerError;

/// Top-level layer configuration, loaded from apidump.toml and then
/// overridden by `APIDUMP_*` environment variables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerConfig {
    /// What to do when a handle has no registered dispatch table.
    #[serde(default)]
    pub on_violation: ViolationPolicy,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub range: FrameRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    /// Output file (None = stdout)
    pub file: Option<String>,
    /// Flush the sink after every call
    #[serde(default = "default_true")]
    pub flush: bool,
    /// Tag every call with microseconds since the layer was loaded
    #[serde(default)]
    pub timestamps: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    /// Forward calls without recording anything.
    None,
}

/// Which frames produce output: `count` frames (0 = unbounded) starting at
/// `start`, taking every `interval`-th one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRange {
    #[serde(default)]
    pub start: u64,
    #[serde(default)]
    pub count: u64,
    #[serde(default = "default_interval")]
    pub interval: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViolationPolicy {
    /// Panic, which aborts at the FFI boundary.
    Abort,
    /// Log the violation and fail the call as gracefully as possible.
    Log,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            file: None,
            flush: true,
            timestamps: false,
        }
    }
}

impl Default for FrameRange {
    fn default() -> Self {
        Self {
            start: 0,
            count: 0,
            interval: default_interval(),
        }
    }
}

impl Default for ViolationPolicy {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            ViolationPolicy::Abort
        } else {
            ViolationPolicy::Log
        }
    }
}

impl FrameRange {
    pub fn contains(&self, frame: u64) -> bool {
        if frame < self.start {
            return false;
        }
        let offset = frame - self.start;
        let interval = self.interval.max(1);
        if offset % interval != 0 {
            return false;
        }
        self.count == 0 || offset / interval < self.count
    }

    /// Parse `start-count-interval`; trailing parts may be omitted.
    pub fn parse(text: &str) -> Result<Self, LayerError> {
        let mut range = FrameRange::default();
        let mut parts = text.trim().split('-');
        let mut next = |name: &str| -> Result<Option<u64>, LayerError> {
            match parts.next() {
                None | Some("") => Ok(None),
                Some(p) => p
                    .trim()
                    .parse()
                    .map(Some)
                    .map_err(|_| LayerError::Config(format!("invalid {} in range {:?}", name, text))),
            }
        };
        if let Some(start) = next("start")? {
            range.start = start;
        }
        if let Some(count) = next("count")? {
            range.count = count;
        }
        if let Some(interval) = next("interval")? {
            if interval == 0 {
                return Err(LayerError::Config(format!("interval must be non-zero in {:?}", text)));
            }
            range.interval = interval;
        }
        Ok(range)
    }
}

impl LayerConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, LayerError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, LayerError> {
        let config: LayerConfig = toml::from_str(content)?;
        if config.range.interval == 0 {
            return Err(LayerError::Config("range.interval must be non-zero".to_string()));
        }
        Ok(config)
    }

    /// Load from the default location if present, then apply environment
    /// overrides. Errors are logged and the offending layer of configuration
    /// is skipped.
    pub fn load_from_environment() -> Self {
        let path = default_config_path();
        let mut config = if std::path::Path::new(&path).exists() {
            Self::load(&path).unwrap_or_else(|e| {
                tracing::warn!(path = %path, error = %e, "ignoring invalid configuration file");
                Self::default()
            })
        } else {
            Self::default()
        };
        if let Err(e) = config.apply_overrides(|key| std::env::var(key).ok()) {
            tracing::warn!(error = %e, "ignoring invalid environment override");
        }
        config
    }

    /// Apply `APIDUMP_*` overrides read through `var`. Overrides parsed before
    /// an invalid one stay applied.
    pub fn apply_overrides<F>(&mut self, var: F) -> Result<(), LayerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(format) = var("APIDUMP_OUTPUT_FORMAT") {
            self.output.format = match format.trim().to_ascii_lowercase().as_str() {
                "text" => OutputFormat::Text,
                "json" => OutputFormat::Json,
                "none" => OutputFormat::None,
                other => {
                    return Err(LayerError::Config(format!("unknown output format {:?}", other)))
                }
            };
        }
        if let Some(file) = var("APIDUMP_LOG_FILENAME") {
            self.output.file = if file.is_empty() { None } else { Some(file) };
        }
        if let Some(flush) = var("APIDUMP_FLUSH") {
            self.output.flush = parse_bool("APIDUMP_FLUSH", &flush)?;
        }
        if let Some(ts) = var("APIDUMP_TIMESTAMP") {
            self.output.timestamps = parse_bool("APIDUMP_TIMESTAMP", &ts)?;
        }
        if let Some(range) = var("APIDUMP_OUTPUT_RANGE") {
            self.range = FrameRange::parse(&range)?;
        }
        Ok(())
    }

    /// Whether a call made during `frame` should produce output.
    pub fn should_output(&self, frame: u64) -> bool {
        self.output.format != OutputFormat::None && self.range.contains(frame)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, LayerError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        other => Err(LayerError::Config(format!("{} expects a boolean, got {:?}", key, other))),
    }
}

/// Returns the config file path to use.
/// Search order:
/// 1. `APIDUMP_CONFIG` environment variable
/// 2. System-wide config (see `apidump_common::platform::system_config_path`)
/// 3. Local fallback: `./apidump.toml`
pub fn default_config_path() -> String {
    if let Ok(path) = std::env::var("APIDUMP_CONFIG") {
        return path;
    }
    let system_path = apidump_common::platform::system_config_path();
    if std::path::Path::new(&system_path).exists() {
        return system_path;
    }
    "apidump.toml".to_string()
}

fn default_interval() -> u64 {
    1
}

fn default_true() -> bool {
    true
}
