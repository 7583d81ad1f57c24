// Client configuration
// Layering: built-in defaults, then the JSON config file, then APP__* environment variables.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{i18n::Language, preferences::Currency};

pub const ENV_PREFIX: &str = "APP__";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_ms: u64,
    pub default_language: Language,
    pub default_currency: Currency,
    pub maps_api_key: Option<String>,
    pub page_size: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            api_key: None,
            timeout_ms: 10_000,
            default_language: Language::En,
            default_currency: Currency::Usd,
            maps_api_key: None,
            page_size: 12,
        }
    }
}

impl ClientConfig {
    // Missing file means defaults; a present but malformed file is an error
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "config file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_env(std::env::vars())?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env<I>(&mut self, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (name, value) in vars {
            let Some(key) = name.strip_prefix(ENV_PREFIX) else {
                continue;
            };

            match key {
                "BASE_URL" => self.base_url = value,
                "API_KEY" => self.api_key = Some(value),
                "MAPS_API_KEY" => self.maps_api_key = Some(value),
                "TIMEOUT_MS" => self.timeout_ms = parse_number(&name, &value)?,
                "PAGE_SIZE" => self.page_size = parse_number(&name, &value)?,
                "DEFAULT_LANGUAGE" => {
                    self.default_language =
                        value.parse().map_err(|reason| ConfigError::InvalidValue {
                            key: name.clone(),
                            reason,
                        })?
                }
                "DEFAULT_CURRENCY" => {
                    self.default_currency =
                        value.parse().map_err(|reason| ConfigError::InvalidValue {
                            key: name.clone(),
                            reason,
                        })?
                }
                other => warn!(key = other, "ignoring unknown config override"),
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidValue {
            key: "base_url".to_string(),
            reason: e.to_string(),
        })?;

        if self.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "timeout_ms".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.page_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "page_size".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

// `key=value` from the command line. The value may itself contain '='.
pub fn parse_pair(raw: &str) -> Result<(String, String), ConfigError> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(ConfigError::InvalidValue {
            key: raw.to_string(),
            reason: "expected key=value".to_string(),
        }),
    }
}

// JSON literals (numbers, booleans, null, quoted strings, arrays, objects) are kept typed,
// anything else becomes a string
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn ensure_object(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just replaced with an object"),
    }
}

// Dotted keys create nested objects; a non-object in the way is replaced
pub fn merge_pair(target: &mut Value, key: &str, raw_value: &str) {
    let (parents, leaf) = match key.rsplit_once('.') {
        Some((parents, leaf)) => (Some(parents), leaf),
        None => (None, key),
    };

    let mut node = target;
    for segment in parents.into_iter().flat_map(|p| p.split('.')) {
        node = ensure_object(node)
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    ensure_object(node).insert(leaf.to_string(), parse_value(raw_value));
}

// Reads the file (or `{}` if missing), merges every pair and writes it back pretty-printed
pub fn update_config_file(
    path: impl AsRef<Path>,
    pairs: &[(String, String)],
) -> Result<Value, ConfigError> {
    let path = path.as_ref();
    let mut document = match fs::read_to_string(path) {
        Ok(raw) if raw.trim().is_empty() => Value::Object(Map::new()),
        Ok(raw) => serde_json::from_str(&raw)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Value::Object(Map::new()),
        Err(e) => return Err(e.into()),
    };

    for (key, value) in pairs {
        merge_pair(&mut document, key, value);
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, serde_json::to_string_pretty(&document)? + "\n")?;
    Ok(document)
}
