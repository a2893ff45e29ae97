//! Destination file formats and payload encoding.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::errors::{FetcherError, Result};
use crate::secrets::SecretPayload;

/// Serialization format of the destination file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PropertiesFormat {
    Yaml,
    #[default]
    Json,
}

impl PropertiesFormat {
    /// Infer the format from a file extension (`.yaml`, `.yml`, `.json`).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Pick the format for `path`: explicit override first, then the file
    /// extension, then JSON.
    pub fn resolve(override_type: Option<&str>, path: &Path) -> Result<Self> {
        match override_type.map(str::trim).filter(|s| !s.is_empty()) {
            Some(value) => value.parse(),
            None => Ok(Self::from_path(path).unwrap_or_default()),
        }
    }

    /// Encode a payload in this format.
    ///
    /// Both encodings end with a newline. Keys come out sorted.
    pub fn encode(self, payload: &SecretPayload) -> Result<Vec<u8>> {
        match self {
            Self::Json => {
                let mut bytes = serde_json::to_vec_pretty(payload)
                    .map_err(|e| FetcherError::encode(self, e.to_string()))?;
                bytes.push(b'\n');
                Ok(bytes)
            }
            Self::Yaml => serde_yaml::to_string(payload)
                .map(String::into_bytes)
                .map_err(|e| FetcherError::encode(self, e.to_string())),
        }
    }
}

impl FromStr for PropertiesFormat {
    type Err = FetcherError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            other => Err(FetcherError::validation_field(
                format!("Unsupported properties type '{}', expected 'yaml' or 'json'", other),
                "properties_type",
            )),
        }
    }
}

impl fmt::Display for PropertiesFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yaml => write!(f, "yaml"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Encode `payload` as `format`.
pub fn encode(payload: &SecretPayload, format: PropertiesFormat) -> Result<Vec<u8>> {
    format.encode(payload)
}
