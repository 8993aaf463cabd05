//! Configuration for building a filesystem-backed [crate::ResourceManager].
use std::collections::BTreeMap;
use std::io::Read;
use std::path::PathBuf;

use crate::{ResourceError, Result};

/// Where resources live, and what to register or load up front.
///
/// Build one with [ResourceManagerConfigBuilder], or deserialize it from JSON:
///
/// ```json
/// { "root_dir": "assets", "audio": { "theme": "music/theme.ogg" }, "fonts": { "body": "fonts/body.ttf" } }
/// ```
#[derive(Debug, Clone, PartialEq, serde::Deserialize, derive_builder::Builder)]
#[builder(setter(into))]
pub struct ResourceManagerConfig {
    /// Directory every path is resolved against.
    pub root_dir: PathBuf,
    /// Audio names to register, mapped to their paths.
    #[builder(default)]
    #[serde(default)]
    pub audio: BTreeMap<String, String>,
    /// Fonts to load eagerly, mapped to their paths.
    #[builder(default)]
    #[serde(default)]
    pub fonts: BTreeMap<String, String>,
}

impl ResourceManagerConfig {
    pub fn from_json_reader(reader: impl Read) -> Result<ResourceManagerConfig> {
        serde_json::from_reader(reader).map_err(|e| ResourceError::decode("config", e))
    }

    pub fn from_json_str(json: &str) -> Result<ResourceManagerConfig> {
        serde_json::from_str(json).map_err(|e| ResourceError::decode("config", e))
    }
}
