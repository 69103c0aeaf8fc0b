//! JSON file backend

use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::warn;

use super::{BackendError, ConfigBackend};

/// Stores the tree as a single pretty-printed JSON file.
///
/// Output is a UTF-8 JSON object with 2-space indentation; non-ASCII
/// characters are written literally, not escaped. A missing data file is a
/// read failure like any other; the store treats it as "keep the current
/// tree", which makes a brand-new store read as an empty object.
#[derive(Debug, Clone)]
pub struct JsonBackend {
    filename: String,
}

impl JsonBackend {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
        }
    }

    /// The data file name inside the config directory.
    pub fn filename(&self) -> &str {
        &self.filename
    }
}

impl Default for JsonBackend {
    fn default() -> Self {
        Self::new("config.json")
    }
}

impl ConfigBackend for JsonBackend {
    fn read(&self, config_dir: &Path) -> Result<Value, BackendError> {
        let path = config_dir.join(&self.filename);
        let loaded = fs::read_to_string(&path)
            .map_err(BackendError::from)
            .and_then(|text| serde_json::from_str(&text).map_err(BackendError::from));
        if let Err(err) = &loaded {
            warn!(path = %path.display(), %err, "failed to read config file");
        }
        loaded
    }

    fn write(&self, config_dir: &Path, tree: &Value) -> Result<(), BackendError> {
        let path = config_dir.join(&self.filename);
        let written = serde_json::to_string_pretty(tree)
            .map_err(BackendError::from)
            .and_then(|text| fs::write(&path, text).map_err(BackendError::from));
        if let Err(err) = &written {
            warn!(path = %path.display(), %err, "failed to write config file");
        }
        written
    }
}
