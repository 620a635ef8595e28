//! Configuration structures for capture and export.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::storage::Bucket;

/// Main configuration for rcpt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RcptConfig {
    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Export destination configuration.
    pub storage: StorageConfig,

    /// Receipt database configuration.
    pub database: DatabaseConfig,

    /// OCR model configuration.
    pub models: ModelConfig,
}

/// Field extraction configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Currency used when the text names none.
    /// Falls back to the locale currency, then USD.
    pub default_currency: Option<String>,
}

/// Where and whether receipt images are exported.
///
/// Passed into every export call; nothing in the pipeline keeps its own copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Master switch for exporting images.
    pub enabled: bool,

    /// App-private storage area. Default bucket folders live under
    /// `<root>/Receipts/`.
    pub root: PathBuf,

    /// User-chosen folder for fuel receipts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel_folder: Option<PathBuf>,

    /// User-chosen folder for all other receipts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_folder: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            root: PathBuf::from("rcpt-data"),
            fuel_folder: None,
            other_folder: None,
        }
    }
}

impl StorageConfig {
    /// Custom folder configured for a bucket, if any.
    pub fn custom_folder(&self, bucket: Bucket) -> Option<&Path> {
        match bucket {
            Bucket::Fuel => self.fuel_folder.as_deref(),
            Bucket::Other => self.other_folder.as_deref(),
        }
    }

    /// Set or clear (`None`) the custom folder for a bucket.
    pub fn set_custom_folder(&mut self, bucket: Bucket, folder: Option<PathBuf>) {
        match bucket {
            Bucket::Fuel => self.fuel_folder = folder,
            Bucket::Other => self.other_folder = folder,
        }
    }

    /// Default folder for a bucket under the app storage root.
    pub fn default_folder(&self, bucket: Bucket) -> PathBuf {
        self.root.join("Receipts").join(bucket.folder_name())
    }
}

/// Receipt database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file.
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("rcpt-data").join("receipts.db"),
        }
    }
}

/// OCR model file locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
        }
    }
}

impl ModelConfig {
    /// Get full path to a model file.
    pub fn path(&self, file_name: &str) -> PathBuf {
        self.model_dir.join(file_name)
    }
}

impl RcptConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Root all relative default paths at `base`.
    pub fn with_base_dir(mut self, base: &Path) -> Self {
        self.storage.root = base.to_path_buf();
        self.database.path = base.join("receipts.db");
        self.models.model_dir = base.join("models");
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_folders() {
        let config = StorageConfig {
            root: PathBuf::from("/data"),
            ..StorageConfig::default()
        };

        assert_eq!(config.default_folder(Bucket::Fuel), PathBuf::from("/data/Receipts/Fuel"));
        assert_eq!(config.default_folder(Bucket::Other), PathBuf::from("/data/Receipts/Other"));
    }

    #[test]
    fn test_custom_folder_set_and_clear() {
        let mut config = StorageConfig::default();
        config.set_custom_folder(Bucket::Fuel, Some(PathBuf::from("/mnt/fuel")));

        assert_eq!(config.custom_folder(Bucket::Fuel), Some(Path::new("/mnt/fuel")));
        assert_eq!(config.custom_folder(Bucket::Other), None);

        config.set_custom_folder(Bucket::Fuel, None);
        assert_eq!(config.custom_folder(Bucket::Fuel), None);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: RcptConfig =
            serde_json::from_str(r#"{"storage": {"enabled": false}}"#).unwrap();

        assert!(!config.storage.enabled);
        assert_eq!(config.storage.root, PathBuf::from("rcpt-data"));
        assert_eq!(config.models.detection_model, "det.onnx");
        assert!(config.extraction.default_currency.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = RcptConfig::default().with_base_dir(dir.path());
        config.extraction.default_currency = Some("CHF".to_string());
        config.save(&path).unwrap();

        let loaded = RcptConfig::from_file(&path).unwrap();
        assert_eq!(loaded.extraction.default_currency.as_deref(), Some("CHF"));
        assert_eq!(loaded.database.path, dir.path().join("receipts.db"));
    }
}
