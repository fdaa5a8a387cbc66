use crate::error::Result;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const CONFIG_ENV_VAR: &str = "FILE_IMPORT_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "file-import.json";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClassificationOption {
    pub id: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    /// Sent with every request, e.g. session cookies or CSRF tokens.
    pub headers: BTreeMap<String, String>,
    /// Raw registrations, validated when the registry loads them.
    pub cloud_sources: Vec<Value>,
    pub classifications: Vec<ClassificationOption>,
    pub log_filter: Option<String>,
    pub window_size: [f32; 2],
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            headers: BTreeMap::new(),
            cloud_sources: Vec::new(),
            classifications: Vec::new(),
            log_filter: None,
            window_size: [640.0, 720.0],
        }
    }
}

impl AppConfig {
    pub fn path() -> PathBuf {
        std::env::var_os(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path())
    }

    /// A missing file is not an error; everything falls back to defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        info!("Loaded config from {:?}", path);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ImportError;
    use std::io::Write;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "base_url": "https://repo.example.org/api",
                "headers": {{"Cookie": "JSESSIONID=abc"}},
                "cloud_sources": [{{"identifier": "s3", "componentPath": "json"}}],
                "classifications": [{{"id": "doc", "display_name": "Document"}}]
            }}"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.base_url, "https://repo.example.org/api");
        assert_eq!(config.headers.get("Cookie").map(String::as_str), Some("JSESSIONID=abc"));
        assert_eq!(config.cloud_sources.len(), 1);
        assert_eq!(config.classifications[0].display_name, "Document");
        assert_eq!(config.window_size, AppConfig::default().window_size);
        assert_eq!(config.log_filter, None);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(
            AppConfig::load_from(file.path()),
            Err(ImportError::Config(_))
        ));
    }
}
