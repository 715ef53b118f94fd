use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::model::BundledModelLoader;

/// Application configuration loaded from score-predictor.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub model: ModelConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Artifact to load instead of the one compiled into the binary.
    pub path: Option<PathBuf>,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&content)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Config::default())
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn model_loader(&self) -> BundledModelLoader {
        match &self.model.path {
            Some(path) => BundledModelLoader::from_path(path),
            None => BundledModelLoader::embedded(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ArtifactSource;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.model.path, None);
        assert_eq!(config.model_loader().source(), &ArtifactSource::Embedded);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::parse("[server]\nport = 9090\n").unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "127.0.0.1");

        let config = Config::parse("[model]\npath = \"models/custom.json\"\n").unwrap();
        assert_eq!(
            config.model_loader().source(),
            &ArtifactSource::File(PathBuf::from("models/custom.json"))
        );
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        assert!(matches!(
            Config::parse("[server\nport = "),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = Config::load_or_default("no/such/score-predictor.toml").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("score-predictor.toml");
        std::fs::write(&path, "[server]\nhost = \"0.0.0.0\"\nport = 3000\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
    }
}
