//! Asset loading with embedded fallbacks
//!
//! The config file and the upload page are compiled into the binary:
//!
//! - If `CONFIG_FILE` is NOT set: use the embedded config.yaml
//! - If `CONFIG_FILE` IS set and the file is missing: seed it with the embedded default
//! - If `CONFIG_FILE` IS set and the file exists: use it

use rust_embed::RustEmbed;
use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::PathBuf;

/// Embedded default config
#[derive(RustEmbed)]
#[folder = "."]
#[include = "config.yaml"]
struct EmbeddedConfig;

/// Embedded web UI
#[derive(RustEmbed)]
#[folder = "static/"]
struct EmbeddedStatic;

const CONFIG_NAME: &str = "config.yaml";
const INDEX_NAME: &str = "index.html";

/// Report of init (extraction) operations
#[derive(Debug, Default)]
pub struct InitReport {
    pub written: Vec<String>,
    pub skipped: Vec<String>,
}

/// Asset loader with optional filesystem override for the config file
pub struct AssetLoader {
    /// External config file path (from CONFIG_FILE env var)
    config_file: Option<PathBuf>,
}

impl AssetLoader {
    /// Create a new asset loader
    ///
    /// `config_file` should be `Some` only if the env var was set.
    pub fn new(config_file: Option<PathBuf>) -> Self {
        Self { config_file }
    }

    /// Read the config file
    ///
    /// If an external path is configured and exists, uses that.
    /// Otherwise falls back to embedded config.
    pub fn read_config(&self) -> io::Result<Cow<'static, [u8]>> {
        if let Some(ref path) = self.config_file {
            if path.exists() {
                tracing::trace!(path = %path.display(), "Loading config from filesystem");
                return Ok(Cow::Owned(fs::read(path)?));
            }
        }

        EmbeddedConfig::get(CONFIG_NAME)
            .map(|f| {
                tracing::trace!("Loading config from embedded assets");
                f.data
            })
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, "Embedded config.yaml not found")
            })
    }

    /// Read config as a UTF-8 string
    pub fn read_config_string(&self) -> io::Result<String> {
        let bytes = self.read_config()?;
        String::from_utf8(bytes.into_owned())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// The upload page served at `/`
    pub fn index_html() -> Option<Cow<'static, [u8]>> {
        EmbeddedStatic::get(INDEX_NAME).map(|f| f.data)
    }

    /// Write the embedded config to the configured path if it does not exist yet
    ///
    /// Returns whether a file was written.
    pub fn seed_if_configured(&self) -> io::Result<bool> {
        let Some(ref path) = self.config_file else {
            return Ok(false);
        };
        if path.exists() {
            return Ok(false);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        if let Some(data) = EmbeddedConfig::get(CONFIG_NAME) {
            fs::write(path, &*data.data)?;
            tracing::info!(path = %path.display(), "Seeded config file with embedded default");
            return Ok(true);
        }
        Ok(false)
    }

    /// Extract the embedded config to the configured path (or ./config.yaml)
    pub fn init(&self, force: bool) -> io::Result<InitReport> {
        let mut report = InitReport::default();
        let path = self
            .config_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(CONFIG_NAME));

        if !force && path.exists() {
            report.skipped.push(path.display().to_string());
            return Ok(report);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        if let Some(data) = EmbeddedConfig::get(CONFIG_NAME) {
            fs::write(&path, &*data.data)?;
            report.written.push(path.display().to_string());
        }

        Ok(report)
    }

    /// List embedded assets (for display)
    pub fn list_embedded() -> Vec<String> {
        EmbeddedConfig::iter()
            .chain(EmbeddedStatic::iter())
            .map(|s| s.to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_config_is_readable() {
        let loader = AssetLoader::new(None);
        let config = loader.read_config_string().unwrap();
        assert!(config.contains("printer:"));
    }

    #[test]
    fn test_external_config_takes_priority() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "printer:\n  dpi: 300\n").unwrap();

        let loader = AssetLoader::new(Some(path));
        assert_eq!(loader.read_config_string().unwrap(), "printer:\n  dpi: 300\n");
    }

    #[test]
    fn test_missing_external_config_falls_back_to_embedded() {
        let dir = tempfile::tempdir().unwrap();
        let loader = AssetLoader::new(Some(dir.path().join("absent.yaml")));
        assert!(loader.read_config_string().unwrap().contains("printer:"));
    }

    #[test]
    fn test_seed_writes_missing_config_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");
        let loader = AssetLoader::new(Some(path.clone()));

        assert!(loader.seed_if_configured().unwrap());
        assert!(path.exists());
        assert!(!loader.seed_if_configured().unwrap());
    }

    #[test]
    fn test_seed_without_path_is_noop() {
        let loader = AssetLoader::new(None);
        assert!(!loader.seed_if_configured().unwrap());
    }

    #[test]
    fn test_init_skips_existing_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "custom").unwrap();
        let loader = AssetLoader::new(Some(path.clone()));

        let report = loader.init(false).unwrap();
        assert!(report.written.is_empty());
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), "custom");

        let report = loader.init(true).unwrap();
        assert_eq!(report.written.len(), 1);
        assert!(fs::read_to_string(&path).unwrap().contains("printer:"));
    }

    #[test]
    fn test_index_html_is_embedded() {
        let html = AssetLoader::index_html().unwrap();
        assert!(String::from_utf8_lossy(&html).contains("<form"));
    }
}
