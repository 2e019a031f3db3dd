use crate::config::model::Config;
use crate::config::schema::ScrapeConfigFile;
use crate::error::ConfigError;
use std::fs;
use std::path::Path;

/// Parses a configuration document held in memory.
///
/// The document is read as YAML, which also accepts JSON. No network or
/// filesystem access happens here.
pub fn parse_config(raw: &[u8]) -> Result<Config, ConfigError> {
    let file: ScrapeConfigFile = serde_yaml::from_slice(raw)?;
    Config::try_from(file)
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Reads a configuration file, picking the format from its extension.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        let content = fs::read(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let file: ScrapeConfigFile = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_slice(&content)?,
            Some("yaml") | Some("yml") => serde_yaml::from_slice(&content)?,
            Some("toml") => {
                let text = String::from_utf8_lossy(&content);
                toml::from_str(&text)?
            }
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        };

        log::debug!(
            "Loaded {} endpoint(s) from {}",
            file.scrape_endpoints.len(),
            path.display()
        );
        Config::try_from(file)
    }
}
