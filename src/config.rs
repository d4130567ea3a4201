use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::dataset::DatasetPaths;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub datasets: DatasetsConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

/// Where the download step leaves the two extracts.
#[derive(Debug, Deserialize, Clone)]
pub struct DatasetsConfig {
    pub domestic: PathBuf,
    pub overseas: PathBuf,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
}

fn default_delimiter() -> String {
    ",".to_string()
}

impl DatasetsConfig {
    pub fn paths(&self) -> DatasetPaths {
        DatasetPaths {
            domestic: self.domestic.clone(),
            overseas: self.overseas.clone(),
        }
    }

    /// The delimiter as a byte. Validated in [`load_config`].
    pub fn delimiter_byte(&self) -> u8 {
        self.delimiter.as_bytes().first().copied().unwrap_or(b',')
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_autocomplete_limit")]
    pub autocomplete_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            autocomplete_limit: default_autocomplete_limit(),
        }
    }
}

fn default_autocomplete_limit() -> usize {
    10
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    let delimiter = &config.datasets.delimiter;
    if delimiter.len() != 1 || !delimiter.is_ascii() {
        anyhow::bail!(
            "datasets.delimiter must be a single ASCII character, got '{}'",
            delimiter
        );
    }

    if config.search.autocomplete_limit == 0 {
        anyhow::bail!("search.autocomplete_limit must be >= 1");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_src: &str) -> Result<Config> {
        let config: Config = toml::from_str(toml_src)?;
        validate(&config)?;
        Ok(config)
    }

    #[test]
    fn test_defaults_applied() {
        let cfg = parse(
            r#"
[db]
path = "data/registry.sqlite"

[datasets]
domestic = "data/CCOD.csv"
overseas = "data/OCOD.zip"
"#,
        )
        .unwrap();
        assert_eq!(cfg.datasets.delimiter_byte(), b',');
        assert_eq!(cfg.search.autocomplete_limit, 10);
        assert_eq!(cfg.datasets.paths().overseas, PathBuf::from("data/OCOD.zip"));
    }

    #[test]
    fn test_multi_char_delimiter_rejected() {
        let err = parse(
            r#"
[db]
path = "x.sqlite"

[datasets]
domestic = "a.csv"
overseas = "b.csv"
delimiter = "||"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("delimiter"));
    }

    #[test]
    fn test_zero_autocomplete_limit_rejected() {
        assert!(parse(
            r#"
[db]
path = "x.sqlite"

[datasets]
domestic = "a.csv"
overseas = "b.csv"

[search]
autocomplete_limit = 0
"#,
        )
        .is_err());
    }

    #[test]
    fn test_missing_datasets_section_fails() {
        assert!(parse("[db]\npath = \"x.sqlite\"\n").is_err());
    }
}
