//! Configuration handling for the palamedes CLI
//!
//! Supports loading configuration from palamedes.toml files with CLI argument overrides.

use anyhow::{Context, Result};
use palamedes_core::{AlignerParams, MoleculeType, ALT_SEQUENCE_ID, REF_SEQUENCE_ID};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "palamedes.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub aligner: AlignerParams,
    #[serde(default)]
    pub records: RecordConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordConfig {
    /// Molecule type attached to both input sequences
    #[serde(default)]
    pub molecule_type: MoleculeType,

    /// Identifier of the reference record
    #[serde(default = "default_reference_id")]
    pub reference_id: String,

    /// Identifier of the alternate record
    #[serde(default = "default_alternate_id")]
    pub alternate_id: String,
}

fn default_reference_id() -> String { REF_SEQUENCE_ID.to_string() }
fn default_alternate_id() -> String { ALT_SEQUENCE_ID.to_string() }

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            molecule_type: MoleculeType::default(),
            reference_id: default_reference_id(),
            alternate_id: default_alternate_id(),
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => {
                log::info!("Loading configuration from: {}", path.display());
                Self::load_from_file(path)?
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    log::info!("Loading configuration from: {}", DEFAULT_CONFIG_FILE);
                    Self::load_from_file(&default_path)?
                } else {
                    log::debug!("Using default configuration");
                    Self::default()
                }
            }
        };

        Ok(config)
    }

    /// Load configuration from a specific TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse configuration file: {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = self.to_toml()?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write configuration file: {}", path.display()))?;

        Ok(())
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palamedes_core::AlignmentMode;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.aligner, AlignerParams::default());
        assert_eq!(config.records.molecule_type, MoleculeType::Protein);
        assert_eq!(config.records.reference_id, "ref");
        assert_eq!(config.records.alternate_id, "alt");
    }

    #[test]
    fn test_config_roundtrip() -> Result<()> {
        let mut config = Config::default();
        config.records.molecule_type = MoleculeType::Dna;
        config.aligner.mismatch_score = -20;

        let temp_file = NamedTempFile::new()?;
        config.save_to_file(temp_file.path())?;
        let loaded = Config::load_from_file(temp_file.path())?;

        assert_eq!(loaded.records.molecule_type, MoleculeType::Dna);
        assert_eq!(loaded.aligner.mismatch_score, -20);
        assert_eq!(loaded.aligner.match_score, config.aligner.match_score);

        Ok(())
    }

    #[test]
    fn test_partial_config_fills_defaults() -> Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        writeln!(temp_file, "[aligner]\nmode = \"local\"\n\n[records]\nmolecule_type = \"rna\"")?;

        let config = Config::load(Some(temp_file.path()))?;

        assert_eq!(config.aligner.mode, AlignmentMode::Local);
        assert_eq!(config.aligner.open_gap_score, -10);
        assert_eq!(config.records.molecule_type, MoleculeType::Rna);
        assert_eq!(config.records.reference_id, "ref");

        Ok(())
    }

    #[test]
    fn test_unreadable_config_reports_path() {
        let err = Config::load(Some(Path::new("/nonexistent/palamedes.toml"))).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/palamedes.toml"));
    }

    #[test]
    fn test_default_toml_rendering() -> Result<()> {
        let example = Config::default().to_toml()?;
        assert!(example.contains("[aligner]"));
        assert!(example.contains("[records]"));
        assert!(example.contains("mode = \"global\""));
        Ok(())
    }
}
