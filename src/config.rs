// ⚙️ Configuration - tunables for one run
//
// Loaded from an optional JSON file, then overridden by CLI flags. A single
// global threshold applies to every comparison.

use crate::error::{Error, Result};
use crate::similarity::ScorerKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default fuzzy-match threshold (inclusive)
pub const DEFAULT_THRESHOLD: u8 = 87;

/// Id given to the first institution
pub const DEFAULT_ID_BASE: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Minimum similarity (0-100) to merge into an existing institution
    pub threshold: u8,

    /// Id of the first institution created
    pub id_base: u32,

    /// Similarity function used for every comparison
    pub scorer: ScorerKind,

    /// Cutoff for the top-institutions table (None = all)
    pub top_n: Option<usize>,

    /// Trim, expand state codes and capitalize category columns
    pub clean_fields: bool,

    /// Also write Clusters.csv (raw spelling → institution id)
    pub write_clusters: bool,
}

impl Default for SplitConfig {
    fn default() -> Self {
        SplitConfig {
            threshold: DEFAULT_THRESHOLD,
            id_base: DEFAULT_ID_BASE,
            scorer: ScorerKind::default(),
            top_n: None,
            clean_fields: true,
            write_clusters: true,
        }
    }
}

impl SplitConfig {
    /// Load from a JSON file; absent keys keep their defaults
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Config(format!(
                "failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let config: SplitConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.threshold > 100 {
            return Err(Error::Config(format!(
                "threshold must be between 0 and 100, got {}",
                self.threshold
            )));
        }

        if self.top_n == Some(0) {
            return Err(Error::Config("top_n must be at least 1".to_string()));
        }

        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = SplitConfig::default();

        assert_eq!(config.threshold, 87);
        assert_eq!(config.id_base, 1);
        assert_eq!(config.scorer, ScorerKind::TokenSet);
        assert_eq!(config.top_n, None);
        assert!(config.clean_fields);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: SplitConfig =
            serde_json::from_str(r#"{ "threshold": 90, "scorer": "token-sort" }"#).unwrap();

        assert_eq!(config.threshold, 90);
        assert_eq!(config.scorer, ScorerKind::TokenSort);
        assert_eq!(config.id_base, 1);
        assert!(config.write_clusters);
    }

    #[test]
    fn test_threshold_above_100_rejected() {
        let config = SplitConfig {
            threshold: 101,
            ..SplitConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "threshold": 80, "top_n": 5 }}"#).unwrap();

        let config = SplitConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.threshold, 80);
        assert_eq!(config.top_n, Some(5));
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let err = SplitConfig::load_from_file("/nonexistent/contest-split.json").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
