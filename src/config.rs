use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AnnotatorError, Result};
use crate::rating::RatingScale;

pub const CONFIG_FILE_NAME: &str = "annotator.toml";

/// Runtime settings, read from `annotator.toml`. Every field is optional in
/// the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnnotatorConfig {
    /// Default tracing filter; `RUST_LOG` takes precedence.
    pub log_level: String,
    pub summary_delay_ms: u64,
    pub evaluation_delay_ms: u64,
    pub insights_delay_ms: u64,
    pub data_rows_rating: RatingScale,
    pub applications_rating: RatingScale,
    /// Prefix of generated application codes, e.g. `2025A-TIDEC4-0007`.
    pub application_code_prefix: String,
    pub preview_row_limit: usize,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            summary_delay_ms: 1500,
            evaluation_delay_ms: 2500,
            insights_delay_ms: 2000,
            data_rows_rating: RatingScale::new(1, 5),
            applications_rating: RatingScale::new(1, 10),
            application_code_prefix: "2025A-TIDEC4".to_string(),
            preview_row_limit: 10,
        }
    }
}

impl AnnotatorConfig {
    /// Reads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)
            .map_err(|err| AnnotatorError::Config(format!("unable to parse the config: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Zero delays everywhere, for tests and scripted use.
    pub fn without_delays() -> Self {
        Self {
            summary_delay_ms: 0,
            evaluation_delay_ms: 0,
            insights_delay_ms: 0,
            ..Self::default()
        }
    }

    pub fn summary_delay(&self) -> Duration {
        Duration::from_millis(self.summary_delay_ms)
    }

    pub fn evaluation_delay(&self) -> Duration {
        Duration::from_millis(self.evaluation_delay_ms)
    }

    pub fn insights_delay(&self) -> Duration {
        Duration::from_millis(self.insights_delay_ms)
    }

    fn validate(&self) -> Result<()> {
        for (label, scale) in [
            ("data_rows_rating", self.data_rows_rating),
            ("applications_rating", self.applications_rating),
        ] {
            if scale.min > scale.max {
                return Err(AnnotatorError::Config(format!(
                    "{label} has min {} above max {}",
                    scale.min, scale.max
                )));
            }
        }

        if self.preview_row_limit == 0 {
            return Err(AnnotatorError::Config(
                "preview_row_limit must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AnnotatorConfig::load(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config, AnnotatorConfig::default());
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            "insights_delay_ms = 0\napplication_code_prefix = \"2026A-TIDEC5\"\n\n[applications_rating]\nmin = 0\nmax = 100\n",
        )
        .unwrap();

        let config = AnnotatorConfig::load(&path).unwrap();
        assert_eq!(config.insights_delay(), Duration::ZERO);
        assert_eq!(config.summary_delay(), Duration::from_millis(1500));
        assert_eq!(config.application_code_prefix, "2026A-TIDEC5");
        assert_eq!(config.applications_rating, RatingScale::new(0, 100));
        assert_eq!(config.data_rows_rating, RatingScale::new(1, 5));
    }

    #[test]
    fn inverted_rating_range_is_rejected() {
        let err = AnnotatorConfig::from_toml_str("[data_rows_rating]\nmin = 5\nmax = 1\n").unwrap_err();
        assert!(matches!(err, AnnotatorError::Config(message) if message.contains("data_rows_rating")));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(AnnotatorConfig::from_toml_str("summary_delay = 3\n").is_err());
    }
}
