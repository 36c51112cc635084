use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::labels::LabelType;
use crate::table::MissingPolicy;

/// Optional pipeline parameters with named defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SankifyConfig {
    /// Number of random sample points, default 500.
    pub samples: usize,
    /// Sampling scale in image units (degrees for local rasters). None = native resolution.
    pub scale: Option<f64>,
    /// Seed for point generation, default 0.
    pub seed: u64,
    /// Keep only classes at least as large as the k-th largest. None = keep all.
    pub max_classes: Option<usize>,
    pub title: Option<String>,
    /// Built-in theme name, default "default".
    pub theme: String,
    pub label_type: LabelType,
    /// Rows with missing values are dropped by default.
    pub missing: MissingPolicy,
    /// Bound on the single remote sampling call, default 60 s.
    pub timeout_secs: u64,
}

impl Default for SankifyConfig {
    fn default() -> Self {
        Self {
            samples: 500,
            scale: None,
            seed: 0,
            max_classes: None,
            title: None,
            theme: "default".into(),
            label_type: LabelType::Class,
            missing: MissingPolicy::Drop,
            timeout_secs: 60,
        }
    }
}

impl SankifyConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.samples == 0 {
            return Err(ConfigurationError::InvalidSetting {
                field: "samples",
                reason: "must be positive".into(),
            });
        }
        if let Some(scale) = self.scale {
            if !(scale.is_finite() && scale > 0.0) {
                return Err(ConfigurationError::InvalidSetting {
                    field: "scale",
                    reason: format!("must be a positive number, got {scale}"),
                });
            }
        }
        if self.timeout_secs == 0 {
            return Err(ConfigurationError::InvalidSetting {
                field: "timeout_secs",
                reason: "must be positive".into(),
            });
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_uses_defaults() {
        let cfg: SankifyConfig = serde_json::from_str(r#"{"samples": 50, "label_type": "percent"}"#).unwrap();
        assert_eq!(cfg.samples, 50);
        assert_eq!(cfg.label_type, LabelType::Percent);
        assert_eq!(cfg.seed, 0);
        assert_eq!(cfg.theme, "default");
        assert_eq!(cfg.missing, MissingPolicy::Drop);
    }

    #[test]
    fn validation() {
        assert!(SankifyConfig::default().validate().is_ok());
        let bad = SankifyConfig {
            scale: Some(-1.0),
            ..Default::default()
        };
        assert!(matches!(bad.validate(), Err(ConfigurationError::InvalidSetting { field: "scale", .. })));
        let bad = SankifyConfig {
            samples: 0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
