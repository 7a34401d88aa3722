use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Default feature ceiling; anything beyond is truncated (and logged).
pub const MAX_FEATURES: usize = 2000;
/// Default wall-clock budget for the per-feature loop.
pub const TIME_BUDGET_MS: f64 = 25_000.0;
/// Above this many solids the boolean union is skipped entirely.
pub const MAX_UNION_SOLIDS: usize = 100;
/// Padding around the footprints for the base slab, in local units.
pub const BASE_BUFFER: f64 = 0.005;
/// Base slab thickness, in local units.
pub const BASE_THICKNESS: f64 = 0.002;

/// When to add the supporting base slab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum BaseMode {
    /// Only for dense, compact footprint sets.
    #[default]
    Auto,
    Always,
    Never,
}

/// Options accepted from the JS host. Every field is optional in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    pub max_features: usize,
    pub time_budget_ms: f64,
    pub max_union_solids: usize,
    pub base_buffer: f64,
    pub base_thickness: f64,
    pub generate_base: BaseMode,
    /// Name of the solid block written for the combined mesh.
    pub solid_name: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_features: MAX_FEATURES,
            time_budget_ms: TIME_BUDGET_MS,
            max_union_solids: MAX_UNION_SOLIDS,
            base_buffer: BASE_BUFFER,
            base_thickness: BASE_THICKNESS,
            generate_base: BaseMode::Auto,
            solid_name: "buildings".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Parse options JSON from the host. Empty input means defaults.
    pub fn from_json(options_json: &str) -> Result<Self, PipelineError> {
        if options_json.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: PipelineConfig = serde_json::from_str(options_json)
            .map_err(|e| PipelineError::InvalidOptions(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.max_features == 0 {
            return Err(PipelineError::InvalidOptions(
                "maxFeatures must be at least 1".to_string(),
            ));
        }
        if !self.time_budget_ms.is_finite() || self.time_budget_ms <= 0.0 {
            return Err(PipelineError::InvalidOptions(
                "timeBudgetMs must be a positive number".to_string(),
            ));
        }
        if !(self.base_thickness.is_finite() && self.base_thickness > 0.0) {
            return Err(PipelineError::InvalidOptions(
                "baseThickness must be a positive number".to_string(),
            ));
        }
        if !(self.base_buffer.is_finite() && self.base_buffer >= 0.0) {
            return Err(PipelineError::InvalidOptions(
                "baseBuffer must not be negative".to_string(),
            ));
        }
        if self.solid_name.trim().is_empty() || self.solid_name.contains(char::is_whitespace) {
            return Err(PipelineError::InvalidOptions(
                "solidName must be a single non-empty word".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_options_use_defaults() {
        assert_eq!(PipelineConfig::from_json("").unwrap(), PipelineConfig::default());
        assert_eq!(PipelineConfig::from_json("{}").unwrap(), PipelineConfig::default());
    }

    #[test]
    fn partial_options_keep_remaining_defaults() {
        let config =
            PipelineConfig::from_json(r#"{"maxFeatures": 10, "generateBase": "never"}"#).unwrap();
        assert_eq!(config.max_features, 10);
        assert_eq!(config.generate_base, BaseMode::Never);
        assert_eq!(config.max_union_solids, MAX_UNION_SOLIDS);
    }

    #[test]
    fn rejects_nonsense_limits() {
        assert!(matches!(
            PipelineConfig::from_json(r#"{"maxFeatures": 0}"#),
            Err(PipelineError::InvalidOptions(_))
        ));
        assert!(matches!(
            PipelineConfig::from_json(r#"{"timeBudgetMs": -5}"#),
            Err(PipelineError::InvalidOptions(_))
        ));
        assert!(matches!(
            PipelineConfig::from_json(r#"{"solidName": "two words"}"#),
            Err(PipelineError::InvalidOptions(_))
        ));
        assert!(PipelineConfig::from_json("not json").is_err());
    }
}
