use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ProjectionError;
use crate::forward::{ExecutionStep, ForwardContext, SiteCurveMap};
use crate::models::{Genus, Region};
use crate::site_index::SiteCurve;

/// Forward-engine settings, the `[engine]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub last_step: ExecutionStep,
    pub species_to_combine: Vec<Vec<Genus>>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            last_step: ExecutionStep::All,
            species_to_combine: ForwardContext::default().species_to_combine,
        }
    }
}

/// One `[[site_curves]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteCurveEntry {
    pub genus: Genus,
    pub region: Region,
    pub curve: SiteCurve,
}

/// Configuration file for a projection run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectionConfig {
    pub engine: EngineConfig,
    pub site_curves: Vec<SiteCurveEntry>,
}

impl ProjectionConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ProjectionError> {
        let config: ProjectionConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self, ProjectionError> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        debug!(
            path = %path.display(),
            site_curves = config.site_curves.len(),
            last_step = %config.engine.last_step,
            "loaded configuration"
        );
        Ok(config)
    }

    fn validate(&self) -> Result<(), ProjectionError> {
        if let Some(group) = self.engine.species_to_combine.iter().find(|g| g.len() != 2) {
            return Err(ProjectionError::ValidationError(format!(
                "species_to_combine groups must name exactly 2 genera, found {group:?}"
            )));
        }
        Ok(())
    }

    /// The explicit site-curve assignments. Later entries for the same
    /// genus and region replace earlier ones.
    pub fn site_curve_map(&self) -> SiteCurveMap {
        self.site_curves
            .iter()
            .map(|e| (e.genus, e.region, e.curve))
            .collect()
    }

    pub fn forward_context(&self) -> ForwardContext {
        ForwardContext {
            site_curve_map: self.site_curve_map(),
            species_to_combine: self.engine.species_to_combine.clone(),
        }
    }
}
