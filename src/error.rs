use thiserror::Error;

use crate::models::Region;
use crate::site_index::SiteCurve;

/// Errors that can occur in site-index conversion and polygon processing.
#[derive(Error, Debug)]
pub enum ProjectionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{quantity} below breast height (1.3m) on curve {curve}: {value}")]
    BelowBreastHeight {
        curve: SiteCurve,
        quantity: &'static str,
        value: f64,
    },

    #[error("No convergence on curve {curve}: {reason}")]
    NoConvergence { curve: SiteCurve, reason: String },

    #[error("Growth intercept curve {curve} cannot be evaluated at total age")]
    GrowthInterceptRequiresBreastAge { curve: SiteCurve },

    #[error("Breast-height age {age} is outside growth intercept curve {curve} (1..={max_age})")]
    GrowthInterceptOutOfRange {
        curve: SiteCurve,
        age: f64,
        max_age: u32,
    },

    #[error("Unknown site curve: {0}")]
    UnknownCurve(String),

    #[error("Invalid site curve: {0}")]
    InvalidCurve(String),

    #[error("Invalid species: {0}")]
    InvalidSpecies(String),

    #[error("No site index conversion from curve {from} to curve {to}")]
    NoConversion { from: SiteCurve, to: SiteCurve },

    #[error("Polygon {polygon} has no species with basal area of at least {min_basal_area}")]
    NoSpeciesRemaining { polygon: String, min_basal_area: f64 },

    #[error("No site curve available for genus {genus} in the {region} region")]
    NoCurveAvailable { genus: String, region: Region },

    #[error("Unrecognized genus: {0}")]
    UnrecognizedGenus(String),
}

impl ProjectionError {
    /// Solver failures that stop one species' estimate but not the polygon.
    pub fn is_recoverable_per_species(&self) -> bool {
        matches!(
            self,
            ProjectionError::NoConversion { .. }
                | ProjectionError::NoConvergence { .. }
                | ProjectionError::BelowBreastHeight { .. }
                | ProjectionError::GrowthInterceptRequiresBreastAge { .. }
                | ProjectionError::GrowthInterceptOutOfRange { .. }
        )
    }

    pub(crate) fn no_convergence(curve: SiteCurve, reason: impl Into<String>) -> Self {
        ProjectionError::NoConvergence {
            curve,
            reason: reason.into(),
        }
    }
}
