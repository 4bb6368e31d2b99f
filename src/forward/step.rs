use serde::{Deserialize, Serialize};

use crate::error::ProjectionError;

/// The stages of the forward pipeline, in execution order.
///
/// `None` runs nothing and `All` runs every stage. Running "through" a step
/// executes every stage whose position is at or before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStep {
    None,
    RemoveSmallSpecies,
    CalculateMissingSiteCurves,
    CalculateCoverages,
    DeterminePolygonRankings,
    EstimateMissingSiteIndices,
    EstimateMissingYearsToBreastHeight,
    #[default]
    All,
}

impl ExecutionStep {
    pub const ALL_STEPS: [ExecutionStep; 8] = [
        ExecutionStep::None,
        ExecutionStep::RemoveSmallSpecies,
        ExecutionStep::CalculateMissingSiteCurves,
        ExecutionStep::CalculateCoverages,
        ExecutionStep::DeterminePolygonRankings,
        ExecutionStep::EstimateMissingSiteIndices,
        ExecutionStep::EstimateMissingYearsToBreastHeight,
        ExecutionStep::All,
    ];

    pub fn ordinal(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            ExecutionStep::None => "none",
            ExecutionStep::RemoveSmallSpecies => "remove_small_species",
            ExecutionStep::CalculateMissingSiteCurves => "calculate_missing_site_curves",
            ExecutionStep::CalculateCoverages => "calculate_coverages",
            ExecutionStep::DeterminePolygonRankings => "determine_polygon_rankings",
            ExecutionStep::EstimateMissingSiteIndices => "estimate_missing_site_indices",
            ExecutionStep::EstimateMissingYearsToBreastHeight => {
                "estimate_missing_years_to_breast_height"
            }
            ExecutionStep::All => "all",
        }
    }

    pub fn predecessor(self) -> Result<ExecutionStep, ProjectionError> {
        match self.ordinal() {
            0 => Err(ProjectionError::InvalidArgument(
                "ExecutionStep::None has no predecessor".to_string(),
            )),
            n => Ok(Self::ALL_STEPS[n - 1]),
        }
    }

    pub fn successor(self) -> Result<ExecutionStep, ProjectionError> {
        match self {
            ExecutionStep::All => Err(ProjectionError::InvalidArgument(
                "ExecutionStep::All has no successor".to_string(),
            )),
            _ => Ok(Self::ALL_STEPS[self.ordinal() + 1]),
        }
    }

    /// Whether running through `self` includes `stage`.
    pub fn includes(self, stage: ExecutionStep) -> bool {
        self >= stage
    }
}

impl std::fmt::Display for ExecutionStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ExecutionStep {
    type Err = ProjectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        Self::ALL_STEPS
            .iter()
            .copied()
            .find(|step| step.name() == wanted)
            .ok_or_else(|| ProjectionError::ParseError(format!("Unknown execution step: '{s}'")))
    }
}
