use rayon::prelude::*;
use tracing::{debug, info};

use super::ranking::determine_polygon_rankings;
use super::site_curve_map::SiteCurveMap;
use super::stages::{
    calculate_coverages, calculate_missing_site_curves, estimate_missing_site_indices,
    estimate_missing_years_to_breast_height, remove_small_species,
};
use super::step::ExecutionStep;
use crate::config::ProjectionConfig;
use crate::error::ProjectionError;
use crate::models::{Genus, Polygon, PolygonBank};

/// Read-only inputs shared by every polygon a run processes.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardContext {
    pub site_curve_map: SiteCurveMap,
    /// Genus pairs whose coverages are merged when ranking species
    pub species_to_combine: Vec<Vec<Genus>>,
}

impl Default for ForwardContext {
    fn default() -> Self {
        Self {
            site_curve_map: SiteCurveMap::new(),
            species_to_combine: vec![vec![Genus::Pl, Genus::Pa], vec![Genus::C, Genus::Y]],
        }
    }
}

/// Run every stage up to and including `last_step` over `bank`, in order.
pub fn execute_forward_algorithm(
    bank: &mut PolygonBank,
    ctx: &ForwardContext,
    last_step: ExecutionStep,
) -> Result<(), ProjectionError> {
    let stages = ExecutionStep::ALL_STEPS
        .into_iter()
        .filter(|s| !matches!(s, ExecutionStep::None | ExecutionStep::All));

    for step in stages.take_while(|s| last_step.includes(*s)) {
        debug!(polygon = %bank.description, %step, "running stage");
        match step {
            ExecutionStep::RemoveSmallSpecies => {
                remove_small_species(bank)?;
            }
            ExecutionStep::CalculateMissingSiteCurves => {
                calculate_missing_site_curves(bank, &ctx.site_curve_map)?
            }
            ExecutionStep::CalculateCoverages => calculate_coverages(bank),
            ExecutionStep::DeterminePolygonRankings => {
                determine_polygon_rankings(bank, &ctx.species_to_combine)?;
            }
            ExecutionStep::EstimateMissingSiteIndices => estimate_missing_site_indices(bank)?,
            ExecutionStep::EstimateMissingYearsToBreastHeight => {
                estimate_missing_years_to_breast_height(bank)?
            }
            ExecutionStep::None | ExecutionStep::All => {}
        }
    }
    Ok(())
}

/// Validates polygons, builds their banks and runs the forward stages.
#[derive(Debug, Clone, Default)]
pub struct ForwardEngine {
    context: ForwardContext,
    last_step: ExecutionStep,
}

impl ForwardEngine {
    pub fn new(context: ForwardContext, last_step: ExecutionStep) -> Self {
        Self { context, last_step }
    }

    pub fn from_config(config: &ProjectionConfig) -> Self {
        Self::new(config.forward_context(), config.engine.last_step)
    }

    pub fn context(&self) -> &ForwardContext {
        &self.context
    }

    pub fn last_step(&self) -> ExecutionStep {
        self.last_step
    }

    /// Process one polygon through the engine's configured last step.
    pub fn process_polygon(&self, polygon: &Polygon) -> Result<PolygonBank, ProjectionError> {
        self.process_polygon_through(polygon, self.last_step)
    }

    /// Process one polygon through `last_step`.
    pub fn process_polygon_through(
        &self,
        polygon: &Polygon,
        last_step: ExecutionStep,
    ) -> Result<PolygonBank, ProjectionError> {
        info!(polygon = %polygon.description, %last_step, "processing polygon");
        polygon.validate()?;

        let mut bank = PolygonBank::from_polygon(polygon);
        execute_forward_algorithm(&mut bank, &self.context, last_step)?;
        Ok(bank)
    }

    /// Process polygons in parallel. Results come back in input order; a
    /// failed polygon does not affect the others.
    pub fn process_polygons(&self, polygons: &[Polygon]) -> Vec<Result<PolygonBank, ProjectionError>> {
        polygons
            .par_iter()
            .map(|polygon| self.process_polygon(polygon))
            .collect()
    }
}
