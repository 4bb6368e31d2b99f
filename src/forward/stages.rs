//! The individual stages of forward processing. Each runs over a bank on its
//! own so callers can execute any prefix of the pipeline.

use tracing::{debug, warn};

use super::site_curve_map::SiteCurveMap;
use crate::error::ProjectionError;
use crate::models::{PolygonBank, SpeciesRankingDetails};
use crate::site_index::{convert, years_to_breast_height, SiteCurve};

/// Species with less basal area than this (m²/ha) are dropped before processing.
pub const MIN_BASAL_AREA: f64 = 0.001;

/// Drop every species whose all-classes basal area is below [`MIN_BASAL_AREA`].
///
/// Returns the number of species removed. Fails if no species remain.
pub fn remove_small_species(bank: &mut PolygonBank) -> Result<usize, ProjectionError> {
    let removed = bank.remove_species(|s| s.basal_area.all() < MIN_BASAL_AREA);
    if removed > 0 {
        debug!(polygon = %bank.description, removed, "removed small species");
    }

    if bank.n_species() == 0 {
        return Err(ProjectionError::NoSpeciesRemaining {
            polygon: bank.description.name.clone(),
            min_basal_area: MIN_BASAL_AREA,
        });
    }
    Ok(removed)
}

/// Assign a site curve to every species that was not given one.
pub fn calculate_missing_site_curves(
    bank: &mut PolygonBank,
    site_curve_map: &SiteCurveMap,
) -> Result<(), ProjectionError> {
    let region = bank.region;
    for i in bank.indices() {
        let slot = bank.species_mut(i);
        if slot.site_curve.is_none() {
            let curve = site_curve_map.resolve(slot.genus, region)?;
            debug!(genus = %slot.genus, %curve, "assigned site curve");
            slot.site_curve = Some(curve);
        }
    }
    Ok(())
}

/// Percentage of forested land covered by each species, as its share of the
/// polygon's all-classes basal area.
pub fn calculate_coverages(bank: &mut PolygonBank) {
    let total = bank.totals.basal_area.all();
    debug!(
        n_species = bank.n_species(),
        total_basal_area = total,
        "calculating coverages"
    );

    for i in bank.indices() {
        let slot = bank.species_mut(i);
        let percent = if total > 0.0 {
            slot.basal_area.all() / total * 100.0
        } else {
            0.0
        };
        slot.percent_forested = Some(percent);
        debug!(
            slot = i,
            genus = %slot.genus,
            basal_area = slot.basal_area.all(),
            percent,
            "species coverage"
        );
    }
}

/// Fill in missing site indices from the other species of the polygon.
///
/// If the primary species has no site index it becomes the mean of the
/// other species' indices converted to the primary's curve. Once the primary
/// has an index, every other species still missing one gets the primary's
/// index converted to its own curve. Conversions that have no answer are
/// logged and skipped. The polygon's site index is set to the primary's.
pub fn estimate_missing_site_indices(bank: &mut PolygonBank) -> Result<(), ProjectionError> {
    let primary = ranking(bank)?.primary_index;
    let primary_curve = slot_curve(bank, primary)?;

    if bank.species(primary).site_index.is_none() {
        let mut sum = 0.0;
        let mut count = 0usize;
        for i in bank.indices().filter(|i| *i != primary) {
            let Some(site_index) = bank.species(i).site_index else {
                continue;
            };
            let curve = slot_curve(bank, i)?;
            match convert(curve, site_index, primary_curve) {
                Ok(mapped) => {
                    sum += mapped;
                    count += 1;
                }
                Err(e) if e.is_recoverable_per_species() => {
                    warn!(
                        polygon = %bank.description,
                        genus = %bank.species(i).genus,
                        error = %e,
                        "no site index conversion to the primary curve; skipping species"
                    );
                }
                Err(e) => return Err(e),
            }
        }
        if count > 0 {
            bank.species_mut(primary).site_index = Some(sum / count as f64);
        }
    }

    let primary_site_index = bank.species(primary).site_index;
    if let Some(primary_si) = primary_site_index {
        for i in bank.indices().filter(|i| *i != primary) {
            if bank.species(i).site_index.is_some() {
                continue;
            }
            let curve = slot_curve(bank, i)?;
            match convert(primary_curve, primary_si, curve) {
                Ok(mapped) => bank.species_mut(i).site_index = Some(mapped),
                Err(e) if e.is_recoverable_per_species() => {
                    warn!(
                        polygon = %bank.description,
                        genus = %bank.species(i).genus,
                        error = %e,
                        "no site index conversion from the primary curve; skipping species"
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    bank.totals.site_index = primary_site_index;
    Ok(())
}

/// Fill in missing years-to-breast-height values.
///
/// Where both total age and years at breast height are known the value is
/// their difference. Otherwise it is estimated from the species' curve and
/// site index, falling back to the primary species' index (or the first
/// available one). Estimation failures are logged and leave the value unset.
pub fn estimate_missing_years_to_breast_height(
    bank: &mut PolygonBank,
) -> Result<(), ProjectionError> {
    let primary = ranking(bank)?.primary_index;
    let default_site_index = bank
        .species(primary)
        .site_index
        .or_else(|| bank.species_slots().iter().find_map(|s| s.site_index));

    for i in bank.indices() {
        let slot = bank.species(i);
        if slot.years_to_breast_height.is_some() {
            continue;
        }
        let genus = slot.genus;
        let own_site_index = slot.site_index;

        if let (Some(age_total), Some(at_breast)) = (slot.age_total, slot.years_at_breast_height) {
            if age_total > at_breast {
                bank.species_mut(i).years_to_breast_height = Some(age_total - at_breast);
                continue;
            }
        }

        let Some(site_index) = own_site_index.or(default_site_index) else {
            warn!(
                polygon = %bank.description,
                %genus,
                "no site index available; years to breast height left unset"
            );
            continue;
        };
        let curve = slot_curve(bank, i)?;
        match years_to_breast_height(curve, site_index) {
            Ok(y2bh) => bank.species_mut(i).years_to_breast_height = Some(y2bh),
            Err(e) if e.is_recoverable_per_species() => {
                warn!(
                    polygon = %bank.description,
                    %genus,
                    error = %e,
                    "unable to determine years to breast height"
                );
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

fn ranking(bank: &PolygonBank) -> Result<SpeciesRankingDetails, ProjectionError> {
    bank.ranking().copied().ok_or_else(|| {
        ProjectionError::InvalidArgument(format!(
            "polygon {} has not been ranked",
            bank.description
        ))
    })
}

fn slot_curve(bank: &PolygonBank, index: usize) -> Result<SiteCurve, ProjectionError> {
    let slot = bank.species(index);
    slot.site_curve.ok_or_else(|| {
        ProjectionError::InvalidArgument(format!(
            "polygon {}, species {} has no site curve",
            bank.description, slot.genus
        ))
    })
}
