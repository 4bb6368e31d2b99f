use super::curve::{AgeType, CurveSpecies, EquationRegistry, SiteCurve};
use super::height::height_from_age;
use super::index::site_index_from_height;
use super::math::{BREAST_HEIGHT, REFERENCE_AGE};
use crate::error::ProjectionError;

/// Height at the reference age on the first species' curve mapped to height
/// on the second's: `to = intercept + slope * from`. The reverse direction of
/// every pair is derived, so each pair is listed once.
const HEIGHT_RELATIONS: &[(CurveSpecies, CurveSpecies, f64, f64)] = &[
    (CurveSpecies::At, CurveSpecies::Sw, 3.28, 0.78),
    (CurveSpecies::At, CurveSpecies::Pli, 2.71, 0.86),
    (CurveSpecies::Pli, CurveSpecies::Sw, -2.14, 1.08),
    (CurveSpecies::Pli, CurveSpecies::Fdi, 0.71, 0.93),
    (CurveSpecies::Sw, CurveSpecies::Fdi, 4.09, 0.79),
    (CurveSpecies::Sw, CurveSpecies::Bl, 2.24, 0.82),
    (CurveSpecies::Pli, CurveSpecies::Bl, 1.05, 0.89),
    (CurveSpecies::Sw, CurveSpecies::Hwi, 1.92, 0.86),
    (CurveSpecies::Hwi, CurveSpecies::Cwi, 1.02, 0.83),
    (CurveSpecies::Lw, CurveSpecies::Fdi, 0.86, 0.94),
    (CurveSpecies::Ep, CurveSpecies::Sw, 0.93, 0.94),
    (CurveSpecies::Fdc, CurveSpecies::Hwc, 1.95, 0.82),
    (CurveSpecies::Fdc, CurveSpecies::Cwc, 0.47, 0.86),
    (CurveSpecies::Hwc, CurveSpecies::Cwc, -0.76, 1.04),
    (CurveSpecies::Hwc, CurveSpecies::Ss, 2.03, 0.95),
    (CurveSpecies::Hwc, CurveSpecies::Ba, 0.49, 0.98),
    (CurveSpecies::Fdc, CurveSpecies::Ss, 3.08, 0.81),
    (CurveSpecies::Dr, CurveSpecies::Fdc, -0.92, 1.21),
    (CurveSpecies::Dr, CurveSpecies::Hwc, 1.11, 0.97),
    (CurveSpecies::Dr, CurveSpecies::Cwc, 0.21, 1.06),
    (CurveSpecies::Cwc, CurveSpecies::Ba, 1.33, 0.93),
    (CurveSpecies::Ss, CurveSpecies::Ba, -0.15, 1.01),
    (CurveSpecies::Cwc, CurveSpecies::Ss, 2.66, 0.93),
    (CurveSpecies::Py, CurveSpecies::Fdi, 1.5, 0.9),
    (CurveSpecies::Pw, CurveSpecies::Fdc, 0.8, 0.95),
    (CurveSpecies::Acb, CurveSpecies::At, 0.5, 0.96),
    (CurveSpecies::Mb, CurveSpecies::Dr, 1.2, 0.9),
];

/// The `(intercept, slope)` mapping reference height on `from` to `to`.
pub fn height_relation(from: CurveSpecies, to: CurveSpecies) -> Option<(f64, f64)> {
    if from == to {
        return Some((0.0, 1.0));
    }
    HEIGHT_RELATIONS.iter().find_map(|&(a, b, intercept, slope)| {
        if a == from && b == to {
            Some((intercept, slope))
        } else if a == to && b == from {
            Some((-intercept / slope, 1.0 / slope))
        } else {
            None
        }
    })
}

/// Convert a site index measured on `from` to the equivalent index on `to`.
///
/// The index is taken as the height at breast-height age 50 on `from`, that
/// height is carried over to the target species, and the site index giving
/// that height at age 50 on `to` is solved for.
pub fn convert(from: SiteCurve, site_index: f64, to: SiteCurve) -> Result<f64, ProjectionError> {
    if site_index < BREAST_HEIGHT {
        return Err(ProjectionError::BelowBreastHeight {
            curve: from,
            quantity: "site index",
            value: site_index,
        });
    }
    if from == to {
        return Ok(site_index);
    }

    let (intercept, slope) = height_relation(from.species(), to.species())
        .ok_or(ProjectionError::NoConversion { from, to })?;

    // At breast-height age 50 no curve is on its juvenile branch, so the
    // years-to-breast-height offset plays no part.
    let height = height_from_age(from, REFERENCE_AGE, AgeType::BreastHeight, site_index, 0.0)?;
    let target_height = intercept + slope * height;
    site_index_from_height(to, REFERENCE_AGE, AgeType::BreastHeight, target_height, 0.0)
}

/// [`convert`] for curves given by numeric index. Unknown indices are
/// reported as `InvalidCurve`.
pub fn convert_by_index(from: u32, site_index: f64, to: u32) -> Result<f64, ProjectionError> {
    let resolve = |index: u32| {
        EquationRegistry::lookup(index)
            .map(|spec| spec.curve)
            .map_err(|_| ProjectionError::InvalidCurve(index.to_string()))
    };
    convert(resolve(from)?, site_index, resolve(to)?)
}

/// Whether a site index on `from` can be expressed on `to` at all.
pub fn can_convert(from: SiteCurve, to: SiteCurve) -> bool {
    height_relation(from.species(), to.species()).is_some()
}
