use super::curve::{AgeType, SiteCurve, YearsToBreastHeightModel};
use super::height::bruce_years_to_breast_height;
use super::math::BREAST_HEIGHT;
use crate::error::ProjectionError;

/// Lower bound on any estimated years to breast height.
pub const MIN_YEARS_TO_BREAST_HEIGHT: f64 = 1.0;

/// Estimate the years a tree on `curve` takes to reach breast height.
pub fn years_to_breast_height(curve: SiteCurve, site_index: f64) -> Result<f64, ProjectionError> {
    if site_index < BREAST_HEIGHT {
        return Err(ProjectionError::BelowBreastHeight {
            curve,
            quantity: "site index",
            value: site_index,
        });
    }

    let years = match curve.spec().years_to_breast_height {
        YearsToBreastHeightModel::Bruce => bruce_years_to_breast_height(site_index),
        YearsToBreastHeightModel::Linear { a, b } => a - b * site_index,
        YearsToBreastHeightModel::Reciprocal { a, b } => a + b / site_index,
    };
    Ok(years.max(MIN_YEARS_TO_BREAST_HEIGHT))
}

/// Convert an age between total and breast-height age.
///
/// Breast-height age never goes below zero: a tree younger than `y2bh`
/// has breast-height age 0. Growth-intercept curves have no total-age
/// definition and reject any conversion involving it.
pub fn age_to_age(
    curve: SiteCurve,
    age: f64,
    from: AgeType,
    to: AgeType,
    y2bh: f64,
) -> Result<f64, ProjectionError> {
    if from == to {
        return Ok(age);
    }
    if curve.is_growth_intercept() {
        return Err(ProjectionError::GrowthInterceptRequiresBreastAge { curve });
    }
    match to {
        AgeType::BreastHeight => Ok((age - y2bh).max(0.0)),
        AgeType::Total => Ok(age + y2bh),
    }
}
