use super::curve::{AgeType, CurveForm, SiteCurve};
use super::height::{anchored_ratio, height_from_age};
use super::math::{ppow, BREAST_HEIGHT};
use super::y2bh::years_to_breast_height;
use crate::error::ProjectionError;

const HEIGHT_TOLERANCE: f64 = 0.0001;
const MIN_STEP: f64 = 0.00001;
const MAX_FAILURES: u32 = 100;
const MAX_SEARCH_STEPS: u32 = 1_000;
const MAX_SITE_INDEX: f64 = 999.0;

/// Site index implied by a tree of `height` at `age` on `curve`.
///
/// Growth-intercept curves evaluate their direct relation and are only
/// defined at breast-height ages `1..=max_age`. Every other curve is
/// searched: the site index whose height at `age` matches `height`.
pub fn site_index_from_height(
    curve: SiteCurve,
    age: f64,
    age_type: AgeType,
    height: f64,
    y2bh: f64,
) -> Result<f64, ProjectionError> {
    if height < BREAST_HEIGHT {
        return Err(ProjectionError::BelowBreastHeight {
            curve,
            quantity: "height",
            value: height,
        });
    }

    match curve.spec().form {
        CurveForm::GrowthIntercept { b1, b2, max_age } => {
            if age_type == AgeType::Total {
                return Err(ProjectionError::GrowthInterceptRequiresBreastAge { curve });
            }
            if age < 1.0 || age > f64::from(max_age) {
                return Err(ProjectionError::GrowthInterceptOutOfRange { curve, age, max_age });
            }
            Ok(BREAST_HEIGHT + (height - BREAST_HEIGHT) * ppow(anchored_ratio(b1, age), -b2))
        }
        _ => search_site_index(curve, age, age_type, height, |_| Ok(y2bh)),
    }
}

/// Site index implied by a tree of `height` at `age` when years to breast
/// height is unknown: each trial site index brings its own estimate.
pub fn site_index_with_estimated_y2bh(
    curve: SiteCurve,
    age: f64,
    age_type: AgeType,
    height: f64,
) -> Result<f64, ProjectionError> {
    if height < BREAST_HEIGHT || curve.is_growth_intercept() {
        return site_index_from_height(curve, age, age_type, height, 0.0);
    }
    search_site_index(curve, age, age_type, height, |si| {
        years_to_breast_height(curve, si)
    })
}

fn search_site_index<F>(
    curve: SiteCurve,
    age: f64,
    age_type: AgeType,
    height: f64,
    y2bh_for: F,
) -> Result<f64, ProjectionError>
where
    F: Fn(f64) -> Result<f64, ProjectionError>,
{
    let mut site_index = 25.0;
    let mut step = site_index / 2.0;
    let mut failures = 0;

    for _ in 0..MAX_SEARCH_STEPS {
        let y2bh = y2bh_for(site_index)?;
        let test_height = match height_from_age(curve, age, age_type, site_index, y2bh) {
            Ok(h) => h,
            Err(ProjectionError::NoConvergence { .. }) => {
                failures += 1;
                if failures == MAX_FAILURES {
                    break;
                }
                1000.0
            }
            Err(e) => return Err(e),
        };

        if (test_height - height).abs() <= HEIGHT_TOLERANCE {
            return Ok(site_index);
        }
        if test_height > height {
            if step > 0.0 {
                step = -step / 2.0;
            }
        } else if step < 0.0 {
            step = -step / 2.0;
        }
        site_index = (site_index + step).max(BREAST_HEIGHT);

        if step.abs() < MIN_STEP {
            return Ok(site_index);
        }
        if site_index > MAX_SITE_INDEX {
            break;
        }
    }

    Err(ProjectionError::no_convergence(
        curve,
        format!("no site index reaches height {height} at {age_type} age {age}"),
    ))
}
