use super::curve::{AgeType, CurveForm, HuGarciaCoefficients, SiteCurve};
use super::math::{llog, ppow, BREAST_HEIGHT, MAX_AGE, REFERENCE_AGE};
use crate::error::ProjectionError;

/// Heights above this are treated as a failure to produce an answer.
const MAX_HEIGHT: f64 = 999.0;

/// Juvenile-branch height at which Wiley trees reach breast age.
const WILEY_BREAST_HEIGHT: f64 = 1.37;

const FEET_PER_METRE: f64 = 1.0 / 0.3048;

/// Compute height (m) at the given age on a site curve.
///
/// `y2bh` is the years-to-breast-height offset used to move between total
/// and breast-height age. Ages at or below zero total age give a height of
/// zero; the result is never negative.
pub fn height_from_age(
    curve: SiteCurve,
    age: f64,
    age_type: AgeType,
    site_index: f64,
    y2bh: f64,
) -> Result<f64, ProjectionError> {
    if site_index < BREAST_HEIGHT {
        return Err(ProjectionError::BelowBreastHeight {
            curve,
            quantity: "site index",
            value: site_index,
        });
    }

    let form = curve.spec().form;
    let y2bh = match form {
        CurveForm::Bruce { .. } => bruce_years_to_breast_height(site_index),
        _ => y2bh,
    };
    let total_age = match age_type {
        AgeType::Total => age,
        AgeType::BreastHeight => age + y2bh,
    };
    if total_age <= 0.0 {
        return Ok(0.0);
    }
    let bh_age = total_age - y2bh;

    let height = match form {
        CurveForm::Bruce { x2, breast_height } => {
            let terms = BruceTerms::new(curve, x2, breast_height, site_index, y2bh)?;
            site_index * (terms.x4 * (ppow(total_age, terms.x2) - terms.x3)).exp()
        }
        CurveForm::Wiley { x2, x3, x4 } if bh_age > 0.0 => {
            let (x2, x3, x4) = wiley_terms(site_index, x2, x3, x4);
            let feet = 4.5 + bh_age * bh_age / (x2 + x3 * bh_age + x4 * bh_age * bh_age);
            feet / FEET_PER_METRE
        }
        CurveForm::Wiley { .. } => juvenile_height(total_age, y2bh, WILEY_BREAST_HEIGHT),
        CurveForm::Goudie { x1, x2, x3 } if bh_age > 0.0 => {
            let (a, b) = goudie_terms(site_index, x1, x2, x3);
            BREAST_HEIGHT + a / (1.0 + (b + x3 * llog(bh_age)).exp())
        }
        CurveForm::Goudie { .. } => juvenile_height(total_age, y2bh, BREAST_HEIGHT),
        CurveForm::HuGarcia(coefficients) => {
            let q = hu_garcia_q(curve, &coefficients, site_index, REFERENCE_AGE)?;
            hu_garcia_height(&coefficients, q, bh_age)
        }
        CurveForm::ChapmanRichards { b1, b2, b3 } if bh_age > 0.0 => {
            let shape = b2 * ppow(site_index - BREAST_HEIGHT, b3);
            BREAST_HEIGHT + (site_index - BREAST_HEIGHT) * ppow(anchored_ratio(b1, bh_age), shape)
        }
        CurveForm::GrowthIntercept { b1, b2, .. } if bh_age > 0.0 => {
            BREAST_HEIGHT + (site_index - BREAST_HEIGHT) * ppow(anchored_ratio(b1, bh_age), b2)
        }
        CurveForm::ChapmanRichards { .. } | CurveForm::GrowthIntercept { .. } => {
            juvenile_height(total_age, y2bh, BREAST_HEIGHT)
        }
    };

    if !height.is_finite() || height > MAX_HEIGHT {
        return Err(ProjectionError::no_convergence(
            curve,
            format!("height at age {age} exceeds {MAX_HEIGHT}"),
        ));
    }
    Ok(height.max(0.0))
}

/// Height before breast height is reached: grows with the square of the
/// fraction of `y2bh` elapsed, reaching `at_breast` when `total_age == y2bh`.
fn juvenile_height(total_age: f64, y2bh: f64, at_breast: f64) -> f64 {
    at_breast * ppow(total_age / y2bh, 2.0)
}

/// `(1 - e^(-b1 * age)) / (1 - e^(-b1 * 50))`, equal to 1 at the reference age.
pub(crate) fn anchored_ratio(b1: f64, bh_age: f64) -> f64 {
    (1.0 - (-b1 * bh_age).exp()) / (1.0 - (-b1 * REFERENCE_AGE).exp())
}

pub(crate) fn bruce_years_to_breast_height(site_index: f64) -> f64 {
    13.25 - site_index / 6.096
}

pub(crate) struct BruceTerms {
    pub x2: f64,
    pub x3: f64,
    pub x4: f64,
}

impl BruceTerms {
    pub fn new(
        curve: SiteCurve,
        c: [f64; 4],
        breast_height: f64,
        site_index: f64,
        y2bh: f64,
    ) -> Result<Self, ProjectionError> {
        let x1 = site_index / 30.48;
        let x2 = c[0] + x1 * (c[1] + x1 * (c[2] + x1 * c[3]));
        let x3 = ppow(REFERENCE_AGE + y2bh, x2);
        let denominator = ppow(y2bh, x2) - x3;
        if denominator == 0.0 {
            return Err(ProjectionError::no_convergence(
                curve,
                format!("degenerate curve for site index {site_index}"),
            ));
        }
        let x4 = llog(breast_height / site_index) / denominator;
        Ok(Self { x2, x3, x4 })
    }
}

/// Coefficients of the Wiley quadratic for a site index in metres.
pub(crate) fn wiley_terms(
    site_index: f64,
    x2: [f64; 2],
    x3: [f64; 2],
    x4: [f64; 2],
) -> (f64, f64, f64) {
    let x1 = 2500.0 / (site_index * FEET_PER_METRE - 4.5);
    (x2[0] + x2[1] * x1, x3[0] + x3[1] * x1, x4[0] + x4[1] * x1)
}

/// Asymptote and offset terms of the Goudie form for a site index.
pub(crate) fn goudie_terms(site_index: f64, x1: f64, x2: f64, x3: f64) -> (f64, f64) {
    let b = x2 + x1 * llog(site_index - BREAST_HEIGHT);
    let a = (site_index - BREAST_HEIGHT) * (1.0 + (b + x3 * REFERENCE_AGE.ln()).exp());
    (a, b)
}

const HU_GARCIA_MAX_STEPS: usize = 10_000;

/// Solve the Hu-Garcia `q` parameter giving `site_index` at breast-height
/// age `bh_age`.
pub(crate) fn hu_garcia_q(
    curve: SiteCurve,
    coefficients: &HuGarciaCoefficients,
    site_index: f64,
    bh_age: f64,
) -> Result<f64, ProjectionError> {
    let mut q = 0.02;
    let mut step = 0.01;
    let mut diff = 0.0;

    for _ in 0..HU_GARCIA_MAX_STEPS {
        let h = hu_garcia_height(coefficients, q, bh_age);
        let last_diff = diff;
        diff = site_index - h;
        if diff > 1e-7 {
            if last_diff < 0.0 {
                step /= 2.0;
            }
            q += step;
        } else if diff < -1e-7 {
            if last_diff > 0.0 {
                step /= 2.0;
            }
            q -= step;
            if q <= 0.0 {
                q = 1e-7;
            }
        } else {
            return Ok(q);
        }
        if step < 1e-7 {
            return Ok(q);
        }
    }

    Err(ProjectionError::no_convergence(
        curve,
        format!("Hu-Garcia q did not settle for site index {site_index}"),
    ))
}

pub(crate) fn hu_garcia_height(c: &HuGarciaCoefficients, q: f64, bh_age: f64) -> f64 {
    let a = c.scale * ppow(q, c.scale_exponent);
    let growth = 1.0 - (1.0 - ppow(BREAST_HEIGHT / a, c.shape)) * (-q * (bh_age - 0.5)).exp();
    a * ppow(growth, c.exponent)
}

/// Breast-height age at which the Hu-Garcia curve for `q` reaches `height`.
pub(crate) fn hu_garcia_breast_age(c: &HuGarciaCoefficients, q: f64, height: f64) -> f64 {
    let a = c.scale * ppow(q, c.scale_exponent);
    let ratio = (1.0 - ppow(height / a, c.shape)) / (1.0 - ppow(BREAST_HEIGHT / a, c.shape));
    0.5 - 1.0 / q * llog(ratio)
}

/// Guard shared by the age solvers: negative ages clamp to zero, anything
/// past `MAX_AGE` or non-finite is a failure.
pub(crate) fn checked_age(curve: SiteCurve, age: f64) -> Result<f64, ProjectionError> {
    if !age.is_finite() || age > MAX_AGE {
        return Err(ProjectionError::no_convergence(
            curve,
            format!("projected age {age} exceeds {MAX_AGE}"),
        ));
    }
    Ok(age.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_height_at_reference_age_is_site_index() {
        for curve in SiteCurve::ALL {
            let h = height_from_age(curve, 50.0, AgeType::BreastHeight, 27.5, 6.0).unwrap();
            assert!((h - 27.5).abs() < 1e-3, "{curve}: {h}");
        }
    }

    #[test]
    fn test_bruce_reaches_breast_height_at_y2bh() {
        let si = 30.0;
        let y2bh = bruce_years_to_breast_height(si);
        let h = height_from_age(SiteCurve::FdcBruce, y2bh, AgeType::Total, si, 0.0).unwrap();
        assert_approx_eq!(h, 1.372, 1e-9);
    }

    #[test]
    fn test_height_increases_with_age() {
        for curve in [SiteCurve::HwcWiley, SiteCurve::SsGoudie, SiteCurve::DrNigh, SiteCurve::SwHuGarcia] {
            let mut last = 0.0;
            for age in [5.0, 10.0, 20.0, 40.0, 80.0, 120.0] {
                let h = height_from_age(curve, age, AgeType::Total, 22.0, 7.0).unwrap();
                assert!(h > last, "{curve} at {age}: {h} <= {last}");
                last = h;
            }
        }
    }

    #[test]
    fn test_zero_total_age_is_zero_height() {
        let h = height_from_age(SiteCurve::PliGoudieDry, 0.0, AgeType::Total, 18.0, 5.0).unwrap();
        assert_eq!(h, 0.0);
        let h = height_from_age(SiteCurve::PliGoudieDry, -5.0, AgeType::BreastHeight, 18.0, 5.0)
            .unwrap();
        assert_eq!(h, 0.0);
    }

    #[test]
    fn test_juvenile_branch_below_breast_height() {
        let h = height_from_age(SiteCurve::SwGoudieNat, 3.0, AgeType::Total, 20.0, 6.0).unwrap();
        assert_approx_eq!(h, 1.3 * 0.25, 1e-9);
    }

    #[test]
    fn test_site_index_below_breast_height_fails() {
        let err = height_from_age(SiteCurve::HwcWiley, 20.0, AgeType::Total, 1.0, 5.0).unwrap_err();
        assert!(matches!(err, ProjectionError::BelowBreastHeight { .. }));
    }

    fn hu_garcia_coefficients() -> HuGarciaCoefficients {
        match SiteCurve::SwHuGarcia.spec().form {
            CurveForm::HuGarcia(c) => c,
            other => panic!("unexpected form {other:?}"),
        }
    }

    #[test]
    fn test_hu_garcia_q_reproduces_site_index() {
        let c = hu_garcia_coefficients();
        let q = hu_garcia_q(SiteCurve::SwHuGarcia, &c, 25.0, 50.0).unwrap();
        assert_approx_eq!(hu_garcia_height(&c, q, 50.0), 25.0, 1e-3);
        assert_approx_eq!(hu_garcia_breast_age(&c, q, 25.0), 50.0, 1e-2);
    }

    #[test]
    fn test_registry_coefficients_drive_the_formula() {
        let mut c = hu_garcia_coefficients();
        let q = hu_garcia_q(SiteCurve::SwHuGarcia, &c, 25.0, 50.0).unwrap();
        let h = hu_garcia_height(&c, q, 80.0);
        c.exponent *= 1.1;
        assert!(hu_garcia_height(&c, q, 80.0) != h);

        let bruce = SiteCurve::FdcBruce.spec().form;
        let CurveForm::Bruce { x2, breast_height } = bruce else {
            panic!("unexpected form {bruce:?}");
        };
        let y2bh = bruce_years_to_breast_height(30.0);
        let terms = BruceTerms::new(SiteCurve::FdcBruce, x2, breast_height, 30.0, y2bh).unwrap();
        assert_approx_eq!(
            30.0 * (terms.x4 * (ppow(y2bh, terms.x2) - terms.x3)).exp(),
            breast_height,
            1e-9
        );
    }

    #[test]
    fn test_checked_age() {
        assert_eq!(checked_age(SiteCurve::FdcBruce, -0.2).unwrap(), 0.0);
        assert!(checked_age(SiteCurve::FdcBruce, 1000.0).is_err());
        assert!(checked_age(SiteCurve::FdcBruce, f64::NAN).is_err());
    }
}
