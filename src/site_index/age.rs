use tracing::trace;

use super::curve::{AgeType, CurveForm, SiteCurve};
use super::height::{
    bruce_years_to_breast_height, checked_age, goudie_terms, height_from_age,
    hu_garcia_breast_age, hu_garcia_q, wiley_terms, BruceTerms,
};
use super::index::site_index_from_height;
use super::math::{llog, ppow, BREAST_HEIGHT, MAX_AGE, REFERENCE_AGE};
use super::y2bh::age_to_age;
use crate::error::ProjectionError;

/// A total-age request for a height at or below this returns age 0.
const EMERGENCE_HEIGHT: f64 = 0.0001;

const START_AGE: f64 = 25.0;
const AGE_TOLERANCE_HEIGHT: f64 = 0.005;
const MIN_STEP: f64 = 0.00001;
const MAX_FORWARD_FAILURES: u32 = 100;
/// Height recorded when the forward solve fails during iteration.
const FAILED_HEIGHT: f64 = 1000.0;

/// Wiley ages below this are refined by iteration.
const WILEY_ITERATE_BELOW: f64 = 10.0;

/// Breast-height ages scanned by the growth-intercept solver.
const GI_SCAN_AGES: std::ops::Range<u32> = 1..100;
const GI_TOLERANCE: f64 = 1.0;

/// Compute the age at which a tree on `curve` reaches `height`.
pub fn age_from_height(
    curve: SiteCurve,
    height: f64,
    age_type: AgeType,
    site_index: f64,
    y2bh: f64,
) -> Result<f64, ProjectionError> {
    if height < BREAST_HEIGHT {
        if age_type == AgeType::BreastHeight {
            return Err(ProjectionError::BelowBreastHeight {
                curve,
                quantity: "height",
                value: height,
            });
        }
        if height <= EMERGENCE_HEIGHT {
            return Ok(0.0);
        }
    }
    if site_index < BREAST_HEIGHT {
        return Err(ProjectionError::BelowBreastHeight {
            curve,
            quantity: "site index",
            value: site_index,
        });
    }

    match curve.spec().form {
        CurveForm::Bruce { x2, breast_height } => {
            bruce_age(curve, x2, breast_height, height, age_type, site_index)
        }
        CurveForm::Wiley { x2, x3, x4 } => {
            let terms = wiley_terms(site_index, x2, x3, x4);
            let age = wiley_age(curve, terms, height, age_type, site_index, y2bh)?;
            if age > 0.0 && age < WILEY_ITERATE_BELOW {
                trace!(%curve, age, "refining young Wiley age by iteration");
                iterate_age(curve, height, age_type, site_index, y2bh)
            } else {
                Ok(age)
            }
        }
        CurveForm::Goudie { x1, x2, x3 } => {
            if height < BREAST_HEIGHT {
                return juvenile_age(curve, height, age_type, y2bh, BREAST_HEIGHT);
            }
            let (a, b) = goudie_terms(site_index, x1, x2, x3);
            let bh_age = ((llog(a / (height - BREAST_HEIGHT) - 1.0) - b) / x3).exp();
            checked_age(curve, with_age_type(bh_age, age_type, y2bh))
        }
        CurveForm::HuGarcia(coefficients) => {
            let q = hu_garcia_q(curve, &coefficients, site_index, REFERENCE_AGE)?;
            let bh_age = hu_garcia_breast_age(&coefficients, q, height);
            checked_age(curve, with_age_type(bh_age, age_type, y2bh))
        }
        CurveForm::ChapmanRichards { .. } => iterate_age(curve, height, age_type, site_index, y2bh),
        CurveForm::GrowthIntercept { .. } => {
            scan_growth_intercept_age(curve, height, age_type, site_index)
        }
    }
}

/// Express a breast-height age in the requested age type.
fn with_age_type(bh_age: f64, age_type: AgeType, y2bh: f64) -> f64 {
    match age_type {
        AgeType::Total => bh_age + y2bh,
        AgeType::BreastHeight => bh_age,
    }
}

/// Age below breast height, inverting `height = at_breast * (age / y2bh)^2`.
fn juvenile_age(
    curve: SiteCurve,
    height: f64,
    age_type: AgeType,
    y2bh: f64,
    at_breast: f64,
) -> Result<f64, ProjectionError> {
    let mut age = y2bh * ppow(height / at_breast, 0.5);
    if age_type == AgeType::BreastHeight {
        age -= y2bh;
    }
    checked_age(curve, age)
}

fn bruce_age(
    curve: SiteCurve,
    x2: [f64; 4],
    breast_height: f64,
    height: f64,
    age_type: AgeType,
    site_index: f64,
) -> Result<f64, ProjectionError> {
    let y2bh = bruce_years_to_breast_height(site_index);
    let terms = BruceTerms::new(curve, x2, breast_height, site_index, y2bh)?;

    let x1 = llog(height / site_index) / terms.x4 + terms.x3;
    if x1 < 0.0 {
        return Err(ProjectionError::no_convergence(
            curve,
            format!("height {height} is beyond the curve for site index {site_index}"),
        ));
    }
    let mut age = ppow(x1, 1.0 / terms.x2);
    if age_type == AgeType::BreastHeight {
        age -= y2bh;
    }
    checked_age(curve, age)
}

fn wiley_age(
    curve: SiteCurve,
    (x2, x3, x4): (f64, f64, f64),
    height: f64,
    age_type: AgeType,
    site_index: f64,
    y2bh: f64,
) -> Result<f64, ProjectionError> {
    let feet = height / 0.3048;
    if feet < 4.5 {
        return juvenile_age(curve, height, age_type, y2bh, 1.37);
    }

    let x1 = 4.5 - feet;
    let a = 1.0 + x1 * x4;
    let b = x1 * x3;
    let c = x1 * x2;

    let root = ppow(b * b - 4.0 * a * c, 0.5);
    if root == 0.0 {
        return Err(ProjectionError::no_convergence(
            curve,
            format!("no real age for height {height} at site index {site_index}"),
        ));
    }
    let bh_age = (-b + root) / (2.0 * a);
    checked_age(curve, with_age_type(bh_age, age_type, y2bh))
}

/// Solve age by stepping total age from 25 years, halving and reversing the
/// step each time the computed height crosses the target.
///
/// A forward solve that fails is recorded as a height of 1000 and counted;
/// the search gives up after 100 such failures or once the age passes 999.
pub fn iterate_age(
    curve: SiteCurve,
    height: f64,
    age_type: AgeType,
    site_index: f64,
    y2bh: f64,
) -> Result<f64, ProjectionError> {
    // Surface argument errors before searching.
    height_from_age(curve, START_AGE, AgeType::Total, site_index, y2bh)?;

    let age = search_total_age(curve, height, |age| {
        height_from_age(curve, age, AgeType::Total, site_index, y2bh)
    })?;
    age_to_age(curve, age.max(0.0), AgeType::Total, age_type, y2bh)
}

/// The stepping search behind [`iterate_age`], over any forward height
/// function of total age.
fn search_total_age<F>(curve: SiteCurve, height: f64, mut forward: F) -> Result<f64, ProjectionError>
where
    F: FnMut(f64) -> Result<f64, ProjectionError>,
{
    let mut age = START_AGE;
    let mut step = age / 2.0;
    let mut failures = 0;

    loop {
        let test_height = match forward(age) {
            Ok(h) => h,
            Err(ProjectionError::NoConvergence { .. }) => {
                failures += 1;
                if failures == MAX_FORWARD_FAILURES {
                    return Err(ProjectionError::no_convergence(
                        curve,
                        format!("height solver failed {MAX_FORWARD_FAILURES} times"),
                    ));
                }
                FAILED_HEIGHT
            }
            Err(e) => return Err(e),
        };

        if (test_height - height).abs() <= AGE_TOLERANCE_HEIGHT {
            return Ok(age);
        }
        if test_height > height {
            if step > 0.0 {
                step = -step / 2.0;
            }
        } else if step < 0.0 {
            step = -step / 2.0;
        }
        age += step;

        if step.abs() < MIN_STEP {
            return Ok(age);
        }
        if age > MAX_AGE {
            return Err(ProjectionError::no_convergence(
                curve,
                format!("projected age exceeds {MAX_AGE}"),
            ));
        }
    }
}

/// Find the integer breast-height age whose implied site index is closest
/// to `site_index`.
pub fn scan_growth_intercept_age(
    curve: SiteCurve,
    height: f64,
    age_type: AgeType,
    site_index: f64,
) -> Result<f64, ProjectionError> {
    if age_type == AgeType::Total {
        return Err(ProjectionError::GrowthInterceptRequiresBreastAge { curve });
    }

    let mut best_age = GI_SCAN_AGES.start;
    let mut min_diff = f64::MAX;
    let mut last_scanned = None;

    for age in GI_SCAN_AGES {
        let test_site =
            match site_index_from_height(curve, f64::from(age), AgeType::BreastHeight, height, 0.0) {
                Ok(si) => si,
                Err(ProjectionError::GrowthInterceptOutOfRange { .. }) => break,
                Err(e) => return Err(e),
            };
        last_scanned = Some(age);

        let diff = (test_site - site_index).abs();
        if diff < min_diff {
            min_diff = diff;
            best_age = age;
        }
    }

    let at_boundary = best_age == GI_SCAN_AGES.start || Some(best_age) == last_scanned;
    if last_scanned.is_none() || (at_boundary && min_diff > GI_TOLERANCE) {
        return Err(ProjectionError::no_convergence(
            curve,
            format!("closest age {best_age} is off by {min_diff:.3}, outside the 1m tolerance"),
        ));
    }
    Ok(f64::from(best_age))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    const CLOSED_FORM: [SiteCurve; 8] = [
        SiteCurve::FdcBruce,
        SiteCurve::HwcWiley,
        SiteCurve::PliGoudieDry,
        SiteCurve::PliGoudieWet,
        SiteCurve::SsGoudie,
        SiteCurve::SwGoudiePla,
        SiteCurve::SwGoudieNat,
        SiteCurve::SwHuGarcia,
    ];

    #[test]
    fn test_closed_form_round_trip() {
        for curve in CLOSED_FORM {
            for age in [15.0, 30.0, 60.0, 100.0] {
                for age_type in [AgeType::Total, AgeType::BreastHeight] {
                    let h = height_from_age(curve, age, age_type, 26.0, 6.0).unwrap();
                    let back = age_from_height(curve, h, age_type, 26.0, 6.0).unwrap();
                    assert!(
                        (back - age).abs() < 0.01,
                        "{curve} {age_type} age {age}: got {back}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_iterative_round_trip() {
        for curve in [SiteCurve::DrNigh, SiteCurve::BaNigh, SiteCurve::AtNigh] {
            let h = height_from_age(curve, 42.0, AgeType::Total, 21.0, 5.0).unwrap();
            let back = age_from_height(curve, h, AgeType::Total, 21.0, 5.0).unwrap();
            assert!((back - 42.0).abs() < 0.05, "{curve}: {back}");
            let bh = age_from_height(curve, h, AgeType::BreastHeight, 21.0, 5.0).unwrap();
            assert!((bh - 37.0).abs() < 0.05, "{curve}: {bh}");
        }
    }

    #[test]
    fn test_young_wiley_age_is_refined() {
        let h = height_from_age(SiteCurve::HwcWiley, 4.0, AgeType::BreastHeight, 30.0, 5.0).unwrap();
        let age = age_from_height(SiteCurve::HwcWiley, h, AgeType::BreastHeight, 30.0, 5.0).unwrap();
        assert_approx_eq!(age, 4.0, 0.02);
    }

    #[test]
    fn test_breast_height_age_below_breast_height_fails() {
        let err = age_from_height(SiteCurve::SsGoudie, 1.2, AgeType::BreastHeight, 20.0, 6.0)
            .unwrap_err();
        assert!(matches!(err, ProjectionError::BelowBreastHeight { .. }));
    }

    #[test]
    fn test_unemerged_stand_has_total_age_zero() {
        for curve in [SiteCurve::FdcBruce, SiteCurve::DrNigh, SiteCurve::SwNighGi] {
            let age = age_from_height(curve, 0.0, AgeType::Total, 20.0, 6.0).unwrap();
            assert_eq!(age, 0.0);
        }
    }

    #[test]
    fn test_site_index_below_breast_height_fails() {
        let err = age_from_height(SiteCurve::DrNigh, 10.0, AgeType::Total, 1.25, 6.0).unwrap_err();
        assert!(matches!(err, ProjectionError::BelowBreastHeight { quantity: "site index", .. }));
    }

    #[test]
    fn test_unreachable_height_does_not_converge() {
        let err = age_from_height(SiteCurve::DrNigh, 200.0, AgeType::Total, 15.0, 4.0).unwrap_err();
        assert!(matches!(err, ProjectionError::NoConvergence { .. }));
    }

    // Red alder at site index 998 passes the 999 m height limit from
    // total age 55.2, so every forward solve past that point fails.
    const TALL: f64 = 998.0;
    const TALL_Y2BH: f64 = 5.0;

    fn tall_alder(age: f64) -> Result<f64, ProjectionError> {
        height_from_age(SiteCurve::DrNigh, age, AgeType::Total, TALL, TALL_Y2BH)
    }

    #[test]
    fn test_iteration_continues_past_failed_height_solves() {
        assert!(tall_alder(62.5).is_err());
        let age = iterate_age(SiteCurve::DrNigh, 998.5, AgeType::Total, TALL, TALL_Y2BH).unwrap();
        assert_approx_eq!(age, 55.1025390625, 1e-9);
        assert!((tall_alder(age).unwrap() - 998.5).abs() <= 0.005);

        let bh = age_from_height(SiteCurve::DrNigh, 998.5, AgeType::BreastHeight, TALL, TALL_Y2BH)
            .unwrap();
        assert_approx_eq!(bh, 55.1025390625 - TALL_Y2BH, 1e-9);
    }

    #[test]
    fn test_failed_height_solve_counts_as_1000() {
        // The first step lands at 62.5, where the forward solve fails; its
        // recorded height of 1000 is within tolerance of the target.
        let age =
            iterate_age(SiteCurve::DrNigh, 1000.003, AgeType::Total, TALL, TALL_Y2BH).unwrap();
        assert_eq!(age, 62.5);
    }

    #[test]
    fn test_iteration_stops_when_step_is_exhausted() {
        // No height lies within tolerance of 999.5: real solves stop at 999
        // and failed ones count as 1000.
        let age = iterate_age(SiteCurve::DrNigh, 999.5, AgeType::Total, TALL, TALL_Y2BH).unwrap();
        assert_approx_eq!(age, 55.206, 1e-3);
        assert!((tall_alder(age).unwrap() - 999.5).abs() > 0.005);
    }

    #[test]
    fn test_iteration_gives_up_past_max_age() {
        let mut failures = 0;
        let err = search_total_age(SiteCurve::DrNigh, 1500.0, |age| {
            let h = tall_alder(age);
            if h.is_err() {
                failures += 1;
            }
            h
        })
        .unwrap_err();
        assert!(failures > 0 && failures < MAX_FORWARD_FAILURES);
        match err {
            ProjectionError::NoConvergence { reason, .. } => {
                assert_eq!(reason, "projected age exceeds 999")
            }
            other => panic!("unexpected error {other:?}"),
        }

        let err = age_from_height(SiteCurve::DrNigh, 1500.0, AgeType::Total, TALL, TALL_Y2BH)
            .unwrap_err();
        assert!(err.to_string().contains("exceeds 999"), "{err}");
    }

    #[test]
    fn test_iteration_gives_up_after_100_failed_height_solves() {
        // Every failure reads as 1000, above the target, so the search walks
        // down forever without halving and only the failure counter stops it.
        let mut calls = 0;
        let err = search_total_age(SiteCurve::DrNigh, 10.0, |_| {
            calls += 1;
            Err(ProjectionError::no_convergence(SiteCurve::DrNigh, "forced"))
        })
        .unwrap_err();
        assert_eq!(calls, MAX_FORWARD_FAILURES);
        match err {
            ProjectionError::NoConvergence { reason, .. } => {
                assert_eq!(reason, "height solver failed 100 times")
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_iteration_propagates_other_forward_errors() {
        let err = search_total_age(SiteCurve::DrNigh, 10.0, |_| {
            Err(ProjectionError::InvalidArgument("bad".into()))
        })
        .unwrap_err();
        assert!(matches!(err, ProjectionError::InvalidArgument(_)));
    }

    #[test]
    fn test_growth_intercept_finds_reference_age() {
        for curve in [SiteCurve::FdcNighGi, SiteCurve::PliNighGi97, SiteCurve::CwiNighGi] {
            let h = height_from_age(curve, 50.0, AgeType::BreastHeight, 23.0, 0.0).unwrap();
            let age = age_from_height(curve, h, AgeType::BreastHeight, 23.0, 0.0).unwrap();
            assert_eq!(age, 50.0, "{curve}");
        }
    }

    #[test]
    fn test_growth_intercept_interior_age() {
        let h = height_from_age(SiteCurve::HwiNighGi, 20.0, AgeType::BreastHeight, 18.0, 0.0).unwrap();
        let age = scan_growth_intercept_age(SiteCurve::HwiNighGi, h, AgeType::BreastHeight, 18.0)
            .unwrap();
        assert_eq!(age, 20.0);
    }

    #[test]
    fn test_growth_intercept_total_age_rejected() {
        let err = age_from_height(SiteCurve::BlThrowerGi, 10.0, AgeType::Total, 20.0, 6.0)
            .unwrap_err();
        assert!(matches!(err, ProjectionError::GrowthInterceptRequiresBreastAge { .. }));
    }

    #[test]
    fn test_growth_intercept_answer_past_scan_range() {
        // A tall tree on a poor site: the best match sits at the last scannable
        // age with a residual far above the tolerance.
        let err = age_from_height(SiteCurve::SsNighGi, 45.0, AgeType::BreastHeight, 8.0, 0.0)
            .unwrap_err();
        assert!(matches!(err, ProjectionError::NoConvergence { .. }));
    }
}
