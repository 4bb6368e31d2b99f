//! Guarded numeric primitives shared by every curve formula.

/// Breast height in metres.
pub const BREAST_HEIGHT: f64 = 1.3;

/// Oldest age any solver may report.
pub const MAX_AGE: f64 = 999.0;

/// Breast-height age at which site index is defined.
pub const REFERENCE_AGE: f64 = 50.0;

/// `x` raised to `y`, or 0.0 when the base is not positive.
pub fn ppow(x: f64, y: f64) -> f64 {
    if x <= 0.0 {
        0.0
    } else {
        x.powf(y)
    }
}

/// Natural log of `x`, or `ln(1e-5)` when `x` is not positive.
pub fn llog(x: f64) -> f64 {
    if x <= 0.0 {
        0.00001f64.ln()
    } else {
        x.ln()
    }
}
