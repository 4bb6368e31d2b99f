//! Site-curve equation systems: conversions between age, height and site
//! index, and between site indices on different curves.

mod age;
mod convert;
mod curve;
mod defaults;
mod height;
mod index;
mod math;
mod y2bh;

pub use age::{age_from_height, iterate_age, scan_growth_intercept_age};
pub use convert::{can_convert, convert, convert_by_index, height_relation};
pub use curve::{
    AgeType, CurveForm, CurveSpecies, EquationRegistry, EquationSpec, HuGarciaCoefficients,
    SiteCurve, SolveStrategy, YearsToBreastHeightModel,
};
pub use defaults::default_curve;
pub use height::height_from_age;
pub use index::{site_index_from_height, site_index_with_estimated_y2bh};
pub use math::{llog, ppow, BREAST_HEIGHT, MAX_AGE, REFERENCE_AGE};
pub use y2bh::{age_to_age, years_to_breast_height, MIN_YEARS_TO_BREAST_HEIGHT};
