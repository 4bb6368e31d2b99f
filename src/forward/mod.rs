//! Forward processing: the ordered repair stages that take a polygon's raw
//! layer measurements to a ranked bank with every site value filled in.

mod engine;
mod ranking;
mod site_curve_map;
mod stages;
mod step;

pub use engine::{execute_forward_algorithm, ForwardContext, ForwardEngine};
pub use ranking::{
    combine_percentages, determine_polygon_rankings, find_inventory_type_group,
    pure_inventory_type_group, PURE_STAND_PERCENTAGE,
};
pub use site_curve_map::SiteCurveMap;
pub use stages::{
    calculate_coverages, calculate_missing_site_curves, estimate_missing_site_indices,
    estimate_missing_years_to_breast_height, remove_small_species, MIN_BASAL_AREA,
};
pub use step::ExecutionStep;
