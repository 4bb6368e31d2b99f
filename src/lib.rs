pub mod config;
pub mod error;
pub mod forward;
pub mod io;
pub mod models;
pub mod site_index;
pub mod visualization;

pub use config::ProjectionConfig;
pub use error::ProjectionError;
pub use forward::{execute_forward_algorithm, ExecutionStep, ForwardContext, ForwardEngine};
pub use io::{PolygonReader, PolygonWriter};
pub use models::{Genus, LayerSpecies, Polygon, PolygonBank, Region};
pub use site_index::{AgeType, EquationRegistry, SiteCurve};
