mod genus;
mod utilization;
mod polygon;
mod bank;

pub use genus::{Genus, Region};
pub use utilization::{UtilizationClass, UtilizationVector};
pub use polygon::{LayerSpecies, Polygon, PolygonDescription};
pub use bank::{BankTotals, PolygonBank, SpeciesRankingDetails, SpeciesSlot};
