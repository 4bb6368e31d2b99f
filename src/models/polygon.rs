use serde::{Deserialize, Serialize};

use super::{Genus, Region, UtilizationVector};
use crate::error::ProjectionError;
use crate::site_index::{SiteCurve, BREAST_HEIGHT};

/// Identifies a polygon and the year it was measured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonDescription {
    pub name: String,
    pub year: i32,
}

impl std::fmt::Display for PolygonDescription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.name, self.year)
    }
}

/// Raw measurements of one species in the primary layer of a polygon.
///
/// Absent values are `None`; a measured zero is `Some(0.0)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerSpecies {
    pub genus: Genus,
    /// Basal area (m²/ha) per utilization class
    pub basal_area: UtilizationVector,
    /// Live trees per hectare per utilization class
    #[serde(default)]
    pub trees_per_hectare: UtilizationVector,
    #[serde(default)]
    pub site_index: Option<f64>,
    #[serde(default)]
    pub site_curve: Option<SiteCurve>,
    #[serde(default)]
    pub age_total: Option<f64>,
    #[serde(default)]
    pub years_at_breast_height: Option<f64>,
    #[serde(default)]
    pub years_to_breast_height: Option<f64>,
}

impl LayerSpecies {
    /// A species record with only its genus and all-classes basal area set.
    pub fn new(genus: Genus, basal_area: f64) -> Self {
        Self {
            genus,
            basal_area: UtilizationVector::from_all(basal_area),
            trees_per_hectare: UtilizationVector::default(),
            site_index: None,
            site_curve: None,
            age_total: None,
            years_at_breast_height: None,
            years_to_breast_height: None,
        }
    }

    /// Validate measurements. Returns `ProjectionError::ValidationError` on failure.
    pub fn validate(&self, polygon: &str) -> Result<(), ProjectionError> {
        for (label, vector) in [
            ("basal area", &self.basal_area),
            ("trees per hectare", &self.trees_per_hectare),
        ] {
            if vector.values().iter().any(|v| *v < 0.0 || !v.is_finite()) {
                return Err(ProjectionError::ValidationError(format!(
                    "Polygon {polygon}, species {}: {label} must be non-negative",
                    self.genus
                )));
            }
        }
        if let Some(si) = self.site_index {
            if si < BREAST_HEIGHT {
                return Err(ProjectionError::ValidationError(format!(
                    "Polygon {polygon}, species {}: site index must be at least {BREAST_HEIGHT}, got {si}",
                    self.genus
                )));
            }
        }
        for (label, value) in [
            ("age total", self.age_total),
            ("years at breast height", self.years_at_breast_height),
            ("years to breast height", self.years_to_breast_height),
        ] {
            if let Some(v) = value {
                if v < 0.0 {
                    return Err(ProjectionError::ValidationError(format!(
                        "Polygon {polygon}, species {}: {label} must be non-negative, got {v}",
                        self.genus
                    )));
                }
            }
        }
        Ok(())
    }
}

/// One polygon's primary layer as supplied by the input parsers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Polygon {
    pub description: PolygonDescription,
    pub region: Region,
    /// Layer-wide basal area; derived from the species when absent.
    #[serde(default)]
    pub basal_area: Option<UtilizationVector>,
    /// Layer-wide trees per hectare; derived from the species when absent.
    #[serde(default)]
    pub trees_per_hectare: Option<UtilizationVector>,
    pub species: Vec<LayerSpecies>,
}

impl Polygon {
    pub fn new(name: impl Into<String>, year: i32, region: Region) -> Self {
        Self {
            description: PolygonDescription {
                name: name.into(),
                year,
            },
            region,
            basal_area: None,
            trees_per_hectare: None,
            species: Vec::new(),
        }
    }

    /// Validate that the polygon is in good order for processing.
    pub fn validate(&self) -> Result<(), ProjectionError> {
        if self.description.year < 1900 {
            return Err(ProjectionError::ValidationError(format!(
                "Polygon {}'s year value {} is < 1900",
                self.description.name, self.description.year
            )));
        }
        let mut seen = Vec::with_capacity(self.species.len());
        for sp in &self.species {
            if seen.contains(&sp.genus) {
                return Err(ProjectionError::ValidationError(format!(
                    "Polygon {}: genus {} appears more than once",
                    self.description.name, sp.genus
                )));
            }
            seen.push(sp.genus);
            sp.validate(&self.description.name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_polygon() -> Polygon {
        let mut polygon = Polygon::new("01002 S000001 00", 1970, Region::Coastal);
        polygon.species.push(LayerSpecies::new(Genus::C, 5.04597));
        polygon.species.push(LayerSpecies::new(Genus::H, 5.81006));
        polygon
    }

    #[test]
    fn test_valid_polygon() {
        assert!(sample_polygon().validate().is_ok());
    }

    #[test]
    fn test_year_before_1900_rejected() {
        let mut polygon = sample_polygon();
        polygon.description.year = 1899;
        let err = polygon.validate().unwrap_err();
        assert!(err.to_string().contains("< 1900"));
    }

    #[test]
    fn test_duplicate_genus_rejected() {
        let mut polygon = sample_polygon();
        polygon.species.push(LayerSpecies::new(Genus::C, 1.0));
        assert!(matches!(
            polygon.validate(),
            Err(ProjectionError::ValidationError(_))
        ));
    }

    #[test]
    fn test_site_index_below_breast_height_rejected() {
        let mut polygon = sample_polygon();
        polygon.species[0].site_index = Some(1.2);
        let err = polygon.validate().unwrap_err();
        assert!(err.to_string().contains("site index"));
    }

    #[test]
    fn test_negative_basal_area_rejected() {
        let mut polygon = sample_polygon();
        polygon.species[1].basal_area = UtilizationVector::from_all(-0.5);
        assert!(polygon.validate().is_err());
    }

    #[test]
    fn test_measured_zero_is_distinct_from_missing() {
        let mut sp = LayerSpecies::new(Genus::D, 1.0);
        sp.years_to_breast_height = Some(0.0);
        assert_eq!(sp.years_to_breast_height, Some(0.0));
        assert!(sp.age_total.is_none());
        assert!(sp.validate("p").is_ok());
    }

    #[test]
    fn test_polygon_json_roundtrip() {
        let mut polygon = sample_polygon();
        polygon.species[0].site_curve = Some(SiteCurve::CwcNigh);
        polygon.species[0].site_index = Some(13.4);
        let json = serde_json::to_string(&polygon).unwrap();
        let back: Polygon = serde_json::from_str(&json).unwrap();
        assert_eq!(back.species.len(), 2);
        assert_eq!(back.species[0].site_curve, Some(SiteCurve::CwcNigh));
        assert_eq!(back.species[0].site_index, Some(13.4));
        assert_eq!(back.species[1].site_index, None);
    }
}
