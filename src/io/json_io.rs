use std::path::Path;

use crate::error::ProjectionError;
use crate::models::{Polygon, PolygonBank};

/// Read a JSON array of polygons.
pub fn read_json(path: impl AsRef<Path>) -> Result<Vec<Polygon>, ProjectionError> {
    let content = std::fs::read_to_string(path.as_ref())?;
    parse_polygons(&content)
}

/// Read a JSON array of polygons from bytes.
pub fn read_json_from_bytes(data: &[u8]) -> Result<Vec<Polygon>, ProjectionError> {
    let content = std::str::from_utf8(data)
        .map_err(|e| ProjectionError::ParseError(format!("Invalid UTF-8: {e}")))?;
    parse_polygons(content)
}

fn parse_polygons(content: &str) -> Result<Vec<Polygon>, ProjectionError> {
    let polygons: Vec<Polygon> = serde_json::from_str(content)?;
    for polygon in &polygons {
        for sp in &polygon.species {
            sp.validate(&polygon.description.name)?;
        }
    }
    Ok(polygons)
}

/// Write polygons as a JSON array.
pub fn write_json(
    polygons: &[Polygon],
    path: impl AsRef<Path>,
    pretty: bool,
) -> Result<(), ProjectionError> {
    let content = if pretty {
        serde_json::to_string_pretty(polygons)?
    } else {
        serde_json::to_string(polygons)?
    };
    std::fs::write(path.as_ref(), content)?;
    Ok(())
}

/// Serialize processed banks as a JSON array.
pub fn banks_to_json(banks: &[PolygonBank], pretty: bool) -> Result<String, ProjectionError> {
    let content = if pretty {
        serde_json::to_string_pretty(banks)?
    } else {
        serde_json::to_string(banks)?
    };
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Genus, LayerSpecies, Region};
    use crate::site_index::SiteCurve;

    const POLYGONS: &str = r#"[
        {
            "description": { "name": "01002 S000001 00", "year": 1970 },
            "region": "coastal",
            "species": [
                { "genus": "C", "basal_area": [0.0, 5.04597, 0.0, 0.0, 0.0, 0.0],
                  "site_index": 13.4, "site_curve": "cwc_kurucz" },
                { "genus": "H", "basal_area": [0.0, 5.81006, 0.0, 0.0, 0.0, 0.0] }
            ]
        }
    ]"#;

    #[test]
    fn test_read_from_bytes() {
        let polygons = read_json_from_bytes(POLYGONS.as_bytes()).unwrap();
        assert_eq!(polygons.len(), 1);
        let species = &polygons[0].species;
        assert_eq!(species[0].genus, Genus::C);
        assert_eq!(species[0].site_curve, Some(SiteCurve::CwcKurucz));
        assert_eq!(species[1].site_index, None);
        assert_eq!(species[1].basal_area.all(), 5.81006);
    }

    #[test]
    fn test_invalid_species_is_rejected() {
        let bad = POLYGONS.replace("13.4", "0.5");
        let err = read_json_from_bytes(bad.as_bytes()).unwrap_err();
        assert!(matches!(err, ProjectionError::ValidationError(_)));
    }

    #[test]
    fn test_invalid_utf8() {
        let err = read_json_from_bytes(&[0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, ProjectionError::ParseError(_)));
    }

    #[test]
    fn test_write_and_read_file() {
        let mut polygon = Polygon::new("p1", 2001, Region::Interior);
        polygon.species.push(LayerSpecies::new(Genus::Pl, 22.0));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("polygons.json");

        write_json(&[polygon], &path, true).unwrap();
        let loaded = read_json(&path).unwrap();

        assert_eq!(loaded[0].description.name, "p1");
        assert_eq!(loaded[0].region, Region::Interior);
        assert_eq!(loaded[0].species[0].basal_area.all(), 22.0);
    }

    #[test]
    fn test_banks_to_json() {
        let polygons = read_json_from_bytes(POLYGONS.as_bytes()).unwrap();
        let bank = PolygonBank::from_polygon(&polygons[0]);
        let json = banks_to_json(&[bank], false).unwrap();
        assert!(json.contains("\"cwc_kurucz\""));
        assert!(json.contains("\"totals\""));
    }
}
