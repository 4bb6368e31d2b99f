use std::io::{Read, Write};
use std::path::Path;

use crate::error::ProjectionError;
use crate::models::{
    Genus, LayerSpecies, Polygon, PolygonBank, Region, UtilizationVector,
};
use crate::site_index::SiteCurve;

/// One species of one polygon in a layer file.
#[derive(Debug, serde::Deserialize, serde::Serialize)]
struct SpeciesRow {
    polygon: String,
    year: i32,
    region: Region,
    genus: Genus,
    basal_area: f64,
    trees_per_hectare: Option<f64>,
    site_index: Option<f64>,
    site_curve: Option<SiteCurve>,
    age_total: Option<f64>,
    years_at_breast_height: Option<f64>,
    years_to_breast_height: Option<f64>,
}

/// One species slot of a processed bank.
#[derive(Debug, serde::Serialize)]
struct BankRow<'a> {
    polygon: &'a str,
    year: i32,
    slot: usize,
    genus: Genus,
    basal_area: f64,
    percent_forested: Option<f64>,
    site_curve: Option<SiteCurve>,
    site_index: Option<f64>,
    years_to_breast_height: Option<f64>,
    rank: &'static str,
    inventory_type_group: Option<u32>,
}

fn parse_csv_records<R: Read>(rdr: &mut csv::Reader<R>) -> Result<Vec<Polygon>, ProjectionError> {
    let mut polygons: Vec<Polygon> = Vec::new();

    for result in rdr.deserialize() {
        let row: SpeciesRow = result?;

        let species = LayerSpecies {
            genus: row.genus,
            basal_area: UtilizationVector::from_all(row.basal_area),
            trees_per_hectare: UtilizationVector::from_all(row.trees_per_hectare.unwrap_or(0.0)),
            site_index: row.site_index,
            site_curve: row.site_curve,
            age_total: row.age_total,
            years_at_breast_height: row.years_at_breast_height,
            years_to_breast_height: row.years_to_breast_height,
        };
        species.validate(&row.polygon)?;

        // Rows of one polygon are expected together; a polygon seen again
        // later is still merged into its first occurrence.
        let position = polygons
            .iter()
            .position(|p| p.description.name == row.polygon && p.description.year == row.year);
        let polygon = match position {
            Some(i) => &mut polygons[i],
            None => {
                polygons.push(Polygon::new(row.polygon, row.year, row.region));
                let last = polygons.len() - 1;
                &mut polygons[last]
            }
        };
        if polygon.region != row.region {
            return Err(ProjectionError::ParseError(format!(
                "Polygon {} is listed in both the {} and {} regions",
                polygon.description, polygon.region, row.region
            )));
        }
        polygon.species.push(species);
    }

    Ok(polygons)
}

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(true).flexible(true).trim(csv::Trim::All);
    builder
}

/// Read polygons from a one-row-per-species CSV file.
pub fn read_csv(path: impl AsRef<Path>) -> Result<Vec<Polygon>, ProjectionError> {
    let mut rdr = reader_builder().from_path(path.as_ref())?;
    parse_csv_records(&mut rdr)
}

/// Read polygons from CSV bytes.
pub fn read_csv_from_bytes(data: &[u8]) -> Result<Vec<Polygon>, ProjectionError> {
    let mut rdr = reader_builder().from_reader(data);
    parse_csv_records(&mut rdr)
}

/// Write polygons as one row per species.
pub fn write_csv(polygons: &[Polygon], path: impl AsRef<Path>) -> Result<(), ProjectionError> {
    let mut wtr = csv::Writer::from_path(path.as_ref())?;

    for polygon in polygons {
        for sp in &polygon.species {
            let row = SpeciesRow {
                polygon: polygon.description.name.clone(),
                year: polygon.description.year,
                region: polygon.region,
                genus: sp.genus,
                basal_area: sp.basal_area.all(),
                trees_per_hectare: Some(sp.trees_per_hectare.all()),
                site_index: sp.site_index,
                site_curve: sp.site_curve,
                age_total: sp.age_total,
                years_at_breast_height: sp.years_at_breast_height,
                years_to_breast_height: sp.years_to_breast_height,
            };
            wtr.serialize(&row)?;
        }
    }

    wtr.flush()?;
    Ok(())
}

/// Write processed banks, one row per species slot, to any writer.
pub fn write_banks_csv<W: Write>(banks: &[PolygonBank], writer: W) -> Result<(), ProjectionError> {
    let mut wtr = csv::Writer::from_writer(writer);

    for bank in banks {
        let ranking = bank.ranking();
        for i in bank.indices() {
            let slot = bank.species(i);
            let rank = match ranking {
                Some(r) if r.primary_index == i => "primary",
                Some(r) if r.secondary_index == Some(i) => "secondary",
                _ => "",
            };
            wtr.serialize(BankRow {
                polygon: &bank.description.name,
                year: bank.description.year,
                slot: i,
                genus: slot.genus,
                basal_area: slot.basal_area.all(),
                percent_forested: slot.percent_forested,
                site_curve: slot.site_curve,
                site_index: slot.site_index,
                years_to_breast_height: slot.years_to_breast_height,
                rank,
                inventory_type_group: ranking.map(|r| r.inventory_type_group),
            })?;
        }
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAYER: &str = "\
polygon,year,region,genus,basal_area,trees_per_hectare,site_index,site_curve,age_total,years_at_breast_height,years_to_breast_height
01002 S000001 00,1970,coastal,B,0.40292,5.0,,,,,
01002 S000001 00,1970,coastal,C,5.04597,,13.4,cwc_kurucz,,,
01002 S000001 00,1970,coastal,D,29.30249,,,,55,54,
01002 S000002 00,1973,interior,PL,12.5,,17.0,48,,,
";

    #[test]
    fn test_read_groups_rows_by_polygon() {
        let polygons = read_csv_from_bytes(LAYER.as_bytes()).unwrap();
        assert_eq!(polygons.len(), 2);

        let first = &polygons[0];
        assert_eq!(first.description.name, "01002 S000001 00");
        assert_eq!(first.region, Region::Coastal);
        assert_eq!(first.species.len(), 3);
        assert_eq!(first.species[1].site_curve, Some(SiteCurve::CwcKurucz));
        assert_eq!(first.species[1].site_index, Some(13.4));
        assert_eq!(first.species[2].age_total, Some(55.0));
        assert_eq!(first.species[0].trees_per_hectare.all(), 5.0);
        assert!(first.basal_area.is_none());

        let second = &polygons[1];
        assert_eq!(second.description.year, 1973);
        assert_eq!(second.species[0].site_curve, Some(SiteCurve::PliGoudieDry));
    }

    #[test]
    fn test_unknown_genus_is_rejected() {
        let data = "polygon,year,region,genus,basal_area\np,1990,coastal,QQ,1.0\n";
        assert!(read_csv_from_bytes(data.as_bytes()).is_err());
    }

    #[test]
    fn test_region_conflict_is_rejected() {
        let data = "polygon,year,region,genus,basal_area\np,1990,coastal,B,1.0\np,1990,interior,C,1.0\n";
        let err = read_csv_from_bytes(data.as_bytes()).unwrap_err();
        assert!(matches!(err, ProjectionError::ParseError(_)));
    }

    #[test]
    fn test_write_then_read() {
        let polygons = read_csv_from_bytes(LAYER.as_bytes()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layer.csv");

        write_csv(&polygons, &path).unwrap();
        let loaded = read_csv(&path).unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].species.len(), 3);
        assert_eq!(loaded[0].species[2].years_at_breast_height, Some(54.0));
    }

    #[test]
    fn test_write_banks() {
        let polygons = read_csv_from_bytes(LAYER.as_bytes()).unwrap();
        let banks: Vec<PolygonBank> = polygons.iter().map(PolygonBank::from_polygon).collect();
        let mut out = Vec::new();

        write_banks_csv(&banks, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("polygon,year,slot,genus"));
        assert_eq!(text.lines().count(), 5);
    }
}
