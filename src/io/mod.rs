mod csv_io;
mod json_io;

use std::path::Path;

use crate::error::ProjectionError;
use crate::models::Polygon;

pub use csv_io::{read_csv, read_csv_from_bytes, write_banks_csv, write_csv};
pub use json_io::{banks_to_json, read_json, read_json_from_bytes, write_json};

/// Trait for reading polygon layer data from a file.
pub trait PolygonReader {
    fn read(&self, path: &Path) -> Result<Vec<Polygon>, ProjectionError>;
}

/// Trait for writing polygon layer data to a file.
pub trait PolygonWriter {
    fn write(&self, polygons: &[Polygon], path: &Path) -> Result<(), ProjectionError>;
}

/// CSV format reader/writer.
pub struct CsvFormat;

impl PolygonReader for CsvFormat {
    fn read(&self, path: &Path) -> Result<Vec<Polygon>, ProjectionError> {
        read_csv(path)
    }
}

impl PolygonWriter for CsvFormat {
    fn write(&self, polygons: &[Polygon], path: &Path) -> Result<(), ProjectionError> {
        write_csv(polygons, path)
    }
}

/// JSON format reader/writer.
#[derive(Default)]
pub struct JsonFormat {
    pub pretty: bool,
}

impl PolygonReader for JsonFormat {
    fn read(&self, path: &Path) -> Result<Vec<Polygon>, ProjectionError> {
        read_json(path)
    }
}

impl PolygonWriter for JsonFormat {
    fn write(&self, polygons: &[Polygon], path: &Path) -> Result<(), ProjectionError> {
        write_json(polygons, path, self.pretty)
    }
}

/// Pick a reader from the file extension: `.csv` is CSV, anything else JSON.
pub fn reader_for(path: &Path) -> Box<dyn PolygonReader> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => Box::new(CsvFormat),
        _ => Box::new(JsonFormat::default()),
    }
}
