//! CSV ingestion and output.
//!
//! The output keeps every input column in its original position and row
//! order, then appends whichever result columns the input lacked.

use crate::batch::OutputRow;
use crate::record::{parse_coordinate, LocationRecord};
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

pub const STATE_COLUMN: &str = "province_state";
pub const COUNTY_COLUMN: &str = "county";
pub const CITY_COLUMN: &str = "city";
pub const PRECISE_COLUMN: &str = "prec_location";
pub const COUNTRY_COLUMN: &str = "country";
pub const LATITUDE_COLUMN: &str = "latitude";
pub const LONGITUDE_COLUMN: &str = "longitude";

/// Result columns, in the order they are appended.
pub const OUTPUT_COLUMNS: [&str; 10] = [
    LATITUDE_COLUMN,
    LONGITUDE_COLUMN,
    "latitude_shifted",
    "longitude_shifted",
    "offset_applied",
    "geocoded_address",
    "google_formatted_address",
    "location_type",
    "flag_status",
    "flag_reason",
];

#[derive(Debug, Error)]
pub enum TableError {
    #[error("cannot open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{rows} input rows but {outputs} output rows")]
    LengthMismatch { rows: usize, outputs: usize },
}

/// An input table held in memory: header names plus raw cells.
#[derive(Debug, Clone)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    index: HashMap<String, usize>,
}

impl Table {
    pub fn read_path(path: &Path) -> Result<Self, TableError> {
        let file = File::open(path).map_err(|source| TableError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, TableError> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::Headers)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();
        let width = headers.len();

        let mut rows = Vec::new();
        for (line, result) in csv_reader.records().enumerate() {
            let record: StringRecord = result?;
            let mut cells: Vec<String> = record.iter().map(str::to_string).collect();
            if cells.len() > width {
                warn!(
                    row = line,
                    extra = cells.len() - width,
                    "dropping cells beyond the header width"
                );
            }
            cells.resize(width, String::new());
            rows.push(cells);
        }

        let index = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.to_lowercase(), i))
            .collect();

        Ok(Self { headers, rows, index })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// A cell by column name; absent columns read as "".
    fn cell<'a>(&'a self, row: &'a [String], column: &str) -> &'a str {
        self.index
            .get(column)
            .and_then(|&i| row.get(i))
            .map(|s| s.trim())
            .unwrap_or("")
    }

    /// Location records, one per row, in file order.
    pub fn records(&self) -> Vec<LocationRecord> {
        self.rows
            .iter()
            .map(|row| LocationRecord {
                province_state: self.cell(row, STATE_COLUMN).to_string(),
                county: self.cell(row, COUNTY_COLUMN).to_string(),
                city: self.cell(row, CITY_COLUMN).to_string(),
                precise_location: self.cell(row, PRECISE_COLUMN).to_string(),
                country: self.cell(row, COUNTRY_COLUMN).to_string(),
                latitude: parse_coordinate(self.cell(row, LATITUDE_COLUMN)),
                longitude: parse_coordinate(self.cell(row, LONGITUDE_COLUMN)),
            })
            .collect()
    }

    pub fn write_path(&self, path: &Path, outputs: &[OutputRow]) -> Result<(), TableError> {
        let file = File::create(path).map_err(|source| TableError::Io {
            path: path.display().to_string(),
            source,
        })?;
        self.write_to(file, outputs)
    }

    /// Write the input table augmented with result columns.
    pub fn write_to<W: io::Write>(
        &self,
        writer: W,
        outputs: &[OutputRow],
    ) -> Result<(), TableError> {
        if outputs.len() != self.rows.len() {
            return Err(TableError::LengthMismatch {
                rows: self.rows.len(),
                outputs: outputs.len(),
            });
        }

        let mut headers = self.headers.clone();
        let mut positions = Vec::with_capacity(OUTPUT_COLUMNS.len());
        for column in OUTPUT_COLUMNS {
            let position = match self.index.get(column) {
                Some(&i) => i,
                None => {
                    headers.push(column.to_string());
                    headers.len() - 1
                }
            };
            positions.push(position);
        }

        let mut csv_writer = WriterBuilder::new().from_writer(writer);
        csv_writer.write_record(&headers)?;

        for (row, output) in self.rows.iter().zip(outputs) {
            let mut cells = row.clone();
            cells.resize(headers.len(), String::new());
            for (position, value) in positions.iter().zip(output_cells(output)) {
                if let Some(value) = value {
                    cells[*position] = value;
                }
            }
            csv_writer.write_record(&cells)?;
        }

        csv_writer.flush().map_err(|source| TableError::Io {
            path: "output".into(),
            source,
        })?;
        Ok(())
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Cell values for `OUTPUT_COLUMNS`, in the same order. `None` keeps the
/// input cell: latitude/longitude are only written when the row has
/// coordinates, so a half-filled pair survives a failed lookup.
fn output_cells(output: &OutputRow) -> [Option<String>; 10] {
    let coordinates = output.coordinates();
    let geocode = output.geocode();
    let shifted = output.shifted.as_ref();

    [
        coordinates.map(|(lat, _)| lat.to_string()),
        coordinates.map(|(_, lon)| lon.to_string()),
        Some(fmt_opt(shifted.map(|s| s.latitude))),
        Some(fmt_opt(shifted.map(|s| s.longitude))),
        Some(shifted.map(|s| s.description.clone()).unwrap_or_default()),
        Some(if geocode.is_some() { output.query.clone() } else { String::new() }),
        Some(geocode.map(|g| g.formatted_address.clone()).unwrap_or_default()),
        Some(geocode.map(|g| g.location_type.to_string()).unwrap_or_default()),
        Some(output.flag.status.to_string()),
        Some(output.flag.reason()),
    ]
}
