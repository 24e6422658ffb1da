//! Core data model for a harvest run

use crate::error::ZoneError;
use std::fmt;

/// Column header shared by the latest and history tables
pub const CSV_HEADER: [&str; 13] = [
    "Comunidad",
    "Provincia",
    "Municipio",
    "Nombre",
    "punto_muestreo",
    "adoptada_por",
    "utm_x",
    "utm_y",
    "utm_huso",
    "fecha_toma",
    "escherichia_coli",
    "enterococo",
    "observaciones",
];

/// Identifier of one bathing-water monitoring zone
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ZoneCode(pub u32);

impl fmt::Display for ZoneCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a zone is, extracted once per zone from the location page
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocationRecord {
    /// Autonomous community
    pub region: String,
    /// Province
    pub province: String,
    /// Municipality, possibly bilingual ("Alicante/Alacant")
    pub municipality: String,
    /// Bathing zone name
    pub zone_name: String,
}

/// One monitoring location within a zone
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SamplePoint {
    /// Point identifier, e.g. "PM1"
    pub point_id: String,
    /// UTM easting
    pub utm_x: String,
    /// UTM northing
    pub utm_y: String,
    /// UTM zone number
    pub huso: String,
}

/// One sampling result for a sample point
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Measurement {
    /// Sampling date as published
    pub date: String,
    /// Escherichia coli count
    pub e_coli: String,
    /// Intestinal enterococci count
    pub enterococcus: String,
    /// Free-text observations
    pub observations: String,
}

/// One line of the latest or history table
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputRow {
    /// Zone the row belongs to
    pub location: LocationRecord,
    /// Sample point with its coordinates
    pub point: SamplePoint,
    /// Crowd-sourced owner or the default sentinel
    pub owner: String,
    /// Measurement carried by this row
    pub measurement: Measurement,
}

impl OutputRow {
    /// Fields in [`CSV_HEADER`] order
    pub fn fields(&self) -> [&str; 13] {
        [
            &self.location.region,
            &self.location.province,
            &self.location.municipality,
            &self.location.zone_name,
            &self.point.point_id,
            &self.owner,
            &self.point.utm_x,
            &self.point.utm_y,
            &self.point.huso,
            &self.measurement.date,
            &self.measurement.e_coli,
            &self.measurement.enterococcus,
            &self.measurement.observations,
        ]
    }
}

/// A zone that could not be processed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogLine {
    /// Zone code that failed
    pub code: ZoneCode,
    /// Why it failed
    pub error: ZoneError,
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.error)
    }
}

/// What a single zone code contributes to the output
///
/// Rows and a log line are mutually exclusive. A zone with a valid location
/// but no sampling sub-sections yields `Rows` with both lists empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ZoneResult {
    /// The zone was processed
    Rows {
        /// First measurement of every sample point
        latest: Vec<OutputRow>,
        /// Every measurement of every sample point
        history: Vec<OutputRow>,
    },
    /// The zone was skipped
    Skipped(LogLine),
}

/// Results for one contiguous code range, in ascending code order
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SliceResult {
    /// Latest rows in code order
    pub latest: Vec<OutputRow>,
    /// History rows in code order
    pub history: Vec<OutputRow>,
    /// Log lines in code order
    pub log: Vec<LogLine>,
    /// Number of zone codes processed
    pub zones: usize,
}

impl SliceResult {
    /// Append the result of the next zone code
    pub fn push(&mut self, result: ZoneResult) {
        match result {
            ZoneResult::Rows { latest, history } => {
                self.latest.extend(latest);
                self.history.extend(history);
            }
            ZoneResult::Skipped(line) => self.log.push(line),
        }
        self.zones += 1;
    }
}
