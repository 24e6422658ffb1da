//! Label-anchored field extraction from portal pages
//!
//! The portal renders every value in a cell with the same class, so values are
//! located by the label of the preceding cell instead of by markup structure.
//! The markup assumption lives in a small set of declarative rules:
//!
//! - a [`FieldRule`] finds every `label: <markup> prefix(value) <` occurrence,
//!   tolerating whatever markup sits between the label and the value cell;
//! - a [`BlockRule`] finds every run of `arity` consecutive value cells;
//! - [`SECTION_MARKER`] splits the samples page into one section per sample point.
//!
//! [`Extractor`] compiles the rules once per run and is shared by all workers.

use crate::error::{Error, Result, ZoneError};
use crate::types::{LocationRecord, Measurement};
use regex::Regex;

/// Header that opens the sampling section of each sample point
pub const SECTION_MARKER: &str = "Punto Muestreo:";

/// Locates the value cell that follows a label cell
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldRule {
    /// Label text, matched literally and followed by `:`
    pub label: &'static str,
    /// Pattern the value cell starts with; only what follows it is captured
    pub value_prefix: Option<&'static str>,
}

impl FieldRule {
    /// Rule without a value prefix
    pub const fn new(label: &'static str) -> Self {
        Self {
            label,
            value_prefix: None,
        }
    }

    /// Rule capturing only what follows `prefix` in the value cell
    pub const fn with_prefix(label: &'static str, prefix: &'static str) -> Self {
        Self {
            label,
            value_prefix: Some(prefix),
        }
    }

    /// Build the pattern for this rule
    pub fn compile(&self) -> Result<Regex> {
        let pattern = format!(
            r"{}:<.+\s+.+>{}(.+)<",
            regex::escape(self.label),
            self.value_prefix.unwrap_or("")
        );
        Ok(Regex::new(&pattern)?)
    }
}

/// Locates runs of consecutive value cells
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockRule {
    /// Markup that opens a value cell, matched literally
    pub anchor: &'static str,
    /// Number of consecutive cells in one block
    pub arity: usize,
}

impl BlockRule {
    /// Build the pattern for this rule
    pub fn compile(&self) -> Result<Regex> {
        let cell = format!(r"{}(.+)<.+\s+.+", regex::escape(self.anchor));
        Ok(Regex::new(&cell.repeat(self.arity))?)
    }
}

/// Autonomous community of the zone
pub const REGION: FieldRule = FieldRule::new("Comunidad Autónoma");
/// Province of the zone
pub const PROVINCE: FieldRule = FieldRule::new("Provincia");
/// Municipality of the zone
pub const MUNICIPALITY: FieldRule = FieldRule::new("Municipio");
/// Name of the zone
pub const ZONE_NAME: FieldRule = FieldRule::new("Zona Agua Baño");
/// Sample point denomination; only the number after "PM" is kept
pub const POINT_ID: FieldRule = FieldRule::with_prefix("Denominación", ".+PM");
/// UTM easting of each sample point
pub const UTM_X: FieldRule = FieldRule::new("X");
/// UTM northing of each sample point
pub const UTM_Y: FieldRule = FieldRule::new("Y");
/// UTM zone of each sample point
pub const UTM_HUSO: FieldRule = FieldRule::new("Huso");

/// Date, E. coli, enterococci and observations cells of one sampling
pub const MEASUREMENT_BLOCK: BlockRule = BlockRule {
    anchor: r#"valorCampoI">"#,
    arity: 4,
};

/// A compiled [`FieldRule`]
#[derive(Clone, Debug)]
pub struct FieldScanner {
    rule: FieldRule,
    regex: Regex,
}

impl FieldScanner {
    /// Compile a rule
    pub fn new(rule: FieldRule) -> Result<Self> {
        Ok(Self {
            rule,
            regex: rule.compile()?,
        })
    }

    /// Every captured value in document order; empty if the label is absent
    pub fn scan(&self, text: &str) -> Vec<String> {
        self.regex
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// First captured value, if any
    pub fn first(&self, text: &str) -> Option<String> {
        self.regex
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// The rule this scanner was built from
    pub fn rule(&self) -> FieldRule {
        self.rule
    }
}

/// A compiled [`BlockRule`]
#[derive(Clone, Debug)]
pub struct BlockScanner {
    arity: usize,
    regex: Regex,
}

impl BlockScanner {
    /// Compile a rule
    pub fn new(rule: BlockRule) -> Result<Self> {
        if rule.arity == 0 {
            return Err(Error::config("block arity must be at least 1", "arity"));
        }
        Ok(Self {
            arity: rule.arity,
            regex: rule.compile()?,
        })
    }

    /// Every block in document order, each with exactly `arity` values
    pub fn scan(&self, text: &str) -> Vec<Vec<String>> {
        self.regex
            .captures_iter(text)
            .map(|caps| {
                (1..=self.arity)
                    .map(|i| caps.get(i).map_or("", |m| m.as_str()).to_string())
                    .collect()
            })
            .collect()
    }
}

/// Per-point columns of the location page, aligned by position
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PointColumns {
    /// Sample point identifiers
    pub point_ids: Vec<String>,
    /// UTM eastings
    pub utm_x: Vec<String>,
    /// UTM northings
    pub utm_y: Vec<String>,
    /// UTM zones
    pub huso: Vec<String>,
}

/// Compiled rule set for both portal pages
#[derive(Clone, Debug)]
pub struct Extractor {
    region: FieldScanner,
    province: FieldScanner,
    municipality: FieldScanner,
    zone_name: FieldScanner,
    point_id: FieldScanner,
    utm_x: FieldScanner,
    utm_y: FieldScanner,
    huso: FieldScanner,
    measurements: BlockScanner,
}

impl Extractor {
    /// Compile the portal rule set
    pub fn new() -> Result<Self> {
        Ok(Self {
            region: FieldScanner::new(REGION)?,
            province: FieldScanner::new(PROVINCE)?,
            municipality: FieldScanner::new(MUNICIPALITY)?,
            zone_name: FieldScanner::new(ZONE_NAME)?,
            point_id: FieldScanner::new(POINT_ID)?,
            utm_x: FieldScanner::new(UTM_X)?,
            utm_y: FieldScanner::new(UTM_Y)?,
            huso: FieldScanner::new(UTM_HUSO)?,
            measurements: BlockScanner::new(MEASUREMENT_BLOCK)?,
        })
    }

    /// Raw location fields of a zone
    ///
    /// Any missing label means there is no zone at this code.
    pub fn extract_location(&self, page: &str) -> std::result::Result<LocationRecord, ZoneError> {
        let field = |scanner: &FieldScanner| scanner.first(page).ok_or(ZoneError::NotFound);
        Ok(LocationRecord {
            region: field(&self.region)?,
            province: field(&self.province)?,
            municipality: field(&self.municipality)?,
            zone_name: field(&self.zone_name)?,
        })
    }

    /// Point identifiers and raw coordinates, one entry per sample point
    pub fn extract_points(&self, page: &str) -> PointColumns {
        PointColumns {
            point_ids: self.point_id.scan(page),
            utm_x: self.utm_x.scan(page),
            utm_y: self.utm_y.scan(page),
            huso: self.huso.scan(page),
        }
    }

    /// Every measurement of one sampling section, newest first as published
    pub fn scan_measurements(&self, section: &str) -> Vec<Measurement> {
        self.measurements
            .scan(section)
            .into_iter()
            .map(|mut cells| {
                let observations = cells.pop().unwrap_or_default();
                let enterococcus = cells.pop().unwrap_or_default();
                let e_coli = cells.pop().unwrap_or_default();
                let date = cells.pop().unwrap_or_default();
                Measurement {
                    date,
                    e_coli,
                    enterococcus,
                    observations,
                }
            })
            .collect()
    }
}

/// Split a samples page into one section per sample point, preamble discarded
pub fn split_sections(page: &str) -> Vec<&str> {
    page.split(SECTION_MARKER).skip(1).collect()
}
