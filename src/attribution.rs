//! Crowd-sourced ownership of sample points
//!
//! Volunteers "adopt" sample points by editing a previous output file. The
//! store is built once from that snapshot before any worker starts and is
//! read-only afterwards, so workers share it through an `Arc` without locking.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// Column holding the municipality in a snapshot row
const MUNICIPALITY_COLUMN: usize = 2;
/// Column holding the zone name in a snapshot row
const NAME_COLUMN: usize = 3;
/// Column holding the point identifier in a snapshot row
const POINT_COLUMN: usize = 4;
/// Column holding the owner in a snapshot row
const OWNER_COLUMN: usize = 5;
/// Column that must be filled for the owner to count
const SIGNATURE_COLUMN: usize = 6;

/// Normalized lookup key for a (municipality, zone, point) triple
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AttributionKey(String);

impl AttributionKey {
    /// Build a key from the raw columns
    ///
    /// Only the part of the municipality before the first `/` is used, so
    /// bilingual names like "Alicante/Alacant" match either spelling in the
    /// snapshot. Non-ASCII characters and apostrophes are dropped and the
    /// rest is uppercased.
    pub fn new(municipality: &str, zone_name: &str, point_id: &str) -> Self {
        let base = municipality.split('/').next().unwrap_or(municipality);
        let key = [base, zone_name, point_id]
            .concat()
            .chars()
            .filter(|c| c.is_ascii() && *c != '\'')
            .map(|c| c.to_ascii_uppercase())
            .collect();
        Self(key)
    }

    /// Key text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Immutable owner lookup built from a prior output snapshot
#[derive(Clone, Debug)]
pub struct AttributionStore {
    owners: HashMap<AttributionKey, String>,
    default_owner: String,
}

impl AttributionStore {
    /// Store with no attributions; every lookup yields `default_owner`
    pub fn empty(default_owner: impl Into<String>) -> Self {
        Self {
            owners: HashMap::new(),
            default_owner: default_owner.into(),
        }
    }

    /// Build the store from CSV snapshot text
    ///
    /// The first row is a header. A row counts only when both the owner and
    /// the signature columns are present and non-empty; short rows are skipped.
    pub fn from_reader<R: Read>(reader: R, default_owner: impl Into<String>) -> Result<Self> {
        let mut store = Self::empty(default_owner);
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        for record in csv_reader.records() {
            let record = record?;
            let (Some(owner), Some(signature)) =
                (record.get(OWNER_COLUMN), record.get(SIGNATURE_COLUMN))
            else {
                continue;
            };
            if owner.is_empty() || signature.is_empty() {
                continue;
            }
            let key = AttributionKey::new(
                record.get(MUNICIPALITY_COLUMN).unwrap_or_default(),
                record.get(NAME_COLUMN).unwrap_or_default(),
                record.get(POINT_COLUMN).unwrap_or_default(),
            );
            store.owners.insert(key, owner.to_string());
        }

        tracing::debug!(attributions = store.len(), "Loaded attribution snapshot");
        Ok(store)
    }

    /// Build the store from a snapshot file
    pub fn from_path(path: &Path, default_owner: impl Into<String>) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|source| Error::File {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(std::io::BufReader::new(file), default_owner)
    }

    /// Owner recorded for `key`, or the default owner
    pub fn owner(&self, key: &AttributionKey) -> &str {
        self.owners
            .get(key)
            .map(String::as_str)
            .unwrap_or(&self.default_owner)
    }

    /// Owner used when a key is unknown
    pub fn default_owner(&self) -> &str {
        &self.default_owner
    }

    /// Number of recorded attributions
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Whether the snapshot carried no attributions
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}
