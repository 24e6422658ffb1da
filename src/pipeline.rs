//! Per-zone worker pipeline: fetch, extract, attribute, accumulate
//!
//! A worker walks its slice of zone codes in ascending order. For each code it
//! fetches the location page and the samples page, extracts the fields, looks
//! up the owner of every sample point and produces either rows or one log
//! line. Zone-level failures are turned into log lines here and never leave
//! this module; transport exhaustion is returned as an error and stops the run.

use crate::attribution::{AttributionKey, AttributionStore};
use crate::error::{Error, Result, ZoneError};
use crate::extractor::{Extractor, PointColumns, split_sections};
use crate::fetcher::{PageSource, ZonePage, zone_url};
use crate::partition::Slice;
use crate::types::{LocationRecord, LogLine, OutputRow, SamplePoint, SliceResult, ZoneCode, ZoneResult};
use crate::utils::{collapse_spaces, decode_html_entities};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_util::sync::CancellationToken;

/// State shared by every worker of a run
///
/// Built once before workers start. Only `processed` is written during the
/// run; everything else is read-only.
pub struct RunContext {
    /// Where pages come from
    pub source: Arc<dyn PageSource>,
    /// Compiled extraction rules
    pub extractor: Extractor,
    /// Owner lookup built from the prior snapshot
    pub attribution: AttributionStore,
    /// Portal endpoint
    pub base_url: url::Url,
    /// Zone codes processed so far, skipped ones included
    pub processed: Arc<AtomicUsize>,
    /// Cancelled as soon as any worker hits a fatal error
    pub cancel: CancellationToken,
}

impl RunContext {
    /// Create a context with a fresh counter and cancellation token
    pub fn new(
        source: Arc<dyn PageSource>,
        attribution: AttributionStore,
        base_url: url::Url,
    ) -> Result<Self> {
        Ok(Self {
            source,
            extractor: Extractor::new()?,
            attribution,
            base_url,
            processed: Arc::new(AtomicUsize::new(0)),
            cancel: CancellationToken::new(),
        })
    }
}

/// Process every code of `slice` in ascending order
///
/// Stops before the next code once the run is cancelled, and cancels the run
/// itself when a fetch fails for good.
pub async fn process_slice(ctx: Arc<RunContext>, slice: Slice) -> Result<SliceResult> {
    let mut result = SliceResult::default();

    for code in slice.codes() {
        if ctx.cancel.is_cancelled() {
            tracing::debug!(slice = slice.index, code, "Stopping worker, run cancelled");
            return Err(Error::Cancelled);
        }

        let zone = match process_zone(&ctx, ZoneCode(code)).await {
            Ok(zone) => zone,
            Err(e) => {
                tracing::error!(slice = slice.index, code, error = %e, "Fatal error, cancelling run");
                ctx.cancel.cancel();
                return Err(e);
            }
        };

        result.push(zone);
        ctx.processed.fetch_add(1, Ordering::Relaxed);
    }

    tracing::debug!(
        slice = slice.index,
        zones = result.zones,
        latest = result.latest.len(),
        skipped = result.log.len(),
        "Worker finished"
    );
    Ok(result)
}

/// Process a single zone code
///
/// Returns `Ok(ZoneResult::Skipped)` for zone-level failures and `Err` only for
/// fatal fetch errors.
pub async fn process_zone(ctx: &RunContext, code: ZoneCode) -> Result<ZoneResult> {
    let location_page = ctx
        .source
        .fetch(&zone_url(&ctx.base_url, code, ZonePage::Location))
        .await?;

    let location = match ctx.extractor.extract_location(&location_page) {
        Ok(raw) => normalize_location(raw),
        Err(e) => return Ok(skip(code, e)),
    };
    let points = ctx.extractor.extract_points(&location_page);

    let samples_page = ctx
        .source
        .fetch(&zone_url(&ctx.base_url, code, ZonePage::Samples))
        .await?;

    match build_rows(ctx, &location, &points, &samples_page) {
        Ok((latest, history)) => {
            tracing::debug!(%code, points = latest.len(), measurements = history.len(), "Zone processed");
            Ok(ZoneResult::Rows { latest, history })
        }
        Err(e) => Ok(skip(code, e)),
    }
}

fn skip(code: ZoneCode, error: ZoneError) -> ZoneResult {
    tracing::debug!(%code, reason = %error, "Zone skipped");
    ZoneResult::Skipped(LogLine { code, error })
}

/// Decode entities and tidy whitespace in the fields that feed the attribution key
pub fn normalize_location(raw: LocationRecord) -> LocationRecord {
    LocationRecord {
        municipality: decode_html_entities(raw.municipality.trim()),
        zone_name: decode_html_entities(&collapse_spaces(raw.zone_name.trim())),
        ..raw
    }
}

/// Rows of every sampling section, or the first zone-level failure
///
/// Partial rows are discarded on failure so a zone never contributes both.
fn build_rows(
    ctx: &RunContext,
    location: &LocationRecord,
    points: &PointColumns,
    samples_page: &str,
) -> std::result::Result<(Vec<OutputRow>, Vec<OutputRow>), ZoneError> {
    let mut latest = Vec::new();
    let mut history = Vec::new();

    for (index, section) in split_sections(samples_page).into_iter().enumerate() {
        let point = sample_point(points, index).ok_or(ZoneError::MissingCoordinates { index })?;

        let key = AttributionKey::new(&location.municipality, &location.zone_name, &point.point_id);
        let owner = ctx.attribution.owner(&key).to_string();

        let measurements = ctx.extractor.scan_measurements(section);
        if measurements.is_empty() {
            return Err(ZoneError::NoSamples {
                point_id: point.point_id,
            });
        }

        for (i, measurement) in measurements.into_iter().enumerate() {
            let row = OutputRow {
                location: location.clone(),
                point: point.clone(),
                owner: owner.clone(),
                measurement,
            };
            if i == 0 {
                latest.push(row.clone());
            }
            history.push(row);
        }
    }

    Ok((latest, history))
}

fn sample_point(points: &PointColumns, index: usize) -> Option<SamplePoint> {
    Some(SamplePoint {
        point_id: points.point_ids.get(index)?.clone(),
        utm_x: points.utm_x.get(index)?.clone(),
        utm_y: points.utm_y.get(index)?.clone(),
        huso: points.huso.get(index)?.clone(),
    })
}
