//! Merge of per-slice results into the final payloads

use crate::error::{Error, Result};
use crate::types::{CSV_HEADER, LogLine, OutputRow, SliceResult};

/// Everything a run produced, ordered by slice index then by zone code
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AggregateResult {
    /// Latest measurement per sample point
    pub latest: Vec<OutputRow>,
    /// Every measurement per sample point
    pub history: Vec<OutputRow>,
    /// Zones that could not be processed
    pub log: Vec<LogLine>,
    /// Number of zone codes processed
    pub zones: usize,
}

impl AggregateResult {
    /// Latest table as CSV, header included
    pub fn latest_csv(&self) -> Result<String> {
        render_csv(&self.latest)
    }

    /// History table as CSV, header included
    pub fn history_csv(&self) -> Result<String> {
        render_csv(&self.history)
    }

    /// Log payload, one `"<code>: <message>"` line per skipped zone
    pub fn log_text(&self) -> String {
        self.log.iter().map(|line| format!("{}\n", line)).collect()
    }
}

/// Concatenate slice results in ascending slice index, whatever order they arrive in
pub fn aggregate(mut slices: Vec<(usize, SliceResult)>) -> AggregateResult {
    slices.sort_by_key(|(index, _)| *index);

    slices
        .into_iter()
        .fold(AggregateResult::default(), |mut acc, (_, slice)| {
            acc.latest.extend(slice.latest);
            acc.history.extend(slice.history);
            acc.log.extend(slice.log);
            acc.zones += slice.zones;
            acc
        })
}

fn render_csv(rows: &[OutputRow]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADER)?;
    for row in rows {
        writer.write_record(row.fields())?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
