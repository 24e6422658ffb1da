//! Static partitioning of a zone code range across workers

use crate::error::{Error, Result};
use std::ops::Range;

/// Contiguous range of zone codes owned by one worker
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Slice {
    /// Position of the slice; output is merged in this order
    pub index: usize,
    /// First code, inclusive
    pub start: u32,
    /// One past the last code
    pub end: u32,
}

impl Slice {
    /// Codes of this slice in ascending order
    pub fn codes(&self) -> Range<u32> {
        self.start..self.end
    }

    /// Number of codes in this slice
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start) as usize
    }

    /// Whether this slice owns no codes
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Split `[first, last]` into `workers` contiguous slices
///
/// Every slice gets `total / workers` codes except the last one, which also
/// absorbs the remainder. With more workers than codes the leading slices are
/// empty and the last slice takes the whole range.
pub fn partition(first: u32, last: u32, workers: usize) -> Result<Vec<Slice>> {
    if workers == 0 {
        return Err(Error::config("at least one worker is required", "workers"));
    }
    if first > last {
        return Err(Error::config(
            format!("empty code range [{}, {}]", first, last),
            "first_code",
        ));
    }

    // Slice ends are exclusive, so `last + 1` must still be a code
    if last == u32::MAX {
        return Err(Error::config(
            format!("zone code {} is out of range", last),
            "last_code",
        ));
    }

    let total = u64::from(last - first) + 1;
    let slice_size = total / workers as u64;
    let end_of_range = u64::from(last) + 1;

    let slices = (0..workers)
        .map(|t| {
            let start = u64::from(first) + slice_size * t as u64;
            let end = if t + 1 == workers {
                end_of_range
            } else {
                u64::from(first) + slice_size * (t as u64 + 1)
            };
            Slice {
                index: t,
                start: start as u32,
                end: end as u32,
            }
        })
        .collect();

    Ok(slices)
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn assert_exhaustive(first: u32, last: u32, workers: usize) {
        let slices = partition(first, last, workers).unwrap();
        assert_eq!(slices.len(), workers);

        let codes: Vec<u32> = slices.iter().flat_map(|s| s.codes()).collect();
        let expected: Vec<u32> = (first..=last).collect();
        assert_eq!(codes, expected, "range [{first}, {last}] with {workers} workers");

        let size = ((last - first + 1) as usize) / workers;
        for slice in &slices[..workers - 1] {
            assert_eq!(slice.len(), size);
        }
        for pair in slices.windows(2) {
            assert_eq!(pair[0].end, pair[1].start, "slices must be contiguous");
        }
    }

    #[test]
    fn test_full_portal_range() {
        let slices = partition(1, 1990, 4).unwrap();
        assert_eq!(
            slices.iter().map(|s| (s.start, s.end)).collect::<Vec<_>>(),
            vec![(1, 498), (498, 995), (995, 1492), (1492, 1991)]
        );
        assert_eq!(slices[3].len(), 499);
    }

    #[test]
    fn test_partition_properties() {
        for (first, last) in [(1, 1), (1, 3), (1, 10), (5, 17), (1, 1990), (100, 163)] {
            for workers in 1..=12 {
                assert_exhaustive(first, last, workers);
            }
        }
    }

    #[test]
    fn test_more_workers_than_codes() {
        let slices = partition(1, 3, 5).unwrap();
        assert!(slices[..4].iter().all(Slice::is_empty));
        assert_eq!(slices[4].codes().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_single_worker_takes_everything() {
        let slices = partition(1, 3, 1).unwrap();
        assert_eq!(slices, vec![Slice { index: 0, start: 1, end: 4 }]);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(partition(1, 10, 0).is_err());
        assert!(partition(10, 1, 2).is_err());
    }

    #[test]
    fn test_range_end_must_be_representable() {
        assert!(matches!(
            partition(u32::MAX - 3, u32::MAX, 2),
            Err(Error::Config { .. })
        ));

        let slices = partition(u32::MAX - 4, u32::MAX - 1, 2).unwrap();
        assert_eq!(slices.last().unwrap().end, u32::MAX);
        assert_eq!(slices.iter().map(Slice::len).sum::<usize>(), 4);
    }
}
