use crate::types::{LineSampleRecord, SarError, SarResult};

/// Conversion between original ("global") and kept ("local") line or sample indices.
///
/// Records must be ordered by increasing `first` and pairwise disjoint; see
/// [`CoordinateMapper::validate`]. Local index 0 is the first kept global index.
pub struct CoordinateMapper;

impl CoordinateMapper {
    /// Check that records are ordered and disjoint
    pub fn validate(records: &[LineSampleRecord]) -> SarResult<()> {
        for (i, pair) in records.windows(2).enumerate() {
            if pair[1].first <= pair[0].last {
                return Err(SarError::GeometryResolution(format!(
                    "Records {} {} and {} {} overlap or are out of order",
                    i,
                    pair[0],
                    i + 1,
                    pair[1]
                )));
            }
        }
        Ok(())
    }

    /// Total number of kept indices
    pub fn kept_length(records: &[LineSampleRecord]) -> usize {
        records.iter().map(LineSampleRecord::len).sum()
    }

    /// Map a global index to its kept index
    pub fn global_to_local(records: &[LineSampleRecord], global: usize) -> SarResult<usize> {
        let mut kept_before = 0;
        for record in records {
            if global < record.first {
                break;
            }
            if global <= record.last {
                return Ok(kept_before + global - record.first);
            }
            kept_before += record.len();
        }
        Err(SarError::OutOfRange(format!(
            "Global index {} is not kept by any record",
            global
        )))
    }

    /// Map a kept index back to its global index
    pub fn local_to_global(records: &[LineSampleRecord], local: usize) -> SarResult<usize> {
        let mut remaining = local;
        for record in records {
            if remaining < record.len() {
                return Ok(record.first + remaining);
            }
            remaining -= record.len();
        }
        Err(SarError::OutOfRange(format!(
            "Local index {} exceeds kept length {}",
            local,
            Self::kept_length(records)
        )))
    }
}
