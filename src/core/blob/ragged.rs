//! Ragged (variable-length per sample) offsets.

use crate::core::errors::DeployError;
use std::ops::Range;

/// Cumulative segment boundaries of a ragged blob.
///
/// Segment `i` spans rows `offsets[i]..offsets[i + 1]` of the blob's first
/// dimension. A sample with no rows has an empty segment, so counts `[3, 0]`
/// become offsets `[0, 3, 3]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaggedOffsets {
    offsets: Vec<usize>,
}

impl RaggedOffsets {
    /// Wraps cumulative offsets after validating them.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::InvalidInput`] if the offsets are empty, do not
    /// start at zero, or decrease anywhere.
    pub fn new(offsets: Vec<usize>) -> Result<Self, DeployError> {
        match offsets.first() {
            None => {
                return Err(DeployError::invalid_input(
                    "ragged offsets must contain at least the leading 0",
                ));
            }
            Some(&first) if first != 0 => {
                return Err(DeployError::invalid_input(format!(
                    "ragged offsets must start at 0, got {first}"
                )));
            }
            Some(_) => {}
        }
        if let Some(pos) = offsets.windows(2).position(|w| w[1] < w[0]) {
            return Err(DeployError::invalid_input(format!(
                "ragged offsets must be non-decreasing, {} follows {} at position {}",
                offsets[pos + 1],
                offsets[pos],
                pos + 1
            )));
        }
        Ok(Self { offsets })
    }

    /// Builds offsets from per-sample counts.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::InvalidInput`] if the running total overflows.
    pub fn from_counts(counts: &[usize]) -> Result<Self, DeployError> {
        let mut offsets = Vec::with_capacity(counts.len() + 1);
        offsets.push(0usize);
        let mut total = 0usize;
        for (sample, &count) in counts.iter().enumerate() {
            total = total.checked_add(count).ok_or_else(|| {
                DeployError::invalid_input(format!(
                    "ragged counts overflow at sample {sample} (count {count})"
                ))
            })?;
            offsets.push(total);
        }
        Ok(Self { offsets })
    }

    /// Builds offsets from signed counts as reported by an engine.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::InvalidInput`] if any count is negative or the
    /// counts do not fit in a `usize` total.
    pub fn from_signed_counts(counts: &[i64]) -> Result<Self, DeployError> {
        let counts = counts
            .iter()
            .map(|&c| {
                usize::try_from(c).map_err(|_| {
                    DeployError::invalid_input(format!("ragged count must be non-negative, got {c}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_counts(&counts)
    }

    /// The raw cumulative offsets.
    pub fn as_slice(&self) -> &[usize] {
        &self.offsets
    }

    /// Number of segments (samples).
    pub fn num_segments(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Row range of segment `index`, or `None` past the last segment.
    pub fn segment(&self, index: usize) -> Option<Range<usize>> {
        if index >= self.num_segments() {
            return None;
        }
        Some(self.offsets[index]..self.offsets[index + 1])
    }

    /// Per-segment row counts.
    pub fn counts(&self) -> Vec<usize> {
        self.offsets.windows(2).map(|w| w[1] - w[0]).collect()
    }

    /// Total number of rows covered.
    pub fn total(&self) -> usize {
        self.offsets.last().copied().unwrap_or(0)
    }
}
