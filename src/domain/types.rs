use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ModelError, ModelResult};

// ============================================================================
// Time Index
// ============================================================================

/// Evenly spaced time index with a single investment period
///
/// Every flow gets one decision variable per timestep. The model only ever
/// uses period 0; the period is still carried in flow keys so results line up
/// with multi-period conventions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TimeIndexRecord", into = "TimeIndexRecord")]
pub struct TimeIndex {
    pub start: DateTime<FixedOffset>,
    pub step: chrono::Duration,
    pub len: usize,
}

impl TimeIndex {
    pub fn new(start: DateTime<FixedOffset>, step: chrono::Duration, len: usize) -> ModelResult<Self> {
        if len == 0 {
            return Err(ModelError::InvalidTimeIndex(
                "time index needs at least one timestep".to_string(),
            ));
        }
        if step <= chrono::Duration::zero() {
            return Err(ModelError::InvalidTimeIndex(format!(
                "step must be positive, got {}s",
                step.num_seconds()
            )));
        }
        if step.subsec_nanos() != 0 {
            return Err(ModelError::InvalidTimeIndex(
                "step must be a whole number of seconds".to_string(),
            ));
        }

        let index = Self { start, step, len };
        if index.end().is_none() {
            return Err(ModelError::InvalidTimeIndex(format!(
                "{} steps of {}s from {} run past the supported date range",
                len,
                step.num_seconds(),
                start
            )));
        }
        Ok(index)
    }

    /// Hourly index starting at `start`
    pub fn hourly(start: DateTime<FixedOffset>, len: usize) -> ModelResult<Self> {
        Self::new(start, chrono::Duration::hours(1), len)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Length of one timestep in hours
    pub fn timeincrement(&self) -> f64 {
        self.step.num_seconds() as f64 / 3600.0
    }

    /// Start of timestep `t`, `None` past the supported date range
    pub fn timestamp(&self, t: usize) -> Option<DateTime<FixedOffset>> {
        let offset = self.step.checked_mul(i32::try_from(t).ok()?)?;
        self.start.checked_add_signed(offset)
    }

    pub fn timestamps(&self) -> Vec<DateTime<FixedOffset>> {
        (0..self.len).filter_map(|t| self.timestamp(t)).collect()
    }

    /// Offset of timestep `t` from the start, in hours
    pub fn hours_since_start(&self, t: usize) -> f64 {
        t as f64 * self.timeincrement()
    }

    /// End of the last timestep
    pub fn end(&self) -> Option<DateTime<FixedOffset>> {
        self.timestamp(self.len)
    }
}

/// Wire form of a [`TimeIndex`]; decoding goes through [`TimeIndex::new`]
#[derive(Serialize, Deserialize)]
struct TimeIndexRecord {
    start: DateTime<FixedOffset>,
    step_seconds: i64,
    len: usize,
}

impl TryFrom<TimeIndexRecord> for TimeIndex {
    type Error = ModelError;

    fn try_from(record: TimeIndexRecord) -> ModelResult<Self> {
        let step = chrono::Duration::try_seconds(record.step_seconds).ok_or_else(|| {
            ModelError::InvalidTimeIndex(format!("step of {}s is out of range", record.step_seconds))
        })?;
        TimeIndex::new(record.start, step, record.len)
    }
}

impl From<TimeIndex> for TimeIndexRecord {
    fn from(index: TimeIndex) -> Self {
        Self {
            start: index.start,
            step_seconds: index.step.num_seconds(),
            len: index.len,
        }
    }
}

// ============================================================================
// Sequences
// ============================================================================

/// Per-timestep parameter, either constant or one value per timestep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Sequence {
    Scalar(f64),
    Series(Vec<f64>),
}

impl Sequence {
    /// Value at timestep `t`. Scalars broadcast; a series past its end yields
    /// its last value, which [`Sequence::check_len`] rules out for validated
    /// models.
    pub fn get(&self, t: usize) -> f64 {
        match self {
            Sequence::Scalar(v) => *v,
            Sequence::Series(values) => values
                .get(t)
                .or_else(|| values.last())
                .copied()
                .unwrap_or(0.0),
        }
    }

    pub fn check_len(&self, name: &str, expected: usize) -> ModelResult<()> {
        match self {
            Sequence::Scalar(_) => Ok(()),
            Sequence::Series(values) if values.len() == expected => Ok(()),
            Sequence::Series(values) => Err(ModelError::SequenceLength {
                name: name.to_string(),
                expected,
                actual: values.len(),
            }),
        }
    }

    pub fn values(&self) -> Box<dyn Iterator<Item = f64> + '_> {
        match self {
            Sequence::Scalar(v) => Box::new(std::iter::once(*v)),
            Sequence::Series(values) => Box::new(values.iter().copied()),
        }
    }

    pub fn all_finite(&self) -> bool {
        self.values().all(f64::is_finite)
    }

    pub fn within(&self, lower: f64, upper: f64) -> bool {
        self.values().all(|v| v >= lower && v <= upper)
    }
}

impl From<f64> for Sequence {
    fn from(v: f64) -> Self {
        Sequence::Scalar(v)
    }
}

impl From<Vec<f64>> for Sequence {
    fn from(values: Vec<f64>) -> Self {
        Sequence::Series(values)
    }
}

impl From<&[f64]> for Sequence {
    fn from(values: &[f64]) -> Self {
        Sequence::Series(values.to_vec())
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sequence::Scalar(v) => write!(f, "{}", v),
            Sequence::Series(values) => write!(f, "[{} values]", values.len()),
        }
    }
}
