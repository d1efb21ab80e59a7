use serde::{Deserialize, Serialize};

use crate::{ObservationDate, ValidationError};

/// One dated value. `None` marks a missing observation as published by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: ObservationDate,
    pub value: Option<f64>,
}

impl Observation {
    pub const fn new(date: ObservationDate, value: Option<f64>) -> Self {
        Self { date, value }
    }

    /// Finite value, treating NaN and infinities as missing.
    pub fn finite_value(&self) -> Option<f64> {
        self.value.filter(|value| value.is_finite())
    }
}

/// Ordered observations with strictly increasing dates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Observation>", into = "Vec<Observation>")]
pub struct TimeSeries {
    observations: Vec<Observation>,
}

impl TimeSeries {
    pub fn new(observations: Vec<Observation>) -> Result<Self, ValidationError> {
        for pair in observations.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(ValidationError::UnorderedObservations {
                    previous: pair[0].date.to_string(),
                    next: pair[1].date.to_string(),
                });
            }
        }
        Ok(Self { observations })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a series from provider rows that may arrive unsorted or duplicated.
    /// Rows are sorted by date; for duplicate dates the last row wins.
    pub fn from_unsorted(mut observations: Vec<Observation>) -> Self {
        observations.sort_by_key(|observation| observation.date);
        let mut deduped: Vec<Observation> = Vec::with_capacity(observations.len());
        for observation in observations {
            match deduped.last_mut() {
                Some(last) if last.date == observation.date => *last = observation,
                _ => deduped.push(observation),
            }
        }
        Self {
            observations: deduped,
        }
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Copy of the series without missing or non-finite observations.
    pub fn drop_missing(&self) -> Self {
        Self {
            observations: self
                .observations
                .iter()
                .filter_map(|observation| {
                    observation
                        .finite_value()
                        .map(|value| Observation::new(observation.date, Some(value)))
                })
                .collect(),
        }
    }

    /// Finite values in date order.
    pub fn values(&self) -> Vec<f64> {
        self.observations
            .iter()
            .filter_map(Observation::finite_value)
            .collect()
    }

    /// Latest observation carrying a finite value.
    pub fn last_valid(&self) -> Option<(ObservationDate, f64)> {
        self.observations
            .iter()
            .rev()
            .find_map(|observation| {
                observation
                    .finite_value()
                    .map(|value| (observation.date, value))
            })
    }

    /// `self - other` on the dates present in both series (inner join).
    /// Missing values on either side drop the date.
    pub fn spread(&self, other: &Self) -> Self {
        let left = self.drop_missing();
        let right = other.drop_missing();
        let mut joined = Vec::with_capacity(left.len().min(right.len()));

        let (mut i, mut j) = (0, 0);
        while i < left.observations.len() && j < right.observations.len() {
            let a = left.observations[i];
            let b = right.observations[j];
            match a.date.cmp(&b.date) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    if let (Some(x), Some(y)) = (a.value, b.value) {
                        joined.push(Observation::new(a.date, Some(x - y)));
                    }
                    i += 1;
                    j += 1;
                }
            }
        }

        Self {
            observations: joined,
        }
    }
}

impl TryFrom<Vec<Observation>> for TimeSeries {
    type Error = ValidationError;

    fn try_from(value: Vec<Observation>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TimeSeries> for Vec<Observation> {
    fn from(value: TimeSeries) -> Self {
        value.observations
    }
}
