//! Merged table of downloaded series, keyed by symbol.

use std::collections::BTreeMap;
use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::{CoreError, ObservationDate, SeriesSymbol, TimeSeries};

/// Read-only mapping from symbol to series used by one evaluation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeriesStore {
    series: BTreeMap<SeriesSymbol, TimeSeries>,
}

impl SeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads `{"SYMBOL": [{"date": "YYYY-MM-DD", "value": 1.0}, ...]}`.
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, CoreError> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_json_str(input: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn insert(&mut self, symbol: SeriesSymbol, series: TimeSeries) -> Option<TimeSeries> {
        self.series.insert(symbol, series)
    }

    pub fn with_series(mut self, symbol: SeriesSymbol, series: TimeSeries) -> Self {
        self.insert(symbol, series);
        self
    }

    pub fn get(&self, symbol: &SeriesSymbol) -> Option<&TimeSeries> {
        self.series.get(symbol)
    }

    pub fn contains(&self, symbol: &SeriesSymbol) -> bool {
        self.series.contains_key(symbol)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &SeriesSymbol> {
        self.series.keys()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Latest date carrying a value anywhere in the table.
    pub fn latest_date(&self) -> Option<ObservationDate> {
        self.series
            .values()
            .filter_map(|series| series.last_valid().map(|(date, _)| date))
            .max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_json_and_reports_latest_date() {
        let store = SeriesStore::from_json_str(
            r#"{
                "VIXCLS": [{"date": "2024-01-02", "value": 13.2}, {"date": "2024-01-05", "value": null}],
                "DGS10": [{"date": "2024-01-04", "value": 4.0}]
            }"#,
        )
        .expect("store should parse");

        assert_eq!(store.len(), 2);
        assert_eq!(
            store.latest_date().map(|date| date.to_string()),
            Some(String::from("2024-01-04"))
        );
    }

    #[test]
    fn rejects_unordered_series_in_json() {
        let result = SeriesStore::from_json_str(
            r#"{"VIXCLS": [{"date": "2024-01-05", "value": 1}, {"date": "2024-01-02", "value": 2}]}"#,
        );
        assert!(result.is_err());
    }
}
