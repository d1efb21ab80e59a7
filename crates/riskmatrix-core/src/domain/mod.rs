//! # Domain Models
//!
//! Canonical domain types for riskmatrix series data.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`SeriesSymbol`] | Validated provider series identifier |
//! | [`ObservationDate`] | Calendar date of an observation |
//! | [`UtcDateTime`] | UTC timestamp |
//! | [`Frequency`] | Publication frequency and its change windows |
//! | [`Observation`] | One dated, possibly missing value |
//! | [`TimeSeries`] | Strictly date-ordered observations |
//!
//! All types validate at construction and serialize to plain JSON strings and
//! numbers so series files stay hand-editable.

mod date;
mod frequency;
mod series;
mod symbol;
mod timestamp;

pub use date::ObservationDate;
pub use frequency::{ChangeWindow, Frequency};
pub use series::{Observation, TimeSeries};
pub use symbol::SeriesSymbol;
pub use timestamp::UtcDateTime;
