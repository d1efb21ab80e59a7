//! Regime classification.
//!
//! A regime is the bucket of a [`ThresholdTable`] that the current value
//! falls into. Tables are data: each indicator declares its own orientation
//! and literal comparison operators, and one evaluator serves all of them.
//!
//! ```rust
//! use riskmatrix_core::regime::{classify, Bucket, Severity, ThresholdTable};
//!
//! let table = ThresholdTable::ascending()
//!     .below(15.0, Bucket::new("低波动制度", Severity::Low))
//!     .below(25.0, Bucket::new("正常波动制度", Severity::Moderate))
//!     .otherwise(Bucket::new("压力波动制度", Severity::Elevated))
//!     .expect("table is well formed");
//!
//! assert_eq!(classify(12.0, &table).label, "低波动制度");
//! ```

mod table;

use std::collections::BTreeMap;

pub use table::{
    Bucket, BucketInterval, Comparison, IntervalBound, Orientation, Severity, ThresholdTable,
    ThresholdTableBuilder, RESERVED_REPORT_KEYS,
};

/// Borrowed result of one lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verdict<'a> {
    pub label: &'a str,
    pub severity: Severity,
    pub narrative: &'a BTreeMap<String, String>,
}

/// Looks up the bucket for `value` in `table`.
pub fn classify(value: f64, table: &ThresholdTable) -> Verdict<'_> {
    let bucket = table.classify(value);
    Verdict {
        label: bucket.label(),
        severity: bucket.severity(),
        narrative: bucket.narrative_fields(),
    }
}
