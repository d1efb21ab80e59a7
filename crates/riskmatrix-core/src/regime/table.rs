use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ThresholdTableError;

/// Report keys that narrative fields may not shadow.
pub const RESERVED_REPORT_KEYS: [&str; 8] = [
    "indicator",
    "symbol",
    "current_value",
    "date",
    "statistics",
    "regime",
    "severity",
    "status",
];

/// Direction in which a table's bounds are walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Bounds increase; rules use `<` or `<=`.
    Ascending,
    /// Bounds decrease; rules use `>` or `>=`.
    Descending,
}

impl Orientation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ascending => "ascending",
            Self::Descending => "descending",
        }
    }
}

/// Literal comparison attached to one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op", content = "bound")]
pub enum Comparison {
    Below(f64),
    AtMost(f64),
    Above(f64),
    AtLeast(f64),
}

impl Comparison {
    pub const fn bound(self) -> f64 {
        match self {
            Self::Below(bound)
            | Self::AtMost(bound)
            | Self::Above(bound)
            | Self::AtLeast(bound) => bound,
        }
    }

    pub const fn operator(self) -> &'static str {
        match self {
            Self::Below(_) => "<",
            Self::AtMost(_) => "<=",
            Self::Above(_) => ">",
            Self::AtLeast(_) => ">=",
        }
    }

    pub const fn is_inclusive(self) -> bool {
        matches!(self, Self::AtMost(_) | Self::AtLeast(_))
    }

    const fn orientation(self) -> Orientation {
        match self {
            Self::Below(_) | Self::AtMost(_) => Orientation::Ascending,
            Self::Above(_) | Self::AtLeast(_) => Orientation::Descending,
        }
    }

    pub fn holds(self, value: f64) -> bool {
        match self {
            Self::Below(bound) => value < bound,
            Self::AtMost(bound) => value <= bound,
            Self::Above(bound) => value > bound,
            Self::AtLeast(bound) => value >= bound,
        }
    }
}

impl Display for Comparison {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.operator(), self.bound())
    }
}

/// Coarse risk grade of a bucket, used to summarise a whole matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Moderate,
    Elevated,
    Severe,
}

impl Severity {
    pub const ALL: [Self; 4] = [Self::Low, Self::Moderate, Self::Elevated, Self::Severe];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::Elevated => "elevated",
            Self::Severe => "severe",
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Regime label plus the static narrative text shown with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    label: String,
    severity: Severity,
    narrative: BTreeMap<String, String>,
}

impl Bucket {
    pub fn new(label: impl Into<String>, severity: Severity) -> Self {
        Self {
            label: label.into(),
            severity,
            narrative: BTreeMap::new(),
        }
    }

    pub fn narrative(mut self, field: impl Into<String>, text: impl Into<String>) -> Self {
        self.narrative.insert(field.into(), text.into());
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub const fn severity(&self) -> Severity {
        self.severity
    }

    pub fn narrative_fields(&self) -> &BTreeMap<String, String> {
        &self.narrative
    }
}

/// One side of a bucket's interval. Infinite values mean unbounded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalBound {
    pub value: f64,
    pub inclusive: bool,
}

impl IntervalBound {
    const fn unbounded(value: f64) -> Self {
        Self {
            value,
            inclusive: false,
        }
    }
}

/// Closed/open interval covered by one bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketInterval {
    pub lower: IntervalBound,
    pub upper: IntervalBound,
}

impl BucketInterval {
    pub fn contains(&self, value: f64) -> bool {
        let above_lower = if self.lower.value == f64::NEG_INFINITY {
            true
        } else if self.lower.inclusive {
            value >= self.lower.value
        } else {
            value > self.lower.value
        };
        let below_upper = if self.upper.value == f64::INFINITY {
            true
        } else if self.upper.inclusive {
            value <= self.upper.value
        } else {
            value < self.upper.value
        };
        above_lower && below_upper
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Rule {
    comparison: Comparison,
    bucket: Bucket,
}

/// Ordered, gap-free bucket table for one indicator.
///
/// Rules are walked in declaration order and the first satisfied comparison
/// wins; the trailing catch-all bucket covers everything else. Construction
/// guarantees every real value lands in exactly one bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdTable {
    orientation: Orientation,
    rules: Vec<Rule>,
    otherwise: Bucket,
}

impl ThresholdTable {
    /// Starts a table whose bounds rise (`<` / `<=` rules).
    pub fn ascending() -> ThresholdTableBuilder {
        ThresholdTableBuilder::new(Orientation::Ascending)
    }

    /// Starts a table whose bounds fall (`>` / `>=` rules).
    pub fn descending() -> ThresholdTableBuilder {
        ThresholdTableBuilder::new(Orientation::Descending)
    }

    pub const fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Bucket matching `value`. Callers pass finite values; a NaN falls through to the catch-all.
    pub fn classify(&self, value: f64) -> &Bucket {
        self.rules
            .iter()
            .find(|rule| rule.comparison.holds(value))
            .map(|rule| &rule.bucket)
            .unwrap_or(&self.otherwise)
    }

    /// Buckets in evaluation order, catch-all last.
    pub fn buckets(&self) -> impl Iterator<Item = &Bucket> {
        self.rules
            .iter()
            .map(|rule| &rule.bucket)
            .chain(std::iter::once(&self.otherwise))
    }

    /// Comparisons in evaluation order; the catch-all has none.
    pub fn comparisons(&self) -> impl Iterator<Item = Option<Comparison>> + '_ {
        self.rules
            .iter()
            .map(|rule| Some(rule.comparison))
            .chain(std::iter::once(None))
    }

    /// Interval covered by each bucket, in evaluation order.
    pub fn intervals(&self) -> Vec<BucketInterval> {
        let mut intervals = Vec::with_capacity(self.rules.len() + 1);
        let mut previous: Option<Comparison> = None;

        for rule in &self.rules {
            // The previous rule's bound is where this bucket starts, on the opposite side.
            let near = previous
                .map(|comparison| IntervalBound {
                    value: comparison.bound(),
                    inclusive: !comparison.is_inclusive(),
                })
                .unwrap_or(IntervalBound::unbounded(self.far_end(true)));
            let far = IntervalBound {
                value: rule.comparison.bound(),
                inclusive: rule.comparison.is_inclusive(),
            };
            intervals.push(self.oriented(near, far));
            previous = Some(rule.comparison);
        }

        let near = previous
            .map(|comparison| IntervalBound {
                value: comparison.bound(),
                inclusive: !comparison.is_inclusive(),
            })
            .unwrap_or(IntervalBound::unbounded(self.far_end(true)));
        intervals.push(self.oriented(near, IntervalBound::unbounded(self.far_end(false))));
        intervals
    }

    fn far_end(&self, start: bool) -> f64 {
        match (self.orientation, start) {
            (Orientation::Ascending, true) | (Orientation::Descending, false) => f64::NEG_INFINITY,
            (Orientation::Ascending, false) | (Orientation::Descending, true) => f64::INFINITY,
        }
    }

    fn oriented(&self, near: IntervalBound, far: IntervalBound) -> BucketInterval {
        match self.orientation {
            Orientation::Ascending => BucketInterval {
                lower: near,
                upper: far,
            },
            Orientation::Descending => BucketInterval {
                lower: far,
                upper: near,
            },
        }
    }
}

/// Incremental constructor; validation happens in [`ThresholdTableBuilder::otherwise`].
#[derive(Debug, Clone)]
pub struct ThresholdTableBuilder {
    orientation: Orientation,
    rules: Vec<Rule>,
}

impl ThresholdTableBuilder {
    fn new(orientation: Orientation) -> Self {
        Self {
            orientation,
            rules: Vec::new(),
        }
    }

    pub fn rule(mut self, comparison: Comparison, bucket: Bucket) -> Self {
        self.rules.push(Rule { comparison, bucket });
        self
    }

    /// `value < bound`
    pub fn below(self, bound: f64, bucket: Bucket) -> Self {
        self.rule(Comparison::Below(bound), bucket)
    }

    /// `value <= bound`
    pub fn at_most(self, bound: f64, bucket: Bucket) -> Self {
        self.rule(Comparison::AtMost(bound), bucket)
    }

    /// `value > bound`
    pub fn above(self, bound: f64, bucket: Bucket) -> Self {
        self.rule(Comparison::Above(bound), bucket)
    }

    /// `value >= bound`
    pub fn at_least(self, bound: f64, bucket: Bucket) -> Self {
        self.rule(Comparison::AtLeast(bound), bucket)
    }

    /// Closes the table with its catch-all bucket and validates it.
    pub fn otherwise(self, bucket: Bucket) -> Result<ThresholdTable, ThresholdTableError> {
        let table = ThresholdTable {
            orientation: self.orientation,
            rules: self.rules,
            otherwise: bucket,
        };
        validate(&table)?;
        Ok(table)
    }
}

fn validate(table: &ThresholdTable) -> Result<(), ThresholdTableError> {
    if table.rules.is_empty() {
        return Err(ThresholdTableError::NoRules);
    }

    let mut previous: Option<f64> = None;
    for (index, rule) in table.rules.iter().enumerate() {
        let bound = rule.comparison.bound();
        if !bound.is_finite() {
            return Err(ThresholdTableError::NonFiniteBound { index, bound });
        }

        if rule.comparison.orientation() != table.orientation {
            return Err(ThresholdTableError::OperatorMismatch {
                index,
                operator: rule.comparison.operator(),
                orientation: table.orientation.as_str(),
            });
        }

        if let Some(previous) = previous {
            let (ordered, direction) = match table.orientation {
                Orientation::Ascending => (bound > previous, "greater"),
                Orientation::Descending => (bound < previous, "less"),
            };
            if !ordered {
                return Err(ThresholdTableError::UnorderedBounds {
                    index,
                    bound,
                    previous,
                    direction,
                });
            }
        }
        previous = Some(bound);
    }

    for (index, bucket) in table.buckets().enumerate() {
        if bucket.label.trim().is_empty() {
            return Err(ThresholdTableError::EmptyLabel { index });
        }
        if let Some(field) = bucket
            .narrative
            .keys()
            .find(|field| RESERVED_REPORT_KEYS.contains(&field.as_str()))
        {
            return Err(ThresholdTableError::ReservedNarrativeField {
                field: field.clone(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vix_table() -> ThresholdTable {
        ThresholdTable::ascending()
            .below(15.0, Bucket::new("低波动制度", Severity::Low))
            .below(25.0, Bucket::new("正常波动制度", Severity::Moderate))
            .below(40.0, Bucket::new("压力波动制度", Severity::Elevated))
            .otherwise(Bucket::new("恐慌波动制度", Severity::Severe))
            .expect("valid table")
    }

    #[test]
    fn walks_ascending_rules_in_order() {
        let table = vix_table();
        assert_eq!(table.classify(12.0).label(), "低波动制度");
        assert_eq!(table.classify(15.0).label(), "正常波动制度");
        assert_eq!(table.classify(39.99).label(), "压力波动制度");
        assert_eq!(table.classify(80.0).label(), "恐慌波动制度");
    }

    #[test]
    fn intervals_partition_the_real_line() {
        let table = vix_table();
        let intervals = table.intervals();
        assert_eq!(intervals.len(), 4);
        for value in [-1e9, 0.0, 14.999, 15.0, 24.0, 25.0, 40.0, 1e9] {
            let hits = intervals.iter().filter(|interval| interval.contains(value)).count();
            assert_eq!(hits, 1, "value {value} should hit exactly one bucket");
        }
    }

    #[test]
    fn rejects_operator_not_matching_orientation() {
        let err = ThresholdTable::ascending()
            .below(1.0, Bucket::new("a", Severity::Low))
            .above(2.0, Bucket::new("b", Severity::Low))
            .otherwise(Bucket::new("c", Severity::Low))
            .expect_err("must fail");
        assert!(matches!(err, ThresholdTableError::OperatorMismatch { index: 1, .. }));
    }

    #[test]
    fn rejects_overlapping_bounds() {
        let err = ThresholdTable::descending()
            .above(10.0, Bucket::new("a", Severity::Low))
            .above(10.0, Bucket::new("b", Severity::Low))
            .otherwise(Bucket::new("c", Severity::Low))
            .expect_err("must fail");
        assert!(matches!(err, ThresholdTableError::UnorderedBounds { .. }));
    }

    #[test]
    fn rejects_reserved_narrative_field() {
        let err = ThresholdTable::ascending()
            .below(1.0, Bucket::new("a", Severity::Low).narrative("regime", "x"))
            .otherwise(Bucket::new("b", Severity::Low))
            .expect_err("must fail");
        assert!(matches!(err, ThresholdTableError::ReservedNarrativeField { .. }));
    }
}
