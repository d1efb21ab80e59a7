use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Lookback window reported in an indicator's statistics block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeWindow {
    /// Short label used in statistic keys (`1w`, `1m`, `3m`, `1y`).
    pub label: &'static str,
    /// Negative observation offset from the latest value.
    pub offset: isize,
}

impl ChangeWindow {
    pub const fn new(label: &'static str, offset: isize) -> Self {
        Self { label, offset }
    }
}

const DAILY_WINDOWS: [ChangeWindow; 4] = [
    ChangeWindow::new("1w", -5),
    ChangeWindow::new("1m", -21),
    ChangeWindow::new("3m", -63),
    ChangeWindow::new("1y", -252),
];

const WEEKLY_WINDOWS: [ChangeWindow; 3] = [
    ChangeWindow::new("1w", -1),
    ChangeWindow::new("1m", -4),
    ChangeWindow::new("1y", -52),
];

const MONTHLY_WINDOWS: [ChangeWindow; 2] = [
    ChangeWindow::new("1m", -1),
    ChangeWindow::new("1y", -12),
];

/// Publication frequency of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    pub const ALL: [Self; 3] = [Self::Daily, Self::Weekly, Self::Monthly];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    /// Change windows reported for series of this frequency.
    pub const fn change_windows(self) -> &'static [ChangeWindow] {
        match self {
            Self::Daily => &DAILY_WINDOWS,
            Self::Weekly => &WEEKLY_WINDOWS,
            Self::Monthly => &MONTHLY_WINDOWS,
        }
    }

    /// Number of observations in one year.
    pub const fn observations_per_year(self) -> usize {
        match self {
            Self::Daily => 252,
            Self::Weekly => 52,
            Self::Monthly => 12,
        }
    }
}

impl Display for Frequency {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "daily" | "d" => Ok(Self::Daily),
            "weekly" | "w" => Ok(Self::Weekly),
            "monthly" | "m" => Ok(Self::Monthly),
            other => Err(ValidationError::InvalidFrequency {
                value: other.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_frequency() {
        let frequency = Frequency::from_str("Monthly").expect("must parse");
        assert_eq!(frequency, Frequency::Monthly);
    }

    #[test]
    fn rejects_invalid_frequency() {
        let err = Frequency::from_str("hourly").expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidFrequency { .. }));
    }

    #[test]
    fn windows_depend_on_frequency() {
        let labels = |frequency: Frequency| {
            frequency
                .change_windows()
                .iter()
                .map(|window| window.label)
                .collect::<Vec<_>>()
        };
        assert_eq!(labels(Frequency::Daily), vec!["1w", "1m", "3m", "1y"]);
        assert_eq!(labels(Frequency::Monthly), vec!["1m", "1y"]);
    }
}
