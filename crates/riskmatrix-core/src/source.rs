use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Remote data providers with a fetch adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Fred,
    Yahoo,
}

impl ProviderId {
    pub const ALL: [Self; 2] = [Self::Fred, Self::Yahoo];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fred => "fred",
            Self::Yahoo => "yahoo",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog source tag: a remote provider, or computed from other catalog series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceTag {
    Fred,
    Yahoo,
    Derived,
}

impl SourceTag {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fred => "fred",
            Self::Yahoo => "yahoo",
            Self::Derived => "derived",
        }
    }

    /// Provider to download from; `None` for derived series.
    pub const fn provider(self) -> Option<ProviderId> {
        match self {
            Self::Fred => Some(ProviderId::Fred),
            Self::Yahoo => Some(ProviderId::Yahoo),
            Self::Derived => None,
        }
    }
}

impl Display for SourceTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceTag {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fred" => Ok(Self::Fred),
            "yahoo" => Ok(Self::Yahoo),
            "derived" => Ok(Self::Derived),
            other => Err(ValidationError::InvalidSource {
                value: other.to_owned(),
            }),
        }
    }
}

impl From<ProviderId> for SourceTag {
    fn from(value: ProviderId) -> Self {
        match value {
            ProviderId::Fred => Self::Fred,
            ProviderId::Yahoo => Self::Yahoo,
        }
    }
}
