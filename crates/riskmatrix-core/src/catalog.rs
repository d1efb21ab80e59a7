//! Indicator catalog: which series exist, where they come from, how often they publish.
//!
//! The catalog is an owned value. Editing operations return a new catalog, and an
//! evaluation run works from an [`Arc`] snapshot so readers never observe a
//! half-applied edit.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{CatalogError, Frequency, ProviderId, SeriesSymbol, SourceTag, ValidationError};

/// Arithmetic relationship of a derived series to other catalog series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Derivation {
    /// `minuend - subtrahend` on shared dates.
    Spread {
        minuend: SeriesSymbol,
        subtrahend: SeriesSymbol,
    },
}

impl Derivation {
    pub fn inputs(&self) -> [&SeriesSymbol; 2] {
        match self {
            Self::Spread {
                minuend,
                subtrahend,
            } => [minuend, subtrahend],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub source: SourceTag,
    pub frequency: Frequency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derived_from: Option<Derivation>,
}

impl CatalogEntry {
    pub fn remote(name: impl Into<String>, provider: ProviderId, frequency: Frequency) -> Self {
        Self {
            name: name.into(),
            source: provider.into(),
            frequency,
            derived_from: None,
        }
    }

    pub fn spread(
        name: impl Into<String>,
        frequency: Frequency,
        minuend: SeriesSymbol,
        subtrahend: SeriesSymbol,
    ) -> Self {
        Self {
            name: name.into(),
            source: SourceTag::Derived,
            frequency,
            derived_from: Some(Derivation::Spread {
                minuend,
                subtrahend,
            }),
        }
    }
}

/// Immutable view shared with one evaluation run.
pub type CatalogSnapshot = Arc<SeriesCatalog>;

/// Symbol-keyed catalog, persisted as a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeriesCatalog {
    entries: BTreeMap<SeriesSymbol, CatalogEntry>,
}

impl SeriesCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in catalog covering every series used by the standard indicator registry.
    pub fn standard() -> Result<Self, ValidationError> {
        use Frequency::{Daily, Monthly, Weekly};
        use ProviderId::{Fred, Yahoo};

        let remote: [(&str, &str, ProviderId, Frequency); 20] = [
            ("VIXCLS", "CBOE波动率指数(VIX)", Fred, Daily),
            ("DGS10", "10年期美债收益率", Fred, Daily),
            ("DGS2", "2年期美债收益率", Fred, Daily),
            ("DTB3", "3个月美债收益率", Fred, Daily),
            ("BAMLH0A0HYM2", "美国高收益债期权调整利差", Fred, Daily),
            ("BAMLC0A0CM", "美国投资级公司债期权调整利差", Fred, Daily),
            ("STLFSI4", "圣路易斯联储金融压力指数", Fred, Weekly),
            ("DFF", "联邦基金有效利率", Fred, Daily),
            ("DFII10", "10年期TIPS实际收益率", Fred, Daily),
            ("T10YIE", "10年期盈亏平衡通胀率", Fred, Daily),
            ("DTWEXBGS", "美元广义贸易加权指数", Fred, Daily),
            ("DCOILWTICO", "WTI原油现货价格", Fred, Daily),
            ("UNRATE", "美国失业率", Fred, Monthly),
            ("CPIAUCSL", "美国CPI(城市居民)", Fred, Monthly),
            ("UMCSENT", "密歇根大学消费者信心指数", Fred, Monthly),
            ("^GSPC", "S&P 500", Yahoo, Daily),
            ("^IXIC", "NASDAQ", Yahoo, Daily),
            ("^DJI", "Dow Jones", Yahoo, Daily),
            ("000001.SS", "Shanghai Composite", Yahoo, Daily),
            ("^HSI", "Hang Seng", Yahoo, Daily),
        ];

        let mut catalog = Self::new();
        for (symbol, name, provider, frequency) in remote {
            catalog.entries.insert(
                SeriesSymbol::parse(symbol)?,
                CatalogEntry::remote(name, provider, frequency),
            );
        }

        let spreads = [
            ("T10Y2Y", "10年-2年美债利差", "DGS10", "DGS2"),
            ("T10Y3M", "10年-3个月美债利差", "DGS10", "DTB3"),
        ];
        for (symbol, name, minuend, subtrahend) in spreads {
            catalog.entries.insert(
                SeriesSymbol::parse(symbol)?,
                CatalogEntry::spread(
                    name,
                    Daily,
                    SeriesSymbol::parse(minuend)?,
                    SeriesSymbol::parse(subtrahend)?,
                ),
            );
        }

        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog: Self = serde_json::from_str(&raw).map_err(|source| CatalogError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        for (symbol, entry) in &catalog.entries {
            validate_entry(symbol, entry)?;
        }
        Ok(catalog)
    }

    pub fn save(&self, path: &Path) -> Result<(), CatalogError> {
        let write_error = |source| CatalogError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_error)?;
        }
        let mut payload = serde_json::to_string_pretty(self).map_err(|source| {
            CatalogError::Serialize {
                path: path.to_path_buf(),
                source,
            }
        })?;
        payload.push('\n');
        fs::write(path, payload).map_err(write_error)
    }

    /// New catalog where every entry of `updates` replaces or extends this one.
    pub fn merge(&self, updates: &Self) -> Self {
        let mut entries = self.entries.clone();
        entries.extend(
            updates
                .entries
                .iter()
                .map(|(symbol, entry)| (symbol.clone(), entry.clone())),
        );
        Self { entries }
    }

    pub fn with_entry(
        &self,
        symbol: SeriesSymbol,
        entry: CatalogEntry,
    ) -> Result<Self, CatalogError> {
        validate_entry(&symbol, &entry)?;
        let mut entries = self.entries.clone();
        entries.insert(symbol, entry);
        Ok(Self { entries })
    }

    pub fn without_entry(&self, symbol: &SeriesSymbol) -> Result<Self, CatalogError> {
        let mut entries = self.entries.clone();
        entries
            .remove(symbol)
            .ok_or_else(|| CatalogError::UnknownEntry {
                symbol: symbol.to_string(),
            })?;
        Ok(Self { entries })
    }

    pub fn get(&self, symbol: &SeriesSymbol) -> Option<&CatalogEntry> {
        self.entries.get(symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SeriesSymbol, &CatalogEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Series that must be downloaded, in symbol order.
    pub fn remote_series(&self) -> Vec<(SeriesSymbol, ProviderId, Frequency)> {
        self.entries
            .iter()
            .filter_map(|(symbol, entry)| {
                entry
                    .source
                    .provider()
                    .map(|provider| (symbol.clone(), provider, entry.frequency))
            })
            .collect()
    }

    pub fn snapshot(&self) -> CatalogSnapshot {
        Arc::new(self.clone())
    }
}

fn validate_entry(symbol: &SeriesSymbol, entry: &CatalogEntry) -> Result<(), ValidationError> {
    if let Some(derivation) = &entry.derived_from {
        if derivation.inputs().contains(&symbol) {
            return Err(ValidationError::SelfReferentialDerivation {
                symbol: symbol.to_string(),
            });
        }
    }
    Ok(())
}
