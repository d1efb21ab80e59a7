//! # riskmatrix core
//!
//! Regime classification and risk-matrix assembly for a fixed panel of
//! macro-financial indicators.
//!
//! ## Overview
//!
//! - **Series model**: dated observations with explicit missing values
//! - **Catalog** of series, their provider and publication frequency
//! - **Indicator registry**: one declarative spec per indicator (metric,
//!   change mode, threshold table)
//! - **Classification**: change windows, percentiles and regime lookup
//! - **Assembly** of the `{metadata, main_indicators}` document and its
//!   dated/latest snapshot files
//! - **Acquisition** from FRED and Yahoo Finance behind per-provider pools,
//!   rate gates, retries and circuit breakers
//! - **Publishing** of snapshot files to an HTTP bucket or a directory
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`acquisition`] | Concurrent catalog download |
//! | [`adapters`] | FRED and Yahoo adapters |
//! | [`catalog`] | Series catalog and snapshots |
//! | [`change`] | Change windows and return statistics |
//! | [`circuit_breaker`] | Circuit breaker for upstream calls |
//! | [`config`] | Environment configuration |
//! | [`data_source`] | Adapter trait and request types |
//! | [`domain`] | Symbols, dates, observations, series |
//! | [`error`] | Error types |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`indicators`] | Indicator specs and the standard registry |
//! | [`matrix`] | Risk-matrix document and assembler |
//! | [`persist`] | Snapshot files |
//! | [`provider_policy`] | Per-provider concurrency, quota and backoff |
//! | [`publish`] | Publishers and publish plans |
//! | [`regime`] | Threshold tables and classification |
//! | [`report`] | Per-indicator evaluation |
//! | [`retry`] | Retry schedules |
//! | [`routing`] | Source registry |
//! | [`store`] | In-memory series store |
//! | [`throttling`] | Rate gate |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use riskmatrix_core::{
//!     IndicatorRegistry, RiskMatrixAssembler, SeriesCatalog, SeriesStore, SnapshotWriter,
//!     UtcDateTime,
//! };
//!
//! fn run(store: &SeriesStore) -> Result<(), riskmatrix_core::CoreError> {
//!     let catalog = SeriesCatalog::standard()?;
//!     let assembler = RiskMatrixAssembler::new(IndicatorRegistry::standard()?);
//!     let matrix = assembler.assemble(store, &catalog, UtcDateTime::now());
//!     SnapshotWriter::new("data").write(&matrix)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐
//! │ SeriesDownloader│────▶│ SourceRegistry   │──▶ FRED / Yahoo adapters
//! └────────┬────────┘     └──────────────────┘
//!          │ SeriesStore
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ RiskMatrix      │────▶│ ReportBuilder    │──▶ change / regime
//! │ Assembler       │     └──────────────────┘
//! └────────┬────────┘
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ SnapshotWriter  │────▶│ Publisher        │
//! └─────────────────┘     └──────────────────┘
//! ```

pub mod acquisition;
pub mod adapters;
pub mod catalog;
pub mod change;
pub mod circuit_breaker;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod indicators;
pub mod matrix;
pub mod persist;
pub mod provider_policy;
pub mod publish;
pub mod regime;
pub mod report;
pub mod retry;
pub mod routing;
pub mod source;
pub mod store;
pub mod throttling;

pub use acquisition::{DownloadReport, FetchFailure, SeriesDownloader, DEFAULT_LOOKBACK_DAYS};
pub use adapters::{synthetic_series, FredAdapter, YahooAdapter};
pub use catalog::{CatalogEntry, CatalogSnapshot, Derivation, SeriesCatalog};
pub use change::ChangeMode;
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use config::{ConfigError, PublishConfig, RuntimeConfig};
pub use data_source::{
    DataSource, HealthState, HealthStatus, SeriesRequest, SourceError, SourceErrorKind,
};
pub use domain::{
    ChangeWindow, Frequency, Observation, ObservationDate, SeriesSymbol, TimeSeries, UtcDateTime,
};
pub use error::{
    CatalogError, CoreError, PersistError, PublishError, ThresholdTableError, ValidationError,
};
pub use http_client::{
    HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, NoopHttpClient,
    ReqwestHttpClient,
};
pub use indicators::{IndicatorRegistry, IndicatorSpec, Metric};
pub use matrix::{Metadata, RiskMatrix, RiskMatrixAssembler, RiskSummary, SCHEMA_VERSION};
pub use persist::{dated_file_name, SnapshotPaths, SnapshotWriter, LATEST_FILE_NAME};
pub use provider_policy::{BackoffPolicy, ProviderPolicy};
pub use publish::{
    publish_all, DirectoryPublisher, HttpPublisher, PublishItem, PublishOutcome, PublishPlan,
    PublishReport, Publisher,
};
pub use regime::{classify, Bucket, Severity, ThresholdTable, Verdict};
pub use report::{IndicatorOutcome, IndicatorReport, ReportBuilder, ReportStatus};
pub use retry::{Backoff, RetryConfig};
pub use routing::{SourceRegistry, SourceRegistryBuilder, SourceSnapshot};
pub use source::{ProviderId, SourceTag};
pub use store::SeriesStore;
pub use throttling::ThrottlingQueue;
