use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] riskmatrix_core::ValidationError),

    #[error(transparent)]
    Config(#[from] riskmatrix_core::ConfigError),

    #[error(transparent)]
    Core(#[from] riskmatrix_core::CoreError),

    #[error(transparent)]
    Catalog(#[from] riskmatrix_core::CatalogError),

    #[error(transparent)]
    Persist(#[from] riskmatrix_core::PersistError),

    #[error("command error: {0}")]
    Command(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::Config(_) | Self::Command(_) => 2,
            Self::Core(_) | Self::Catalog(_) => 2,
            Self::Serialization(_) => 4,
            Self::Persist(_) | Self::Io(_) => 10,
        }
    }
}
