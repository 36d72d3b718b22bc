use thiserror::Error;

use super::config::ConfigError;
use crate::core::io::fasta::FastaError;
use crate::core::io::signal::SignalPeptideError;
use crate::core::models::protein::ModelError;
use crate::workflows::settings::SettingsError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Unknown module '{0}'")]
    UnknownModule(String),

    #[error("A handler for module '{0}' is already registered")]
    DuplicateHandler(String),

    #[error("Invalid window [{min}, {max}]: bounds must not be NaN")]
    InvalidWindow { min: f64, max: f64 },

    #[error("Invalid depletion fraction {fraction} for '{entry_name}': must lie in [0, 1]")]
    InvalidFraction { entry_name: String, fraction: f64 },

    #[error("Settings error: {source}")]
    Settings {
        #[from]
        source: SettingsError,
    },

    #[error("Model error: {source}")]
    Model {
        #[from]
        source: ModelError,
    },

    #[error("FASTA error: {source}")]
    Fasta {
        #[from]
        source: FastaError,
    },

    #[error("Signal-peptide data error: {source}")]
    SignalPeptide {
        #[from]
        source: SignalPeptideError,
    },

    #[error("Configuration error: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Module '{module}' failed: {reason}")]
    Handler { module: String, reason: String },

    #[error("Module catalog and registered handlers disagree: {0}")]
    CatalogMismatch(String),
}
