use thiserror::Error;

/// Errors originating from the core module.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Invalid configuration value or structure.
    #[error("Configuration invalide : {0}")]
    Config(String),

    /// Referenced file does not exist.
    #[error("Fichier introuvable : {path}")]
    FileNotFound {
        /// Path that was not found.
        path: String,
    },

    /// Coefficient set that cannot describe a causal rational transfer function.
    #[error("Coefficients invalides : {reason}")]
    InvalidCoefficients {
        /// What was wrong with the set.
        reason: String,
    },
}
