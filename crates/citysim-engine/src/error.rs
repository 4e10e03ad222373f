//! Error types for the match server binary.
//!
//! [`EngineError`] wraps every failure mode of startup and match execution
//! so that `main` can propagate with `?`.

/// Top-level error for the match server binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: citysim_core::config::ConfigError,
    },

    /// The match could not be played to the end.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: citysim_core::runner::RunnerError,
    },
}
