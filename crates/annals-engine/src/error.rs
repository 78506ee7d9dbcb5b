//! Error types for the runner binary.

/// Top-level error for the runner binary.
///
/// Each variant wraps a specific subsystem error, so startup steps can
/// propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: annals_core::config::ConfigError,
    },

    /// Engine construction or a turn failed.
    #[error("turn error: {source}")]
    Turn {
        /// The underlying turn error.
        #[from]
        source: annals_core::engine::TurnError,
    },

    /// Starting map construction failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: annals_world::WorldError,
    },

    /// The turn loop failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: annals_core::runner::RunnerError,
    },

    /// Nation spawning failed.
    #[error("spawner error: {message}")]
    Spawner {
        /// Description of the spawner failure.
        message: String,
    },
}
