//! Error definitions for the input engine

use thiserror::Error;

/// Errors raised while setting up or driving the input engine
///
/// The per-tick translation itself never fails; these only cover
/// configuration and lifecycle problems.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration values that cannot work together
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// The poll thread could not be spawned or joined
    #[error("Thread error: {0}")]
    ThreadError(String),

    /// Lifecycle call in the wrong state
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),
}
