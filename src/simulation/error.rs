//! Error taxonomy for the traffic engine

use thiserror::Error;

/// Errors returned by engine and service operations
///
/// Every variant is a caller input error: the engine is purely in-memory, so
/// nothing here is transient or worth retrying.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("cell at position {position}, lane {lane} is already occupied")]
    OccupiedCell { position: usize, lane: usize },

    #[error("simulation has not been initialized")]
    NotInitialized,
}

impl SimError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        SimError::InvalidConfig(message.into())
    }

    /// Stable machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            SimError::InvalidConfig(_) => "invalid_config",
            SimError::OccupiedCell { .. } => "occupied_cell",
            SimError::NotInitialized => "not_initialized",
        }
    }
}

pub type SimResult<T> = Result<T, SimError>;
