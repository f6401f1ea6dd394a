//! Error types for level loading and world access.

use darkwood_component::Entity;
use thiserror::Error;

/// Errors raised while loading or validating a level.
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid level '{scene}': {reason}")]
    Invalid { scene: String, reason: String },
    #[error("unknown scene: {0}")]
    UnknownScene(String),
}

/// Errors raised when gameplay code addresses something that is not there.
#[derive(Debug, Error)]
pub enum WorldError {
    #[error("entity {0} not found")]
    EntityNotFound(Entity),
    #[error("component '{0}' not found on entity {1}")]
    ComponentNotFound(&'static str, Entity),
}
