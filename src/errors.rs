// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

use crate::tree::NodeId;

#[derive(Error, Debug)]
pub enum Trakem2Error {
    /// Attempted cycle or double-parenting. Rejected before any mutation.
    #[error("Invalid topology: {0}")]
    InvalidTopology(String),

    /// A structural invariant is already broken (e.g. a child missing from
    /// its parent's child list). Indicates a prior bug.
    #[error("Inconsistent state: {0}")]
    InconsistentState(String),

    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// Failure raised inside background task logic, contained at the worker
    /// boundary.
    #[error("Worker failure in '{task}': {reason}")]
    WorkerFailure { task: String, reason: String },

    #[error("Job already started: {0}")]
    JobAlreadyStarted(String),

    #[error("Invalid value for attribute '{name}': {value}")]
    InvalidAttribute { name: String, value: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Trakem2Error>;
