//! Error types for graph loading and simulation runs.

use thiserror::Error;

use dg_core::DgError;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Invalid graph: {what}")]
    Validation { what: String },

    #[error("Cannot convert argument {index} of '{entity}.{command}': {what}")]
    Argument {
        entity: String,
        command: String,
        index: usize,
        what: String,
    },

    #[error("Graph error: {0}")]
    Graph(#[from] DgError),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SimResult<T> = Result<T, SimError>;
