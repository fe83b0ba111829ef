use crate::model::{GroupId, RecordId, RowId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VarhubError {
    #[error("{0}")]
    Load(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Record not found: {0}")]
    UnknownRecord(RecordId),

    #[error("Matrix row not found: {0}")]
    UnknownRow(RowId),

    #[error("Variable group not found: {0}")]
    UnknownGroup(GroupId),

    #[error("Tree node not found: {0}")]
    UnknownNode(usize),
}

pub type Result<T> = std::result::Result<T, VarhubError>;
