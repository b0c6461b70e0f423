use std::{fmt, io};

use serde::{Deserialize, Serialize};
use serde_json::Error as JsonError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum AssuranceError {
    /// Bad or missing model directory argument.
    #[error("Missing Directory/File Path or Unable to parse Directory/File parameter - {0}")]
    Argument(String),
    /// Malformed request or command payload.
    #[error("Unable to parse request: {0}")]
    Parse(String),
    #[error("{0}")]
    Lookup(String),
    #[error("Unknown command {0}")]
    UnknownCommand(String),
    /// Serialize or write failure while saving; the message carries its own context.
    #[error("{0}")]
    Persistence(String),
    /// Source text could not be parsed or generated by a document codec.
    #[error("Codec error: {0}")]
    Codec(String),
    #[error("File System error: {0}")]
    Io(String),
    #[error("Duplicate identifier: {0}")]
    Duplicate(String),
    #[error("Invalid attribute: {0}")]
    InvalidAttribute(String),
    #[error("Invalid relation: {0}")]
    InvalidRelation(String),
    #[error("Request cancelled")]
    Cancelled,
}

impl AssuranceError {
    pub fn node_not_found(id: &str) -> Self {
        AssuranceError::Lookup(format!("Node not found ID = {id}"))
    }

    pub fn child_not_found(id: &str) -> Self {
        AssuranceError::Lookup(format!("Child Node not found ID = {id}"))
    }
}

impl From<toml::de::Error> for AssuranceError {
    fn from(src: toml::de::Error) -> AssuranceError {
        AssuranceError::Parse(format!("Toml deserialization error: {src}"))
    }
}

impl From<JsonError> for AssuranceError {
    fn from(src: JsonError) -> AssuranceError {
        AssuranceError::Parse(format!("JSON (de)serialization error: {src}"))
    }
}

impl From<uuid::Error> for AssuranceError {
    fn from(src: uuid::Error) -> AssuranceError {
        AssuranceError::InvalidAttribute(format!("UUID conversion failed: {src}"))
    }
}

impl From<io::Error> for AssuranceError {
    fn from(x: io::Error) -> Self {
        match x.kind() {
            io::ErrorKind::NotFound => AssuranceError::Io(format!("not found: {x}")),
            io::ErrorKind::PermissionDenied => AssuranceError::Io(format!("permission denied: {x}")),
            _ => AssuranceError::Io(format!("IOError: {}", x.kind())),
        }
    }
}

impl From<fmt::Error> for AssuranceError {
    fn from(x: fmt::Error) -> Self {
        AssuranceError::Codec(format!("{x}"))
    }
}
