// src/error.rs
// Error taxonomy for header parsing and capture loading

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::header::{Channel, Parameter};

#[derive(Error, Debug)]
pub enum ScopeError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing header parameter: '{0}'")]
    MissingParameter(Parameter),

    /// Unknown header key, or a known key whose value could not be coerced.
    #[error("Invalid header parameter '{key}': {reason}")]
    InvalidParameter { key: String, reason: String },

    #[error("Invalid data in {path:?} at row {row}: {reason}")]
    InvalidData {
        path: PathBuf,
        row: usize,
        reason: String,
    },

    #[error("Sample count mismatch: time={time}, value={value}, expected={expected}")]
    LengthMismatch {
        time: usize,
        value: usize,
        expected: usize,
    },

    #[error("'{token}' is not a known {kind}")]
    UnknownToken { kind: &'static str, token: String },

    #[error("Channels do not share a time base: first difference at sample {index} (CH1 has {ch1} samples, CH2 has {ch2})")]
    TimeBaseMismatch {
        index: usize,
        ch1: usize,
        ch2: usize,
    },

    #[error("No capture files found in {0:?}")]
    EmptyFolder(PathBuf),

    #[error("Unsupported folder structure in {path:?}: found {found} capture files, expected at most 2")]
    CustomFolderStructure { path: PathBuf, found: usize },

    #[error("Channel {channel} declared by more than one file (second: {path:?})")]
    DuplicateChannel { channel: Channel, path: PathBuf },

    #[error("Channel 1 or Channel 2 must have a value")]
    NoChannelDataPresent,
}

impl ScopeError {
    pub(crate) fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        ScopeError::InvalidParameter {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScopeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parameter_message_echoes_key() {
        let err = ScopeError::invalid("Weird entry", "not a recognized parameter");
        assert!(err.to_string().contains("Weird entry"));
    }

    #[test]
    fn test_missing_parameter_message_names_token() {
        let err = ScopeError::MissingParameter(Parameter::RecordLength);
        assert_eq!(err.to_string(), "Missing header parameter: 'Record Length'");
    }
}
