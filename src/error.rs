use std::{io, path::PathBuf};

use thiserror::Error;

/// A backing file could not be opened, read or written.
#[derive(Debug, Error)]
#[error("{}: store unavailable ({source})", .path.display())]
pub struct StoreError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

impl StoreError {
    pub fn new(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self { path: path.into(), source }
    }

    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self::new(path, io::Error::new(io::ErrorKind::UnexpectedEof, "empty"))
    }
}

#[derive(Debug, Error)]
pub enum TunableError {
    #[error("unknown parameter `{0}`")]
    UnknownParameter(String),

    #[error("parameter `{0}` is not supported by this kernel")]
    UnsupportedParameter(String),

    /// Write to backing path `index` failed. Paths before `index` were already
    /// written and are left as they are.
    #[error("parameter `{key}`: write to path #{index} failed: {source}")]
    WriteFailed {
        key: String,
        index: usize,
        #[source]
        source: StoreError,
    },

    #[error("parameter `{key}`: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error(transparent)]
    Unavailable(#[from] StoreError),

    #[error("parameter `{0}` has no open session")]
    NoSession(String),

    #[error(transparent)]
    Persist(#[from] PrefsError),
}

impl TunableError {
    /// True for failures that only mean "the hardware did not take the value".
    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, TunableError::WriteFailed { .. } | TunableError::Unavailable(_))
    }
}

#[derive(Debug, Error)]
pub enum PrefsError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("encode preferences: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("tunable `{key}`: {reason}")]
    InvalidDescriptor { key: String, reason: String },

    #[error("duplicate tunable key `{0}`")]
    DuplicateKey(String),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("parse config: {0}")]
    Parse(#[from] serde_json::Error),
}
