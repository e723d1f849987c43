use std::path::PathBuf;

use thiserror::Error;

/// Failures while reading the tag example definitions. All of them abort the run.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("tag directory '{}' could not be read: {source}", path.display())]
    Directory {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("tag file '{}' could not be read: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("tag file '{}' is not valid: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("tag file '{}': example '{example}' is not valid: {source}", path.display())]
    Example {
        path: PathBuf,
        example: String,
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings file '{}' could not be read: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("settings file '{}' is not valid: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("settings file '{}' could not be written: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("settings could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A sign icon is needed for layout math, so every failure here is fatal.
#[derive(Debug, Error)]
pub enum IconError {
    #[error("sign icon '{}' could not be read: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("sign icon '{}' is not a valid svg: {source}", path.display())]
    Parse { path: PathBuf, source: usvg::Error },

    #[error("sign icon '{}' has an empty size", path.display())]
    EmptySize { path: PathBuf },

    #[error("traffic sign code '{code}' is not a plain file name")]
    InvalidCode { code: String },
}

#[derive(Debug, Error)]
pub enum DrawingError {
    #[error("drawing '{file}': cannot {action} while {state}")]
    InvalidState {
        file: String,
        action: &'static str,
        state: &'static str,
    },

    #[error("way '{way}' element {index}: {reason}")]
    InvalidElement {
        way: String,
        index: usize,
        reason: String,
    },

    #[error("canvas of {width}x{height} px is too large")]
    CanvasTooLarge { width: f64, height: f64 },

    #[error("drawing output '{}' could not be written: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("drawing output '{}' could not be re-opened: {source}", path.display())]
    Reopen {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("drawing output '{}' has no closing svg tag", path.display())]
    Malformed { path: PathBuf },

    #[error(transparent)]
    Icon(#[from] IconError),
}

impl DrawingError {
    pub fn invalid_element(way: impl Into<String>, index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidElement {
            way: way.into(),
            index,
            reason: reason.into(),
        }
    }
}
