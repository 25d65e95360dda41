//! Core types for XLIFF 1.2 translation files: the document model, the
//! target-state vocabulary and the error taxonomy shared by every crate.

use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod model;
pub mod state;

pub use model::{
    LineEnding, Note, NoteSource, ProductInfo, RefreshHint, Target, ToolHeader,
    TranslationDocument, TranslationUnit, DEFAULT_DATATYPE, DEFAULT_GROUP_ID,
};
pub use state::{
    Completion, CompletionSignal, Marking, TargetState, TranslationMode, TranslationToken,
    EXACT_MATCH,
};

pub type Result<T> = std::result::Result<T, XlfError>;

#[derive(Debug, Error)]
pub enum XlfError {
    /// Not well-formed XML, or a broken `<target>` caught by the lexical pre-check.
    #[error("{} is not a valid XML document at offset {offset} (length {length}): {message}", display_path(.path))]
    MalformedDocument {
        path: Option<PathBuf>,
        offset: usize,
        length: usize,
        message: String,
    },

    #[error("{} is missing required element or attribute '{element}'", display_path(.path))]
    MissingRequiredElement {
        path: Option<PathBuf>,
        element: String,
    },

    #[error("invalid trans-unit '{id}' in {}: {message}", display_path(.path))]
    InvalidUnit {
        path: Option<PathBuf>,
        id: String,
        message: String,
    },

    #[error("Translation unit with id {id} not found.")]
    UnitNotFound { id: String },

    #[error("invalid filter '{filter}'")]
    InvalidFilter { filter: String },

    #[error("invalid translation mode '{mode}' (expected 'external' or 'tokens')")]
    InvalidMode { mode: String },

    #[error("invalid pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    #[error("{} already exists", .path.display())]
    DuplicateOutput { path: PathBuf },

    #[error("no {what} found in {}", .dir.display())]
    MissingFile { dir: PathBuf, what: String },

    #[error("expected one generator file in {}, found {count}", .dir.display())]
    AmbiguousGenerator { dir: PathBuf, count: usize },

    #[error("invalid target state '{value}'")]
    InvalidState { value: String },

    #[error("failed to write XML: {0}")]
    Serialize(String),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn display_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => p.display().to_string(),
        None => "document".to_string(),
    }
}

impl XlfError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        XlfError::Io {
            path: path.into(),
            source,
        }
    }

    /// Attach a file path to a parse error raised on in-memory text.
    pub fn with_path(self, file: &Path) -> Self {
        match self {
            XlfError::MalformedDocument {
                path: None,
                offset,
                length,
                message,
            } => XlfError::MalformedDocument {
                path: Some(file.to_path_buf()),
                offset,
                length,
                message,
            },
            XlfError::MissingRequiredElement {
                path: None,
                element,
            } => XlfError::MissingRequiredElement {
                path: Some(file.to_path_buf()),
                element,
            },
            XlfError::InvalidUnit {
                path: None,
                id,
                message,
            } => XlfError::InvalidUnit {
                path: Some(file.to_path_buf()),
                id,
                message,
            },
            other => other,
        }
    }

    /// Errors that come from the content of a file rather than the file system.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            XlfError::MalformedDocument { .. }
                | XlfError::MissingRequiredElement { .. }
                | XlfError::InvalidUnit { .. }
        )
    }
}
