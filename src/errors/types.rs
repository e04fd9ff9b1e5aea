//! Error type definitions for the EPG enrichment application
//!
//! Pattern-file errors are deliberately narrow: only the structural
//! conditions that abort a whole load appear here. Per-entry problems
//! (a missing sub-element, an empty or uncompilable pattern attribute,
//! an unknown property type) are absorbed inside the loader, surfaced
//! via logs, and never reach a caller.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level application error type
///
/// This enum represents all possible errors that can occur in the
/// application. It uses `thiserror` to provide automatic error trait
/// implementations and proper error chaining.
#[derive(Error, Debug)]
pub enum AppError {
    /// Pattern document load failures
    #[error("Pattern file error: {0}")]
    PatternFile(#[from] PatternFileError),

    /// XMLTV document handling errors
    #[error("XMLTV error: {message}")]
    Xmltv { message: String },

    /// XML serialization errors
    #[error("XML write error: {0}")]
    XmlWrite(#[from] quick_xml::Error),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Create an XMLTV handling error
    pub fn xmltv<S: Into<String>>(message: S) -> Self {
        Self::Xmltv {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

/// Fatal pattern-document load failures
///
/// Each variant independently aborts the whole load: the catalog is never
/// constructed and the caller is expected to disable extraction for the
/// session (see `ShowInfoService`).
#[derive(Error, Debug)]
pub enum PatternFileError {
    /// Document does not exist
    #[error("pattern file not found: {path}")]
    Missing { path: PathBuf },

    /// Document exists but could not be read
    #[error("pattern file unreadable: {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Document read successfully but contained no content
    #[error("pattern file is empty")]
    Empty,

    /// Document is not well-formed XML
    #[error("unable to parse pattern file: {message}")]
    Malformed { message: String },

    /// Root `<showInfo>` element is absent
    #[error("could not find <showInfo> root element")]
    MissingRoot,

    /// Root element carries no `name` attribute
    #[error("<showInfo> element has no name attribute")]
    MissingName,

    /// A required section is absent
    #[error("could not find <{section}> section")]
    MissingSection { section: &'static str },

    /// A required section exists but contains no entry elements
    #[error("<{section}> section contains no <{entry}> entries")]
    EmptySection {
        section: &'static str,
        entry: &'static str,
    },
}
