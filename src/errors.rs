//! Error types for the pimgroups application.
//!
//! This module defines custom error types that categorize the different failures
//! that can occur while loading, editing, linking and searching groups.

use std::{io, path::PathBuf};

use thiserror::Error;

/// The main error type for the pimgroups application.
#[derive(Error, Debug)]
pub enum PimError {
    /// Errors related to file I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed or unrecognized JSON.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Errors related to zip operations.
    #[error("Zip error: {0}")]
    ZipError(#[from] zip::result::ZipError),

    /// The requested group (or a note inside it) does not exist.
    #[error("Group not found: {name}")]
    GroupNotFound { name: String },

    /// A group with the same name already exists.
    #[error("Group already exists: {name}")]
    GroupAlreadyExists { name: String },

    /// Note was not found inside a group.
    #[error("Note not found: {id}")]
    NoteNotFound { id: String },

    /// Valid JSON, but not a shape we can use.
    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },

    /// A link creation request was rejected before any state was touched.
    #[error("Invalid link: {message}")]
    InvalidLink { message: String },

    /// Search with no terms and no date filters.
    #[error("Search criteria are empty: enter a term or a date range")]
    EmptyCriteria,

    #[error("Invalid search criteria: {message}")]
    InvalidCriteria { message: String },

    /// Errors related to archive operations.
    #[error("Archive failed: {message}")]
    ArchiveFailed { message: String },

    /// Errors related to configuration.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Directory creation or access failed.
    #[error("Failed to create or access directory: {path}")]
    DirectoryError { path: PathBuf },

    #[error("{message}")]
    EditorError { message: String },

    /// Generic application error with a custom message.
    #[error("{message}")]
    ApplicationError { message: String },
}
