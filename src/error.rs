//! Error types for course file listing and relicensing

use thiserror::Error;

/// Main error type for the course files library
#[derive(Error, Debug)]
pub enum CourseFilesError {
    #[error("Invalid license: {0}")]
    InvalidLicense(String),

    #[error("Too many files: {count} requested, at most {max} allowed")]
    TooManyFiles { count: usize, max: usize },

    /// Contract violation: the total is only known once a page was listed.
    #[error("File count requested before any page was listed")]
    NotYetComputed,

    #[error("Context not found: {0}")]
    ContextNotFound(i64),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, CourseFilesError>;
