//! List, filter and bulk-relicense the files attached to a course.
//!
//! The host learning platform owns the file rows; this crate reads them
//! through [`files::FileIndex`], classifies and paginates them, and performs
//! validated license updates that emit one event per changed file.

pub mod config;
pub mod error;
pub mod files;
pub mod strings;

pub use config::Config;
pub use error::{CourseFilesError, Result};
pub use files::CourseFiles;
