//! Course files: listing, filtering and bulk relicensing of the files
//! stored under a course context.

pub mod components;
pub mod course;
pub mod events;
pub mod index;
pub mod license;
pub mod mimetype;
pub mod pattern;
pub mod query;
pub mod relicense;
pub mod schema;
pub mod urls;

pub use course::CourseFiles;
pub use events::{EventSink, RecordingEventSink, TracingEventSink};
pub use index::FileIndex;
pub use license::LicenseRegistry;
pub use schema::{Context, FileRecord, LicenseChanged, NewFile, PaginatedFileList};
