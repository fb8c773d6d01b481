use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Context level of a course.
pub const CONTEXT_COURSE: i64 = 50;
/// Context level of a course module (activity or resource).
pub const CONTEXT_MODULE: i64 = 70;

/// A node of the host's scoping tree. `path` lists the ancestor ids,
/// slash-delimited, ending with the node's own id (`/1/3/17`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    pub id: i64,
    pub level: i64,
    pub instance_id: i64,
    pub path: String,
}

impl Context {
    /// Whether a context with the given id and path is this one or lies
    /// below it.
    pub fn contains(&self, context_id: i64, path: &str) -> bool {
        context_id == self.id
            || path == self.path
            || path
                .strip_prefix(self.path.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

/// Metadata row of one stored file, joined with its owning context and
/// uploader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: i64,
    pub context_id: i64,
    pub component: String,
    pub filearea: String,
    pub item_id: i64,
    pub filepath: String,
    pub filename: String,
    pub user_id: Option<i64>,
    pub filesize: u64,
    pub mimetype: Option<String>,
    pub license: Option<String>,
    pub author: Option<String>,
    pub time_modified: i64,
    pub context_level: Option<i64>,
    pub instance_id: Option<i64>,
    pub user_fullname: Option<String>,
}

/// Fields a host supplies when it stores a file row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewFile {
    pub context_id: i64,
    pub component: String,
    pub filearea: String,
    pub item_id: i64,
    pub filepath: String,
    pub filename: String,
    pub user_id: Option<i64>,
    pub filesize: u64,
    pub mimetype: Option<String>,
    pub license: Option<String>,
    pub author: Option<String>,
    pub time_modified: i64,
}

/// Authoritative scope of a file as re-read from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileScope {
    pub id: i64,
    pub context_id: i64,
    pub path: String,
}

/// Filter option for the component selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentCategory {
    pub key: String,
    pub label: String,
}

/// One page of a filtered file listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedFileList {
    pub files: Vec<FileRecord>,
    pub offset: usize,
    pub limit: usize,
    pub total: usize,
}

/// A course module as listed in the course's module info.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseModule {
    pub id: i64,
    pub course_id: i64,
    pub modname: String,
}

/// Text fields that may embed files (`@@PLUGINFILE@@/<name>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// Module intro, keyed by the module's context id.
    Intro,
    /// Book chapter body, keyed by chapter id.
    BookChapter,
    /// Course section summary, keyed by section id.
    Section,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Intro => "intro",
            ContentKind::BookChapter => "book_chapter",
            ContentKind::Section => "section",
        }
    }
}

/// Emitted once per file whose license was changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LicenseChanged {
    pub event_name: String,
    pub context_id: i64,
    pub object_id: i64,
    pub other: LicenseChangedOther,
    pub time_created: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LicenseChangedOther {
    pub license: String,
}

impl LicenseChanged {
    pub const NAME: &'static str = "license_changed";

    pub fn new(context_id: i64, file_id: i64, license: &str) -> Self {
        Self {
            event_name: Self::NAME.to_string(),
            context_id,
            object_id: file_id,
            other: LicenseChangedOther {
                license: license.to_string(),
            },
            time_created: Utc::now(),
        }
    }
}

/// Result of a relicense request. Ids missing from `updated` were outside
/// the caller's scope or do not exist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseUpdateOutcome {
    pub requested: Vec<i64>,
    pub updated: Vec<i64>,
}
