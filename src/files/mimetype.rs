//! Coarse file type categories derived from MIME types.

use super::pattern::Pattern;
use crate::strings::{plugin_string, Translator};
use rusqlite::types::Value;

/// A named bucket of MIME type patterns.
#[derive(Debug, PartialEq, Eq)]
pub struct MimeCategory {
    pub name: &'static str,
    pub patterns: &'static [&'static str],
}

impl MimeCategory {
    pub fn matches(&self, mimetype: &str) -> bool {
        self.patterns.iter().any(|p| Pattern::parse(p).matches(mimetype))
    }
}

/// Category table, checked in declaration order.
pub static CATEGORIES: &[MimeCategory] = &[
    MimeCategory {
        name: "document",
        patterns: &[
            "application/pdf",
            "application/epub+zip",
            "application/vnd.ms-%",
            "application/vnd.openxmlformats-officedocument%",
        ],
    },
    MimeCategory {
        name: "image",
        patterns: &["image/%"],
    },
    MimeCategory {
        name: "audio",
        patterns: &["audio/%"],
    },
    MimeCategory {
        name: "video",
        patterns: &["video/%"],
    },
    MimeCategory {
        name: "text",
        patterns: &["text/%", "application/x-tex"],
    },
    MimeCategory {
        name: "archive",
        patterns: &[
            "application/zip",
            "application/x-tar",
            "application/g-zip",
            "application/x-rar-compressed",
            "application/x-7z-compressed",
            "application/vnd.moodle.backup",
        ],
    },
];

pub const ALL_TYPES: &str = "all";
pub const OTHER_TYPE: &str = "other";

/// Name of the first category matching `mimetype`, or `None` for "other".
pub fn classify(mimetype: &str) -> Option<&'static str> {
    CATEGORIES
        .iter()
        .find(|category| category.matches(mimetype))
        .map(|category| category.name)
}

pub fn category(name: &str) -> Option<&'static MimeCategory> {
    CATEGORIES.iter().find(|category| category.name == name)
}

/// Restriction on the mimetype column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MimeFilter {
    Category(&'static MimeCategory),
    /// Matches no pattern of any category.
    Other,
}

impl MimeFilter {
    /// Filter for a file type selector; `None` for `all` and unknown
    /// selectors, which do not restrict the listing.
    pub fn for_selector(selector: &str) -> Option<Self> {
        if selector == OTHER_TYPE {
            return Some(MimeFilter::Other);
        }
        category(selector).map(MimeFilter::Category)
    }

    pub fn matches(&self, mimetype: &str) -> bool {
        match self {
            MimeFilter::Category(category) => category.matches(mimetype),
            MimeFilter::Other => !CATEGORIES.iter().any(|c| c.matches(mimetype)),
        }
    }

    pub fn to_sql(&self, column: &str) -> (String, Vec<Value>) {
        let mut clauses = Vec::new();
        let mut params = Vec::new();
        let patterns: Vec<&str> = match self {
            MimeFilter::Category(category) => category.patterns.to_vec(),
            MimeFilter::Other => CATEGORIES
                .iter()
                .flat_map(|c| c.patterns.iter().copied())
                .collect(),
        };
        for raw in patterns {
            let (sql, value) = Pattern::parse(raw).to_sql(column);
            clauses.push(match self {
                MimeFilter::Category(_) => sql,
                MimeFilter::Other => format!("NOT ({sql})"),
            });
            params.push(value);
        }
        let glue = match self {
            MimeFilter::Category(_) => " OR ",
            MimeFilter::Other => " AND ",
        };
        (format!("({})", clauses.join(glue)), params)
    }
}

/// File type selector options: `all`, every category, then `other`.
pub fn file_types(strings: &dyn Translator) -> Vec<(String, String)> {
    std::iter::once(ALL_TYPES)
        .chain(CATEGORIES.iter().map(|c| c.name))
        .chain(std::iter::once(OTHER_TYPE))
        .map(|name| {
            (
                name.to_string(),
                plugin_string(strings, &format!("filetype_{name}")),
            )
        })
        .collect()
}

/// Label of the category a mimetype falls in, or the mimetype itself.
pub fn file_type_translation(strings: &dyn Translator, mimetype: &str) -> String {
    match classify(mimetype) {
        Some(name) => plugin_string(strings, &format!("filetype_{name}")),
        None => mimetype.to_string(),
    }
}
