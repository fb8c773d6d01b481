//! Links for a file: where to download it, where to edit the text that
//! embeds it, and whether that text still references it.

use super::index::FileIndex;
use super::schema::{ContentKind, FileRecord};
use crate::error::Result;

/// Path layouts of the host's file serving endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadShape {
    /// `/pluginfile.php/{ctx}/{component}/{area}/0{path}{name}`
    Standard,
    /// `/pluginfile.php/{ctx}/{component}/{area}/{path}{name}`
    WithoutItem,
    /// `/pluginfile.php/{ctx}/{component}/{area}/{item}{path}{name}`
    WithItem,
    /// `/file.php/{course}{path}{name}`
    Legacy,
}

/// Shape the host serves a (component, file area) pair with.
pub fn download_shape(component: &str, filearea: &str) -> Option<DownloadShape> {
    use DownloadShape::*;
    let shape = match (component, filearea) {
        ("mod_folder", "intro")
        | ("mod_folder", "content")
        | ("mod_resource", "intro")
        | ("mod_resource", "content") => Standard,

        ("mod_assign", "intro") | ("mod_label", "intro") => WithoutItem,

        ("assignsubmission_file", "submission_files")
        | ("mod_assign", "introattachment")
        | ("mod_data", "content")
        | ("mod_forum", "post")
        | ("mod_forum", "attachment")
        | ("mod_page", "content")
        | ("mod_page", "intro")
        | ("mod_glossary", "entry")
        | ("mod_wiki", "attachments")
        | ("course", "section") => WithItem,

        ("course", "legacy") => Legacy,

        _ => return None,
    };
    Some(shape)
}

/// Build the download path of `file` in the given shape.
pub fn download_path(shape: DownloadShape, course_id: i64, file: &FileRecord) -> String {
    let tail = format!("{}{}", encode_path(&file.filepath), urlencoding::encode(&file.filename));
    let base = format!(
        "/pluginfile.php/{}/{}/{}",
        file.context_id,
        urlencoding::encode(&file.component),
        urlencoding::encode(&file.filearea)
    );
    match shape {
        DownloadShape::Standard => format!("{base}/0{tail}"),
        DownloadShape::WithoutItem => format!("{base}/{tail}"),
        DownloadShape::WithItem => format!("{base}/{}{tail}", file.item_id),
        DownloadShape::Legacy => format!("/file.php/{course_id}{tail}"),
    }
}

/// Download path of `file`, or `None` when the host has no direct link
/// for its (component, file area) pair.
pub fn download_url(course_id: i64, file: &FileRecord) -> Option<String> {
    download_shape(&file.component, &file.filearea)
        .map(|shape| download_path(shape, course_id, file))
}

/// Per-component behaviour. Components without their own variant use
/// `Default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentHandler {
    Book,
    Folder,
    Default,
}

impl ComponentHandler {
    pub fn for_component(component: &str) -> Self {
        match component {
            "mod_book" => ComponentHandler::Book,
            "mod_folder" => ComponentHandler::Folder,
            _ => ComponentHandler::Default,
        }
    }

    pub fn download_url(&self, course_id: i64, file: &FileRecord) -> Option<String> {
        match (self, file.filearea.as_str()) {
            (ComponentHandler::Book, "chapter") => {
                Some(download_path(DownloadShape::WithItem, course_id, file))
            }
            (ComponentHandler::Folder, "content") => {
                Some(download_path(DownloadShape::Standard, course_id, file))
            }
            _ => download_url(course_id, file),
        }
    }

    /// Where the text embedding `file` is edited.
    pub fn edit_url(&self, file: &FileRecord) -> Option<String> {
        match (self, file.filearea.as_str()) {
            (ComponentHandler::Book, "chapter") => file
                .instance_id
                .map(|cmid| format!("/mod/book/edit.php?cmid={cmid}&id={}", file.item_id)),
            _ if is_module_intro(file) => file
                .instance_id
                .map(|cmid| format!("/course/modedit.php?update={cmid}")),
            _ if file.component == "course" && file.filearea == "section" => {
                Some(format!("/course/editsection.php?id={}", file.item_id))
            }
            _ => None,
        }
    }

    /// Whether the text owning `file` still references it; `None` when the
    /// component gives no way to tell.
    pub fn is_file_used(&self, index: &FileIndex, file: &FileRecord) -> Result<Option<bool>> {
        let (kind, key) = match (self, file.filearea.as_str()) {
            (ComponentHandler::Folder, "content") => return Ok(Some(true)),
            (ComponentHandler::Book, "chapter") => (ContentKind::BookChapter, file.item_id),
            _ if is_module_intro(file) => (ContentKind::Intro, file.context_id),
            _ if file.component == "course" && file.filearea == "section" => {
                (ContentKind::Section, file.item_id)
            }
            _ => return Ok(None),
        };
        let used = index
            .embedded_content(kind, key)?
            .is_some_and(|body| embeds(&body, &file.filename));
        Ok(Some(used))
    }
}

fn is_module_intro(file: &FileRecord) -> bool {
    file.component.starts_with("mod_") && file.filearea == "intro"
}

/// Whether `body` references `filename` the way the host's editor stores
/// embedded files.
pub fn embeds(body: &str, filename: &str) -> bool {
    body.contains(&format!("@@PLUGINFILE@@/{}", urlencoding::encode(filename)))
}

fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
