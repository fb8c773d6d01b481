use super::components::{ComponentCatalog, ALL_WITHOUT_SUBMISSIONS};
use super::index::{ComponentFilter, FileFilter, FileIndex};
use super::mimetype::MimeFilter;
use super::schema::{ComponentCategory, Context, PaginatedFileList};
use crate::error::{CourseFilesError, Result};
use crate::strings::Translator;
use std::collections::HashMap;
use std::sync::Arc;

/// Filtered, paginated listing of the files below a context.
///
/// Pages are cached per `(offset, limit)`; the filter set is fixed for the
/// lifetime of the query, so a new filter needs a new query.
pub struct FileQuery {
    index: FileIndex,
    scope: Context,
    catalog: ComponentCatalog,
    component: String,
    file_type: String,
    filter: Option<FileFilter>,
    pages: HashMap<(usize, usize), PaginatedFileList>,
    total: Option<usize>,
}

impl FileQuery {
    pub fn new(
        index: FileIndex,
        scope: Context,
        strings: Arc<dyn Translator>,
        component: &str,
        file_type: &str,
    ) -> Self {
        Self {
            catalog: ComponentCatalog::new(index.clone(), scope.clone(), strings),
            index,
            scope,
            component: component.to_string(),
            file_type: file_type.to_string(),
            filter: None,
            pages: HashMap::new(),
            total: None,
        }
    }

    pub fn components(&mut self) -> Result<&[ComponentCategory]> {
        self.catalog.components()
    }

    pub fn page(&mut self, offset: usize, limit: usize) -> Result<&PaginatedFileList> {
        let key = (offset, limit);
        if !self.pages.contains_key(&key) {
            let page = self.fetch(offset, limit)?;
            self.pages.insert(key, page);
        }
        let page = &self.pages[&key];
        self.total = Some(page.total);
        Ok(page)
    }

    /// Total number of matching files; known once a page was listed.
    pub fn total(&self) -> Result<usize> {
        self.total.ok_or(CourseFilesError::NotYetComputed)
    }

    fn fetch(&mut self, offset: usize, limit: usize) -> Result<PaginatedFileList> {
        let filter = self.filter()?;
        let files = self.index.list(&self.scope, &filter, offset, limit)?;

        // A short page tells the total, unless it is an empty page past the
        // end, which says nothing about how many rows came before.
        let inferred = offset.checked_add(files.len());
        let total = match inferred {
            Some(total) if files.len() < limit && (!files.is_empty() || offset == 0) => total,
            _ => self.index.count(&self.scope, &filter)?,
        };
        tracing::debug!(
            scope = self.scope.id,
            offset,
            limit,
            returned = files.len(),
            total,
            "file page listed"
        );

        Ok(PaginatedFileList {
            files,
            offset,
            limit,
            total,
        })
    }

    fn filter(&mut self) -> Result<FileFilter> {
        if let Some(filter) = &self.filter {
            return Ok(filter.clone());
        }
        let component = if self.component == ALL_WITHOUT_SUBMISSIONS {
            Some(ComponentFilter::WithoutSubmissions)
        } else if self.catalog.contains(&self.component)? {
            Some(ComponentFilter::Only(self.component.clone()))
        } else {
            None
        };
        let filter = FileFilter {
            component,
            mimetype: MimeFilter::for_selector(&self.file_type),
        };
        self.filter = Some(filter.clone());
        Ok(filter)
    }
}
