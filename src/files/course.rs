use super::events::EventSink;
use super::index::FileIndex;
use super::license::{License, LicenseLabel, LicenseRegistry};
use super::mimetype;
use super::query::FileQuery;
use super::relicense::LicenseUpdate;
use super::schema::{
    ComponentCategory, Context, CourseModule, FileRecord, LicenseUpdateOutcome,
    PaginatedFileList, CONTEXT_COURSE, CONTEXT_MODULE,
};
use super::urls::ComponentHandler;
use crate::error::{CourseFilesError, Result};
use crate::strings::Translator;
use std::collections::HashMap;
use std::sync::Arc;

/// The files of one course, as seen by the listing page: one instance per
/// request, with a fixed component and file type selection.
pub struct CourseFiles {
    course_id: i64,
    context: Context,
    index: FileIndex,
    strings: Arc<dyn Translator>,
    licenses: Arc<LicenseRegistry>,
    sink: Arc<dyn EventSink>,
    query: FileQuery,
    modules: Option<HashMap<i64, CourseModule>>,
}

impl CourseFiles {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        course_id: i64,
        context: Context,
        component: &str,
        file_type: &str,
        index: FileIndex,
        strings: Arc<dyn Translator>,
        licenses: Arc<LicenseRegistry>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let query = FileQuery::new(
            index.clone(),
            context.clone(),
            strings.clone(),
            component,
            file_type,
        );
        Self {
            course_id,
            context,
            index,
            strings,
            licenses,
            sink,
            query,
            modules: None,
        }
    }

    /// Same as [`CourseFiles::new`] with the course's own context as scope.
    pub fn for_course(
        course_id: i64,
        component: &str,
        file_type: &str,
        index: FileIndex,
        strings: Arc<dyn Translator>,
        licenses: Arc<LicenseRegistry>,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self> {
        let context = index
            .course_context(course_id)?
            .ok_or(CourseFilesError::ContextNotFound(course_id))?;
        Ok(Self::new(
            course_id, context, component, file_type, index, strings, licenses, sink,
        ))
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn get_file_list(&mut self, offset: usize, limit: usize) -> Result<&PaginatedFileList> {
        self.query.page(offset, limit)
    }

    /// Number of files matching the selection. Only available after
    /// [`CourseFiles::get_file_list`].
    pub fn get_file_list_total_size(&self) -> Result<usize> {
        self.query.total()
    }

    pub fn get_components(&mut self) -> Result<&[ComponentCategory]> {
        self.query.components()
    }

    pub fn get_available_licenses(&self) -> &[License] {
        self.licenses.licenses()
    }

    pub fn get_license_name_color(&self, code: &str) -> LicenseLabel {
        self.licenses.name_color(code)
    }

    pub fn set_files_license(
        &self,
        ids: impl IntoIterator<Item = i64>,
        license: &str,
    ) -> Result<LicenseUpdateOutcome> {
        LicenseUpdate::new(&self.index, &self.licenses, self.sink.as_ref()).apply(
            ids,
            license,
            &self.context,
        )
    }

    /// View link of the module or course owning a context.
    pub fn get_component_url(&mut self, level: i64, instance_id: i64) -> Result<Option<String>> {
        match level {
            CONTEXT_MODULE => Ok(self
                .modules()?
                .get(&instance_id)
                .map(|cm| format!("/mod/{}/view.php?id={}", cm.modname, cm.id))),
            CONTEXT_COURSE => Ok(Some(format!("/course/view.php?id={}", self.course_id))),
            _ => Ok(None),
        }
    }

    pub fn get_file_download_url(&self, file: &FileRecord) -> Option<String> {
        ComponentHandler::for_component(&file.component).download_url(self.course_id, file)
    }

    pub fn get_file_edit_url(&self, file: &FileRecord) -> Option<String> {
        ComponentHandler::for_component(&file.component).edit_url(file)
    }

    pub fn is_file_used(&self, file: &FileRecord) -> Result<Option<bool>> {
        ComponentHandler::for_component(&file.component).is_file_used(&self.index, file)
    }

    pub fn get_file_types(strings: &dyn Translator) -> Vec<(String, String)> {
        mimetype::file_types(strings)
    }

    pub fn get_file_type_translation(strings: &dyn Translator, mimetype: &str) -> String {
        mimetype::file_type_translation(strings, mimetype)
    }

    /// Label of a file's type using this course's string table.
    pub fn file_type_label(&self, mimetype: &str) -> String {
        mimetype::file_type_translation(self.strings.as_ref(), mimetype)
    }

    fn modules(&mut self) -> Result<&HashMap<i64, CourseModule>> {
        if self.modules.is_none() {
            let modules = self
                .index
                .course_modules(self.course_id)?
                .into_iter()
                .map(|cm| (cm.id, cm))
                .collect();
            self.modules = Some(modules);
        }
        Ok(self.modules.get_or_insert_with(HashMap::new))
    }
}
