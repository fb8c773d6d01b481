use super::index::FileIndex;
use super::schema::{ComponentCategory, Context};
use crate::error::Result;
use crate::strings::{component_label, plugin_string, Translator};
use std::sync::Arc;

/// Selector key listing every file.
pub const ALL_COMPONENTS: &str = "all";
/// Selector key listing every file not produced by a submission plugin.
pub const ALL_WITHOUT_SUBMISSIONS: &str = "all_wo_submissions";

/// Components owning files in a context subtree, with display labels.
pub struct ComponentCatalog {
    index: FileIndex,
    scope: Context,
    strings: Arc<dyn Translator>,
    components: Option<Vec<ComponentCategory>>,
}

impl ComponentCatalog {
    pub fn new(index: FileIndex, scope: Context, strings: Arc<dyn Translator>) -> Self {
        Self {
            index,
            scope,
            strings,
            components: None,
        }
    }

    /// Synthetic entries first, then real components sorted by label.
    /// Queried once per catalog.
    pub fn components(&mut self) -> Result<&[ComponentCategory]> {
        if self.components.is_none() {
            let found = self.index.components(&self.scope)?;
            tracing::debug!(scope = self.scope.id, count = found.len(), "components found");

            let mut real: Vec<ComponentCategory> = found
                .into_iter()
                .map(|key| ComponentCategory {
                    label: component_label(self.strings.as_ref(), &key),
                    key,
                })
                .collect();
            real.sort_by_cached_key(|c| c.label.to_lowercase());

            let mut components = vec![
                ComponentCategory {
                    key: ALL_COMPONENTS.to_string(),
                    label: plugin_string(self.strings.as_ref(), "all_files"),
                },
                ComponentCategory {
                    key: ALL_WITHOUT_SUBMISSIONS.to_string(),
                    label: plugin_string(self.strings.as_ref(), "all_wo_submissions"),
                },
            ];
            components.extend(real);
            self.components = Some(components);
        }
        Ok(self.components.as_deref().unwrap_or_default())
    }

    /// Whether `key` names a real component found under the scope.
    pub fn contains(&mut self, key: &str) -> Result<bool> {
        if key == ALL_COMPONENTS || key == ALL_WITHOUT_SUBMISSIONS {
            return Ok(false);
        }
        Ok(self.components()?.iter().any(|c| c.key == key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::index::tests::{ctx, file, open_index};
    use crate::files::schema::{CONTEXT_COURSE, CONTEXT_MODULE};
    use crate::strings::StringCatalog;

    fn strings() -> Arc<dyn Translator> {
        Arc::new(StringCatalog::with_defaults())
    }

    #[test]
    fn synthetic_entries_come_first_even_when_empty() {
        let (_dir, index) = open_index();
        let course = ctx(17, CONTEXT_COURSE, 4, "/1/17");
        index.insert_context(&course).unwrap();

        let mut catalog = ComponentCatalog::new(index, course, strings());
        let keys: Vec<_> = catalog
            .components()
            .unwrap()
            .iter()
            .map(|c| c.key.clone())
            .collect();
        assert_eq!(keys, vec!["all", "all_wo_submissions"]);
    }

    #[test]
    fn real_components_sorted_case_insensitively_by_label() {
        let (_dir, index) = open_index();
        let course = ctx(17, CONTEXT_COURSE, 4, "/1/17");
        index.insert_context(&course).unwrap();
        index.insert_context(&ctx(40, CONTEXT_MODULE, 9, "/1/17/40")).unwrap();
        for component in ["mod_resource", "mod_folder", "assignsubmission_file", "mod_zzz"] {
            index.insert_file(&file(40, component, "content", "a.pdf", "application/pdf")).unwrap();
        }
        index.insert_file(&file(40, "mod_folder", "content", "b.pdf", "application/pdf")).unwrap();

        let mut strings = StringCatalog::with_defaults();
        strings.insert("mod_zzz", "pluginname", "aardvark");
        let mut catalog = ComponentCatalog::new(index, course, Arc::new(strings));
        let labels: Vec<_> = catalog
            .components()
            .unwrap()
            .iter()
            .map(|c| c.label.clone())
            .collect();
        assert_eq!(
            labels,
            vec![
                "All files",
                "All files except submissions",
                "aardvark",
                "File",
                "File submissions",
                "Folder",
            ]
        );
    }

    #[test]
    fn catalog_is_cached() {
        let (_dir, index) = open_index();
        let course = ctx(17, CONTEXT_COURSE, 4, "/1/17");
        index.insert_context(&course).unwrap();
        let mut catalog = ComponentCatalog::new(index.clone(), course, strings());
        assert_eq!(catalog.components().unwrap().len(), 2);

        index.insert_file(&file(17, "course", "section", "a.txt", "text/plain")).unwrap();
        assert_eq!(catalog.components().unwrap().len(), 2);
        assert!(!catalog.contains("course").unwrap());
    }

    #[test]
    fn unknown_labels_fall_back_to_identifier() {
        let (_dir, index) = open_index();
        let course = ctx(17, CONTEXT_COURSE, 4, "/1/17");
        index.insert_context(&course).unwrap();
        index.insert_file(&file(17, "local_custom", "stuff", "a.txt", "text/plain")).unwrap();

        let mut catalog = ComponentCatalog::new(index, course, Arc::new(StringCatalog::new()));
        let last = catalog.components().unwrap().last().unwrap().clone();
        assert_eq!(last.key, "local_custom");
        assert_eq!(last.label, "local_custom");
        assert!(catalog.contains("local_custom").unwrap());
    }
}
