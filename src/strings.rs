//! Translated labels, keyed by (string key, owning component).
//!
//! The host's string manager is modelled by the [`Translator`] trait; the
//! crate ships a [`StringCatalog`] with English defaults that configuration
//! can override.

use std::collections::HashMap;

/// Component under which this crate's own strings live.
pub const PLUGIN_COMPONENT: &str = "coursefiles";

/// Lookup service for display strings.
///
/// `None` means the string does not exist (or the service cannot answer);
/// callers fall back to the raw key.
pub trait Translator: Send + Sync {
    fn lookup(&self, key: &str, component: &str) -> Option<String>;
}

const DEFAULTS: &[(&str, &str, &str)] = &[
    (PLUGIN_COMPONENT, "all_files", "All files"),
    (PLUGIN_COMPONENT, "all_wo_submissions", "All files except submissions"),
    (PLUGIN_COMPONENT, "filetype_all", "All"),
    (PLUGIN_COMPONENT, "filetype_document", "Document"),
    (PLUGIN_COMPONENT, "filetype_image", "Image"),
    (PLUGIN_COMPONENT, "filetype_audio", "Audio"),
    (PLUGIN_COMPONENT, "filetype_video", "Video"),
    (PLUGIN_COMPONENT, "filetype_text", "Text"),
    (PLUGIN_COMPONENT, "filetype_archive", "Archive"),
    (PLUGIN_COMPONENT, "filetype_other", "Other"),
    ("license", "unknown", "Licence not specified"),
    ("license", "allrightsreserved", "All rights reserved"),
    ("license", "public", "Public domain"),
    ("license", "cc", "Creative Commons"),
    ("license", "cc-nd", "Creative Commons - NoDerivs"),
    ("license", "cc-nc-nd", "Creative Commons - No Commercial NoDerivs"),
    ("license", "cc-nc", "Creative Commons - No Commercial"),
    ("license", "cc-nc-sa", "Creative Commons - No Commercial ShareAlike"),
    ("license", "cc-sa", "Creative Commons - ShareAlike"),
    ("mod_assign", "pluginname", "Assignment"),
    ("mod_book", "pluginname", "Book"),
    ("mod_data", "pluginname", "Database"),
    ("mod_folder", "pluginname", "Folder"),
    ("mod_forum", "pluginname", "Forum"),
    ("mod_glossary", "pluginname", "Glossary"),
    ("mod_label", "pluginname", "Text and media area"),
    ("mod_page", "pluginname", "Page"),
    ("mod_resource", "pluginname", "File"),
    ("mod_wiki", "pluginname", "Wiki"),
    ("assignsubmission_file", "pluginname", "File submissions"),
    ("assignfeedback_file", "pluginname", "File feedback"),
    ("", "course", "Course"),
    ("", "user", "User"),
    ("", "question", "Question"),
    ("", "backup", "Backup"),
];

/// In-memory string table.
#[derive(Debug, Clone, Default)]
pub struct StringCatalog {
    strings: HashMap<(String, String), String>,
}

impl StringCatalog {
    /// Empty catalog; every lookup misses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog preloaded with the built-in English strings.
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();
        for (component, key, value) in DEFAULTS {
            catalog.insert(component, key, value);
        }
        catalog
    }

    pub fn insert(&mut self, component: &str, key: &str, value: &str) {
        self.strings
            .insert((component.to_string(), key.to_string()), value.to_string());
    }

    /// Merge `[strings.<component>]` overrides; `core` maps to the empty
    /// component.
    pub fn extend(&mut self, overrides: &HashMap<String, HashMap<String, String>>) {
        for (component, table) in overrides {
            let component = if component == "core" { "" } else { component.as_str() };
            for (key, value) in table {
                self.insert(component, key, value);
            }
        }
    }
}

impl Translator for StringCatalog {
    fn lookup(&self, key: &str, component: &str) -> Option<String> {
        self.strings
            .get(&(component.to_string(), key.to_string()))
            .cloned()
    }
}

/// Display label of a component: its plugin name, else a core string named
/// after it, else the identifier itself.
pub fn component_label(strings: &dyn Translator, component: &str) -> String {
    strings
        .lookup("pluginname", component)
        .or_else(|| strings.lookup(component, ""))
        .unwrap_or_else(|| component.to_string())
}

/// One of this crate's own strings, or the key when it is missing.
pub fn plugin_string(strings: &dyn Translator, key: &str) -> String {
    strings
        .lookup(key, PLUGIN_COMPONENT)
        .unwrap_or_else(|| key.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_label_prefers_plugin_name() {
        let strings = StringCatalog::with_defaults();
        assert_eq!(component_label(&strings, "mod_folder"), "Folder");
    }

    #[test]
    fn component_label_falls_back_to_core_string() {
        let strings = StringCatalog::with_defaults();
        assert_eq!(component_label(&strings, "course"), "Course");
    }

    #[test]
    fn component_label_falls_back_to_identifier() {
        let strings = StringCatalog::new();
        assert_eq!(component_label(&strings, "mod_quiz"), "mod_quiz");
    }

    #[test]
    fn overrides_replace_defaults() {
        let mut strings = StringCatalog::with_defaults();
        let mut overrides = HashMap::new();
        overrides.insert(
            "core".to_string(),
            HashMap::from([("course".to_string(), "Kurs".to_string())]),
        );
        overrides.insert(
            "mod_folder".to_string(),
            HashMap::from([("pluginname".to_string(), "Verzeichnis".to_string())]),
        );
        strings.extend(&overrides);

        assert_eq!(component_label(&strings, "course"), "Kurs");
        assert_eq!(component_label(&strings, "mod_folder"), "Verzeichnis");
    }
}
