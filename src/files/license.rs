use crate::strings::Translator;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Default allow-list, the host's standard license set.
pub const DEFAULT_LICENSES: &str =
    "unknown,allrightsreserved,public,cc,cc-nd,cc-nc-nd,cc-nc,cc-nc-sa,cc-sa";

static COLOR_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*(\S+)\s*([a-fA-F0-9]{6})\s*").expect("license colour pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    pub shortname: String,
    pub fullname: String,
}

/// Display form of a license: its full name and optional hex colour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseLabel {
    pub name: String,
    pub color: Option<String>,
}

impl LicenseLabel {
    pub fn to_html(&self) -> String {
        let name = escape_html(&self.name);
        match &self.color {
            Some(color) => format!("<span style=\"color: #{color}\">{name}</span>"),
            None => name,
        }
    }
}

/// Legal licenses in allow-list order, with their colours.
#[derive(Debug, Clone)]
pub struct LicenseRegistry {
    licenses: Vec<License>,
    colors: HashMap<String, String>,
}

impl LicenseRegistry {
    pub fn new(allow_list: &str, colors: &str, strings: &dyn Translator) -> Self {
        let mut licenses: Vec<License> = Vec::new();
        for code in allow_list.split(',').map(str::trim).filter(|c| !c.is_empty()) {
            if licenses.iter().any(|l| l.shortname == code) {
                continue;
            }
            licenses.push(License {
                shortname: code.to_string(),
                fullname: strings
                    .lookup(code, "license")
                    .unwrap_or_else(|| code.to_string()),
            });
        }
        Self {
            licenses,
            colors: parse_license_colors(colors),
        }
    }

    pub fn licenses(&self) -> &[License] {
        &self.licenses
    }

    pub fn is_allowed(&self, code: &str) -> bool {
        self.licenses.iter().any(|l| l.shortname == code)
    }

    /// Full name of `code` (empty when it is not allowed) with its colour.
    pub fn name_color(&self, code: &str) -> LicenseLabel {
        let name = self
            .licenses
            .iter()
            .find(|l| l.shortname == code)
            .map(|l| l.fullname.clone())
            .unwrap_or_default();
        LicenseLabel {
            name,
            color: self.colors.get(code).cloned(),
        }
    }
}

/// Parse `<code> <rrggbb>` entries out of free text. Later entries win.
pub fn parse_license_colors(text: &str) -> HashMap<String, String> {
    COLOR_ENTRY
        .captures_iter(text)
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
        .collect()
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strings::StringCatalog;

    #[test]
    fn allow_list_keeps_order_and_translates() {
        let strings = StringCatalog::with_defaults();
        let registry = LicenseRegistry::new("cc, public,,custom,cc", "", &strings);
        let codes: Vec<_> = registry.licenses().iter().map(|l| l.shortname.as_str()).collect();
        assert_eq!(codes, vec!["cc", "public", "custom"]);
        assert_eq!(registry.licenses()[1].fullname, "Public domain");
        assert_eq!(registry.licenses()[2].fullname, "custom");
        assert!(registry.is_allowed("custom"));
        assert!(!registry.is_allowed("cc-sa"));
    }

    #[test]
    fn colours_parse_from_free_text() {
        let colors = parse_license_colors("cc 00aa00\n  public   0000FF\nbroken zz\ncc-sa\tABCDEF");
        assert_eq!(colors.get("cc").map(String::as_str), Some("00aa00"));
        assert_eq!(colors.get("public").map(String::as_str), Some("0000FF"));
        assert_eq!(colors.get("cc-sa").map(String::as_str), Some("ABCDEF"));
        assert!(!colors.contains_key("broken"));
    }

    #[test]
    fn name_color_renders_span_only_with_colour() {
        let strings = StringCatalog::with_defaults();
        let registry = LicenseRegistry::new(DEFAULT_LICENSES, "cc 00aa00", &strings);

        let label = registry.name_color("cc");
        assert_eq!(label.to_html(), "<span style=\"color: #00aa00\">Creative Commons</span>");
        assert_eq!(registry.name_color("public").to_html(), "Public domain");
        assert_eq!(registry.name_color("nope").name, "");
    }
}
