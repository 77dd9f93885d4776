//! String resources declared next to a manifest
//!
//! Only `<string>` values are collected; they are what `@string/...`
//! references in `<data>` attributes resolve to.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, trace};

#[derive(Debug, Clone, Default)]
pub struct StringResources {
    values: HashMap<String, String>,
}

impl StringResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `res/values*/*.xml` beside the manifest at `manifest_path`
    ///
    /// Values from the unqualified `values` directory win over qualified
    /// ones such as `values-fr`.
    pub fn load_for_manifest(manifest_path: &Path) -> Self {
        let mut resources = Self::new();
        let Some(res_dir) = manifest_path.parent().map(|dir| dir.join("res")) else {
            return resources;
        };
        if !res_dir.is_dir() {
            return resources;
        }

        let mut value_dirs: Vec<_> = walkdir::WalkDir::new(&res_dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .flatten()
            .filter(|entry| entry.file_type().is_dir())
            .filter(|entry| entry.file_name().to_string_lossy().starts_with("values"))
            .map(|entry| entry.into_path())
            .collect();
        // "values" sorts before every "values-*" directory
        value_dirs.sort();

        for dir in value_dirs {
            let files = walkdir::WalkDir::new(&dir)
                .min_depth(1)
                .max_depth(1)
                .sort_by_file_name()
                .into_iter()
                .flatten()
                .filter(|entry| entry.path().extension().map(|e| e == "xml").unwrap_or(false));
            for entry in files {
                resources.parse_values_xml(entry.path());
            }
        }

        debug!(
            "Loaded {} string resources from {}",
            resources.len(),
            res_dir.display()
        );
        resources
    }

    /// Parse a values XML file, keeping already known names
    fn parse_values_xml(&mut self, file_path: &Path) {
        let content = match fs::read_to_string(file_path) {
            Ok(c) => c,
            Err(e) => {
                debug!("Skipping {}: {}", file_path.display(), e);
                return;
            }
        };
        for (name, value) in parse_strings(&content) {
            self.values.entry(name).or_insert(value);
        }
        trace!("Parsed {}", file_path.display());
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Extract `(name, text)` for every `<string>` element
fn parse_strings(content: &str) -> Vec<(String, String)> {
    let mut reader = Reader::from_str(content);
    reader.trim_text(true);

    let mut strings = Vec::new();
    let mut current: Option<(String, String)> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"string" => {
                let name = e
                    .attributes()
                    .flatten()
                    .find(|attr| attr.key.as_ref() == b"name")
                    .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()));
                current = name.map(|name| (name, String::new()));
            }
            Ok(Event::Text(ref e)) => {
                if let Some((_, text)) = current.as_mut() {
                    if let Ok(value) = e.unescape() {
                        text.push_str(&value);
                    }
                }
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"string" => {
                if let Some((name, text)) = current.take() {
                    strings.push((name, unquote(&text)));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                debug!("Stopped reading values file: {}", e);
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    strings
}

/// Strip the surrounding double quotes Android allows around string values
fn unquote(text: &str) -> String {
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text)
        .to_string()
}
