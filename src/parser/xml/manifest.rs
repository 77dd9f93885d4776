use super::{Document, Element, LineIndex};
use miette::{IntoDiagnostic, Result, WrapErr};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A parsed AndroidManifest.xml together with its source text
#[derive(Debug, Clone)]
pub struct Manifest {
    pub path: PathBuf,
    pub source: String,
    pub document: Document,
    pub lines: LineIndex,

    /// `package` attribute of the root element
    pub package: Option<String>,
}

impl Manifest {
    pub fn root(&self) -> &Element {
        &self.document.root
    }

    /// Resolve a component name, handling relative names like ".MainActivity"
    pub fn resolve_class_name(&self, name: &str) -> String {
        resolve_class_name(name, self.package.as_deref())
    }
}

/// Parser for AndroidManifest.xml files
pub struct ManifestParser;

impl ManifestParser {
    pub fn new() -> Self {
        Self
    }

    /// Read and parse the manifest at `path`
    pub fn parse_file(&self, path: &Path) -> Result<Manifest> {
        let contents = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read manifest: {}", path.display()))?;
        self.parse(path, contents)
    }

    /// Parse manifest `contents` that were read from `path`
    pub fn parse(&self, path: &Path, contents: String) -> Result<Manifest> {
        let document = Document::parse(&contents)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to parse manifest: {}", path.display()))?;

        let package = document
            .root
            .attribute("package")
            .map(|attr| attr.value.clone());

        debug!(
            "Parsed manifest {}: root <{}>, package {:?}",
            path.display(),
            document.root.qualified_name,
            package
        );

        Ok(Manifest {
            path: path.to_path_buf(),
            lines: LineIndex::new(&contents),
            source: contents,
            document,
            package,
        })
    }
}

impl Default for ManifestParser {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve_class_name(name: &str, package: Option<&str>) -> String {
    if let Some(relative) = name.strip_prefix('.') {
        match package {
            Some(pkg) => format!("{}.{}", pkg, relative),
            None => relative.to_string(),
        }
    } else if !name.contains('.') {
        match package {
            Some(pkg) => format!("{}.{}", pkg, name),
            None => name.to_string(),
        }
    } else {
        name.to_string()
    }
}
