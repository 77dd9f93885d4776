pub mod applinks;

use crate::config::Config;
use crate::parser::xml::{Manifest, Span, StringResources};
use applinks::{AppLinksValidDetector, EmptySchemePolicy, ValueResolver};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Severity levels for reported issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Fatal,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        }
    }

    /// Label used in lint-style text output, where fatal issues print as errors
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Info => "Information",
            Severity::Warning => "Warning",
            Severity::Error | Severity::Fatal => "Error",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Severity::Error | Severity::Fatal)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Issues reported by the app-links checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Issue {
    /// A `tools:validation` test URL is invalid or not matched
    TestAppLink,

    /// Malformed or incomplete URL declarations in an intent filter
    AppLinkUrlError,

    /// Intent filter looks like an App Link but is missing `autoVerify`
    AppLinkWarning,

    /// A `<data>` tag mixes several URI parts
    IntentFilterUniqueDataAttributes,
}

impl Issue {
    pub const ALL: [Issue; 4] = [
        Issue::TestAppLink,
        Issue::AppLinkUrlError,
        Issue::AppLinkWarning,
        Issue::IntentFilterUniqueDataAttributes,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Issue::TestAppLink => "TestAppLink",
            Issue::AppLinkUrlError => "AppLinkUrlError",
            Issue::AppLinkWarning => "AppLinkWarning",
            Issue::IntentFilterUniqueDataAttributes => "IntentFilterUniqueDataAttributes",
        }
    }

    pub fn default_severity(&self) -> Severity {
        match self {
            Issue::TestAppLink => Severity::Fatal,
            Issue::AppLinkUrlError => Severity::Error,
            Issue::AppLinkWarning => Severity::Warning,
            Issue::IntentFilterUniqueDataAttributes => Severity::Warning,
        }
    }

    pub fn brief_description(&self) -> &'static str {
        match self {
            Issue::TestAppLink => "Unmatched URLs",
            Issue::AppLinkUrlError => "URI invalid",
            Issue::AppLinkWarning => "App Link warning",
            Issue::IntentFilterUniqueDataAttributes => {
                "Data tags should only declare unique attributes"
            }
        }
    }

    /// Look up an issue by id, ignoring case
    pub fn from_id(id: &str) -> Option<Issue> {
        Issue::ALL
            .into_iter()
            .find(|issue| issue.id().eq_ignore_ascii_case(id.trim()))
    }
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Where a diagnostic points to
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Location {
    pub file: PathBuf,
    pub span: Span,
}

impl Location {
    pub fn new(file: impl Into<PathBuf>, span: Span) -> Self {
        Self {
            file: file.into(),
            span,
        }
    }
}

/// A single finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub issue: Issue,
    pub severity: Severity,
    pub message: String,
    pub location: Location,
}

impl Diagnostic {
    pub fn new(issue: Issue, location: Location, message: impl Into<String>) -> Self {
        Self {
            issue,
            severity: issue.default_severity(),
            message: message.into(),
            location,
        }
    }
}

/// Receives diagnostics as checks find them
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Per-run settings shared by every checked manifest
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// Manifest placeholders available to `${name}` substitution
    pub placeholders: HashMap<String, String>,

    /// Overrides the `package` attribute as `${applicationId}`
    pub application_id: Option<String>,

    /// Resolve `@string/...` against `res/values*` beside each manifest
    pub resolve_resources: bool,

    pub empty_scheme: EmptySchemePolicy,

    /// Issues that are not reported
    pub disabled: HashSet<Issue>,
}

impl CheckOptions {
    pub fn from_config(config: &Config) -> Self {
        let mut disabled = HashSet::new();
        for id in &config.checks.disabled {
            match Issue::from_id(id) {
                Some(issue) => {
                    disabled.insert(issue);
                }
                None => warn!("Unknown issue id in disabled checks: {}", id),
            }
        }

        Self {
            placeholders: config.manifest.placeholders.clone(),
            application_id: config.manifest.application_id.clone(),
            resolve_resources: config.manifest.resolve_resources,
            empty_scheme: config.matching.empty_scheme,
            disabled,
        }
    }
}

/// Runs the app-links checks over whole manifests
pub struct ManifestChecker {
    options: CheckOptions,
    detector: AppLinksValidDetector,
}

impl ManifestChecker {
    pub fn new(options: CheckOptions) -> Self {
        let detector = AppLinksValidDetector::new().with_empty_scheme(options.empty_scheme);
        Self { options, detector }
    }

    /// Check one parsed manifest and return its diagnostics sorted by location
    pub fn check(&self, manifest: &Manifest) -> Vec<Diagnostic> {
        let resources = if self.options.resolve_resources {
            StringResources::load_for_manifest(&manifest.path)
        } else {
            StringResources::new()
        };

        let mut placeholders = self.options.placeholders.clone();
        if let Some(application_id) = self
            .options
            .application_id
            .clone()
            .or_else(|| manifest.package.clone())
        {
            placeholders
                .entry("applicationId".to_string())
                .or_insert(application_id);
        }

        let resolver = ValueResolver::new()
            .with_resources(&resources)
            .with_placeholders(&placeholders);

        let mut diagnostics: Vec<Diagnostic> = Vec::new();
        self.detector
            .check_manifest(manifest, &resolver, &mut diagnostics);

        diagnostics.retain(|d| !self.options.disabled.contains(&d.issue));
        sort_diagnostics(&mut diagnostics);

        debug!(
            "{}: {} diagnostics",
            manifest.path.display(),
            diagnostics.len()
        );
        diagnostics
    }

    /// Read, parse and check the manifest at `path`
    pub fn check_file(&self, path: &Path) -> miette::Result<Vec<Diagnostic>> {
        let manifest = crate::parser::xml::ManifestParser::new().parse_file(path)?;
        Ok(self.check(&manifest))
    }
}

impl Default for ManifestChecker {
    fn default() -> Self {
        Self::new(CheckOptions {
            resolve_resources: true,
            ..CheckOptions::default()
        })
    }
}

/// Order diagnostics by file and position, then by message
pub fn sort_diagnostics(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by(|a, b| {
        a.location
            .file
            .cmp(&b.location.file)
            .then(a.location.span.start.offset.cmp(&b.location.span.start.offset))
            .then(a.message.cmp(&b.message))
    });
}
