//! applinkcheck - Intent filter and App Link validation for Android manifests
//!
//! Checks the `<intent-filter>` declarations of `AndroidManifest.xml` files:
//! syntax of the `<data>` URI attributes, the structure Android App Links
//! require, and `tools:validation` test URLs that must be accepted by at
//! least one of the activity's intent filters.
//!
//! # Architecture
//!
//! 1. **Discovery** - Find manifests below a project directory
//! 2. **Parsing** - Build a namespaced element tree with source spans
//! 3. **Checking** - Aggregate each intent filter, validate it into a
//!    [`analysis::applinks::UriInfo`] and match test URLs against them
//! 4. **Reporting** - Output diagnostics as text, JSON or SARIF

pub mod analysis;
pub mod config;
pub mod discovery;
pub mod parser;
pub mod report;

pub use analysis::applinks::{AppLinksValidDetector, Matcher, TestUrl, UriInfo};
pub use analysis::{CheckOptions, Diagnostic, Issue, ManifestChecker, Severity};
pub use config::Config;
pub use discovery::FileFinder;
pub use parser::xml::{Manifest, ManifestParser};
pub use report::{ReportFormat, Reporter};
