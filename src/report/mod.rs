mod json;
mod sarif;
mod terminal;

pub use json::JsonReporter;
pub use sarif::SarifReporter;
pub use terminal::TerminalReporter;

use crate::analysis::{Diagnostic, Severity};
use crate::parser::xml::{LineIndex, Manifest};
use miette::{miette, Result};
use std::path::PathBuf;
use std::str::FromStr;

/// Output format for reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Terminal,
    Json,
    Sarif,
}

impl FromStr for ReportFormat {
    type Err = miette::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "terminal" | "text" => Ok(ReportFormat::Terminal),
            "json" => Ok(ReportFormat::Json),
            "sarif" => Ok(ReportFormat::Sarif),
            other => Err(miette!("Unknown report format: {}", other)),
        }
    }
}

/// The diagnostics of one checked manifest, with the text they point into
#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub source: String,
    lines: LineIndex,
    pub diagnostics: Vec<Diagnostic>,
}

impl FileReport {
    pub fn new(path: PathBuf, source: String, diagnostics: Vec<Diagnostic>) -> Self {
        let lines = LineIndex::new(&source);
        Self {
            path,
            source,
            lines,
            diagnostics,
        }
    }

    pub fn from_manifest(manifest: Manifest, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            path: manifest.path,
            source: manifest.source,
            lines: manifest.lines,
            diagnostics,
        }
    }

    /// Text of a 1-based line of the manifest
    pub fn line_text(&self, line: usize) -> Option<&str> {
        self.lines.line_text(&self.source, line)
    }
}

/// Counts over all reported diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
}

impl Summary {
    pub fn from_files(files: &[FileReport]) -> Self {
        let mut summary = Self::default();
        for diagnostic in files.iter().flat_map(|f| &f.diagnostics) {
            match diagnostic.severity {
                Severity::Fatal | Severity::Error => summary.errors += 1,
                Severity::Warning => summary.warnings += 1,
                Severity::Info => summary.infos += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.errors + self.warnings + self.infos
    }
}

/// Writes check results in the selected format
pub struct Reporter {
    format: ReportFormat,
    output_path: Option<PathBuf>,
    show_source: bool,
}

impl Reporter {
    pub fn new(format: ReportFormat, output_path: Option<PathBuf>) -> Self {
        Self {
            format,
            output_path,
            show_source: true,
        }
    }

    pub fn with_source(mut self, show: bool) -> Self {
        self.show_source = show;
        self
    }

    pub fn report(&self, files: &[FileReport]) -> Result<()> {
        match self.format {
            ReportFormat::Terminal => {
                let reporter = TerminalReporter::new().with_source(self.show_source);
                reporter.report(files)
            }
            ReportFormat::Json => {
                let reporter = JsonReporter::new(self.output_path.clone());
                reporter.report(files)
            }
            ReportFormat::Sarif => {
                let reporter = SarifReporter::new(self.output_path.clone());
                reporter.report(files)
            }
        }
    }
}
