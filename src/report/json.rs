use super::{FileReport, Summary};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::PathBuf;

/// JSON reporter for programmatic output
pub struct JsonReporter {
    output_path: Option<PathBuf>,
}

impl JsonReporter {
    pub fn new(output_path: Option<PathBuf>) -> Self {
        Self { output_path }
    }

    pub fn report(&self, files: &[FileReport]) -> Result<()> {
        let report = JsonReport::from_files(files);
        let json = serde_json::to_string_pretty(&report).into_diagnostic()?;

        if let Some(path) = &self.output_path {
            std::fs::write(path, &json).into_diagnostic()?;
            println!("Report written to: {}", path.display());
        } else {
            println!("{}", json);
        }

        Ok(())
    }
}

#[derive(Serialize)]
struct JsonReport {
    version: &'static str,
    files_checked: usize,
    total_issues: usize,
    issues: Vec<JsonIssue>,
    summary: JsonSummary,
}

#[derive(Serialize)]
struct JsonIssue {
    id: &'static str,
    severity: &'static str,
    message: String,
    file: String,
    line: usize,
    column: usize,
    end_line: usize,
    end_column: usize,
}

#[derive(Serialize)]
struct JsonSummary {
    errors: usize,
    warnings: usize,
    infos: usize,
}

impl JsonReport {
    fn from_files(files: &[FileReport]) -> Self {
        let issues: Vec<JsonIssue> = files
            .iter()
            .flat_map(|file| &file.diagnostics)
            .map(|d| JsonIssue {
                id: d.issue.id(),
                severity: d.severity.as_str(),
                message: d.message.clone(),
                file: d.location.file.to_string_lossy().to_string(),
                line: d.location.span.start.line,
                column: d.location.span.start.column,
                end_line: d.location.span.end.line,
                end_column: d.location.span.end.column,
            })
            .collect();

        let summary = Summary::from_files(files);
        JsonReport {
            version: env!("CARGO_PKG_VERSION"),
            files_checked: files.len(),
            total_issues: issues.len(),
            issues,
            summary: JsonSummary {
                errors: summary.errors,
                warnings: summary.warnings,
                infos: summary.infos,
            },
        }
    }
}
