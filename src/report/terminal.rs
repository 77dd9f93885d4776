use super::{FileReport, Summary};
use crate::analysis::{Diagnostic, Severity};
use colored::Colorize;
use miette::Result;

/// Lint-style text output with colors
pub struct TerminalReporter {
    /// Print the source line and an underline below each diagnostic
    show_source: bool,
}

impl TerminalReporter {
    pub fn new() -> Self {
        Self { show_source: true }
    }

    pub fn with_source(mut self, show: bool) -> Self {
        self.show_source = show;
        self
    }

    pub fn report(&self, files: &[FileReport]) -> Result<()> {
        print!("{}", self.render(files));
        Ok(())
    }

    /// The whole report as text
    pub fn render(&self, files: &[FileReport]) -> String {
        let summary = Summary::from_files(files);
        if summary.total() == 0 {
            return format!("{}\n", "No issues found.".green().bold());
        }

        let mut out = String::new();
        for file in files {
            for diagnostic in &file.diagnostics {
                self.render_diagnostic(file, diagnostic, &mut out);
            }
        }

        let counts = format!("{} errors, {} warnings", summary.errors, summary.warnings);
        if summary.errors > 0 {
            out.push_str(&format!("{}\n", counts.red().bold()));
        } else {
            out.push_str(&format!("{}\n", counts.yellow().bold()));
        }
        out
    }

    fn render_diagnostic(&self, file: &FileReport, diagnostic: &Diagnostic, out: &mut String) {
        let severity = diagnostic.severity.label();
        let severity = match diagnostic.severity {
            Severity::Fatal | Severity::Error => severity.red().bold(),
            Severity::Warning => severity.yellow().bold(),
            Severity::Info => severity.blue().bold(),
        };

        let span = diagnostic.location.span;
        out.push_str(&format!(
            "{}:{}: {}: {} [{}]\n",
            diagnostic.location.file.display().to_string().cyan(),
            span.start.line,
            severity,
            diagnostic.message,
            diagnostic.issue.id().dimmed()
        ));

        if !self.show_source {
            return;
        }
        let Some(line) = file.line_text(span.start.line) else {
            return;
        };
        out.push_str(line);
        out.push('\n');
        out.push_str(&underline(line, span.start.column, single_line_width(diagnostic)));
        out.push('\n');
    }
}

impl Default for TerminalReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Width of the `~` underline, or `None` for a span crossing lines
fn single_line_width(diagnostic: &Diagnostic) -> Option<usize> {
    let span = diagnostic.location.span;
    if span.start.line == span.end.line {
        Some(span.end.column.saturating_sub(span.start.column).max(1))
    } else {
        None
    }
}

fn underline(line: &str, column: usize, width: Option<usize>) -> String {
    let indent: String = line
        .chars()
        .take(column.saturating_sub(1))
        .map(|c| if c == '\t' { '\t' } else { ' ' })
        .collect();
    match width {
        Some(width) => format!("{}{}", indent, "~".repeat(width)),
        None => format!("{}^", indent),
    }
}
