use super::FileReport;
use crate::analysis::{Issue, Severity};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::PathBuf;

/// SARIF reporter for CI/CD integration (GitHub, Azure DevOps, etc.)
pub struct SarifReporter {
    output_path: Option<PathBuf>,
}

impl SarifReporter {
    pub fn new(output_path: Option<PathBuf>) -> Self {
        Self { output_path }
    }

    pub fn report(&self, files: &[FileReport]) -> Result<()> {
        let sarif = SarifReport::from_files(files);
        let json = serde_json::to_string_pretty(&sarif).into_diagnostic()?;

        if let Some(path) = &self.output_path {
            std::fs::write(path, &json).into_diagnostic()?;
            println!("SARIF report written to: {}", path.display());
        } else {
            println!("{}", json);
        }

        Ok(())
    }
}

/// SARIF 2.1.0 format
#[derive(Serialize)]
struct SarifReport {
    #[serde(rename = "$schema")]
    schema: &'static str,
    version: &'static str,
    runs: Vec<SarifRun>,
}

#[derive(Serialize)]
struct SarifRun {
    tool: SarifTool,
    results: Vec<SarifResult>,
}

#[derive(Serialize)]
struct SarifTool {
    driver: SarifDriver,
}

#[derive(Serialize)]
struct SarifDriver {
    name: &'static str,
    version: &'static str,
    #[serde(rename = "informationUri")]
    information_uri: &'static str,
    rules: Vec<SarifRule>,
}

#[derive(Serialize)]
struct SarifRule {
    id: &'static str,
    name: &'static str,
    #[serde(rename = "shortDescription")]
    short_description: SarifMessage,
    #[serde(rename = "defaultConfiguration")]
    default_configuration: SarifConfiguration,
}

#[derive(Serialize)]
struct SarifConfiguration {
    level: &'static str,
}

#[derive(Serialize)]
struct SarifResult {
    #[serde(rename = "ruleId")]
    rule_id: &'static str,
    level: &'static str,
    message: SarifMessage,
    locations: Vec<SarifLocation>,
}

#[derive(Serialize)]
struct SarifMessage {
    text: String,
}

#[derive(Serialize)]
struct SarifLocation {
    #[serde(rename = "physicalLocation")]
    physical_location: SarifPhysicalLocation,
}

#[derive(Serialize)]
struct SarifPhysicalLocation {
    #[serde(rename = "artifactLocation")]
    artifact_location: SarifArtifactLocation,
    region: SarifRegion,
}

#[derive(Serialize)]
struct SarifArtifactLocation {
    uri: String,
}

#[derive(Serialize)]
struct SarifRegion {
    #[serde(rename = "startLine")]
    start_line: usize,
    #[serde(rename = "startColumn")]
    start_column: usize,
    #[serde(rename = "endLine")]
    end_line: usize,
    #[serde(rename = "endColumn")]
    end_column: usize,
}

fn sarif_level(severity: Severity) -> &'static str {
    match severity {
        Severity::Fatal | Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Info => "note",
    }
}

fn rule_name(issue: Issue) -> &'static str {
    match issue {
        Issue::TestAppLink => "unmatched-test-url",
        Issue::AppLinkUrlError => "invalid-uri-declaration",
        Issue::AppLinkWarning => "app-link-warning",
        Issue::IntentFilterUniqueDataAttributes => "mixed-data-attributes",
    }
}

impl SarifReport {
    fn from_files(files: &[FileReport]) -> Self {
        let rules = Issue::ALL
            .into_iter()
            .map(|issue| SarifRule {
                id: issue.id(),
                name: rule_name(issue),
                short_description: SarifMessage {
                    text: issue.brief_description().to_string(),
                },
                default_configuration: SarifConfiguration {
                    level: sarif_level(issue.default_severity()),
                },
            })
            .collect();

        let results: Vec<SarifResult> = files
            .iter()
            .flat_map(|file| &file.diagnostics)
            .map(|d| {
                let span = d.location.span;
                SarifResult {
                    rule_id: d.issue.id(),
                    level: sarif_level(d.severity),
                    message: SarifMessage {
                        text: d.message.clone(),
                    },
                    locations: vec![SarifLocation {
                        physical_location: SarifPhysicalLocation {
                            artifact_location: SarifArtifactLocation {
                                uri: d.location.file.to_string_lossy().replace('\\', "/"),
                            },
                            region: SarifRegion {
                                start_line: span.start.line,
                                start_column: span.start.column,
                                end_line: span.end.line,
                                end_column: span.end.column,
                            },
                        },
                    }],
                }
            })
            .collect();

        SarifReport {
            schema: "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json",
            version: "2.1.0",
            runs: vec![SarifRun {
                tool: SarifTool {
                    driver: SarifDriver {
                        name: "applinkcheck",
                        version: env!("CARGO_PKG_VERSION"),
                        information_uri: "https://github.com/KevinDoremy/applinkcheck",
                        rules,
                    },
                },
                results,
            }],
        }
    }
}
