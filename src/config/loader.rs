use crate::analysis::applinks::EmptySchemePolicy;
use miette::{IntoDiagnostic, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Configuration for an applinkcheck run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Target directories to scan for manifests
    pub targets: Vec<PathBuf>,

    /// Patterns to exclude from discovery
    pub exclude: Vec<String>,

    /// Report configuration
    pub report: ReportConfig,

    /// Which issues are reported
    pub checks: ChecksConfig,

    /// How manifest values are resolved
    pub manifest: ManifestConfig,

    /// Test URL matching behaviour
    pub matching: MatchingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Output format: terminal, json, sarif
    pub format: String,

    /// Print the offending source line under each diagnostic
    pub show_source: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChecksConfig {
    /// Issue ids that are never reported, e.g. `AppLinkWarning`
    pub disabled: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestConfig {
    /// Values for `${name}` manifest placeholders
    pub placeholders: HashMap<String, String>,

    /// Value of `${applicationId}`; the manifest `package` when unset
    pub application_id: Option<String>,

    /// Resolve `@string/...` references from `res/values*`
    pub resolve_resources: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// What a filter without any scheme matches
    pub empty_scheme: EmptySchemePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            targets: vec![],
            exclude: vec![
                "**/build/**".to_string(),
                "**/generated/**".to_string(),
                "**/.gradle/**".to_string(),
                "**/.idea/**".to_string(),
            ],
            report: ReportConfig::default(),
            checks: ChecksConfig::default(),
            manifest: ManifestConfig::default(),
            matching: MatchingConfig::default(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: "terminal".to_string(),
            show_source: true,
        }
    }
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            placeholders: HashMap::new(),
            application_id: None,
            resolve_resources: true,
        }
    }
}

impl Config {
    /// Load configuration from a file (YAML or TOML)
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match extension {
            "yml" | "yaml" => serde_yaml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse YAML config"),
            "toml" => toml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse TOML config"),
            _ => {
                if let Ok(config) = serde_yaml::from_str(&contents) {
                    Ok(config)
                } else {
                    toml::from_str(&contents)
                        .into_diagnostic()
                        .wrap_err("Failed to parse config file")
                }
            }
        }
    }

    /// Try to load configuration from default locations
    pub fn from_default_locations(project_root: &Path) -> Result<Self> {
        let default_names = [
            ".applinkcheck.yml",
            ".applinkcheck.yaml",
            ".applinkcheck.toml",
            "applinkcheck.yml",
            "applinkcheck.yaml",
            "applinkcheck.toml",
        ];

        for name in &default_names {
            let path = project_root.join(name);
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Check if a path matches one of the exclusion patterns
    pub fn should_exclude(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy().replace('\\', "/");
        self.exclude
            .iter()
            .any(|pattern| glob_match(pattern, &path_str))
    }
}

/// Simple glob matching for patterns like "**/build/**" or "*Test*"
fn glob_match(pattern: &str, text: &str) -> bool {
    if pattern.starts_with("**/") && pattern.ends_with("/**") {
        // A whole directory name anywhere in the path
        let dir_name = pattern.trim_start_matches("**/").trim_end_matches("/**");
        return text.contains(&format!("/{}/", dir_name))
            || text.starts_with(&format!("{}/", dir_name));
    }

    if let Some((prefix, suffix)) = pattern.split_once("**") {
        let prefix = prefix.trim_end_matches('/');
        let suffix = suffix.trim_start_matches('/');
        let prefix_ok =
            prefix.is_empty() || text.starts_with(prefix) || text.contains(&format!("/{}/", prefix));
        let suffix_ok =
            suffix.is_empty() || text.ends_with(suffix) || text.contains(&format!("/{}", suffix));
        return prefix_ok && suffix_ok;
    }

    if let Some(suffix) = pattern.strip_prefix('*') {
        if !suffix.contains('*') {
            return text.ends_with(suffix);
        }
    }

    if let Some(prefix) = pattern.strip_suffix('*') {
        if !prefix.contains('*') {
            return text.starts_with(prefix);
        }
    }

    text == pattern
}
