mod loader;

pub use loader::{ChecksConfig, Config, ManifestConfig, MatchingConfig, ReportConfig};
