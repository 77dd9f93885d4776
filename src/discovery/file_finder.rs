use crate::config::Config;
use ignore::WalkBuilder;
use miette::{miette, Result};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

pub const MANIFEST_FILE_NAME: &str = "AndroidManifest.xml";

/// Whether `path` names an Android manifest
pub fn is_manifest(path: &Path) -> bool {
    path.file_name().and_then(|n| n.to_str()) == Some(MANIFEST_FILE_NAME)
}

/// Finds the manifests to check below a project root
pub struct FileFinder<'a> {
    config: &'a Config,
}

impl<'a> FileFinder<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Find all AndroidManifest.xml files under `root`, sorted by path
    ///
    /// A `root` that is itself a file is returned as is, whatever its name.
    pub fn find_manifests(&self, root: &Path) -> Result<Vec<PathBuf>> {
        if root.is_file() {
            return Ok(vec![root.to_path_buf()]);
        }
        if !root.exists() {
            return Err(miette!("Path does not exist: {}", root.display()));
        }

        debug!("Scanning for manifests in: {}", root.display());

        let targets = if self.config.targets.is_empty() {
            vec![root.to_path_buf()]
        } else {
            self.config
                .targets
                .iter()
                .map(|t| root.join(t))
                .collect()
        };

        let mut files: Vec<PathBuf> = targets
            .par_iter()
            .flat_map(|target| self.scan_directory(target))
            .collect();
        files.sort();
        files.dedup();

        debug!("Found {} manifests", files.len());
        Ok(files)
    }

    fn scan_directory(&self, dir: &Path) -> Vec<PathBuf> {
        if !dir.exists() {
            trace!("Directory does not exist: {}", dir.display());
            return Vec::new();
        }

        let walker = WalkBuilder::new(dir)
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .ignore(true)
            .parents(true)
            .follow_links(false)
            .build();

        walker
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| {
                let path = entry.path();
                if !is_manifest(path) {
                    return None;
                }
                if self.config.should_exclude(path) {
                    trace!("Excluding: {}", path.display());
                    return None;
                }

                trace!("Found manifest: {}", path.display());
                Some(path.to_path_buf())
            })
            .collect()
    }
}
