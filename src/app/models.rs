use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// One entry of the ecosystem definitions, in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct Ecosystem {
    pub name: String,
    pub files: Vec<String>,
}

/// User settings after loading; `base_path` is always absolute.
#[derive(Debug, Clone)]
pub struct Settings {
    pub base_path: PathBuf,
    pub branch: String,
    pub intervals: HashMap<String, String>,
    pub pull_requests_limit: u32,
    pub ignored_paths: Vec<String>,
    pub grouping_strategy: GroupingStrategy,
    pub custom_groups: Vec<CustomGroup>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum GroupingStrategy {
    /// One update per (ecosystem, directory).
    #[default]
    None,
    PackageEcosystem,
    Custom,
}

impl From<String> for GroupingStrategy {
    fn from(value: String) -> Self {
        match value.as_str() {
            "package-ecosystem" => GroupingStrategy::PackageEcosystem,
            "custom" => GroupingStrategy::Custom,
            _ => GroupingStrategy::None,
        }
    }
}

impl fmt::Display for GroupingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GroupingStrategy::None => "none",
            GroupingStrategy::PackageEcosystem => "package-ecosystem",
            GroupingStrategy::Custom => "custom",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CustomGroup {
    pub name: String,
    #[serde(default)]
    pub directories: Vec<String>,
}

/// Matched manifest files per ecosystem, kept in ecosystem definition order.
///
/// Ecosystems without matches are never stored, and lookups for them yield an
/// empty slice, so "absent" and "empty" read the same downstream.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ScanResult {
    entries: Vec<(String, Vec<PathBuf>)>,
    // Set when `.github/workflows/*.{yml,yaml}` exists, whatever the
    // ecosystem patterns say.
    workflows: bool,
}

impl ScanResult {
    pub fn push(&mut self, ecosystem: &str, file: PathBuf) {
        match self.entries.iter_mut().find(|(name, _)| name == ecosystem) {
            Some((_, files)) => files.push(file),
            None => self.entries.push((ecosystem.to_string(), vec![file])),
        }
    }

    pub fn files(&self, ecosystem: &str) -> &[PathBuf] {
        self.entries
            .iter()
            .find(|(name, _)| name == ecosystem)
            .map(|(_, files)| files.as_slice())
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[PathBuf])> + '_ {
        self.entries
            .iter()
            .map(|(name, files)| (name.as_str(), files.as_slice()))
    }

    pub fn mark_workflows(&mut self) {
        self.workflows = true;
    }

    pub fn has_workflows(&self) -> bool {
        self.workflows
    }

    pub fn total_files(&self) -> usize {
        self.entries.iter().map(|(_, files)| files.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A single planned update, produced by the grouper and rendered by the emitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateRecord {
    Directory {
        ecosystem: String,
        directory: String,
    },
    Grouped {
        ecosystem: String,
        name: Option<String>,
        directories: Vec<String>,
    },
}

impl UpdateRecord {
    pub fn ecosystem(&self) -> &str {
        match self {
            UpdateRecord::Directory { ecosystem, .. } | UpdateRecord::Grouped { ecosystem, .. } => {
                ecosystem
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternCatalogEntry {
    #[serde(rename = "package-ecosystem")]
    pub ecosystem: String,
    #[serde(rename = "folder-patterns")]
    pub folder_patterns: Vec<String>,
    #[serde(rename = "dependency-patterns")]
    pub dependency_patterns: Vec<String>,
}

/// Convenience for callers holding a file path: its parent directory, or the
/// empty path for a bare file name.
pub fn parent_dir(file: &Path) -> &Path {
    file.parent().unwrap_or_else(|| Path::new(""))
}
