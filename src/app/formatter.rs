use crate::app::models::{PatternCatalogEntry, UpdateRecord};
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEPENDABOT_FILE: &str = "dependabot.yaml";
pub const PATTERNS_FILE: &str = "package-ecosystem-patterns.yml";

const DEFAULT_INTERVAL: &str = "weekly";

#[derive(Serialize)]
struct DependabotConfig<'a> {
    version: u8,
    updates: Vec<UpdateEntry<'a>>,
}

// Field order here is the key order in the emitted YAML.
#[derive(Serialize)]
struct UpdateEntry<'a> {
    #[serde(rename = "package-ecosystem")]
    package_ecosystem: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    directory: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    directories: Option<&'a [String]>,
    schedule: Schedule<'a>,
    #[serde(rename = "open-pull-requests-limit")]
    open_pull_requests_limit: u32,
    #[serde(rename = "target-branch")]
    target_branch: &'a str,
}

#[derive(Serialize)]
struct Schedule<'a> {
    interval: &'a str,
}

#[derive(Serialize)]
struct PatternList<'a> {
    #[serde(rename = "pattern-list")]
    pattern_list: &'a [PatternCatalogEntry],
}

pub struct OutputGenerator;

impl OutputGenerator {
    pub fn dependabot_yaml(
        updates: &[UpdateRecord],
        branch: &str,
        intervals: &HashMap<String, String>,
        pull_requests_limit: u32,
    ) -> Result<String> {
        let updates = updates
            .iter()
            .map(|update| {
                let ecosystem = update.ecosystem();
                let (name, directory, directories) = match update {
                    UpdateRecord::Directory { directory, .. } => (None, Some(directory.as_str()), None),
                    UpdateRecord::Grouped {
                        name, directories, ..
                    } => (name.as_deref(), None, Some(directories.as_slice())),
                };
                UpdateEntry {
                    package_ecosystem: ecosystem,
                    name,
                    directory,
                    directories,
                    schedule: Schedule {
                        interval: intervals
                            .get(ecosystem)
                            .map_or(DEFAULT_INTERVAL, String::as_str),
                    },
                    open_pull_requests_limit: pull_requests_limit,
                    target_branch: branch,
                }
            })
            .collect();

        let doc = DependabotConfig {
            version: 2,
            updates,
        };
        serde_yaml::to_string(&doc).context("Failed to serialize dependabot configuration")
    }

    pub fn patterns_yaml(entries: &[PatternCatalogEntry]) -> Result<String> {
        serde_yaml::to_string(&PatternList {
            pattern_list: entries,
        })
        .context("Failed to serialize pattern list")
    }

    /// Creates the output directory; must succeed before anything is written.
    pub fn prepare_output_dir(dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {:?}", dir))
    }

    pub fn write(dir: &Path, file_name: &str, content: &str) -> Result<PathBuf> {
        let path = dir.join(file_name);
        fs::write(&path, content).with_context(|| format!("Failed to write {:?}", path))?;
        Ok(path)
    }
}
