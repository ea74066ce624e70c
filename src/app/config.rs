use crate::app::models::{CustomGroup, Ecosystem, GroupingStrategy, Settings};
use crate::app::paths::absolutize;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML config {path}: {source}")]
    ParseYaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to resolve base_path {path}: {source}")]
    BasePath {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid glob pattern {pattern:?}: {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

#[derive(Deserialize, Debug)]
struct EcosystemsFile {
    #[serde(deserialize_with = "ordered_ecosystems")]
    ecosystems: Vec<Ecosystem>,
}

#[derive(Deserialize, Debug)]
struct EcosystemSpec {
    files: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct SettingsFile {
    settings: RawSettings,
}

#[derive(Deserialize, Debug)]
struct RawSettings {
    base_path: String,
    branch: String,
    #[serde(default)]
    intervals: HashMap<String, String>,
    pull_requests_limit: u32,
    #[serde(default)]
    ignored_paths: Vec<String>,
    #[serde(default)]
    grouping_strategy: GroupingStrategy,
    #[serde(default)]
    custom_groups: Vec<CustomGroup>,
}

/// The mapping order of `ecosystems` decides output order, so it is read
/// into a Vec rather than a HashMap.
fn ordered_ecosystems<'de, D>(deserializer: D) -> Result<Vec<Ecosystem>, D::Error>
where
    D: Deserializer<'de>,
{
    struct EcosystemsVisitor;

    impl<'de> Visitor<'de> for EcosystemsVisitor {
        type Value = Vec<Ecosystem>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a mapping of ecosystem name to {files: [...]}")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut ecosystems = Vec::new();
            while let Some((name, spec)) = map.next_entry::<String, EcosystemSpec>()? {
                ecosystems.push(Ecosystem {
                    name,
                    files: spec.files,
                });
            }
            Ok(ecosystems)
        }
    }

    deserializer.deserialize_map(EcosystemsVisitor)
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })
}

pub fn load_ecosystems(path: &Path) -> Result<Vec<Ecosystem>, ConfigError> {
    parse_ecosystems_str(&read(path)?, &path.display().to_string())
}

pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    parse_settings_str(&read(path)?, &path.display().to_string())
}

fn parse_ecosystems_str(content: &str, origin: &str) -> Result<Vec<Ecosystem>, ConfigError> {
    let parsed: EcosystemsFile =
        serde_yaml::from_str(content).map_err(|e| ConfigError::ParseYaml {
            path: origin.to_string(),
            source: e,
        })?;
    Ok(parsed.ecosystems)
}

fn parse_settings_str(content: &str, origin: &str) -> Result<Settings, ConfigError> {
    let parsed: SettingsFile = serde_yaml::from_str(content).map_err(|e| ConfigError::ParseYaml {
        path: origin.to_string(),
        source: e,
    })?;
    let raw = parsed.settings;

    let base_path = absolutize(Path::new(&raw.base_path)).map_err(|e| ConfigError::BasePath {
        path: raw.base_path.clone(),
        source: e,
    })?;

    Ok(Settings {
        base_path,
        branch: raw.branch,
        intervals: raw.intervals,
        pull_requests_limit: raw.pull_requests_limit,
        ignored_paths: raw.ignored_paths,
        grouping_strategy: raw.grouping_strategy,
        custom_groups: raw.custom_groups,
    })
}
