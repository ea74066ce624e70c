use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    ParseJson {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

// serde_json is built with `preserve_order`, so these maps keep the
// declaration order of the manifest.
#[derive(Deserialize)]
struct PackageJson {
    #[serde(default)]
    dependencies: Map<String, Value>,
    #[serde(default, rename = "devDependencies")]
    dev_dependencies: Map<String, Value>,
}

#[derive(Deserialize)]
struct ComposerJson {
    #[serde(default)]
    require: Map<String, Value>,
    #[serde(default, rename = "require-dev")]
    require_dev: Map<String, Value>,
}

/// Dependency names declared by `file`, or nothing if the file is not a
/// manifest this ecosystem knows how to read.
///
/// Unreadable or malformed manifests are logged and count as empty.
pub fn parse_dependencies(file: &Path, ecosystem: &str) -> Vec<String> {
    match try_parse_dependencies(file, ecosystem) {
        Ok(names) => names,
        Err(err) => {
            log::warn!("Error parsing {}: {}", file.display(), err);
            Vec::new()
        }
    }
}

fn try_parse_dependencies(file: &Path, ecosystem: &str) -> Result<Vec<String>, ManifestError> {
    let name = file.to_string_lossy();

    match ecosystem {
        "npm" if name.ends_with("package.json") => {
            let manifest: PackageJson = read_json(file)?;
            Ok(keys(manifest.dependencies, manifest.dev_dependencies))
        }
        "pip" if name.ends_with("requirements.txt") => {
            let content = read(file)?;
            Ok(requirement_names(&content))
        }
        "composer" if name.ends_with("composer.json") => {
            let manifest: ComposerJson = read_json(file)?;
            Ok(keys(manifest.require, manifest.require_dev))
        }
        _ => Ok(Vec::new()),
    }
}

/// Requirement lines are split on the first `==`; other specifiers are left
/// in the name untouched.
fn requirement_names(content: &str) -> Vec<String> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty() && !line.starts_with('#'))
        .map(|line| line.split("==").next().unwrap_or(line).trim().to_string())
        .collect()
}

fn keys(first: Map<String, Value>, second: Map<String, Value>) -> Vec<String> {
    first.into_iter().chain(second).map(|(key, _)| key).collect()
}

fn read(file: &Path) -> Result<String, ManifestError> {
    fs::read_to_string(file).map_err(|e| ManifestError::Read {
        path: file.display().to_string(),
        source: e,
    })
}

fn read_json<T: DeserializeOwned>(file: &Path) -> Result<T, ManifestError> {
    let content = read(file)?;
    serde_json::from_str(&content).map_err(|e| ManifestError::ParseJson {
        path: file.display().to_string(),
        source: e,
    })
}
