// Declare modules
pub mod catalog;
pub mod cli;
pub mod config;
pub mod formatter;
pub mod grouping;
pub mod manifest;
pub mod models;
pub mod paths;
pub mod scanner;

use anyhow::{Context, Result};
use clap::Parser;

use self::catalog::{build_catalog, collect_dependency_patterns};
use self::cli::{Cli, Output};
use self::config::{load_ecosystems, load_settings};
use self::formatter::{OutputGenerator, DEPENDABOT_FILE, PATTERNS_FILE};
use self::grouping::group_updates;
use self::models::{Ecosystem, ScanResult, Settings};
use self::scanner::Scanner;

/// Initializes components and orchestrates data flow.
pub fn run() -> Result<()> {
    // 1. Parse Args
    let args = Cli::parse();

    // 2. Load Configuration (fatal before any scanning)
    let ecosystems = load_ecosystems(&args.ecosystems)?;
    let settings = load_settings(&args.settings)?;
    let scanner = Scanner::new(&settings.base_path, &ecosystems, &settings.ignored_paths)?;
    OutputGenerator::prepare_output_dir(&args.output_dir)?;

    // 3. Scan Repository
    println!("Scanning repository at {}...", settings.base_path.display());
    let found = scanner
        .scan()
        .with_context(|| format!("Failed to scan {}", settings.base_path.display()))?;
    log::info!("Found {} dependency file(s)", found.total_files());

    if found.is_empty() {
        log::warn!("⚠️ No dependency files matched the configured ecosystems.");
    }

    // 4. Build Documents
    let mut documents = Vec::new();
    if args.wants(Output::Dependabot) {
        documents.push((DEPENDABOT_FILE, dependabot_document(&found, &settings)?));
    }
    if args.wants(Output::Patterns) {
        documents.push((PATTERNS_FILE, patterns_document(&found, &ecosystems, &settings)?));
    }

    // 5. Write Output
    for (file_name, content) in documents {
        let path = OutputGenerator::write(&args.output_dir, file_name, &content)?;
        println!("Wrote {}", path.display());
    }

    Ok(())
}

fn dependabot_document(found: &ScanResult, settings: &Settings) -> Result<String> {
    println!(
        "Grouping updates using strategy: {}...",
        settings.grouping_strategy
    );
    let updates = group_updates(
        found,
        settings.grouping_strategy,
        &settings.custom_groups,
        &settings.base_path,
    );

    println!("Generating dependabot.yaml configuration...");
    OutputGenerator::dependabot_yaml(
        &updates,
        &settings.branch,
        &settings.intervals,
        settings.pull_requests_limit,
    )
}

fn patterns_document(
    found: &ScanResult,
    ecosystems: &[Ecosystem],
    settings: &Settings,
) -> Result<String> {
    let dependency_patterns = collect_dependency_patterns(found);

    println!("Generating folder patterns...");
    let catalog = build_catalog(found, ecosystems, &settings.base_path, &dependency_patterns);

    println!("Writing package-ecosystem-patterns.yml...");
    OutputGenerator::patterns_yaml(&catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::{CustomGroup, GroupingStrategy};
    use serde_yaml::Value;
    use std::collections::HashMap;
    use std::fs;
    use std::path::Path;
    use tempfile::{tempdir, TempDir};

    fn repo() -> TempDir {
        let dir = tempdir().unwrap();
        let files = [
            ("package.json", r#"{"dependencies":{"react":"18.0"},"devDependencies":{"jest":"29.0"}}"#),
            ("web/package.json", r#"{"dependencies":{"vue":"3"}}"#),
            ("web/node_modules/vue/package.json", r#"{"dependencies":{"x":"1"}}"#),
            ("api/requirements.txt", "flask==2.0\n# comment\n\nrequests==2.31\n"),
            (".github/workflows/ci.yml", "on: push\n"),
        ];
        for (file, content) in files {
            let path = dir.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        dir
    }

    fn ecosystems() -> Vec<Ecosystem> {
        [
            ("npm", vec!["**/package.json"]),
            ("pip", vec!["**/requirements.txt"]),
            ("github-actions", vec!["action.yml"]),
        ]
        .into_iter()
        .map(|(name, files)| Ecosystem {
            name: name.to_string(),
            files: files.into_iter().map(String::from).collect(),
        })
        .collect()
    }

    fn settings(base: &Path, strategy: GroupingStrategy) -> Settings {
        Settings {
            base_path: base.to_path_buf(),
            branch: "main".to_string(),
            intervals: HashMap::from([("npm".to_string(), "daily".to_string())]),
            pull_requests_limit: 5,
            ignored_paths: vec!["*/node_modules/*".to_string()],
            grouping_strategy: strategy,
            custom_groups: vec![CustomGroup {
                name: "web".to_string(),
                directories: vec!["/web".to_string()],
            }],
        }
    }

    fn scan(settings: &Settings) -> ScanResult {
        Scanner::new(&settings.base_path, &ecosystems(), &settings.ignored_paths)
            .unwrap()
            .scan()
            .unwrap()
    }

    #[test]
    fn default_strategy_emits_one_update_per_directory() {
        let dir = repo();
        let settings = settings(dir.path(), GroupingStrategy::None);
        let yaml = dependabot_document(&scan(&settings), &settings).unwrap();

        let doc: Value = serde_yaml::from_str(&yaml).unwrap();
        let updates = doc["updates"].as_sequence().unwrap();
        let pairs: Vec<(&str, &str, &str)> = updates
            .iter()
            .map(|u| {
                (
                    u["package-ecosystem"].as_str().unwrap(),
                    u["directory"].as_str().unwrap(),
                    u["schedule"]["interval"].as_str().unwrap(),
                )
            })
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("npm", "/.", "daily"),
                ("npm", "/web", "daily"),
                ("pip", "/api", "weekly"),
            ]
        );
    }

    #[test]
    fn custom_strategy_names_the_group() {
        let dir = repo();
        let settings = settings(dir.path(), GroupingStrategy::Custom);
        let yaml = dependabot_document(&scan(&settings), &settings).unwrap();

        let doc: Value = serde_yaml::from_str(&yaml).unwrap();
        let updates = doc["updates"].as_sequence().unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0]["name"].as_str(), Some("web"));
        assert_eq!(updates[0]["directories"][0].as_str(), Some("/web"));
    }

    #[test]
    fn pattern_catalog_covers_every_ecosystem() {
        let dir = repo();
        let settings = settings(dir.path(), GroupingStrategy::None);
        let yaml = patterns_document(&scan(&settings), &ecosystems(), &settings).unwrap();

        let doc: Value = serde_yaml::from_str(&yaml).unwrap();
        let list = doc["pattern-list"].as_sequence().unwrap();
        assert_eq!(list.len(), 3);

        let strings = |v: &Value| -> Vec<String> {
            v.as_sequence()
                .unwrap()
                .iter()
                .map(|s| s.as_str().unwrap().to_string())
                .collect()
        };
        assert_eq!(strings(&list[0]["folder-patterns"]), vec!["/.", "/web"]);
        assert_eq!(strings(&list[0]["dependency-patterns"]), vec!["jest", "react", "vue"]);
        assert_eq!(strings(&list[1]["dependency-patterns"]), vec!["flask", "requests"]);
        assert_eq!(strings(&list[2]["folder-patterns"]), vec!["/.github/workflows"]);
        assert!(strings(&list[2]["dependency-patterns"]).is_empty());
    }

    #[test]
    fn repeated_runs_are_byte_identical() {
        let dir = repo();
        for strategy in [
            GroupingStrategy::None,
            GroupingStrategy::PackageEcosystem,
            GroupingStrategy::Custom,
        ] {
            let settings = settings(dir.path(), strategy);
            let first = dependabot_document(&scan(&settings), &settings).unwrap();
            let second = dependabot_document(&scan(&settings), &settings).unwrap();
            assert_eq!(first, second);
        }

        let settings = settings(dir.path(), GroupingStrategy::None);
        assert_eq!(
            patterns_document(&scan(&settings), &ecosystems(), &settings).unwrap(),
            patterns_document(&scan(&settings), &ecosystems(), &settings).unwrap()
        );
    }
}
