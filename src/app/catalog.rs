use crate::app::grouping::manifest_directories;
use crate::app::manifest::parse_dependencies;
use crate::app::models::{Ecosystem, PatternCatalogEntry, ScanResult};
use crate::app::paths::normalize;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

const GITHUB_ACTIONS: &str = "github-actions";
const WORKFLOWS_DIR: &str = "/.github/workflows";
const ROOT: &str = "/.";

/// Dependency names from every matched manifest, per ecosystem.
///
/// Files listed twice in the scan are parsed twice; the catalog dedups later.
pub fn collect_dependency_patterns(scan: &ScanResult) -> HashMap<String, Vec<String>> {
    let mut patterns: HashMap<String, Vec<String>> = HashMap::new();
    for (ecosystem, files) in scan.iter() {
        let names = patterns.entry(ecosystem.to_string()).or_default();
        for file in files {
            names.extend(parse_dependencies(file, ecosystem));
        }
    }
    patterns
}

/// One catalog entry per configured ecosystem, matched or not.
///
/// `github-actions` also gets `/.github/workflows` whenever the scan saw a
/// workflow file there.
pub fn build_catalog(
    scan: &ScanResult,
    ecosystems: &[Ecosystem],
    base_path: &Path,
    dependency_patterns: &HashMap<String, Vec<String>>,
) -> Vec<PatternCatalogEntry> {
    ecosystems
        .iter()
        .map(|eco| {
            let files = scan.files(&eco.name);
            let mut folders = manifest_directories(files, base_path);

            if eco.name == GITHUB_ACTIONS && scan.has_workflows() {
                folders.insert(WORKFLOWS_DIR.to_string());
            }
            if files.iter().any(|file| normalize(file, base_path) == ROOT) {
                folders.insert(ROOT.to_string());
            }

            let dependencies: BTreeSet<&String> = dependency_patterns
                .get(&eco.name)
                .into_iter()
                .flatten()
                .collect();

            PatternCatalogEntry {
                ecosystem: eco.name.clone(),
                folder_patterns: folders.into_iter().collect(),
                dependency_patterns: dependencies.into_iter().cloned().collect(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn eco(name: &str) -> Ecosystem {
        Ecosystem {
            name: name.to_string(),
            files: Vec::new(),
        }
    }

    fn write(base: &Path, file: &str, content: &str) -> PathBuf {
        let path = base.join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn workflows_are_listed_without_scan_matches() {
        let dir = tempdir().unwrap();
        let mut scan = ScanResult::default();
        scan.mark_workflows();

        let catalog = build_catalog(
            &scan,
            &[eco("github-actions")],
            dir.path(),
            &HashMap::new(),
        );
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].folder_patterns, vec!["/.github/workflows"]);
        assert!(catalog[0].dependency_patterns.is_empty());
    }

    #[test]
    fn workflows_only_count_for_github_actions() {
        let dir = tempdir().unwrap();
        let mut scan = ScanResult::default();
        scan.mark_workflows();

        let catalog = build_catalog(&scan, &[eco("npm")], dir.path(), &HashMap::new());
        assert!(catalog[0].folder_patterns.is_empty());
    }

    #[test]
    fn unmatched_ecosystems_still_get_an_entry() {
        let dir = tempdir().unwrap();
        let catalog = build_catalog(
            &ScanResult::default(),
            &[eco("pip"), eco("composer")],
            dir.path(),
            &HashMap::new(),
        );
        let names: Vec<&str> = catalog.iter().map(|e| e.ecosystem.as_str()).collect();
        assert_eq!(names, vec!["pip", "composer"]);
        assert!(catalog.iter().all(|e| e.folder_patterns.is_empty()));
    }

    #[test]
    fn dependencies_are_sorted_and_deduplicated() {
        let dir = tempdir().unwrap();
        let web = write(
            dir.path(),
            "web/package.json",
            r#"{"dependencies":{"react":"18.0"},"devDependencies":{"jest":"29.0"}}"#,
        );
        let root = write(dir.path(), "package.json", r#"{"dependencies":{"react":"18.0","axios":"1"}}"#);

        let mut scan = ScanResult::default();
        scan.push("npm", web.clone());
        scan.push("npm", root);
        scan.push("npm", web);

        let patterns = collect_dependency_patterns(&scan);
        assert_eq!(patterns["npm"].len(), 6);

        let catalog = build_catalog(&scan, &[eco("npm")], dir.path(), &patterns);
        assert_eq!(catalog[0].folder_patterns, vec!["/.", "/web"]);
        assert_eq!(catalog[0].dependency_patterns, vec!["axios", "jest", "react"]);
    }

    #[test]
    fn broken_manifest_does_not_stop_the_catalog() {
        let dir = tempdir().unwrap();
        let broken = write(dir.path(), "a/composer.json", "{");
        let good = write(dir.path(), "b/composer.json", r#"{"require":{"monolog/monolog":"^3"}}"#);

        let mut scan = ScanResult::default();
        scan.push("composer", broken);
        scan.push("composer", good);

        let patterns = collect_dependency_patterns(&scan);
        let catalog = build_catalog(&scan, &[eco("composer")], dir.path(), &patterns);
        assert_eq!(catalog[0].folder_patterns, vec!["/a", "/b"]);
        assert_eq!(catalog[0].dependency_patterns, vec!["monolog/monolog"]);
    }
}
