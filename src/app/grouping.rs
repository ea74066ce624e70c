use crate::app::models::{parent_dir, CustomGroup, GroupingStrategy, ScanResult, UpdateRecord};
use crate::app::paths::{clean, normalize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Turns the flat scan into update records according to `strategy`.
///
/// Ecosystems are visited in scan order and directory lists are always
/// sorted, so the same scan always yields the same records.
pub fn group_updates(
    scan: &ScanResult,
    strategy: GroupingStrategy,
    custom_groups: &[CustomGroup],
    base_path: &Path,
) -> Vec<UpdateRecord> {
    match strategy {
        GroupingStrategy::PackageEcosystem => by_ecosystem(scan, base_path),
        GroupingStrategy::Custom => by_custom_group(scan, custom_groups, base_path),
        GroupingStrategy::None => by_directory(scan, base_path),
    }
}

/// Normalized parent directory of every file, deduplicated and sorted.
pub fn manifest_directories(files: &[PathBuf], base_path: &Path) -> BTreeSet<String> {
    files
        .iter()
        .map(|file| normalize(parent_dir(file), base_path))
        .collect()
}

fn by_ecosystem(scan: &ScanResult, base_path: &Path) -> Vec<UpdateRecord> {
    scan.iter()
        .map(|(ecosystem, files)| UpdateRecord::Grouped {
            ecosystem: ecosystem.to_string(),
            name: None,
            directories: manifest_directories(files, base_path).into_iter().collect(),
        })
        .collect()
}

fn by_custom_group(
    scan: &ScanResult,
    custom_groups: &[CustomGroup],
    base_path: &Path,
) -> Vec<UpdateRecord> {
    let mut updates = Vec::new();

    for group in custom_groups {
        // Exact membership only; a group listing `/web` does not pick up `/web/admin`.
        let members: BTreeSet<String> = group
            .directories
            .iter()
            .map(|dir| normalize(&clean(&base_path.join(dir.trim_matches('/'))), base_path))
            .collect();

        for (ecosystem, files) in scan.iter() {
            let directories: Vec<String> = manifest_directories(files, base_path)
                .into_iter()
                .filter(|dir| members.contains(dir))
                .collect();

            if directories.is_empty() {
                continue;
            }
            updates.push(UpdateRecord::Grouped {
                ecosystem: ecosystem.to_string(),
                name: Some(group.name.clone()),
                directories,
            });
        }
    }

    updates
}

fn by_directory(scan: &ScanResult, base_path: &Path) -> Vec<UpdateRecord> {
    scan.iter()
        .flat_map(|(ecosystem, files)| {
            manifest_directories(files, base_path)
                .into_iter()
                .map(move |directory| UpdateRecord::Directory {
                    ecosystem: ecosystem.to_string(),
                    directory,
                })
        })
        .collect()
}
