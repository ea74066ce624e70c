use crate::app::config::ConfigError;
use crate::app::models::{Ecosystem, ScanResult};
use globset::{GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Checked on every scan for the catalog, independent of ecosystem patterns.
const WORKFLOW_PATTERNS: [&str; 2] = [".github/workflows/*.yml", ".github/workflows/*.yaml"];

/// Shell-glob ignore patterns tested against the full path string.
///
/// `*` is allowed to cross `/`, so `*/node_modules/*` drops anything below
/// any `node_modules` directory. Braces and unclosed `[` are literal and
/// backslash is an ordinary character, as with fnmatch.
pub struct IgnoreFilter {
    set: GlobSet,
}

impl IgnoreFilter {
    pub fn new(patterns: &[String]) -> Result<Self, ConfigError> {
        let mut builder = GlobSetBuilder::new();
        for pat in patterns {
            let literal_braces = pat.replace('{', "[{]").replace('}', "[}]");
            let glob = GlobBuilder::new(&literal_braces)
                .allow_unclosed_class(true)
                .backslash_escape(false)
                .build()
                .map_err(|e| invalid_glob(pat, e))?;
            builder.add(glob);
        }
        let set = builder.build().map_err(|e| invalid_glob(&patterns.join(", "), e))?;
        Ok(Self { set })
    }

    pub fn is_ignored(&self, path: &Path) -> bool {
        self.set.is_match(path)
    }
}

enum Segment {
    /// `**`: zero or more visible directories.
    AnyDepth,
    Name { matcher: GlobMatcher, dotted: bool },
}

/// One configured ecosystem pattern, relative to the base path.
///
/// Matched component by component so that wildcards never pick up a
/// dot-prefixed name; only a segment spelled with a leading `.` can.
struct FilePattern {
    segments: Vec<Segment>,
}

impl FilePattern {
    fn new(pattern: &str) -> Result<Self, ConfigError> {
        let segments = pattern
            .split('/')
            .filter(|segment| !segment.is_empty() && *segment != ".")
            .map(|segment| {
                if segment == "**" {
                    return Ok(Segment::AnyDepth);
                }
                let glob = GlobBuilder::new(segment)
                    .literal_separator(true)
                    .build()
                    .map_err(|e| invalid_glob(pattern, e))?;
                Ok(Segment::Name {
                    matcher: glob.compile_matcher(),
                    dotted: segment.starts_with('.'),
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self { segments })
    }

    fn is_match(&self, relative: &Path) -> bool {
        let components: Vec<&OsStr> = relative.components().map(|c| c.as_os_str()).collect();
        match_segments(&self.segments, &components)
    }
}

fn match_segments(segments: &[Segment], components: &[&OsStr]) -> bool {
    match segments.split_first() {
        None => components.is_empty(),
        Some((Segment::AnyDepth, rest)) => {
            for skip in 0..=components.len() {
                if match_segments(rest, &components[skip..]) {
                    return true;
                }
                if skip < components.len() && is_hidden(components[skip]) {
                    break;
                }
            }
            false
        }
        Some((Segment::Name { matcher, dotted }, rest)) => match components.split_first() {
            Some((name, tail)) => {
                (*dotted || !is_hidden(name)) && matcher.is_match(name) && match_segments(rest, tail)
            }
            None => false,
        },
    }
}

fn is_hidden(name: &OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

struct EcosystemPatterns {
    name: String,
    patterns: Vec<FilePattern>,
}

pub struct Scanner {
    root: PathBuf,
    ecosystems: Vec<EcosystemPatterns>,
    workflows: Vec<FilePattern>,
    ignore: IgnoreFilter,
}

impl Scanner {
    /// Compiles every pattern up front so a bad glob fails before any traversal.
    pub fn new(
        root: &Path,
        ecosystems: &[Ecosystem],
        ignored_paths: &[String],
    ) -> Result<Self, ConfigError> {
        let ecosystems = ecosystems
            .iter()
            .map(|eco| {
                let patterns = eco
                    .files
                    .iter()
                    .map(|pat| FilePattern::new(pat))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(EcosystemPatterns {
                    name: eco.name.clone(),
                    patterns,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let workflows = WORKFLOW_PATTERNS
            .iter()
            .map(|pat| FilePattern::new(pat))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            root: root.to_path_buf(),
            ecosystems,
            workflows,
            ignore: IgnoreFilter::new(ignored_paths)?,
        })
    }

    /// Matches every ecosystem pattern against the tree, in configured order.
    ///
    /// A file matched by two patterns of the same ecosystem is listed twice.
    /// A root that does not exist scans as empty.
    pub fn scan(&self) -> Result<ScanResult, ignore::Error> {
        let mut found = ScanResult::default();
        if !self.root.exists() {
            log::warn!("Base path {} does not exist", self.root.display());
            return Ok(found);
        }

        let candidates = self.walk()?;

        for eco in &self.ecosystems {
            for pattern in &eco.patterns {
                for (absolute, relative) in &candidates {
                    if pattern.is_match(relative) && !self.ignore.is_ignored(absolute) {
                        found.push(&eco.name, absolute.clone());
                    }
                }
            }
            log::debug!("{}: {} file(s) matched", eco.name, found.files(&eco.name).len());
        }

        if candidates
            .iter()
            .any(|(_, relative)| self.workflows.iter().any(|p| p.is_match(relative)))
        {
            found.mark_workflows();
        }

        Ok(found)
    }

    /// Every regular file under the root as (absolute, root-relative) pairs.
    fn walk(&self) -> Result<Vec<(PathBuf, PathBuf)>, ignore::Error> {
        // Manifests are found whether or not git would track them
        let walker = WalkBuilder::new(&self.root)
            .hidden(false)
            .ignore(false)
            .parents(false)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .follow_links(true)
            .filter_entry(|entry| entry.file_name() != ".git")
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        let mut files = Vec::new();
        for result in walker {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) if is_loop(&err) => {
                    log::warn!("Skipping symlink loop: {}", err);
                    continue;
                }
                Err(err) => return Err(err),
            };
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if let Ok(relative) = path.strip_prefix(&self.root) {
                files.push((path.to_path_buf(), relative.to_path_buf()));
            }
        }
        Ok(files)
    }
}

fn is_loop(err: &ignore::Error) -> bool {
    match err {
        ignore::Error::Loop { .. } => true,
        ignore::Error::WithPath { err, .. }
        | ignore::Error::WithDepth { err, .. }
        | ignore::Error::WithLineNumber { err, .. } => is_loop(err),
        _ => false,
    }
}

fn invalid_glob(pattern: &str, source: globset::Error) -> ConfigError {
    ConfigError::InvalidGlob {
        pattern: pattern.to_string(),
        source,
    }
}
