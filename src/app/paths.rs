use pathdiff::diff_paths;
use std::env;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Canonical repository-relative form of `path`: forward slashes, leading
/// `/`, and `/.` for the repository root itself.
pub fn normalize(path: &Path, base_path: &Path) -> String {
    if path.as_os_str().is_empty() || path == Path::new(".") {
        return "/.".to_string();
    }

    let relative = diff_paths(path, base_path).unwrap_or_else(|| path.to_path_buf());
    if relative.as_os_str().is_empty() {
        return "/.".to_string();
    }

    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    format!("/{}", parts.join("/"))
}

/// Absolute form of `path` against the working directory, with `.` and `..`
/// folded lexically. Symlinks are left alone.
pub fn absolutize(path: &Path) -> io::Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()?.join(path)
    };
    Ok(clean(&joined))
}

/// Folds `.` and `..` without touching the filesystem.
pub(crate) fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
