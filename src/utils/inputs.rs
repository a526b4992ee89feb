//! Input path resolution.
//!
//! Command-line inputs may be plain paths or glob patterns. They are
//! expanded, deduplicated, and then filtered down to regular `.json`
//! files. Every path that is dropped is logged once with the reason.

use glob::glob;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Expand globs and literal paths into a deduplicated candidate list.
///
/// A pattern without matches falls back to the literal path when it
/// exists, so file names containing glob metacharacters still work.
pub fn resolve_inputs(args: &[String]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut resolved = Vec::new();
    let mut push = |path: PathBuf| {
        if seen.insert(path.clone()) {
            resolved.push(path);
        }
    };

    for arg in args {
        let mut matched = false;
        match glob(arg) {
            Ok(paths) => {
                for entry in paths {
                    match entry {
                        Ok(path) => {
                            matched = true;
                            push(path);
                        }
                        Err(e) => warn!(pattern = %arg, error = %e, "Unreadable glob match"),
                    }
                }
            }
            Err(e) => debug!(pattern = %arg, error = %e, "Not a valid glob pattern"),
        }

        if !matched {
            let literal = Path::new(arg);
            if literal.exists() {
                push(literal.to_path_buf());
            } else {
                warn!("File or pattern not found: {}", arg);
            }
        }
    }

    resolved
}

/// Keep existing regular files whose name ends in `.json` (any case).
pub fn select_json_files(candidates: Vec<PathBuf>) -> Vec<PathBuf> {
    candidates
        .into_iter()
        .filter(|path| {
            let metadata = match fs::metadata(path) {
                Ok(m) => m,
                Err(e) => {
                    warn!("Error stating file {}: {}. Skipping.", path.display(), e);
                    return false;
                }
            };
            if metadata.is_dir() {
                warn!("Skipping directory: {}", path.display());
                false
            } else if !metadata.is_file() {
                warn!("Skipping non-regular file: {}", path.display());
                false
            } else if !has_json_suffix(path) {
                warn!("Skipping non-JSON file: {}", path.display());
                false
            } else {
                true
            }
        })
        .collect()
}

/// Case-insensitive `.json` suffix check on the file name.
pub fn has_json_suffix(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().to_ascii_lowercase().ends_with(".json"))
        .unwrap_or(false)
}
