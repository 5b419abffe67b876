use std::fs;
use std::path::{Path, PathBuf};

use super::BatchSettings;
use crate::error::{ConvertError, Result};
use crate::model::{dedupe_identifiers, normalize_identifier};

/// A definition file found on disk with its batch-unique identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub identifier: String,
    pub path: PathBuf,
}

impl Candidate {
    /// Name used in reports: the identifier, or the path when it normalized to nothing.
    pub fn label(&self) -> String {
        if self.identifier.is_empty() {
            self.path.display().to_string()
        } else {
            self.identifier.clone()
        }
    }
}

/// `<source_root>/groups_dir` when present, else `source_root` itself.
pub fn scan_root(settings: &BatchSettings) -> PathBuf {
    let grouped = settings.source_root.join(&settings.groups_dir);
    if grouped.is_dir() {
        grouped
    } else {
        settings.source_root.clone()
    }
}

/// Collect `<scan-root>/<group>/<definitions_dir>/<name>.<extension>` files,
/// sorted by path, with normalized and de-duplicated identifiers.
pub fn discover(settings: &BatchSettings) -> Result<Vec<Candidate>> {
    let root = &settings.source_root;
    let meta = fs::metadata(root).map_err(|source| ConvertError::Discovery {
        path: root.clone(),
        source,
    })?;
    if !meta.is_dir() {
        return Err(ConvertError::NotADirectory { path: root.clone() });
    }

    let scan = scan_root(settings);
    tracing::debug!("scanning {}", scan.display());
    let groups = fs::read_dir(&scan).map_err(|source| ConvertError::Discovery {
        path: scan.clone(),
        source,
    })?;

    let mut paths: Vec<PathBuf> = Vec::new();
    for group in groups {
        let group = match group {
            Ok(g) => g.path(),
            Err(e) => {
                tracing::warn!("skipping entry in {}: {}", scan.display(), e);
                continue;
            }
        };
        if is_hidden(&group) || !group.is_dir() {
            continue;
        }
        let defs = group.join(&settings.definitions_dir);
        if !defs.is_dir() {
            continue;
        }
        let entries = match fs::read_dir(&defs) {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!("skipping {}: {}", defs.display(), e);
                continue;
            }
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_file() && !is_hidden(&path) && has_extension(&path, &settings.extension) {
                paths.push(path);
            }
        }
    }
    paths.sort();

    let mut ids: Vec<String> = paths
        .iter()
        .map(|p| {
            let stem = p.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
            normalize_identifier(stem)
        })
        .collect();
    dedupe_identifiers(&mut ids);

    Ok(ids
        .into_iter()
        .zip(paths)
        .map(|(identifier, path)| Candidate { identifier, path })
        .collect())
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .is_some_and(|s| s.starts_with('.'))
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}
