use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

use crate::error::{Result, SweepError};

/// One plugin wrapper directory and its manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wrapper {
    pub name: String,
    pub manifest_path: PathBuf,
}

/// List `<wrappers_dir>/*/<manifest_file>`, sorted by wrapper name.
///
/// Plain files and directories without a manifest are skipped. Hidden entries
/// and ignore files are not consulted.
pub fn discover(wrappers_dir: &Path, manifest_file: &str) -> Result<Vec<Wrapper>> {
    if !wrappers_dir.is_dir() {
        return Err(SweepError::WrappersDirMissing {
            path: wrappers_dir.to_path_buf(),
        });
    }

    let mut wrappers: Vec<Wrapper> = WalkBuilder::new(wrappers_dir)
        .max_depth(Some(1))
        .standard_filters(false)
        .build()
        .flatten()
        .filter_map(|entry| {
            let dir = entry.path().to_path_buf();
            if dir == wrappers_dir || !dir.is_dir() {
                return None;
            }

            let manifest_path = dir.join(manifest_file);
            if !manifest_path.is_file() {
                tracing::debug!("no {manifest_file} in {}", dir.display());
                return None;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            Some(Wrapper {
                name,
                manifest_path,
            })
        })
        .collect();

    wrappers.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(wrappers)
}

/// Keep only the wrappers named in `only`; returns the names that matched nothing.
pub fn retain_named(wrappers: &mut Vec<Wrapper>, only: &[String]) -> Vec<String> {
    if only.is_empty() {
        return Vec::new();
    }

    let unknown = only
        .iter()
        .filter(|name| !wrappers.iter().any(|w| &w.name == *name))
        .cloned()
        .collect();
    wrappers.retain(|w| only.contains(&w.name));
    unknown
}
