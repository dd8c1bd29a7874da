use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::naming;

pub const DEFAULT_GROUP: &str = "Geral";
pub const DEFAULT_FALLBACK_ID: &str = "exercicio";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ManifestEntry {
    pub id: String,
    pub name: String,
    pub group: String,
    pub file: String,
}

#[derive(Debug, Clone)]
pub struct ManifestConfig {
    /// Prefix for `file`; trailing slashes are dropped, empty means none.
    pub base_url: Option<String>,
    /// Group for files sitting directly in the scan root.
    pub default_group: String,
    /// Id used when a file stem has no `[a-z0-9]` characters.
    pub fallback_id: String,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            default_group: DEFAULT_GROUP.to_string(),
            fallback_id: DEFAULT_FALLBACK_ID.to_string(),
        }
    }
}

impl ManifestConfig {
    fn file_url(&self, encoded_rel: String) -> String {
        match self.base_url.as_deref().filter(|u| !u.is_empty()) {
            Some(base) => format!("{}/{}", base.trim_end_matches('/'), encoded_rel),
            None => encoded_rel,
        }
    }
}

/// Builds the ordered manifest for `files`, all of which must live under
/// `root`. Entries follow the component-wise order of their relative paths,
/// which is what makes id de-duplication reproducible between runs.
pub fn build_manifest(
    root: &Path,
    files: &[PathBuf],
    config: &ManifestConfig,
) -> Result<Vec<ManifestEntry>> {
    let mut rels = files
        .iter()
        .map(|p| {
            p.strip_prefix(root)
                .map(Path::to_path_buf)
                .with_context(|| format!("{} is not under {}", p.display(), root.display()))
        })
        .collect::<Result<Vec<_>>>()?;
    rels.sort();

    let mut seen_ids = HashSet::with_capacity(rels.len());
    let manifest = rels
        .iter()
        .map(|rel| ManifestEntry {
            id: naming::as_id(rel, &mut seen_ids, &config.fallback_id),
            name: naming::humanize_name(rel),
            group: naming::group_label(rel, &config.default_group),
            file: config.file_url(naming::encode_path(rel)),
        })
        .collect();
    Ok(manifest)
}

/// Serializes `entries` as 2-space pretty JSON and overwrites `path`,
/// creating missing parent directories first.
pub fn write_manifest(path: &Path, entries: &[ManifestEntry]) -> Result<()> {
    let json = serde_json::to_string_pretty(entries).context("failed to serialize manifest")?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory {}", parent.display()))?;
    }
    std::fs::write(path, json)
        .with_context(|| format!("failed to write manifest {}", path.display()))?;
    Ok(())
}
