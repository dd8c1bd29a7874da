use anyhow::{bail, Context, Result};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::progress::ProgressReporter;

pub const DEFAULT_EXTENSIONS: [&str; 3] = ["gif", "apng", "webp"];

/// Accepted file extensions, stored lowercase without the leading dot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionSet {
    exts: BTreeSet<String>,
}

impl ExtensionSet {
    pub fn new<I, S>(exts: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let exts: BTreeSet<String> = exts
            .into_iter()
            .map(|e| e.as_ref().trim().trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        if exts.is_empty() {
            bail!("at least one file extension is required");
        }
        Ok(Self { exts })
    }

    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| self.exts.contains(&ext.to_string_lossy().to_lowercase()))
            .unwrap_or(false)
    }
}

impl Default for ExtensionSet {
    fn default() -> Self {
        Self {
            exts: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl fmt::Display for ExtensionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let list: Vec<String> = self.exts.iter().map(|e| format!(".{}", e)).collect();
        f.write_str(&list.join("/"))
    }
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

fn is_permission_denied(err: &walkdir::Error) -> bool {
    err.io_error()
        .map(|io| io.kind() == std::io::ErrorKind::PermissionDenied)
        .unwrap_or(false)
}

/// Lists every non-hidden file under `root` whose extension is accepted.
///
/// Only the file name is checked for a leading dot. Symlinked files count,
/// symlinked directories are not entered. Unreadable paths below the root are
/// reported as warnings and skipped. Order is unspecified.
pub fn gather_files(
    root: &Path,
    extensions: &ExtensionSet,
    progress: &mut ProgressReporter,
) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        bail!("scan root not found: {}", root.display());
    }
    if !root.is_dir() {
        bail!("scan root is not a directory: {}", root.display());
    }

    let mut files = vec![];
    for entry in WalkDir::new(root).follow_links(false) {
        let e = match entry {
            Ok(e) => e,
            Err(err) if err.depth() > 0 && is_permission_denied(&err) => {
                let path = err
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| root.display().to_string());
                progress.warn(format!("skipped unreadable path: {}", path));
                continue;
            }
            Err(err) => {
                return Err(err).with_context(|| format!("failed to walk {}", root.display()));
            }
        };
        let p = e.path();

        // `Path::is_file` follows symlinks, `DirEntry::file_type` does not.
        if !p.is_file() {
            progress.inc_scanned(false);
            continue;
        }

        let name = match e.file_name().to_str() {
            Some(name) => name.to_string(),
            None => {
                let lossy = e.file_name().to_string_lossy().into_owned();
                progress.warn(format!(
                    "file name is not valid UTF-8, recorded as {:?}: {}",
                    lossy,
                    p.display()
                ));
                lossy
            }
        };

        let accepted = !is_hidden(&name) && extensions.matches(p);
        progress.inc_scanned(accepted);
        if accepted {
            files.push(p.to_path_buf());
        }
    }
    Ok(files)
}
