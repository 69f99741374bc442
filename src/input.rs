//! Input resolution: folder scan or an explicit list of files

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::error::{Result, ResizeError};
use crate::processing::ExtensionSet;

/// Where the images of a run come from
#[derive(Debug, Clone)]
pub enum InputSource {
    /// Non-recursive scan of a directory for recognised extensions
    Folder { root: PathBuf, extensions: ExtensionSet },
    /// Files named by the caller, used as given
    Images(Vec<PathBuf>),
}

/// The resolved file set of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputSet {
    /// Files to convert, one job each
    pub images: Vec<PathBuf>,
    /// Directory entries that were skipped (folder scans only)
    pub ignored: Option<usize>,
}

impl InputSource {
    /// Resolve the source into the list of files to process
    pub async fn resolve(&self) -> Result<InputSet> {
        match self {
            Self::Folder { root, extensions } => scan_folder(root, extensions).await,
            Self::Images(paths) => Ok(InputSet {
                images: dedup_paths(paths),
                ignored: None,
            }),
        }
    }
}

/// Scan `root` (not recursively) for files with a recognised extension.
///
/// Every entry counts, dot-files included: a hidden file with a recognised
/// extension is an image, and anything that is not a matching file
/// (directories too) counts as ignored.
pub async fn scan_folder(root: &Path, extensions: &ExtensionSet) -> Result<InputSet> {
    debug!("Scanning {:?} for {:?}", root, extensions.as_slice());

    let mut entries = fs::read_dir(root)
        .await
        .map_err(|e| ResizeError::input(format!("Cannot read directory: {}", e), root.to_path_buf()))?;

    let mut images = Vec::new();
    let mut total = 0usize;

    while let Some(entry) = entries.next_entry().await? {
        total += 1;

        let path = entry.path();
        // Follows symlinks, so a link to an image counts as an image
        let is_file = fs::metadata(&path).await.map(|m| m.is_file()).unwrap_or(false);

        if is_file && extensions.matches(&path) {
            images.push(path);
        } else {
            debug!("Ignoring {:?}", path);
        }
    }

    // Sort files for consistent processing order
    images.sort();

    let ignored = total - images.len();
    debug!("Scanned {:?}: {} images, {} ignored", root, images.len(), ignored);

    Ok(InputSet {
        images,
        ignored: Some(ignored),
    })
}

/// Drop exact repeats, keeping the first occurrence of each path
fn dedup_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut seen: HashSet<&Path> = HashSet::with_capacity(paths.len());
    let mut unique = Vec::with_capacity(paths.len());

    for path in paths {
        if seen.insert(path.as_path()) {
            unique.push(path.clone());
        } else {
            debug!("Skipping repeated input {:?}", path);
        }
    }

    unique
}
