//! Output directory guard

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::config::NamingConfig;
use crate::error::{Result, ResizeError};

/// A freshly created directory that receives one run's output.
///
/// Only [`OutputDirectory::create`] produces one, so holding a value means
/// the directory did not exist before this run.
#[derive(Debug, Clone)]
pub struct OutputDirectory {
    path: PathBuf,
}

impl OutputDirectory {
    /// Create the directory, refusing to reuse one left by an earlier run.
    ///
    /// The parent must exist; nothing is created recursively.
    pub async fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        match fs::create_dir(path).await {
            Ok(()) => {
                debug!("Created output directory {:?}", path);
                Ok(Self { path: path.to_path_buf() })
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(ResizeError::output_dir_exists(path.to_path_buf()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Destination for `input` inside this directory
    pub fn output_path_for(&self, input: &Path, naming: &NamingConfig) -> PathBuf {
        output_path_for(&self.path, input, naming)
    }
}

/// Destination for `input` inside `dir`, without touching the filesystem
pub fn output_path_for(dir: &Path, input: &Path, naming: &NamingConfig) -> PathBuf {
    dir.join(naming.output_file_name(input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_creates_missing_directory() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("resized");

        let output = OutputDirectory::create(&target).await.unwrap();
        assert!(target.is_dir());
        assert_eq!(output.path(), target.as_path());
    }

    #[tokio::test]
    async fn test_existing_directory_is_rejected() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("resized");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("old_resized.jpg"), b"old").unwrap();

        let err = OutputDirectory::create(&target).await.unwrap_err();
        assert!(matches!(err, ResizeError::OutputDirExists { .. }));
        // Previous output is untouched
        assert_eq!(std::fs::read(target.join("old_resized.jpg")).unwrap(), b"old");
    }

    #[tokio::test]
    async fn test_existing_file_is_rejected() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("resized");
        std::fs::write(&target, b"").unwrap();

        let err = OutputDirectory::create(&target).await.unwrap_err();
        assert!(matches!(err, ResizeError::OutputDirExists { .. }));
    }

    #[tokio::test]
    async fn test_missing_parent_is_io_error() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("missing").join("resized");

        let err = OutputDirectory::create(&target).await.unwrap_err();
        assert!(matches!(err, ResizeError::IoError(_)));
    }

    #[test]
    fn test_output_path_generation() {
        let naming = NamingConfig::default();
        let path = output_path_for(Path::new("/out"), Path::new("in/a.jpg"), &naming);
        assert_eq!(path, PathBuf::from("/out/a_resized.jpg"));

        // Stays inside the output directory even without a file name
        let path = output_path_for(Path::new("/out"), Path::new(".."), &naming);
        assert_eq!(path, PathBuf::from("/out/.._resized"));
        let path = output_path_for(Path::new("/out"), Path::new("/"), &naming);
        assert_eq!(path, PathBuf::from("/out/_resized"));
    }
}
