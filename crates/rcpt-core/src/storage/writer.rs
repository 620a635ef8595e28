//! Destination writers for exported receipt images.
//!
//! Files are written to a temp file in the destination folder and then
//! renamed into place, so a reader never sees a half-written image.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::Builder;
use tracing::{debug, info, warn};

use crate::error::StorageError;
use crate::models::StorageConfig;

use super::Bucket;

/// A file written to its destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Full path of the written file.
    pub path: PathBuf,
    /// Folder the file was written into.
    pub folder: PathBuf,
    pub file_name: String,
    pub bytes_written: usize,
}

/// Result of [`write_receipt_file`]: the stored file and any non-fatal
/// problems hit on the way (e.g. a custom folder that had to be skipped).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReport {
    pub stored: StoredFile,
    pub warnings: Vec<String>,
}

/// A place receipt images can be written to.
pub trait DestinationWriter {
    /// Write `bytes` as `file_name`, replacing any existing file of that name.
    fn write(&self, file_name: &str, bytes: &[u8]) -> Result<StoredFile, StorageError>;

    /// Human-readable destination for logs.
    fn describe(&self) -> String;
}

/// User-chosen folder. Must already exist and be writable.
#[derive(Debug, Clone)]
pub struct CustomFolderWriter {
    folder: PathBuf,
}

impl CustomFolderWriter {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
        }
    }

    fn check_access(&self) -> Result<(), StorageError> {
        let metadata = std::fs::metadata(&self.folder)
            .map_err(|_| StorageError::FolderInaccessible(self.folder.clone()))?;

        if !metadata.is_dir() {
            return Err(StorageError::NotADirectory(self.folder.clone()));
        }
        if metadata.permissions().readonly() {
            return Err(StorageError::ReadOnly(self.folder.clone()));
        }
        Ok(())
    }
}

impl DestinationWriter for CustomFolderWriter {
    fn write(&self, file_name: &str, bytes: &[u8]) -> Result<StoredFile, StorageError> {
        self.check_access()?;
        write_atomic(&self.folder, file_name, bytes)
    }

    fn describe(&self) -> String {
        format!("custom folder {}", self.folder.display())
    }
}

/// Bucket folder under the app storage root. Created on demand.
#[derive(Debug, Clone)]
pub struct DefaultFolderWriter {
    folder: PathBuf,
}

impl DefaultFolderWriter {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
        }
    }

    pub fn for_bucket(config: &StorageConfig, bucket: Bucket) -> Self {
        Self::new(config.default_folder(bucket))
    }
}

impl DestinationWriter for DefaultFolderWriter {
    fn write(&self, file_name: &str, bytes: &[u8]) -> Result<StoredFile, StorageError> {
        std::fs::create_dir_all(&self.folder).map_err(|source| StorageError::CreateFolder {
            path: self.folder.clone(),
            source,
        })?;
        write_atomic(&self.folder, file_name, bytes)
    }

    fn describe(&self) -> String {
        format!("default folder {}", self.folder.display())
    }
}

/// Write into the bucket's custom folder, falling back to its default folder.
///
/// A failing custom folder is reported as a warning and left configured;
/// the caller decides whether to clear it.
pub fn write_receipt_file(
    config: &StorageConfig,
    bucket: Bucket,
    file_name: &str,
    bytes: &[u8],
) -> Result<WriteReport, StorageError> {
    if bytes.is_empty() {
        return Err(StorageError::EmptySource(PathBuf::from(file_name)));
    }

    let mut warnings = Vec::new();

    if let Some(folder) = config.custom_folder(bucket) {
        let writer = CustomFolderWriter::new(folder);
        match writer.write(file_name, bytes) {
            Ok(stored) => {
                info!("Exported {} to {}", file_name, writer.describe());
                return Ok(WriteReport { stored, warnings });
            }
            Err(e) => {
                warn!("{} failed, using default folder: {}", writer.describe(), e);
                warnings.push(e.to_string());
            }
        }
    }

    let writer = DefaultFolderWriter::for_bucket(config, bucket);
    let stored = writer.write(file_name, bytes)?;
    info!("Exported {} to {}", file_name, writer.describe());

    Ok(WriteReport { stored, warnings })
}

fn write_atomic(folder: &Path, file_name: &str, bytes: &[u8]) -> Result<StoredFile, StorageError> {
    if bytes.is_empty() {
        return Err(StorageError::EmptySource(folder.join(file_name)));
    }

    let path = folder.join(file_name);
    let write_error = |source: std::io::Error| StorageError::Write {
        path: path.clone(),
        source,
    };

    let mut temp = temp_builder().tempfile_in(folder).map_err(write_error)?;
    temp.write_all(bytes).map_err(write_error)?;
    temp.flush().map_err(write_error)?;
    temp.persist(&path).map_err(|e| write_error(e.error))?;

    debug!("Wrote {} bytes to {}", bytes.len(), path.display());

    Ok(StoredFile {
        path,
        folder: folder.to_path_buf(),
        file_name: file_name.to_string(),
        bytes_written: bytes.len(),
    })
}

/// Temp files default to owner-only access; exported images get the same
/// mode a plain create would, subject to the umask.
#[cfg(unix)]
fn temp_builder() -> Builder<'static, 'static> {
    use std::os::unix::fs::PermissionsExt;

    let mut builder = Builder::new();
    builder.prefix(".rcpt-").permissions(std::fs::Permissions::from_mode(0o666));
    builder
}

#[cfg(not(unix))]
fn temp_builder() -> Builder<'static, 'static> {
    let mut builder = Builder::new();
    builder.prefix(".rcpt-");
    builder
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const JPEG: &[u8] = b"\xFF\xD8\xFF\xE0receipt";

    fn config(root: &Path) -> StorageConfig {
        StorageConfig {
            root: root.to_path_buf(),
            ..StorageConfig::default()
        }
    }

    #[test]
    fn test_default_folder_created_on_demand() {
        let dir = TempDir::new().unwrap();
        let report = write_receipt_file(&config(dir.path()), Bucket::Fuel, "a.jpg", JPEG).unwrap();

        let expected = dir.path().join("Receipts").join("Fuel").join("a.jpg");
        assert_eq!(report.stored.path, expected);
        assert_eq!(report.stored.bytes_written, JPEG.len());
        assert!(report.warnings.is_empty());
        assert_eq!(std::fs::read(expected).unwrap(), JPEG);
    }

    #[test]
    fn test_custom_folder_used_when_accessible() {
        let root = TempDir::new().unwrap();
        let custom = TempDir::new().unwrap();
        let mut config = config(root.path());
        config.set_custom_folder(Bucket::Other, Some(custom.path().to_path_buf()));

        let report = write_receipt_file(&config, Bucket::Other, "b.png", JPEG).unwrap();

        assert_eq!(report.stored.folder, custom.path());
        assert!(custom.path().join("b.png").exists());
        assert!(!root.path().join("Receipts").exists());
    }

    #[test]
    fn test_missing_custom_folder_falls_back() {
        let root = TempDir::new().unwrap();
        let mut config = config(root.path());
        let gone = root.path().join("gone");
        config.set_custom_folder(Bucket::Fuel, Some(gone.clone()));

        let report = write_receipt_file(&config, Bucket::Fuel, "c.jpg", JPEG).unwrap();

        assert_eq!(report.stored.folder, root.path().join("Receipts").join("Fuel"));
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("no longer accessible"));
        // Mapping is left for the caller to clear
        assert_eq!(config.custom_folder(Bucket::Fuel), Some(gone.as_path()));
    }

    #[cfg(unix)]
    #[test]
    fn test_exported_file_is_not_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let report = write_receipt_file(&config(dir.path()), Bucket::Other, "f.jpg", JPEG).unwrap();

        let mode = std::fs::metadata(&report.stored.path).unwrap().permissions().mode() & 0o777;
        let plain = dir.path().join("plain.jpg");
        std::fs::write(&plain, JPEG).unwrap();
        let plain_mode = std::fs::metadata(&plain).unwrap().permissions().mode() & 0o777;

        assert_eq!(mode, plain_mode);
    }

    #[test]
    fn test_custom_folder_that_is_a_file() {
        let root = TempDir::new().unwrap();
        let file = root.path().join("not-a-dir");
        std::fs::write(&file, b"x").unwrap();

        let err = CustomFolderWriter::new(&file).write("d.jpg", JPEG).unwrap_err();
        assert!(matches!(err, StorageError::NotADirectory(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_read_only_custom_folder() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let locked = dir.path().join("locked");
        std::fs::create_dir(&locked).unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o555)).unwrap();

        let err = CustomFolderWriter::new(&locked).write("e.jpg", JPEG).unwrap_err();
        assert!(matches!(err, StorageError::ReadOnly(_)));

        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn test_collision_overwrites() {
        let dir = TempDir::new().unwrap();
        let writer = DefaultFolderWriter::new(dir.path());

        writer.write("same.jpg", b"first").unwrap();
        writer.write("same.jpg", b"second").unwrap();

        assert_eq!(std::fs::read(dir.path().join("same.jpg")).unwrap(), b"second");
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_empty_bytes_rejected() {
        let dir = TempDir::new().unwrap();
        let err = write_receipt_file(&config(dir.path()), Bucket::Other, "f.jpg", b"").unwrap_err();
        assert!(matches!(err, StorageError::EmptySource(_)));
        assert!(!dir.path().join("Receipts").exists());
    }
}
