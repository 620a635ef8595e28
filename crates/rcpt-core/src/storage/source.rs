//! Source images referenced by receipts.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::StorageError;

const FILE_SCHEME: &str = "file://";
const PDF_MAGIC: &[u8] = b"%PDF-";

/// A captured image (or PDF) on the local filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    path: PathBuf,
    content_type: Option<String>,
}

impl SourceImage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            content_type: None,
        }
    }

    /// Resolve a stored URI. Only local paths and `file://` URIs are readable.
    pub fn from_uri(uri: &str) -> Option<Self> {
        local_path(uri).map(Self::new)
    }

    /// Declare the content type instead of sniffing it.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// URI recorded on the receipt.
    pub fn uri(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    /// Declared content type, else one sniffed from the leading bytes.
    pub fn content_type(&self, bytes: &[u8]) -> Option<String> {
        if let Some(declared) = &self.content_type {
            return Some(declared.clone());
        }

        if let Ok(format) = image::guess_format(bytes) {
            return Some(format.to_mime_type().to_string());
        }

        if bytes.starts_with(PDF_MAGIC) {
            return Some("application/pdf".to_string());
        }

        None
    }

    /// Read the whole file. Empty files are rejected.
    pub fn read_bytes(&self) -> Result<Vec<u8>, StorageError> {
        let bytes = std::fs::read(&self.path).map_err(|source| StorageError::SourceUnreadable {
            path: self.path.clone(),
            source,
        })?;

        if bytes.is_empty() {
            return Err(StorageError::EmptySource(self.path.clone()));
        }

        debug!("Read {} bytes from {}", bytes.len(), self.path.display());
        Ok(bytes)
    }
}

/// Local path for a URI: plain paths pass through, `file://` is stripped,
/// any other scheme is not readable here.
pub fn local_path(uri: &str) -> Option<PathBuf> {
    let uri = uri.trim();
    if uri.is_empty() {
        return None;
    }

    if let Some(path) = uri.strip_prefix(FILE_SCHEME) {
        return Some(PathBuf::from(path));
    }

    if uri.contains("://") {
        return None;
    }

    Some(PathBuf::from(uri))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_local_path() {
        assert_eq!(local_path("/tmp/a.jpg"), Some(PathBuf::from("/tmp/a.jpg")));
        assert_eq!(local_path("file:///tmp/a.jpg"), Some(PathBuf::from("/tmp/a.jpg")));
        assert_eq!(local_path("content://media/external/images/1"), None);
        assert_eq!(local_path("  "), None);
    }

    #[test]
    fn test_sniff_content_type() {
        let source = SourceImage::new("/tmp/whatever");

        assert_eq!(
            source.content_type(&[0xFF, 0xD8, 0xFF, 0xE0, 0, 0]).as_deref(),
            Some("image/jpeg")
        );
        assert_eq!(
            source.content_type(b"\x89PNG\r\n\x1a\n....").as_deref(),
            Some("image/png")
        );
        assert_eq!(
            source.content_type(b"%PDF-1.7\n").as_deref(),
            Some("application/pdf")
        );
        assert_eq!(source.content_type(b"hello"), None);
    }

    #[test]
    fn test_declared_content_type_wins() {
        let source = SourceImage::new("/tmp/a").with_content_type("image/png");
        assert_eq!(source.content_type(b"%PDF-1.7").as_deref(), Some("image/png"));
    }

    #[test]
    fn test_read_bytes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"\xFF\xD8\xFF\xE0data").unwrap();

        let source = SourceImage::new(file.path());
        assert_eq!(source.read_bytes().unwrap(), b"\xFF\xD8\xFF\xE0data".to_vec());
    }

    #[test]
    fn test_read_empty_or_missing() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let source = SourceImage::new(file.path());
        assert!(matches!(source.read_bytes(), Err(StorageError::EmptySource(_))));

        let missing = SourceImage::new("/definitely/not/here.jpg");
        assert!(matches!(
            missing.read_bytes(),
            Err(StorageError::SourceUnreadable { .. })
        ));
    }
}
