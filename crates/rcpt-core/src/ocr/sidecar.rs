//! Recognizer that reads a transcript stored next to the image.
//!
//! Useful for imports that were already recognized elsewhere and for tests:
//! `receipt.jpg` is paired with `receipt.jpg.txt` or `receipt.txt`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::error::RecognitionError;
use crate::storage::SourceImage;

use super::{Recognition, Recognizer, TextBlock};

/// Reads `<image>.txt` (or `<stem>.txt`) as the recognized text.
///
/// Every non-empty line becomes one block; words get `confidence`.
#[derive(Debug, Clone)]
pub struct SidecarRecognizer {
    confidence: f32,
}

impl SidecarRecognizer {
    pub fn new() -> Self {
        Self { confidence: 1.0 }
    }

    /// Set the confidence reported for every word.
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// Candidate transcript paths for an image, in lookup order.
    pub fn transcript_paths(image: &Path) -> Vec<PathBuf> {
        let mut appended = image.as_os_str().to_os_string();
        appended.push(".txt");

        let mut paths = vec![PathBuf::from(appended)];
        if image.extension().is_some() {
            paths.push(image.with_extension("txt"));
        }
        paths
    }

    /// Parse transcript text into a recognition.
    pub fn parse_transcript(&self, content: &str) -> Recognition {
        let blocks = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| TextBlock::from_words(line, self.confidence))
            .collect();

        Recognition {
            raw_text: content.trim_end().to_string(),
            blocks,
        }
    }
}

impl Default for SidecarRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl Recognizer for SidecarRecognizer {
    async fn recognize(&self, source: &SourceImage) -> Result<Recognition, RecognitionError> {
        let candidates = Self::transcript_paths(source.path());
        let mut last_error = None;

        for path in candidates {
            match tokio::fs::read_to_string(&path).await {
                Ok(content) => {
                    debug!("Using transcript {}", path.display());
                    return Ok(self.parse_transcript(&content));
                }
                Err(e) => last_error = Some((path, e)),
            }
        }

        match last_error {
            Some((path, source)) => Err(RecognitionError::Read { path, source }),
            None => Err(RecognitionError::InvalidImage(source.path().display().to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_paths() {
        let paths = SidecarRecognizer::transcript_paths(Path::new("/r/receipt.jpg"));
        assert_eq!(
            paths,
            vec![PathBuf::from("/r/receipt.jpg.txt"), PathBuf::from("/r/receipt.txt")]
        );

        let bare = SidecarRecognizer::transcript_paths(Path::new("/r/receipt"));
        assert_eq!(bare, vec![PathBuf::from("/r/receipt.txt")]);
    }

    #[test]
    fn test_parse_transcript_blocks() {
        let recognition = SidecarRecognizer::new()
            .with_confidence(0.75)
            .parse_transcript("Shop X\n\n  Total: 12.34  \n2024-05-01\n");

        let texts: Vec<_> = recognition.blocks.iter().map(|b| b.text.as_str()).collect();
        assert_eq!(texts, vec!["Shop X", "Total: 12.34", "2024-05-01"]);
        assert_eq!(recognition.raw_text, "Shop X\n\n  Total: 12.34  \n2024-05-01");
        assert!((recognition.mean_confidence() - 0.75).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_recognize_reads_stem_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("receipt.jpg");
        std::fs::write(&image, b"\xFF\xD8\xFF\xE0").unwrap();
        std::fs::write(dir.path().join("receipt.txt"), "Cafe\nTotal 4.50").unwrap();

        let recognition = SidecarRecognizer::new()
            .recognize(&SourceImage::new(&image))
            .await
            .unwrap();
        assert_eq!(recognition.blocks[0].text, "Cafe");
    }

    #[tokio::test]
    async fn test_recognize_missing_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("receipt.jpg");

        let result = SidecarRecognizer::new().recognize(&SourceImage::new(&image)).await;
        assert!(matches!(result, Err(RecognitionError::Read { .. })));
    }
}
