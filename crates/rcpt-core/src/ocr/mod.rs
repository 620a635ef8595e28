//! Text recognition contract and backends.

#[cfg(feature = "native")]
mod pure_engine;
mod sidecar;

#[cfg(feature = "native")]
pub use pure_engine::PureOcrRecognizer;
pub use sidecar::SidecarRecognizer;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RecognitionError;
use crate::storage::SourceImage;

/// A recognized word or symbol with its confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextElement {
    pub text: String,
    /// Recognition confidence (0.0 - 1.0).
    pub confidence: f32,
}

/// A block of recognized text, usually one line on a receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub text: String,
    pub elements: Vec<TextElement>,
}

impl TextBlock {
    /// Build a block whose elements are the whitespace-separated words of
    /// `text`, all with the same confidence.
    pub fn from_words(text: impl Into<String>, confidence: f32) -> Self {
        let text = text.into();
        let elements = text
            .split_whitespace()
            .map(|word| TextElement {
                text: word.to_string(),
                confidence,
            })
            .collect();
        Self { text, elements }
    }
}

/// Output of a recognition backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recognition {
    /// Full text, blocks joined with newlines.
    pub raw_text: String,

    /// Blocks in reading order.
    pub blocks: Vec<TextBlock>,
}

impl Recognition {
    /// Build a recognition from blocks, joining their text for `raw_text`.
    pub fn from_blocks(blocks: Vec<TextBlock>) -> Self {
        let raw_text = blocks
            .iter()
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        Self { raw_text, blocks }
    }

    /// Mean confidence over every element of every block, `0.0` when empty.
    pub fn mean_confidence(&self) -> f32 {
        let (sum, count) = self
            .blocks
            .iter()
            .flat_map(|b| b.elements.iter())
            .fold((0.0f64, 0usize), |(sum, count), e| (sum + e.confidence as f64, count + 1));

        if count == 0 {
            0.0
        } else {
            (sum / count as f64) as f32
        }
    }
}

/// A backend that turns an image into recognized text.
#[async_trait(?Send)]
pub trait Recognizer {
    /// Recognize text in the image.
    async fn recognize(&self, source: &SourceImage) -> Result<Recognition, RecognitionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_blocks_joins_text() {
        let recognition = Recognition::from_blocks(vec![
            TextBlock::from_words("Shop X", 1.0),
            TextBlock::from_words("Total: 12.34", 1.0),
        ]);
        assert_eq!(recognition.raw_text, "Shop X\nTotal: 12.34");
        assert_eq!(recognition.blocks[1].elements.len(), 2);
    }

    #[test]
    fn test_mean_confidence_over_elements() {
        let recognition = Recognition::from_blocks(vec![
            TextBlock::from_words("a b c", 0.9),
            TextBlock::from_words("d", 0.5),
        ]);
        // (0.9 * 3 + 0.5) / 4
        assert!((recognition.mean_confidence() - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_mean_confidence_empty() {
        assert_eq!(Recognition::default().mean_confidence(), 0.0);

        let no_elements = Recognition::from_blocks(vec![TextBlock::from_words("   ", 0.9)]);
        assert_eq!(no_elements.mean_confidence(), 0.0);
    }
}
