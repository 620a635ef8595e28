//! Pure Rust OCR backend using `pure-onnx-ocr`.

use std::time::Instant;

use async_trait::async_trait;
use image::GenericImageView;
use tracing::{debug, info};

use crate::error::RecognitionError;
use crate::models::config::ModelConfig;
use crate::storage::SourceImage;

use super::{Recognition, Recognizer, TextBlock, TextElement};

/// Recognizer backed by `pure-onnx-ocr` (pure Rust, no external ONNX Runtime).
pub struct PureOcrRecognizer {
    engine: pure_onnx_ocr::engine::OcrEngine,
}

impl PureOcrRecognizer {
    /// Load detection and recognition models from the configured directory.
    pub fn from_config(models: &ModelConfig) -> Result<Self, RecognitionError> {
        let det_path = models.path(&models.detection_model);
        let rec_path = models.path(&models.recognition_model);
        let dict_path = models.path(&models.dictionary);

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| RecognitionError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;

        info!("Loaded pure-onnx-ocr engine from {}", models.model_dir.display());

        Ok(Self { engine })
    }
}

#[async_trait(?Send)]
impl Recognizer for PureOcrRecognizer {
    async fn recognize(&self, source: &SourceImage) -> Result<Recognition, RecognitionError> {
        let start = Instant::now();
        let image = image::open(source.path())
            .map_err(|e| RecognitionError::InvalidImage(format!("{}: {}", source.path().display(), e)))?;
        let (width, height) = image.dimensions();

        debug!("Recognizing {}x{} image", width, height);

        let results = self
            .engine
            .run_from_image(&image)
            .map_err(|e| RecognitionError::Recognition(format!("pure-onnx-ocr: {}", e)))?;

        // Reading order: rows of ~20px top to bottom, then left to right
        let mut regions: Vec<(f32, f32, TextBlock)> = results
            .iter()
            .map(|r| {
                let (x, y) = top_left(&r.bounding_box);
                let text = r.text.replace("[UNK]", " ");
                let elements = text
                    .split_whitespace()
                    .map(|word| TextElement {
                        text: word.to_string(),
                        confidence: r.confidence,
                    })
                    .collect();
                (x, y, TextBlock { text, elements })
            })
            .collect();

        regions.sort_by(|a, b| {
            let row_a = (a.1 / 20.0) as i32;
            let row_b = (b.1 / 20.0) as i32;
            row_a
                .cmp(&row_b)
                .then_with(|| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal))
        });

        let recognition = Recognition::from_blocks(regions.into_iter().map(|(_, _, block)| block).collect());

        info!(
            "OCR complete: {} blocks in {}ms",
            recognition.blocks.len(),
            start.elapsed().as_millis()
        );

        Ok(recognition)
    }
}

/// Smallest x and y over the polygon's exterior points.
fn top_left(polygon: &pure_onnx_ocr::Polygon<f64>) -> (f32, f32) {
    polygon
        .exterior()
        .coords()
        .take(4)
        .fold((f32::INFINITY, f32::INFINITY), |(x, y), c| {
            (x.min(c.x as f32), y.min(c.y as f32))
        })
}
