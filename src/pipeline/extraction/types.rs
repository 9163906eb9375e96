use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ExtractionError;
use crate::config::PipelineConfig;

/// Plain text recovered from one uploaded report.
///
/// Lives only until fields are extracted from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportText {
    pub document_id: Uuid,
    pub text: String,
    pub page_count: usize,
}

/// Recognition settings handed to the OCR engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrSettings {
    /// Tesseract-style language spec, e.g. "eng" or "eng+fra".
    pub language: String,
    /// Page segmentation mode (6 = a single uniform block of text).
    pub page_segmentation_mode: u8,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            page_segmentation_mode: 6,
        }
    }
}

impl From<&PipelineConfig> for OcrSettings {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            language: config.ocr_language.clone(),
            page_segmentation_mode: config.page_segmentation_mode,
        }
    }
}

/// OCR engine abstraction (allows mocking for tests)
pub trait OcrEngine {
    fn ocr_image(
        &self,
        image_bytes: &[u8],
        settings: &OcrSettings,
    ) -> Result<String, ExtractionError>;
}

/// PDF → page images, one encoded image per page in page order.
pub trait PdfRasterizer {
    fn rasterize(&self, pdf_bytes: &[u8], dpi: u32) -> Result<Vec<Vec<u8>>, ExtractionError>;
}
