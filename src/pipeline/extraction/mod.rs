pub mod types;
pub mod validation;
pub mod patterns;
pub mod extractor;
pub mod ocr;

pub use types::*;
pub use validation::*;
pub use extractor::*;
pub use ocr::*;

use thiserror::Error;

/// Failures while turning an uploaded document into report text.
///
/// Field extraction itself never fails; only text acquisition does.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("OCR processing failed: {0}")]
    OcrProcessing(String),

    #[error("PDF rasterization failed: {0}")]
    PdfRasterization(String),

    #[error("Unsupported format for extraction")]
    UnsupportedFormat,
}
