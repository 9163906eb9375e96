//! Uploaded document → report text, through the external OCR collaborators.
//!
//! OCR output is expected to be imperfect or missing. An image whose OCR call
//! fails degrades to empty text so the caller can ask the user to fill the
//! form by hand; a PDF that cannot be rasterized is a hard failure.

use uuid::Uuid;

use super::types::{OcrEngine, OcrSettings, PdfRasterizer, ReportText};
use super::ExtractionError;
use crate::config::PipelineConfig;
use crate::pipeline::import::FileCategory;

/// Read the text of an uploaded report.
pub fn acquire_report_text(
    bytes: &[u8],
    category: FileCategory,
    ocr: &dyn OcrEngine,
    rasterizer: &dyn PdfRasterizer,
    config: &PipelineConfig,
) -> Result<ReportText, ExtractionError> {
    let document_id = Uuid::new_v4();
    let settings = OcrSettings::from(config);

    let (text, page_count) = match category {
        FileCategory::Image => (ocr_or_empty(ocr, bytes, &settings, 0), 1),
        FileCategory::Pdf => {
            let pages = rasterizer.rasterize(bytes, config.pdf_dpi)?;
            let mut text = String::new();
            for (index, page) in pages.iter().enumerate() {
                text.push_str(&ocr_or_empty(ocr, page, &settings, index));
                text.push('\n');
            }
            (text, pages.len())
        }
        FileCategory::Unsupported => return Err(ExtractionError::UnsupportedFormat),
    };

    tracing::info!(
        document_id = %document_id,
        category = category.as_str(),
        page_count,
        chars = text.len(),
        "Report text acquired"
    );

    Ok(ReportText {
        document_id,
        text,
        page_count,
    })
}

fn ocr_or_empty(ocr: &dyn OcrEngine, image: &[u8], settings: &OcrSettings, page: usize) -> String {
    match ocr.ocr_image(image, settings) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(page, error = %e, "OCR failed for page, continuing with empty text");
            String::new()
        }
    }
}

/// Mock OCR engine for unit testing without a real OCR backend.
///
/// Returns the page texts in order, cycling back to the first when more
/// images are recognised than texts were given. `None` simulates a failure.
pub struct MockOcrEngine {
    pages: Vec<Option<String>>,
    calls: std::cell::Cell<usize>,
}

impl MockOcrEngine {
    pub fn new(text: &str) -> Self {
        Self::with_pages(vec![Some(text.to_string())])
    }

    pub fn with_pages(pages: Vec<Option<String>>) -> Self {
        Self {
            pages,
            calls: std::cell::Cell::new(0),
        }
    }

    pub fn failing() -> Self {
        Self::with_pages(vec![None])
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl OcrEngine for MockOcrEngine {
    fn ocr_image(
        &self,
        _image_bytes: &[u8],
        _settings: &OcrSettings,
    ) -> Result<String, ExtractionError> {
        let call = self.calls.get();
        self.calls.set(call + 1);
        if self.pages.is_empty() {
            return Ok(String::new());
        }
        self.pages[call % self.pages.len()]
            .clone()
            .ok_or_else(|| ExtractionError::OcrProcessing("mock OCR failure".into()))
    }
}

/// Mock rasterizer producing a fixed number of blank pages, or failing.
pub struct MockRasterizer {
    pub page_count: Option<usize>,
}

impl MockRasterizer {
    pub fn new(page_count: usize) -> Self {
        Self {
            page_count: Some(page_count),
        }
    }

    pub fn failing() -> Self {
        Self { page_count: None }
    }
}

impl PdfRasterizer for MockRasterizer {
    fn rasterize(&self, _pdf_bytes: &[u8], _dpi: u32) -> Result<Vec<Vec<u8>>, ExtractionError> {
        match self.page_count {
            Some(n) => Ok(vec![Vec::new(); n]),
            None => Err(ExtractionError::PdfRasterization("mock rasterizer failure".into())),
        }
    }
}
