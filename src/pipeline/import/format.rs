use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ImportError;

/// Upload categories the report reader understands.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FileCategory {
    Pdf,
    Image,
    Unsupported,
}

impl FileCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Image => "image",
            Self::Unsupported => "unsupported",
        }
    }

    /// PDFs are rasterized to page images before OCR.
    pub fn needs_rasterization(&self) -> bool {
        matches!(self, Self::Pdf)
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported)
    }
}

/// Result of format detection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatDetection {
    pub mime_type: String,
    pub category: FileCategory,
}

/// Image extensions accepted for upload.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Detect an upload's format. Magic bytes win over the file extension; the
/// extension is only consulted when the header is not recognised.
pub fn detect_format(file_name: &str, header: &[u8]) -> FormatDetection {
    let (mime_type, category) = match header {
        // PDF: starts with %PDF
        [0x25, 0x50, 0x44, 0x46, ..] => ("application/pdf", FileCategory::Pdf),
        // JPEG: starts with FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => ("image/jpeg", FileCategory::Image),
        // PNG: starts with 89 50 4E 47
        [0x89, 0x50, 0x4E, 0x47, ..] => ("image/png", FileCategory::Image),
        _ => detect_from_extension(file_name),
    };

    FormatDetection {
        mime_type: mime_type.to_string(),
        category,
    }
}

fn detect_from_extension(file_name: &str) -> (&'static str, FileCategory) {
    let extension = match file_name.rsplit_once('.') {
        Some((_, ext)) => ext.to_lowercase(),
        None => return ("application/octet-stream", FileCategory::Unsupported),
    };

    match extension.as_str() {
        "pdf" => ("application/pdf", FileCategory::Pdf),
        "png" => ("image/png", FileCategory::Image),
        "jpg" | "jpeg" => ("image/jpeg", FileCategory::Image),
        _ => ("application/octet-stream", FileCategory::Unsupported),
    }
}

/// Detect the format of a file on disk from its name and first bytes.
pub fn detect_file_format(path: &Path) -> Result<FormatDetection, ImportError> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .ok_or(ImportError::MissingFileName)?;

    let mut file = std::fs::File::open(path)?;
    let mut header = [0u8; 8];
    let bytes_read = file.read(&mut header)?;

    Ok(detect_format(file_name, &header[..bytes_read]))
}
