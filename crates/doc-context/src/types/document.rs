//! Source files and format classification

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Extensions routed to the vision OCR path
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

/// A raw file submitted for ingestion
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Original filename
    pub name: String,
    /// Media type reported by the uploader (may be empty or wrong)
    pub declared_media_type: String,
    /// Raw payload
    pub bytes: Bytes,
}

impl SourceFile {
    /// Wrap an in-memory payload
    pub fn new(
        name: impl Into<String>,
        declared_media_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            declared_media_type: declared_media_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk; the media type is guessed from the extension
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| Error::read(path.display().to_string(), e))?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let media_type = mime_guess::from_path(path)
            .first()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_default();

        Ok(Self::new(name, media_type, data))
    }

    /// Lowercased extension after the last `.`, empty when there is none
    pub fn extension(&self) -> String {
        extension_of(&self.name)
    }

    /// Image media type to send upstream.
    ///
    /// The declared type is used only when it names an image; otherwise the
    /// type is guessed from the filename.
    pub fn effective_media_type(&self) -> String {
        let declared = self.declared_media_type.trim();
        if declared.to_lowercase().starts_with("image/") {
            return declared.to_string();
        }
        mime_guess::from_path(&self.name)
            .first()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string())
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

fn extension_of(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((_, ext)) => ext.to_lowercase(),
        None => String::new(),
    }
}

/// Extraction algorithm selected once per file
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    /// Per-page PDF text runs
    Pdf,
    /// Workbook or CSV rendered as tab-separated rows
    Spreadsheet,
    /// Word-processor paragraphs
    Docx,
    /// Vision model OCR
    Image,
    /// UTF-8 passthrough
    PlainText,
}

impl ExtractionStrategy {
    /// Pick a strategy from the filename and declared media type.
    ///
    /// Media types are trusted for PDF, images and CSV; office formats are
    /// recognised by extension only. Anything else is plain text.
    pub fn classify(name: &str, declared_media_type: &str) -> Self {
        let media = declared_media_type.to_lowercase();
        let ext = extension_of(name);

        if media.contains("pdf") || ext == "pdf" {
            Self::Pdf
        } else if media.starts_with("image/") || IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Self::Image
        } else if ext == "xlsx" || ext == "xls" {
            Self::Spreadsheet
        } else if media.contains("csv") || ext == "csv" {
            Self::Spreadsheet
        } else if ext == "docx" {
            Self::Docx
        } else {
            Self::PlainText
        }
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Spreadsheet => "Spreadsheet",
            Self::Docx => "Word Document (.docx)",
            Self::Image => "Image",
            Self::PlainText => "Text File",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_by_extension() {
        use ExtractionStrategy::*;

        let cases = [
            ("report.pdf", Pdf),
            ("REPORT.PDF", Pdf),
            ("scan.jpg", Image),
            ("scan.jpeg", Image),
            ("chart.png", Image),
            ("photo.webp", Image),
            ("anim.gif", Image),
            ("budget.xlsx", Spreadsheet),
            ("legacy.xls", Spreadsheet),
            ("data.csv", Spreadsheet),
            ("letter.docx", Docx),
            ("notes.txt", PlainText),
            ("main.rs", PlainText),
            ("archive.tar.gz", PlainText),
            ("README", PlainText),
        ];

        for (name, expected) in cases {
            assert_eq!(ExtractionStrategy::classify(name, ""), expected, "{}", name);
        }
    }

    #[test]
    fn test_classify_by_media_type() {
        use ExtractionStrategy::*;

        assert_eq!(ExtractionStrategy::classify("blob", "application/pdf"), Pdf);
        assert_eq!(ExtractionStrategy::classify("blob", "image/bmp"), Image);
        assert_eq!(ExtractionStrategy::classify("blob", "text/csv"), Spreadsheet);
        assert_eq!(ExtractionStrategy::classify("blob", "Text/CSV"), Spreadsheet);
        // Office media types are not trusted without the extension
        assert_eq!(
            ExtractionStrategy::classify(
                "blob",
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            ),
            PlainText
        );
    }

    #[test]
    fn test_classify_precedence() {
        use ExtractionStrategy::*;

        // PDF media type wins over an image extension
        assert_eq!(ExtractionStrategy::classify("page.png", "application/pdf"), Pdf);
        // Image media type wins over a spreadsheet extension
        assert_eq!(ExtractionStrategy::classify("sheet.xlsx", "image/png"), Image);
        // Spreadsheet extension wins over a csv media type
        assert_eq!(ExtractionStrategy::classify("sheet.xls", "text/csv"), Spreadsheet);
    }

    #[test]
    fn test_effective_media_type() {
        let declared = SourceFile::new("x.png", "image/jpeg", Vec::new());
        assert_eq!(declared.effective_media_type(), "image/jpeg");

        let guessed = SourceFile::new("x.png", "", Vec::new());
        assert_eq!(guessed.effective_media_type(), "image/png");

        let unknown = SourceFile::new("x", " ", Vec::new());
        assert_eq!(unknown.effective_media_type(), "application/octet-stream");

        // A non-image declared type falls back to the extension
        let untrusted = SourceFile::new("scan.png", "application/octet-stream", Vec::new());
        assert_eq!(untrusted.effective_media_type(), "image/png");

        let padded = SourceFile::new("scan.png", " image/webp ", Vec::new());
        assert_eq!(padded.effective_media_type(), "image/webp");
    }

    #[tokio::test]
    async fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.csv");
        std::fs::write(&path, "a,b\n").unwrap();

        let file = SourceFile::from_path(&path).await.unwrap();
        assert_eq!(file.name, "notes.csv");
        assert_eq!(file.declared_media_type, "text/csv");
        assert_eq!(file.bytes.as_ref(), b"a,b\n");

        let missing = SourceFile::from_path(dir.path().join("gone.txt")).await;
        assert!(matches!(missing, Err(Error::Read { .. })));
    }
}
