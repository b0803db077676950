//! Per-format text extractors
//!
//! Parsing is CPU-bound, so every extractor hands the actual work to the
//! blocking pool and only awaits the result.

use futures::future::join_all;
use std::sync::Arc;
use tokio::task::{spawn_blocking, JoinError};

use crate::error::{Error, Result};
use crate::types::SourceFile;

use super::parser::{
    CalamineParser, DocxRsParser, LopdfParser, PdfDocumentParser, SpreadsheetParser,
    WordDocParser,
};

fn join_error(filename: &str, err: JoinError) -> Error {
    Error::file_parse(filename, format!("parser task failed: {}", err))
}

/// PDF text extraction, one blocking task per page
#[derive(Clone)]
pub struct PdfExtractor {
    parser: Arc<dyn PdfDocumentParser>,
}

impl PdfExtractor {
    pub fn new(parser: Arc<dyn PdfDocumentParser>) -> Self {
        Self { parser }
    }

    /// Page texts joined with a single space, in page-number order
    pub async fn extract(&self, file: &SourceFile) -> Result<String> {
        let parser = Arc::clone(&self.parser);
        let data = file.bytes.clone();
        let name = file.name.clone();
        let pages = spawn_blocking(move || parser.open(&name, &data))
            .await
            .map_err(|e| join_error(&file.name, e))??;

        let page_count = pages.page_count();
        tracing::debug!("Extracting {} pages from {}", page_count, file.name);

        // join_all yields results in input order regardless of completion order
        let page_tasks = (1..=page_count).map(|page_number| {
            let pages = Arc::clone(&pages);
            spawn_blocking(move || pages.text_runs(page_number).map(|runs| runs.join(" ")))
        });

        let mut page_texts = Vec::with_capacity(page_count as usize);
        for result in join_all(page_tasks).await {
            page_texts.push(result.map_err(|e| join_error(&file.name, e))??);
        }

        Ok(page_texts.join(" "))
    }
}

/// Workbook and CSV extraction
#[derive(Clone)]
pub struct SpreadsheetExtractor {
    parser: Arc<dyn SpreadsheetParser>,
}

impl SpreadsheetExtractor {
    pub fn new(parser: Arc<dyn SpreadsheetParser>) -> Self {
        Self { parser }
    }

    /// CSV input is read as text; everything else as a binary workbook
    fn is_delimited(file: &SourceFile) -> bool {
        let ext = file.extension();
        if ext == "xlsx" || ext == "xls" {
            return false;
        }
        ext == "csv" || file.declared_media_type.to_lowercase().contains("csv")
    }

    pub async fn extract(&self, file: &SourceFile) -> Result<String> {
        let parser = Arc::clone(&self.parser);
        let data = file.bytes.clone();
        let name = file.name.clone();
        let delimited = Self::is_delimited(file);

        let workbook = spawn_blocking(move || {
            if delimited {
                parser.parse_delimited(&name, &String::from_utf8_lossy(&data))
            } else {
                parser.parse_workbook(&name, &data)
            }
        })
        .await
        .map_err(|e| join_error(&file.name, e))??;

        tracing::debug!("{}: {} sheet(s)", file.name, workbook.sheets.len());
        Ok(workbook.render())
    }
}

/// Word-processor extraction
#[derive(Clone)]
pub struct DocxExtractor {
    parser: Arc<dyn WordDocParser>,
}

impl DocxExtractor {
    pub fn new(parser: Arc<dyn WordDocParser>) -> Self {
        Self { parser }
    }

    /// Decoder errors are logged and replaced with a generic parse error
    pub async fn extract(&self, file: &SourceFile) -> Result<String> {
        let parser = Arc::clone(&self.parser);
        let data = file.bytes.clone();
        let name = file.name.clone();

        match spawn_blocking(move || parser.extract_raw_text(&name, &data)).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => {
                tracing::warn!("DOCX decode failed: {}", e);
                Err(Error::file_parse(
                    &file.name,
                    "Failed to extract text from DOCX file",
                ))
            }
            Err(e) => Err(join_error(&file.name, e)),
        }
    }
}

/// UTF-8 passthrough
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    pub fn extract(&self, file: &SourceFile) -> String {
        String::from_utf8_lossy(&file.bytes).into_owned()
    }
}

/// The full set of non-OCR extractors
#[derive(Clone)]
pub struct Extractors {
    pub pdf: PdfExtractor,
    pub spreadsheet: SpreadsheetExtractor,
    pub docx: DocxExtractor,
    pub plain_text: PlainTextExtractor,
}

impl Default for Extractors {
    fn default() -> Self {
        Self {
            pdf: PdfExtractor::new(Arc::new(LopdfParser)),
            spreadsheet: SpreadsheetExtractor::new(Arc::new(CalamineParser)),
            docx: DocxExtractor::new(Arc::new(DocxRsParser)),
            plain_text: PlainTextExtractor,
        }
    }
}
