//! Parser capabilities for binary office and PDF formats
//!
//! Each format is reached through a small trait so the extractors can be
//! exercised without real documents. The default backends wrap lopdf,
//! calamine, csv and docx-rs.

use calamine::Reader;
use std::io::Cursor;
use std::sync::Arc;

use crate::error::{Error, Result};

/// Page-addressable view of a parsed PDF
pub trait PdfPages: Send + Sync {
    /// Number of pages
    fn page_count(&self) -> u32;

    /// Positioned text runs of a page (1-indexed), in content-stream order
    fn text_runs(&self, page_number: u32) -> Result<Vec<String>>;
}

/// Opens PDF bytes into pages
pub trait PdfDocumentParser: Send + Sync {
    fn open(&self, filename: &str, data: &[u8]) -> Result<Arc<dyn PdfPages>>;
}

/// A single worksheet as rows of rendered cell values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

/// Sheets in workbook order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    /// Render as tab-separated rows, each sheet terminated by a newline
    pub fn render(&self) -> String {
        let mut text = String::new();
        for sheet in &self.sheets {
            let rows: Vec<String> = sheet.rows.iter().map(|row| row.join("\t")).collect();
            text.push_str(&rows.join("\n"));
            text.push('\n');
        }
        text
    }
}

/// Tabular parsing for binary workbooks and delimited text
pub trait SpreadsheetParser: Send + Sync {
    /// Parse an xlsx/xls workbook
    fn parse_workbook(&self, filename: &str, data: &[u8]) -> Result<Workbook>;

    /// Parse comma-separated text as a single-sheet workbook
    fn parse_delimited(&self, filename: &str, text: &str) -> Result<Workbook>;
}

/// Raw text extraction for word-processor documents
pub trait WordDocParser: Send + Sync {
    fn extract_raw_text(&self, filename: &str, data: &[u8]) -> Result<String>;
}

/// lopdf-backed PDF parser
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfParser;

struct LopdfPages {
    filename: String,
    doc: lopdf::Document,
    page_numbers: Vec<u32>,
}

impl PdfDocumentParser for LopdfParser {
    fn open(&self, filename: &str, data: &[u8]) -> Result<Arc<dyn PdfPages>> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::file_parse(filename, format!("Failed to load PDF: {}", e)))?;
        let page_numbers = doc.get_pages().keys().copied().collect();
        Ok(Arc::new(LopdfPages {
            filename: filename.to_string(),
            doc,
            page_numbers,
        }))
    }
}

impl PdfPages for LopdfPages {
    fn page_count(&self) -> u32 {
        self.page_numbers.len() as u32
    }

    fn text_runs(&self, page_number: u32) -> Result<Vec<String>> {
        if !self.page_numbers.contains(&page_number) {
            return Err(Error::file_parse(
                &self.filename,
                format!("page {} out of range", page_number),
            ));
        }

        let text = self.doc.extract_text(&[page_number]).map_err(|e| {
            Error::file_parse(
                &self.filename,
                format!("Failed to extract text from page {}: {}", page_number, e),
            )
        })?;

        // lopdf ends each text object with a newline
        Ok(text
            .replace('\0', "")
            .lines()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }
}

/// calamine + csv backed spreadsheet parser
#[derive(Debug, Default, Clone, Copy)]
pub struct CalamineParser;

impl CalamineParser {
    fn render_cell(cell: &calamine::Data) -> String {
        match cell {
            calamine::Data::Empty => String::new(),
            calamine::Data::String(s) => s.clone(),
            calamine::Data::Float(f) => f.to_string(),
            calamine::Data::Int(i) => i.to_string(),
            calamine::Data::Bool(b) => b.to_string(),
            other => other.to_string(),
        }
    }
}

/// Drop trailing empty cells so ragged rows don't end in tabs
fn trim_row(mut row: Vec<String>) -> Vec<String> {
    while row.last().is_some_and(|c| c.is_empty()) {
        row.pop();
    }
    row
}

impl SpreadsheetParser for CalamineParser {
    fn parse_workbook(&self, filename: &str, data: &[u8]) -> Result<Workbook> {
        let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(data))
            .map_err(|e| Error::file_parse(filename, format!("Failed to open workbook: {}", e)))?;

        let mut sheets = Vec::new();
        for sheet_name in workbook.sheet_names().to_vec() {
            let range = workbook.worksheet_range(&sheet_name).map_err(|e| {
                Error::file_parse(
                    filename,
                    format!("Failed to read sheet '{}': {}", sheet_name, e),
                )
            })?;

            let rows = range
                .rows()
                .map(|row| trim_row(row.iter().map(Self::render_cell).collect()))
                .collect();

            sheets.push(Sheet {
                name: sheet_name,
                rows,
            });
        }

        Ok(Workbook { sheets })
    }

    fn parse_delimited(&self, filename: &str, text: &str) -> Result<Workbook> {
        let text = text.trim_start_matches('\u{feff}');
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record
                .map_err(|e| Error::file_parse(filename, format!("Malformed CSV record: {}", e)))?;
            rows.push(trim_row(record.iter().map(str::to_string).collect()));
        }

        if rows.is_empty() {
            return Ok(Workbook::default());
        }

        Ok(Workbook {
            sheets: vec![Sheet {
                name: "Sheet1".to_string(),
                rows,
            }],
        })
    }
}

/// docx-rs backed word-processor parser
#[derive(Debug, Default, Clone, Copy)]
pub struct DocxRsParser;

impl DocxRsParser {
    fn push_paragraph(out: &mut String, paragraph: &docx_rs::Paragraph) {
        for child in &paragraph.children {
            if let docx_rs::ParagraphChild::Run(run) = child {
                for child in &run.children {
                    match child {
                        docx_rs::RunChild::Text(t) => out.push_str(&t.text),
                        docx_rs::RunChild::Tab(_) => out.push('\t'),
                        _ => {}
                    }
                }
            }
        }
        out.push_str("\n\n");
    }

    fn push_table(out: &mut String, table: &docx_rs::Table) {
        for row in &table.rows {
            let docx_rs::TableChild::TableRow(row) = row;
            for cell in &row.cells {
                let docx_rs::TableRowChild::TableCell(cell) = cell;
                for content in &cell.children {
                    match content {
                        docx_rs::TableCellContent::Paragraph(p) => Self::push_paragraph(out, p),
                        docx_rs::TableCellContent::Table(t) => Self::push_table(out, t),
                        _ => {}
                    }
                }
            }
        }
    }
}

impl WordDocParser for DocxRsParser {
    fn extract_raw_text(&self, filename: &str, data: &[u8]) -> Result<String> {
        let doc = docx_rs::read_docx(data).map_err(|e| Error::file_parse(filename, e.to_string()))?;

        let mut content = String::new();
        for child in &doc.document.children {
            match child {
                docx_rs::DocumentChild::Paragraph(p) => Self::push_paragraph(&mut content, p),
                docx_rs::DocumentChild::Table(t) => Self::push_table(&mut content, t),
                _ => {}
            }
        }

        Ok(content)
    }
}
