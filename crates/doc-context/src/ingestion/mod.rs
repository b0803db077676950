//! Document ingestion: per-format extraction and batch orchestration

pub mod extractor;
pub mod parser;
mod pipeline;

pub use extractor::{DocxExtractor, Extractors, PdfExtractor, PlainTextExtractor, SpreadsheetExtractor};
pub use parser::{
    CalamineParser, DocxRsParser, LopdfParser, PdfDocumentParser, PdfPages, Sheet,
    SpreadsheetParser, WordDocParser, Workbook,
};
pub use pipeline::IngestionPipeline;
