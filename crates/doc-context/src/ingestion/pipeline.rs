//! Batch orchestration: classify, extract and collect per-file outcomes

use futures::future::join_all;
use futures::stream::{FuturesUnordered, StreamExt};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::time::timeout;

use crate::config::{DocContextConfig, ProcessingConfig};
use crate::error::{Error, Result};
use crate::providers::{StreamingOcrClient, VisionOcr};
use crate::types::{ExtractedDocument, ExtractionStrategy, IngestionBatchResult, SourceFile};

use super::extractor::Extractors;

/// Completed slots by submission index
struct BatchOutcome {
    slots: Vec<Option<ExtractedDocument>>,
    cancelled: bool,
}

/// Turns a batch of source files into ordered extraction outcomes
pub struct IngestionPipeline {
    extractors: Extractors,
    ocr: Arc<dyn VisionOcr>,
    config: ProcessingConfig,
}

impl IngestionPipeline {
    /// Create a pipeline from explicit collaborators
    pub fn new(config: ProcessingConfig, extractors: Extractors, ocr: Arc<dyn VisionOcr>) -> Self {
        Self {
            extractors,
            ocr,
            config,
        }
    }

    /// Create a pipeline with the default parsers and an HTTP vision client
    pub fn from_config(config: &DocContextConfig) -> Result<Self> {
        let ocr = StreamingOcrClient::from_config(&config.vision)?;
        Ok(Self::new(
            config.processing.clone(),
            Extractors::default(),
            Arc::new(ocr),
        ))
    }

    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    /// Process a batch, cut short after `processing.batch_timeout_secs`
    pub async fn ingest(&self, batch: Vec<SourceFile>) -> IngestionBatchResult {
        let limit = self.config.batch_timeout();
        let shutdown = async move {
            tokio::time::sleep(limit).await;
            tracing::warn!("Batch timeout of {}s reached", limit.as_secs());
        };
        self.ingest_until(batch, shutdown).await
    }

    /// Process a batch until `shutdown` resolves.
    ///
    /// On shutdown no further file is started, in-flight extractions are
    /// dropped and the completed documents come back as a partial result.
    pub async fn ingest_until<F>(&self, batch: Vec<SourceFile>, shutdown: F) -> IngestionBatchResult
    where
        F: Future,
    {
        let names = batch.iter().map(|f| f.name.clone()).collect();
        let outcome = self.run(&batch, shutdown).await;
        Self::finish(names, outcome)
    }

    /// Read files from disk and process them as one batch.
    ///
    /// A path that cannot be read becomes a `ReadFailure` document in its
    /// position; the other files proceed.
    pub async fn ingest_paths<P>(&self, paths: &[P]) -> IngestionBatchResult
    where
        P: AsRef<Path>,
    {
        let batch_timeout = self.config.batch_timeout();
        self.ingest_paths_until(paths, tokio::time::sleep(batch_timeout))
            .await
    }

    /// `ingest_paths` with an explicit shutdown signal
    pub async fn ingest_paths_until<P, F>(&self, paths: &[P], shutdown: F) -> IngestionBatchResult
    where
        P: AsRef<Path>,
        F: Future,
    {
        let reads = join_all(paths.iter().map(|p| SourceFile::from_path(p))).await;

        let mut names = Vec::with_capacity(paths.len());
        let mut slots = Vec::with_capacity(paths.len());
        let mut batch = Vec::new();
        let mut positions = Vec::new();

        for (index, (path, read)) in paths.iter().zip(reads).enumerate() {
            match read {
                Ok(file) => {
                    names.push(file.name.clone());
                    slots.push(None);
                    positions.push(index);
                    batch.push(file);
                }
                Err(e) => {
                    let path = path.as_ref();
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| path.display().to_string());
                    tracing::warn!("Failed to read {}: {}", path.display(), e);

                    let strategy = ExtractionStrategy::classify(&name, "");
                    slots.push(Some(ExtractedDocument::failure(&name, strategy, &e)));
                    names.push(name);
                }
            }
        }

        let outcome = self.run(&batch, shutdown).await;
        for (position, slot) in positions.into_iter().zip(outcome.slots) {
            slots[position] = slot;
        }

        Self::finish(
            names,
            BatchOutcome {
                slots,
                cancelled: outcome.cancelled,
            },
        )
    }

    async fn run<F>(&self, batch: &[SourceFile], shutdown: F) -> BatchOutcome
    where
        F: Future,
    {
        let started = Instant::now();
        let parallel_files = self.config.parallel_files();
        let semaphore = Arc::new(Semaphore::new(parallel_files));

        tracing::info!(
            "Ingesting {} file(s), {} in parallel",
            batch.len(),
            parallel_files
        );

        let mut pending: FuturesUnordered<_> = batch
            .iter()
            .enumerate()
            .map(|(index, file)| {
                let sem = Arc::clone(&semaphore);
                async move {
                    // The semaphore is never closed
                    let _permit = sem.acquire().await.ok();
                    (index, self.extract_one(file).await)
                }
            })
            .collect();

        let mut slots: Vec<Option<ExtractedDocument>> = vec![None; batch.len()];
        tokio::pin!(shutdown);

        let cancelled = loop {
            tokio::select! {
                biased;
                next = pending.next() => match next {
                    Some((index, doc)) => slots[index] = Some(doc),
                    None => break false,
                },
                _ = &mut shutdown => break true,
            }
        };

        let completed = slots.iter().filter(|s| s.is_some()).count();
        if cancelled {
            tracing::warn!(
                "Batch cancelled after {:.1}s: {} of {} file(s) completed",
                started.elapsed().as_secs_f64(),
                completed,
                batch.len()
            );
        } else {
            tracing::info!(
                "Batch of {} file(s) finished in {:.1}s",
                batch.len(),
                started.elapsed().as_secs_f64()
            );
        }

        BatchOutcome { slots, cancelled }
    }

    fn finish(names: Vec<String>, outcome: BatchOutcome) -> IngestionBatchResult {
        if !outcome.cancelled {
            return IngestionBatchResult::new(outcome.slots.into_iter().flatten().collect());
        }

        let mut documents = Vec::new();
        let mut not_processed = Vec::new();
        for (name, slot) in names.into_iter().zip(outcome.slots) {
            match slot {
                Some(doc) => documents.push(doc),
                None => not_processed.push(name),
            }
        }
        IngestionBatchResult::partial(documents, not_processed)
    }

    async fn extract_one(&self, file: &SourceFile) -> ExtractedDocument {
        let strategy = ExtractionStrategy::classify(&file.name, &file.declared_media_type);

        if file.len() > self.config.max_file_size {
            let err = Error::file_parse(
                &file.name,
                format!(
                    "file is {} bytes, limit is {} bytes",
                    file.len(),
                    self.config.max_file_size
                ),
            );
            tracing::warn!("Rejected {}: {}", file.name, err);
            return ExtractedDocument::failure(&file.name, strategy, &err);
        }

        tracing::info!(
            "Extracting {} as {} ({} bytes)",
            file.name,
            strategy.display_name(),
            file.len()
        );
        let started = Instant::now();

        let outcome = match timeout(self.config.file_timeout(), self.dispatch(strategy, file)).await
        {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(self.config.file_timeout_secs)),
        };

        match outcome {
            Ok(text) => {
                tracing::info!(
                    "Extracted {} chars from {} in {:.1}s",
                    text.len(),
                    file.name,
                    started.elapsed().as_secs_f64()
                );
                ExtractedDocument::success(&file.name, strategy, text)
            }
            Err(e) => {
                tracing::warn!("Failed to extract {}: {}", file.name, e);
                ExtractedDocument::failure(&file.name, strategy, &e)
            }
        }
    }

    async fn dispatch(&self, strategy: ExtractionStrategy, file: &SourceFile) -> Result<String> {
        match strategy {
            ExtractionStrategy::Pdf => self.extractors.pdf.extract(file).await,
            ExtractionStrategy::Spreadsheet => self.extractors.spreadsheet.extract(file).await,
            ExtractionStrategy::Docx => self.extractors.docx.extract(file).await,
            ExtractionStrategy::Image => {
                self.ocr
                    .extract_via_vision_model(&file.bytes, &file.effective_media_type())
                    .await
            }
            ExtractionStrategy::PlainText => Ok(self.extractors.plain_text.extract(file)),
        }
    }
}
