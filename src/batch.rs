//! Offline driver: reads a manifest of already-fetched pages, runs each through
//! the coordinator and writes one result row per page.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use csv_async::{AsyncReaderBuilder, AsyncSerializer, AsyncWriterBuilder};
use futures::stream::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::fs::File as AsyncFile;
use tokio::io::{BufReader, BufWriter};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::coordinator::{Coordinator, Outcome};
use crate::id_issuer::IdIssuer;
use crate::page::{PageDescriptor, ParseResult};

/// One manifest row. `path` is relative to the manifest's directory unless
/// absolute.
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestRecord {
    pub url: String,
    pub base_url: String,
    pub path: String,
    #[serde(default)]
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultRecord {
    pub url: String,
    pub state: String,
    pub vendor: String,
    pub product_id: Option<i64>,
    /// Metadata written for the page, as a JSON object.
    pub metadata: String,
    pub processed_at: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub complete: usize,
    pub partial: usize,
    pub rejected: usize,
    /// Manifest rows that could not be parsed or whose content could not be read.
    pub skipped: usize,
    /// Complete or partial pages left without an id.
    pub unassigned: usize,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.complete + self.partial + self.rejected + self.skipped
    }
}

struct Sink {
    writer: AsyncSerializer<BufWriter<AsyncFile>>,
    summary: BatchSummary,
    error: Option<anyhow::Error>,
}

/// Processes every manifest row with at most `max_concurrency` pages in flight.
pub async fn run_batch<I: IdIssuer>(
    coordinator: &Coordinator<I>,
    manifest: &Path,
    output: &Path,
    max_concurrency: usize,
) -> Result<BatchSummary> {
    let base_dir = manifest.parent().map(Path::to_path_buf).unwrap_or_default();

    let file = AsyncFile::open(manifest)
        .await
        .with_context(|| format!("Failed to open manifest {}", manifest.display()))?;
    let mut csv_reader = AsyncReaderBuilder::new()
        .trim(csv_async::Trim::All)
        .create_deserializer(BufReader::new(file));

    let file_out = AsyncFile::create(output)
        .await
        .with_context(|| format!("Failed to create output {}", output.display()))?;
    let csv_writer = AsyncWriterBuilder::new().create_serializer(BufWriter::new(file_out));

    let sink = Mutex::new(Sink {
        writer: csv_writer,
        summary: BatchSummary::default(),
        error: None,
    });

    csv_reader
        .deserialize::<ManifestRecord>()
        .for_each_concurrent(max_concurrency.max(1), |record_result| {
            let base_dir = &base_dir;
            let sink = &sink;
            async move {
                let row = match record_result {
                    Ok(record) => process_record(coordinator, base_dir, record).await,
                    Err(e) => {
                        warn!(error = %e, "failed to read manifest record");
                        sink.lock().await.summary.skipped += 1;
                        return;
                    }
                };

                let mut sink = sink.lock().await;
                match row.state.as_str() {
                    "complete" => sink.summary.complete += 1,
                    "partial" => sink.summary.partial += 1,
                    "rejected" => sink.summary.rejected += 1,
                    _ => sink.summary.skipped += 1,
                }
                if matches!(row.state.as_str(), "complete" | "partial") && row.product_id.is_none() {
                    sink.summary.unassigned += 1;
                }
                let written = sink.writer.serialize(&row).await;
                if let Err(e) = written {
                    if sink.error.is_none() {
                        sink.error = Some(anyhow::Error::new(e).context("Failed to write result row"));
                    }
                }
            }
        })
        .await;

    let mut sink = sink.into_inner();
    if let Some(e) = sink.error.take() {
        return Err(e);
    }
    sink.writer.flush().await.context("Failed to flush results")?;

    info!(
        complete = sink.summary.complete,
        partial = sink.summary.partial,
        rejected = sink.summary.rejected,
        skipped = sink.summary.skipped,
        "batch finished"
    );
    Ok(sink.summary)
}

async fn process_record<I: IdIssuer>(
    coordinator: &Coordinator<I>,
    base_dir: &Path,
    record: ManifestRecord,
) -> ResultRecord {
    let path: PathBuf = base_dir.join(&record.path);
    let content = match tokio::fs::read(&path).await {
        Ok(content) => content,
        Err(e) => {
            warn!(url = %record.url, path = %path.display(), error = %e, "page content unreadable");
            return ResultRecord {
                url: record.url,
                state: "skipped".to_string(),
                vendor: String::new(),
                product_id: None,
                metadata: "{}".to_string(),
                processed_at: Utc::now().to_rfc3339(),
            };
        }
    };

    let mut page = PageDescriptor::new(record.url.as_str(), record.base_url, content);
    if let Some(content_type) = record.content_type {
        page = page.with_content_type(content_type);
    }

    let mut parse = ParseResult::new(record.url.as_str());
    let outcome = coordinator.process_page(&page, &mut parse).await;
    result_row(&outcome, &parse)
}

fn result_row(outcome: &Outcome, parse: &ParseResult) -> ResultRecord {
    let report = outcome.report();
    ResultRecord {
        url: parse.url.clone(),
        state: outcome.state().to_string(),
        vendor: report.map(|r| r.vendor.clone()).unwrap_or_default(),
        product_id: report
            .and_then(|r| r.product_id.as_ref().ok())
            .map(|id| id.get()),
        metadata: serde_json::to_string(&parse.metadata).unwrap_or_else(|_| "{}".to_string()),
        processed_at: Utc::now().to_rfc3339(),
    }
}
