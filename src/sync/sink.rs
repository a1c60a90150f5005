//! Durable audit trail of sync outcomes and run summaries.
//!
//! Mirrors the shape of the operational sync log: one row per unit outcome
//! carrying entity, status, record count, error message, and timing, plus a
//! summary document per run. The coordinator is the only caller of
//! `flush`.

use crate::sync::types::{RunSummary, SyncOutcome};

use chrono::Utc;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
	#[error("failed to write sync log: {0}")]
	Io(#[from] std::io::Error),

	#[error("failed to encode sync log entry: {0}")]
	Encode(#[from] serde_json::Error),
}

/// Durable record of what a run did.
#[async_trait::async_trait]
pub trait SyncLogSink: Send + Sync {
	/// Record one terminal unit outcome.
	async fn record(&self, outcome: &SyncOutcome) -> Result<(), SinkError>;

	/// Persist the final summary of a run.
	async fn flush(&self, summary: &RunSummary) -> Result<(), SinkError>;
}

/// File-based implementation of `SyncLogSink`.
///
/// Outcomes append to a dated JSON-lines file; each run summary is written
/// as its own document named by the run timestamp.
pub struct FileSyncLogSink {
	data_dir: PathBuf,
}

impl FileSyncLogSink {
	pub fn new(data_dir: PathBuf) -> Self {
		Self { data_dir }
	}

	fn log_filename(&self) -> PathBuf {
		self.data_dir
			.join(format!("sync-log-{}.jsonl", Utc::now().format("%Y-%m-%d")))
	}
}

#[async_trait::async_trait]
impl SyncLogSink for FileSyncLogSink {
	async fn record(&self, outcome: &SyncOutcome) -> Result<(), SinkError> {
		let mut line = serde_json::to_string(outcome)?;
		line.push('\n');

		let mut file = tokio::fs::OpenOptions::new()
			.create(true)
			.append(true)
			.open(self.log_filename())
			.await?;
		file.write_all(line.as_bytes()).await?;
		Ok(())
	}

	async fn flush(&self, summary: &RunSummary) -> Result<(), SinkError> {
		let filename = self.data_dir.join(format!(
			"sync-run-{}.json",
			summary.timestamp.format("%Y-%m-%dT%H-%M-%S")
		));
		let content = serde_json::to_string_pretty(summary)?;
		tokio::fs::write(&filename, content).await?;

		info!("Run summary written to {:?}", filename);
		Ok(())
	}
}
