//! Durable record storage behind the sync operations.
//!
//! The sync core is domain-agnostic about what a record contains; it hands
//! batches of raw JSON records to a `RecordStore` and trusts the store's
//! keying for idempotence. Records are keyed by their natural `self` link
//! when present, so re-running a sync upserts rather than duplicates.

use crate::sync::types::EntityKind;

use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	#[error("failed to access record store: {0}")]
	Io(#[from] std::io::Error),

	#[error("failed to encode records: {0}")]
	Encode(#[from] serde_json::Error),
}

/// Upsert access to the relational store.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
	/// Upsert a batch of records for one entity kind, scoped to one
	/// agreement (or unscoped for aggregate syncs). Returns the number of
	/// records processed, not the number changed.
	async fn upsert(
		&self,
		entity: EntityKind,
		agreement: Option<u64>,
		records: &[Value],
	) -> Result<u64, StoreError>;
}

fn natural_key(record: &Value, index: usize) -> String {
	// Records without a self link dedupe by value.
	match record.get("self").and_then(|v| v.as_str()) {
		Some(link) => link.to_string(),
		None => serde_json::to_string(record).unwrap_or_else(|_| format!("row-{}", index)),
	}
}

fn dataset_name(entity: EntityKind, agreement: Option<u64>) -> String {
	match agreement {
		Some(number) => format!("{}_{}", entity, number),
		None => format!("{}_all_agreements", entity),
	}
}

/// File-based implementation of `RecordStore`.
///
/// One JSON document per entity kind and agreement under the data
/// directory, merged by natural key on every upsert.
pub struct FileRecordStore {
	data_dir: PathBuf,
}

impl FileRecordStore {
	pub fn new(data_dir: PathBuf) -> Self {
		Self { data_dir }
	}

	fn dataset_filename(&self, entity: EntityKind, agreement: Option<u64>) -> PathBuf {
		self.data_dir
			.join(format!("records_{}.json", dataset_name(entity, agreement)))
	}
}

#[async_trait::async_trait]
impl RecordStore for FileRecordStore {
	async fn upsert(
		&self,
		entity: EntityKind,
		agreement: Option<u64>,
		records: &[Value],
	) -> Result<u64, StoreError> {
		let filename = self.dataset_filename(entity, agreement);

		let mut dataset: BTreeMap<String, Value> = if filename.exists() {
			let content = tokio::fs::read_to_string(&filename).await?;
			serde_json::from_str(&content)?
		} else {
			BTreeMap::new()
		};

		for (index, record) in records.iter().enumerate() {
			dataset.insert(natural_key(record, index), record.clone());
		}

		let content = serde_json::to_string_pretty(&dataset)?;
		tokio::fs::write(&filename, content).await?;

		log::debug!(
			"Upserted {} records into {} ({} total)",
			records.len(),
			dataset_name(entity, agreement),
			dataset.len()
		);
		Ok(records.len() as u64)
	}
}

/// In-memory implementation of `RecordStore` for tests and dry runs.
#[derive(Default)]
pub struct MemoryRecordStore {
	datasets: Mutex<BTreeMap<String, BTreeMap<String, Value>>>,
}

impl MemoryRecordStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of distinct records held for one dataset.
	pub fn dataset_len(&self, entity: EntityKind, agreement: Option<u64>) -> usize {
		self.datasets
			.lock()
			.unwrap()
			.get(&dataset_name(entity, agreement))
			.map(|d| d.len())
			.unwrap_or(0)
	}
}

#[async_trait::async_trait]
impl RecordStore for MemoryRecordStore {
	async fn upsert(
		&self,
		entity: EntityKind,
		agreement: Option<u64>,
		records: &[Value],
	) -> Result<u64, StoreError> {
		let mut datasets = self.datasets.lock().unwrap();
		let dataset = datasets.entry(dataset_name(entity, agreement)).or_default();
		for (index, record) in records.iter().enumerate() {
			dataset.insert(natural_key(record, index), record.clone());
		}
		Ok(records.len() as u64)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn fixture() -> Vec<Value> {
		vec![
			json!({"self": "https://restapi.example.com/customers/1", "customerNumber": 1}),
			json!({"self": "https://restapi.example.com/customers/2", "customerNumber": 2}),
		]
	}

	#[tokio::test]
	async fn upsert_is_idempotent_by_natural_key() {
		let store = MemoryRecordStore::new();
		let records = fixture();

		let first = store
			.upsert(EntityKind::Customers, Some(101), &records)
			.await
			.unwrap();
		let second = store
			.upsert(EntityKind::Customers, Some(101), &records)
			.await
			.unwrap();

		// Counts reflect records processed, not changed.
		assert_eq!(first, 2);
		assert_eq!(second, 2);
		assert_eq!(store.dataset_len(EntityKind::Customers, Some(101)), 2);
	}

	#[tokio::test]
	async fn agreements_are_stored_in_separate_datasets() {
		let store = MemoryRecordStore::new();
		let records = fixture();

		store
			.upsert(EntityKind::Customers, Some(101), &records)
			.await
			.unwrap();
		store
			.upsert(EntityKind::Customers, Some(102), &records[..1])
			.await
			.unwrap();

		assert_eq!(store.dataset_len(EntityKind::Customers, Some(101)), 2);
		assert_eq!(store.dataset_len(EntityKind::Customers, Some(102)), 1);
	}

	#[tokio::test]
	async fn file_store_merges_across_runs() {
		let dir = tempfile::tempdir().unwrap();
		let store = FileRecordStore::new(dir.path().to_path_buf());
		let records = fixture();

		store
			.upsert(EntityKind::Accounts, Some(101), &records)
			.await
			.unwrap();
		store
			.upsert(EntityKind::Accounts, Some(101), &records)
			.await
			.unwrap();

		let content = std::fs::read_to_string(dir.path().join("records_accounts_101.json")).unwrap();
		let dataset: BTreeMap<String, Value> = serde_json::from_str(&content).unwrap();
		assert_eq!(dataset.len(), 2);
	}
}
