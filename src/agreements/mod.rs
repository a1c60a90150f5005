//! Agreement (tenant) model and directory access.
//!
//! An agreement is one customer's accounting dataset on the remote API,
//! identified by a numeric agreement number and a grant token. Agreements are
//! created and updated by an external admin workflow; the sync core only ever
//! reads them through the `AgreementDirectory` trait.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

/// One tenant agreement as maintained by the admin workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agreement {
	pub name: String,
	pub agreement_number: u64,
	pub grant_token: String,
	#[serde(default)]
	pub active: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
	#[error("failed to read agreement registry: {0}")]
	Io(#[from] std::io::Error),

	#[error("malformed agreement registry: {0}")]
	Parse(#[from] serde_json::Error),
}

/// Read access to the current set of agreements.
#[async_trait::async_trait]
pub trait AgreementDirectory: Send + Sync {
	/// All agreements currently flagged active.
	async fn list_active(&self) -> Result<Vec<Agreement>, DirectoryError>;
}

/// Directory backed by an `agreements.json` file in the data directory.
///
/// The file is re-read on every call, so an agreement activated mid-run shows
/// up at the next fanout expansion without a restart.
pub struct FileAgreementDirectory {
	path: PathBuf,
}

impl FileAgreementDirectory {
	pub fn new(path: PathBuf) -> Self {
		Self { path }
	}
}

#[async_trait::async_trait]
impl AgreementDirectory for FileAgreementDirectory {
	async fn list_active(&self) -> Result<Vec<Agreement>, DirectoryError> {
		let content = tokio::fs::read_to_string(&self.path).await?;
		let agreements: Vec<Agreement> = serde_json::from_str(&content)?;
		let active: Vec<Agreement> = agreements.into_iter().filter(|a| a.active).collect();
		debug!("Loaded {} active agreements from {:?}", active.len(), self.path);
		Ok(active)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn lists_only_active_agreements() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("agreements.json");
		let content = serde_json::json!([
			{"name": "Alpha ApS", "agreement_number": 101, "grant_token": "tok-a", "active": true},
			{"name": "Beta A/S", "agreement_number": 102, "grant_token": "tok-b", "active": false},
			{"name": "Gamma I/S", "agreement_number": 103, "grant_token": "tok-c", "active": true}
		]);
		std::fs::write(&path, serde_json::to_string_pretty(&content).unwrap()).unwrap();

		let directory = FileAgreementDirectory::new(path);
		let active = directory.list_active().await.unwrap();

		assert_eq!(active.len(), 2);
		assert_eq!(active[0].agreement_number, 101);
		assert_eq!(active[1].agreement_number, 103);
	}

	#[tokio::test]
	async fn missing_registry_file_is_an_error() {
		let dir = tempfile::tempdir().unwrap();
		let directory = FileAgreementDirectory::new(dir.path().join("nope.json"));
		assert!(matches!(
			directory.list_active().await,
			Err(DirectoryError::Io(_))
		));
	}
}
