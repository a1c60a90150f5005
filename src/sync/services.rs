//! Per-entity sync operations backed by the accounting API and the record
//! store.
//!
//! Most entity kinds share the same shape: walk the paginated collection for
//! the kind's resource path under one agreement's grant token and upsert
//! whatever comes back. Accounting years carry the one documented
//! asymmetry between full and daily runs, and invoices still use the legacy
//! aggregate shape that loops all agreements inside a single unit.

use crate::agreements::{Agreement, AgreementDirectory};
use crate::api::AccountingApiClient;
use crate::store::RecordStore;
use crate::sync::types::{EntityKind, OperationVariant, SyncFailure};
use crate::sync::unit::{AggregateSync, AgreementSync, SyncRegistry};

use chrono::{Datelike, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

/// Generic paginated pull-and-upsert for one entity kind.
pub struct PagedResourceSync {
	client: Arc<AccountingApiClient>,
	store: Arc<dyn RecordStore>,
	kind: EntityKind,
}

impl PagedResourceSync {
	pub fn new(
		client: Arc<AccountingApiClient>,
		store: Arc<dyn RecordStore>,
		kind: EntityKind,
	) -> Self {
		Self { client, store, kind }
	}
}

#[async_trait::async_trait]
impl AgreementSync for PagedResourceSync {
	async fn sync(
		&self,
		agreement: &Agreement,
		_variant: OperationVariant,
	) -> Result<u64, SyncFailure> {
		let records = self
			.client
			.fetch_collection(&agreement.grant_token, self.kind.resource_path())
			.await?;
		let count = self
			.store
			.upsert(self.kind, Some(agreement.agreement_number), &records)
			.await?;
		debug!(
			"Synced {} {} records for agreement {}",
			count, self.kind, agreement.agreement_number
		);
		Ok(count)
	}
}

/// Accounting-year sync with the full-history / current-period split.
///
/// Full history walks the whole accounting-years collection. The
/// current-period variant fetches only the year covering today; a 404 there
/// is the canonical expected absence (the period has not been created yet on
/// the remote side) and surfaces as a skip, not an error.
pub struct AccountingYearSync {
	client: Arc<AccountingApiClient>,
	store: Arc<dyn RecordStore>,
}

impl AccountingYearSync {
	pub fn new(client: Arc<AccountingApiClient>, store: Arc<dyn RecordStore>) -> Self {
		Self { client, store }
	}
}

#[async_trait::async_trait]
impl AgreementSync for AccountingYearSync {
	async fn sync(
		&self,
		agreement: &Agreement,
		variant: OperationVariant,
	) -> Result<u64, SyncFailure> {
		let kind = EntityKind::AccountingYears;
		match variant {
			OperationVariant::FullHistory => {
				let records = self
					.client
					.fetch_collection(&agreement.grant_token, kind.resource_path())
					.await?;
				let count = self
					.store
					.upsert(kind, Some(agreement.agreement_number), &records)
					.await?;
				Ok(count)
			}
			OperationVariant::CurrentPeriod => {
				let path = format!("{}/{}", kind.resource_path(), Utc::now().year());
				let record = self
					.client
					.fetch_resource(&agreement.grant_token, &path)
					.await?;
				let count = self
					.store
					.upsert(kind, Some(agreement.agreement_number), &[record])
					.await?;
				Ok(count)
			}
		}
	}
}

/// Legacy aggregate invoice sync: one unit covering every active agreement.
///
/// One agreement's failure does not abort the loop; the aggregate only fails
/// outright when no agreement could be synced at all.
pub struct AggregateInvoiceSync {
	client: Arc<AccountingApiClient>,
	store: Arc<dyn RecordStore>,
	directory: Arc<dyn AgreementDirectory>,
}

impl AggregateInvoiceSync {
	pub fn new(
		client: Arc<AccountingApiClient>,
		store: Arc<dyn RecordStore>,
		directory: Arc<dyn AgreementDirectory>,
	) -> Self {
		Self {
			client,
			store,
			directory,
		}
	}
}

#[async_trait::async_trait]
impl AggregateSync for AggregateInvoiceSync {
	async fn sync_all(&self, _variant: OperationVariant) -> Result<u64, SyncFailure> {
		let agreements = self
			.directory
			.list_active()
			.await
			.map_err(|e| SyncFailure::Directory(e.to_string()))?;
		if agreements.is_empty() {
			return Err(SyncFailure::Missing("no active agreements".to_string()));
		}

		let kind = EntityKind::Invoices;
		let mut total = 0;
		let mut synced_any = false;
		let mut last_failure = None;

		for agreement in &agreements {
			let result: Result<u64, SyncFailure> = async {
				let records = self
					.client
					.fetch_collection(&agreement.grant_token, kind.resource_path())
					.await?;
				let count = self
					.store
					.upsert(kind, Some(agreement.agreement_number), &records)
					.await?;
				Ok(count)
			}
			.await;

			match result {
				Ok(count) => {
					total += count;
					synced_any = true;
				}
				Err(failure) => {
					warn!(
						"Invoice sync failed for agreement {}: {}",
						agreement.agreement_number, failure
					);
					last_failure = Some(failure);
				}
			}
		}

		match (synced_any, last_failure) {
			(false, Some(failure)) => Err(failure),
			_ => Ok(total),
		}
	}
}

/// Production registry: every entity kind wired to its operation.
pub fn standard_registry(
	client: Arc<AccountingApiClient>,
	store: Arc<dyn RecordStore>,
	directory: Arc<dyn AgreementDirectory>,
) -> SyncRegistry {
	let mut registry = SyncRegistry::new();
	for kind in EntityKind::ALL {
		match kind {
			EntityKind::AccountingYears => registry.register_per_agreement(
				kind,
				Arc::new(AccountingYearSync::new(client.clone(), store.clone())),
			),
			EntityKind::Invoices => registry.register_aggregate(
				kind,
				Arc::new(AggregateInvoiceSync::new(
					client.clone(),
					store.clone(),
					directory.clone(),
				)),
			),
			_ => registry.register_per_agreement(
				kind,
				Arc::new(PagedResourceSync::new(client.clone(), store.clone(), kind)),
			),
		}
	}
	registry
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::agreements::FileAgreementDirectory;
	use crate::store::MemoryRecordStore;
	use crate::sync::unit::EntityRegistration;

	#[test]
	fn standard_registry_covers_every_kind() {
		let client = Arc::new(AccountingApiClient::new(
			"https://restapi.example.com".to_string(),
			"secret".to_string(),
			1000,
		));
		let store = Arc::new(MemoryRecordStore::new());
		let directory = Arc::new(FileAgreementDirectory::new("agreements.json".into()));

		let registry = standard_registry(client, store, directory);

		registry.ensure_covers(&EntityKind::ALL).unwrap();
		assert!(matches!(
			registry.get(EntityKind::Invoices),
			Some(EntityRegistration::AllAgreements(_))
		));
		assert!(matches!(
			registry.get(EntityKind::AccountingYears),
			Some(EntityRegistration::PerAgreement(_))
		));
		assert!(matches!(
			registry.get(EntityKind::Customers),
			Some(EntityRegistration::PerAgreement(_))
		));
	}
}
