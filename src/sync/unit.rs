//! Schedulable sync units and the registry of per-entity operations.
//!
//! A `SyncUnit` is one entity kind for one agreement (or, for legacy
//! tenant-oblivious operations, one aggregate unit covering all agreements)
//! plus the async operation that performs the sync. The set of valid
//! operations is closed: every entity kind is registered once, as either a
//! per-agreement or an aggregate operation, and the coordinator refuses to
//! start if a planned kind has no registration.

use crate::agreements::Agreement;
use crate::sync::types::{EntityKind, OperationVariant, PlanError, SyncFailure};

use std::collections::BTreeMap;
use std::sync::Arc;

/// One sync operation, opaque to the orchestration core.
#[async_trait::async_trait]
pub trait SyncOperation: Send + Sync {
	/// Run the operation, returning the number of records processed.
	async fn run(&self) -> Result<u64, SyncFailure>;
}

/// Per-agreement sync shape: invoked once per active agreement.
#[async_trait::async_trait]
pub trait AgreementSync: Send + Sync {
	async fn sync(
		&self,
		agreement: &Agreement,
		variant: OperationVariant,
	) -> Result<u64, SyncFailure>;
}

/// Legacy aggregate shape: loops all agreements internally and reports one
/// combined outcome.
#[async_trait::async_trait]
pub trait AggregateSync: Send + Sync {
	async fn sync_all(&self, variant: OperationVariant) -> Result<u64, SyncFailure>;
}

/// One schedulable sync operation descriptor.
pub struct SyncUnit {
	pub entity: EntityKind,
	pub agreement: Option<Agreement>,
	operation: Arc<dyn SyncOperation>,
}

impl SyncUnit {
	pub fn for_agreement(
		entity: EntityKind,
		agreement: Agreement,
		operation: Arc<dyn SyncOperation>,
	) -> Self {
		Self {
			entity,
			agreement: Some(agreement),
			operation,
		}
	}

	pub fn aggregate(entity: EntityKind, operation: Arc<dyn SyncOperation>) -> Self {
		Self {
			entity,
			agreement: None,
			operation,
		}
	}

	pub async fn execute(&self) -> Result<u64, SyncFailure> {
		self.operation.run().await
	}

	/// Log/audit label, e.g. `invoices_all_agreements` or `customers_101`.
	pub fn label(&self) -> String {
		match &self.agreement {
			Some(agreement) => format!("{}_{}", self.entity, agreement.agreement_number),
			None => format!("{}_all_agreements", self.entity),
		}
	}
}

/// How one entity kind is synced.
pub enum EntityRegistration {
	PerAgreement(Arc<dyn AgreementSync>),
	AllAgreements(Arc<dyn AggregateSync>),
}

/// Closed mapping from entity kind to its registered operation.
#[derive(Default)]
pub struct SyncRegistry {
	entries: BTreeMap<EntityKind, EntityRegistration>,
}

impl SyncRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register_per_agreement(&mut self, kind: EntityKind, service: Arc<dyn AgreementSync>) {
		self.entries
			.insert(kind, EntityRegistration::PerAgreement(service));
	}

	pub fn register_aggregate(&mut self, kind: EntityKind, service: Arc<dyn AggregateSync>) {
		self.entries
			.insert(kind, EntityRegistration::AllAgreements(service));
	}

	pub fn get(&self, kind: EntityKind) -> Option<&EntityRegistration> {
		self.entries.get(&kind)
	}

	/// Fail fast if any of the given kinds has no registered operation.
	pub fn ensure_covers(&self, kinds: &[EntityKind]) -> Result<(), PlanError> {
		for kind in kinds {
			if !self.entries.contains_key(kind) {
				return Err(PlanError::Unregistered(*kind));
			}
		}
		Ok(())
	}
}
