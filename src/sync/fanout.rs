//! Expansion of one entity kind into its schedulable units.
//!
//! Per-agreement kinds produce one unit per active agreement, each
//! independently retryable; legacy aggregate kinds produce exactly one unit.
//! The active-agreement list is fetched at the moment of expansion and never
//! cached across stages, so an agreement activated mid-run is picked up by
//! the next run (or the next stage's expansion, for kinds later in the plan).

use crate::agreements::{Agreement, AgreementDirectory};
use crate::sync::types::{EntityKind, OperationVariant, SyncFailure};
use crate::sync::unit::{
	AggregateSync, AgreementSync, EntityRegistration, SyncOperation, SyncUnit,
};

use std::sync::Arc;
use tracing::debug;

struct AgreementOperation {
	service: Arc<dyn AgreementSync>,
	agreement: Agreement,
	variant: OperationVariant,
}

#[async_trait::async_trait]
impl SyncOperation for AgreementOperation {
	async fn run(&self) -> Result<u64, SyncFailure> {
		self.service.sync(&self.agreement, self.variant).await
	}
}

struct AggregateOperation {
	service: Arc<dyn AggregateSync>,
	variant: OperationVariant,
}

#[async_trait::async_trait]
impl SyncOperation for AggregateOperation {
	async fn run(&self) -> Result<u64, SyncFailure> {
		self.service.sync_all(self.variant).await
	}
}

/// Expands entity kinds into per-agreement or aggregate sync units.
pub struct AgreementFanout {
	directory: Arc<dyn AgreementDirectory>,
}

impl AgreementFanout {
	pub fn new(directory: Arc<dyn AgreementDirectory>) -> Self {
		Self { directory }
	}

	/// Expand one kind into its units for this run.
	///
	/// An empty result means zero active agreements; the caller reports the
	/// kind as skipped rather than treating it as an error.
	pub async fn expand(
		&self,
		kind: EntityKind,
		registration: &EntityRegistration,
		variant: OperationVariant,
	) -> Result<Vec<SyncUnit>, SyncFailure> {
		match registration {
			EntityRegistration::AllAgreements(service) => Ok(vec![SyncUnit::aggregate(
				kind,
				Arc::new(AggregateOperation {
					service: service.clone(),
					variant,
				}),
			)]),
			EntityRegistration::PerAgreement(service) => {
				let agreements = self
					.directory
					.list_active()
					.await
					.map_err(|e| SyncFailure::Directory(e.to_string()))?;

				debug!("Expanding {} across {} active agreements", kind, agreements.len());

				Ok(agreements
					.into_iter()
					.map(|agreement| {
						SyncUnit::for_agreement(
							kind,
							agreement.clone(),
							Arc::new(AgreementOperation {
								service: service.clone(),
								agreement,
								variant,
							}),
						)
					})
					.collect())
			}
		}
	}
}
