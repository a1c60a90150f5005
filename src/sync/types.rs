//! Core types for sync orchestration.
//!
//! Defines the closed set of synchronizable entity kinds, the outcome and
//! summary values produced by a run, and the failure taxonomy that drives
//! retry and skip decisions.

use crate::agreements::Agreement;
use crate::api::ApiError;
use crate::store::StoreError;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// One category of synchronizable accounting data.
///
/// The set is fixed at build time; adding a kind means adding a variant here
/// and a registration in the sync registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
	PaymentTerms,
	ProductGroups,
	Products,
	VatAccounts,
	SupplierGroups,
	Suppliers,
	Invoices,
	AccountingYears,
	Accounts,
	Customers,
	Departments,
	DepartmentalDistributions,
	Journals,
}

impl EntityKind {
	pub const ALL: [EntityKind; 13] = [
		EntityKind::PaymentTerms,
		EntityKind::ProductGroups,
		EntityKind::Products,
		EntityKind::VatAccounts,
		EntityKind::SupplierGroups,
		EntityKind::Suppliers,
		EntityKind::Invoices,
		EntityKind::AccountingYears,
		EntityKind::Accounts,
		EntityKind::Customers,
		EntityKind::Departments,
		EntityKind::DepartmentalDistributions,
		EntityKind::Journals,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			EntityKind::PaymentTerms => "paymentTerms",
			EntityKind::ProductGroups => "productGroups",
			EntityKind::Products => "products",
			EntityKind::VatAccounts => "vatAccounts",
			EntityKind::SupplierGroups => "supplierGroups",
			EntityKind::Suppliers => "suppliers",
			EntityKind::Invoices => "invoices",
			EntityKind::AccountingYears => "accountingYears",
			EntityKind::Accounts => "accounts",
			EntityKind::Customers => "customers",
			EntityKind::Departments => "departments",
			EntityKind::DepartmentalDistributions => "departmentalDistributions",
			EntityKind::Journals => "journals",
		}
	}

	/// REST collection path for this kind on the accounting API.
	pub fn resource_path(&self) -> &'static str {
		match self {
			EntityKind::PaymentTerms => "payment-terms",
			EntityKind::ProductGroups => "product-groups",
			EntityKind::Products => "products",
			EntityKind::VatAccounts => "vat-accounts",
			EntityKind::SupplierGroups => "supplier-groups",
			EntityKind::Suppliers => "suppliers",
			EntityKind::Invoices => "invoices/booked",
			EntityKind::AccountingYears => "accounting-years",
			EntityKind::Accounts => "accounts",
			EntityKind::Customers => "customers",
			EntityKind::Departments => "departments",
			EntityKind::DepartmentalDistributions => "departmental-distributions",
			EntityKind::Journals => "journals",
		}
	}
}

impl std::fmt::Display for EntityKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

impl std::str::FromStr for EntityKind {
	type Err = PlanError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		EntityKind::ALL
			.into_iter()
			.find(|kind| kind.as_str() == s)
			.ok_or_else(|| PlanError::UnknownEntity(s.to_string()))
	}
}

/// Which variant of a sync operation to run.
///
/// Daily sync trades completeness for speed by scoping accounting years to
/// the current period; every other kind runs full history in both modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationVariant {
	FullHistory,
	CurrentPeriod,
}

/// Terminal status of one sync unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
	Success,
	Error,
	Skipped,
}

/// Identifying slice of an agreement, safe to persist in sync logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgreementRef {
	pub agreement_number: u64,
	pub name: String,
}

impl From<&Agreement> for AgreementRef {
	fn from(agreement: &Agreement) -> Self {
		Self {
			agreement_number: agreement.agreement_number,
			name: agreement.name.clone(),
		}
	}
}

/// Outcome of one sync unit execution, produced exactly once post-retry.
#[derive(Debug, Clone, Serialize)]
pub struct SyncOutcome {
	pub entity: EntityKind,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub agreement: Option<AgreementRef>,
	pub status: SyncStatus,
	pub record_count: u64,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error_message: Option<String>,
	pub started_at: DateTime<Utc>,
	pub completed_at: DateTime<Utc>,
	pub duration_ms: u64,
}

impl SyncOutcome {
	pub fn success(
		entity: EntityKind,
		agreement: Option<AgreementRef>,
		record_count: u64,
		started_at: DateTime<Utc>,
	) -> Self {
		Self::finish(entity, agreement, SyncStatus::Success, record_count, None, started_at)
	}

	pub fn skipped(
		entity: EntityKind,
		agreement: Option<AgreementRef>,
		reason: impl Into<String>,
		started_at: DateTime<Utc>,
	) -> Self {
		Self::finish(
			entity,
			agreement,
			SyncStatus::Skipped,
			0,
			Some(reason.into()),
			started_at,
		)
	}

	pub fn error(
		entity: EntityKind,
		agreement: Option<AgreementRef>,
		message: impl Into<String>,
		started_at: DateTime<Utc>,
	) -> Self {
		Self::finish(
			entity,
			agreement,
			SyncStatus::Error,
			0,
			Some(message.into()),
			started_at,
		)
	}

	fn finish(
		entity: EntityKind,
		agreement: Option<AgreementRef>,
		status: SyncStatus,
		record_count: u64,
		error_message: Option<String>,
		started_at: DateTime<Utc>,
	) -> Self {
		let completed_at = Utc::now();
		let duration_ms = (completed_at - started_at).num_milliseconds().max(0) as u64;
		Self {
			entity,
			agreement,
			status,
			record_count,
			error_message,
			started_at,
			completed_at,
			duration_ms,
		}
	}
}

/// Overall status of a full or daily run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunStatus {
	#[serde(rename = "success")]
	Success,
	#[serde(rename = "partial-failure")]
	PartialFailure,
}

/// Per-entity-kind aggregation inside a run summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EntityResult {
	pub count: u64,
	pub status: SyncStatus,
}

/// Aggregate report of one orchestration run.
///
/// Built and returned within a single call; the coordinator holds no
/// cross-run state.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
	pub status: RunStatus,
	pub duration_ms: u64,
	pub timestamp: DateTime<Utc>,
	pub results: BTreeMap<EntityKind, EntityResult>,
}

impl RunSummary {
	/// Aggregate unit outcomes into the per-kind view.
	///
	/// Counts are summed across agreements. A kind is `error` if any of its
	/// units errored, `success` if any succeeded, and `skipped` otherwise.
	/// The run is `partial-failure` as soon as a single unit errored.
	pub fn from_outcomes(
		timestamp: DateTime<Utc>,
		elapsed: Duration,
		outcomes: &[SyncOutcome],
	) -> Self {
		let mut results: BTreeMap<EntityKind, EntityResult> = BTreeMap::new();
		for outcome in outcomes {
			let entry = results.entry(outcome.entity).or_insert(EntityResult {
				count: 0,
				status: SyncStatus::Skipped,
			});
			entry.count += outcome.record_count;
			entry.status = match (entry.status, outcome.status) {
				(SyncStatus::Error, _) | (_, SyncStatus::Error) => SyncStatus::Error,
				(SyncStatus::Success, _) | (_, SyncStatus::Success) => SyncStatus::Success,
				_ => SyncStatus::Skipped,
			};
		}

		let status = if results.values().any(|r| r.status == SyncStatus::Error) {
			RunStatus::PartialFailure
		} else {
			RunStatus::Success
		};

		Self {
			status,
			duration_ms: elapsed.as_millis() as u64,
			timestamp,
			results,
		}
	}
}

/// Classified failure of one sync operation.
///
/// The classification decides what the retry executor does with it: an
/// expected absence short-circuits to `skipped`, everything else is retried
/// up to the attempt bound.
#[derive(Debug, thiserror::Error)]
pub enum SyncFailure {
	#[error("resource not available: {0}")]
	Missing(String),

	#[error("authorization rejected: {0}")]
	Unauthorized(String),

	#[error("transport error: {0}")]
	Transport(String),

	#[error("upstream error: {0}")]
	Upstream(String),

	#[error("store error: {0}")]
	Store(#[from] StoreError),

	#[error("agreement directory error: {0}")]
	Directory(String),
}

impl SyncFailure {
	/// The remote resource legitimately does not exist; retrying cannot
	/// change the outcome.
	pub fn is_expected_absence(&self) -> bool {
		matches!(self, SyncFailure::Missing(_))
	}
}

impl From<ApiError> for SyncFailure {
	fn from(error: ApiError) -> Self {
		match error {
			ApiError::NotFound(path) => SyncFailure::Missing(path),
			ApiError::Unauthorized(path) => SyncFailure::Unauthorized(path),
			ApiError::Upstream { .. } => SyncFailure::Upstream(error.to_string()),
			ApiError::Transport(e) => SyncFailure::Transport(e.to_string()),
			ApiError::Malformed { .. } => SyncFailure::Upstream(error.to_string()),
		}
	}
}

/// Configuration error in the stage table or registry.
///
/// The only error class allowed to abort a run; everything else is absorbed
/// into outcomes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
	#[error("entity kind {0} is missing from the stage table")]
	MissingEntity(EntityKind),

	#[error("entity kind {0} appears in more than one stage")]
	DuplicateEntity(EntityKind),

	#[error("no sync operation registered for entity kind {0}")]
	Unregistered(EntityKind),

	#[error("unknown entity kind: {0}")]
	UnknownEntity(String),
}

#[cfg(test)]
mod tests {
	use super::*;

	fn outcome(entity: EntityKind, status: SyncStatus, count: u64) -> SyncOutcome {
		match status {
			SyncStatus::Success => SyncOutcome::success(entity, None, count, Utc::now()),
			SyncStatus::Error => SyncOutcome::error(entity, None, "boom", Utc::now()),
			SyncStatus::Skipped => SyncOutcome::skipped(entity, None, "absent", Utc::now()),
		}
	}

	#[test]
	fn summary_sums_counts_across_agreements() {
		let outcomes = vec![
			outcome(EntityKind::PaymentTerms, SyncStatus::Success, 10),
			outcome(EntityKind::PaymentTerms, SyncStatus::Success, 10),
			outcome(EntityKind::VatAccounts, SyncStatus::Success, 5),
			outcome(EntityKind::VatAccounts, SyncStatus::Success, 5),
			outcome(EntityKind::ProductGroups, SyncStatus::Success, 3),
			outcome(EntityKind::Products, SyncStatus::Success, 20),
		];
		let summary = RunSummary::from_outcomes(Utc::now(), Duration::from_secs(2), &outcomes);

		assert_eq!(summary.status, RunStatus::Success);
		assert_eq!(summary.results[&EntityKind::PaymentTerms].count, 20);
		assert_eq!(summary.results[&EntityKind::VatAccounts].count, 10);
		assert_eq!(summary.results[&EntityKind::ProductGroups].count, 3);
		assert_eq!(summary.results[&EntityKind::Products].count, 20);
		assert!(
			summary
				.results
				.values()
				.all(|r| r.status == SyncStatus::Success)
		);
	}

	#[test]
	fn one_error_outcome_makes_the_run_partial() {
		let outcomes = vec![
			outcome(EntityKind::Customers, SyncStatus::Success, 7),
			outcome(EntityKind::Customers, SyncStatus::Error, 0),
			outcome(EntityKind::Customers, SyncStatus::Success, 4),
		];
		let summary = RunSummary::from_outcomes(Utc::now(), Duration::from_secs(1), &outcomes);

		assert_eq!(summary.status, RunStatus::PartialFailure);
		let customers = &summary.results[&EntityKind::Customers];
		assert_eq!(customers.status, SyncStatus::Error);
		assert_eq!(customers.count, 11);
	}

	#[test]
	fn all_skipped_kind_stays_skipped() {
		let outcomes = vec![outcome(EntityKind::Journals, SyncStatus::Skipped, 0)];
		let summary = RunSummary::from_outcomes(Utc::now(), Duration::from_secs(0), &outcomes);

		assert_eq!(summary.status, RunStatus::Success);
		assert_eq!(summary.results[&EntityKind::Journals].status, SyncStatus::Skipped);
	}

	#[test]
	fn summary_serializes_to_the_documented_shape() {
		let outcomes = vec![outcome(EntityKind::PaymentTerms, SyncStatus::Success, 12)];
		let summary = RunSummary::from_outcomes(Utc::now(), Duration::from_millis(1500), &outcomes);

		let json = serde_json::to_value(&summary).unwrap();
		assert_eq!(json["status"], "success");
		assert_eq!(json["duration_ms"], 1500);
		assert_eq!(json["results"]["paymentTerms"]["count"], 12);
		assert_eq!(json["results"]["paymentTerms"]["status"], "success");
	}

	#[test]
	fn entity_kind_round_trips_through_its_name() {
		for kind in EntityKind::ALL {
			assert_eq!(kind.as_str().parse::<EntityKind>().unwrap(), kind);
		}
		assert!(matches!(
			"notAKind".parse::<EntityKind>(),
			Err(PlanError::UnknownEntity(_))
		));
	}

	#[test]
	fn expected_absence_is_only_the_missing_class() {
		assert!(SyncFailure::Missing("accounting-years/2026".into()).is_expected_absence());
		assert!(!SyncFailure::Unauthorized("customers".into()).is_expected_absence());
		assert!(!SyncFailure::Transport("timeout".into()).is_expected_absence());
		assert!(!SyncFailure::Upstream("502".into()).is_expected_absence());
	}
}
