//! Bounded retry around one sync unit.
//!
//! The policy is deliberately flat: a fixed number of attempts with a fixed
//! inter-attempt delay, so the worst-case duration of a run stays
//! predictable. An expected-absence failure short-circuits immediately to a
//! skipped outcome since retrying cannot change it. The executor always
//! returns an outcome and never an error; a unit's terminal failure must not
//! be able to crash the coordinator.

use crate::sync::types::{AgreementRef, SyncOutcome};
use crate::sync::unit::SyncUnit;

use backoff::backoff::{Backoff, Constant};
use chrono::Utc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Retry policy parameters.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
	/// Total attempts, including the first one.
	pub max_attempts: u32,
	/// Fixed delay between attempts.
	pub delay: Duration,
}

impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			max_attempts: 3,
			delay: Duration::from_secs(5),
		}
	}
}

/// Executes a sync unit under the retry policy.
#[derive(Debug, Clone)]
pub struct RetryExecutor {
	policy: RetryPolicy,
}

impl RetryExecutor {
	pub fn new(policy: RetryPolicy) -> Self {
		Self { policy }
	}

	/// Run the unit to a terminal outcome.
	pub async fn run(&self, unit: &SyncUnit) -> SyncOutcome {
		let started_at = Utc::now();
		let agreement: Option<AgreementRef> = unit.agreement.as_ref().map(AgreementRef::from);
		let label = unit.label();
		let mut delay = Constant::new(self.policy.delay);
		let mut attempt = 0;

		loop {
			attempt += 1;
			match unit.execute().await {
				Ok(record_count) => {
					info!(
						"{} synced {} records (attempt {}/{})",
						label, record_count, attempt, self.policy.max_attempts
					);
					return SyncOutcome::success(
						unit.entity,
						agreement.clone(),
						record_count,
						started_at,
					);
				}
				Err(failure) if failure.is_expected_absence() => {
					warn!("{} skipped: {}", label, failure);
					return SyncOutcome::skipped(
						unit.entity,
						agreement.clone(),
						failure.to_string(),
						started_at,
					);
				}
				Err(failure) => {
					if attempt >= self.policy.max_attempts {
						error!(
							"{} failed on final attempt {}/{}: {}",
							label, attempt, self.policy.max_attempts, failure
						);
						return SyncOutcome::error(
							unit.entity,
							agreement.clone(),
							failure.to_string(),
							started_at,
						);
					}
					warn!(
						"{} failed on attempt {}/{} ({} retries left): {}",
						label,
						attempt,
						self.policy.max_attempts,
						self.policy.max_attempts - attempt,
						failure
					);
					if let Some(wait) = delay.next_backoff() {
						tokio::time::sleep(wait).await;
					}
				}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::sync::types::{EntityKind, SyncFailure, SyncStatus};
	use crate::sync::unit::SyncOperation;
	use std::sync::Arc;
	use std::sync::atomic::{AtomicU32, Ordering};

	enum Script {
		AlwaysTransient,
		AlwaysAbsent,
		FailOnceThenSucceed(u64),
	}

	struct ScriptedOperation {
		script: Script,
		calls: AtomicU32,
	}

	impl ScriptedOperation {
		fn new(script: Script) -> Arc<Self> {
			Arc::new(Self {
				script,
				calls: AtomicU32::new(0),
			})
		}
	}

	#[async_trait::async_trait]
	impl SyncOperation for ScriptedOperation {
		async fn run(&self) -> Result<u64, SyncFailure> {
			let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
			match self.script {
				Script::AlwaysTransient => {
					Err(SyncFailure::Transport(format!("connection reset ({})", call)))
				}
				Script::AlwaysAbsent => {
					Err(SyncFailure::Missing("accounting-years/2026".to_string()))
				}
				Script::FailOnceThenSucceed(count) => {
					if call == 1 {
						Err(SyncFailure::Upstream("502 on products".to_string()))
					} else {
						Ok(count)
					}
				}
			}
		}
	}

	fn executor() -> RetryExecutor {
		RetryExecutor::new(RetryPolicy::default())
	}

	#[tokio::test(start_paused = true)]
	async fn exhausted_retries_invoke_exactly_three_attempts() {
		let operation = ScriptedOperation::new(Script::AlwaysTransient);
		let unit = SyncUnit::aggregate(EntityKind::Products, operation.clone());

		let outcome = executor().run(&unit).await;

		assert_eq!(operation.calls.load(Ordering::SeqCst), 3);
		assert_eq!(outcome.status, SyncStatus::Error);
		// The recorded message is the last failure's.
		assert_eq!(
			outcome.error_message.as_deref(),
			Some("transport error: connection reset (3)")
		);
	}

	#[tokio::test(start_paused = true)]
	async fn expected_absence_short_circuits_after_one_attempt() {
		let operation = ScriptedOperation::new(Script::AlwaysAbsent);
		let unit = SyncUnit::aggregate(EntityKind::AccountingYears, operation.clone());

		let outcome = executor().run(&unit).await;

		assert_eq!(operation.calls.load(Ordering::SeqCst), 1);
		assert_eq!(outcome.status, SyncStatus::Skipped);
		assert_eq!(outcome.record_count, 0);
	}

	#[tokio::test(start_paused = true)]
	async fn transient_failure_recovers_within_the_bound() {
		let operation = ScriptedOperation::new(Script::FailOnceThenSucceed(42));
		let unit = SyncUnit::aggregate(EntityKind::Products, operation.clone());

		let outcome = executor().run(&unit).await;

		assert_eq!(operation.calls.load(Ordering::SeqCst), 2);
		assert_eq!(outcome.status, SyncStatus::Success);
		assert_eq!(outcome.record_count, 42);
		assert!(outcome.error_message.is_none());
	}
}
