//! Concurrent execution of one stage of sync units.
//!
//! All units of a stage are launched together and the stage completes only
//! once every unit has produced an outcome; the retry executor guarantees
//! each unit resolves, so the stage settles fully and never fails fast. Outcomes
//! come back in submission order regardless of completion order, which keeps
//! reporting deterministic. Between stages the scheduler waits a short
//! cooldown so the downstream API gets a breather after each batch.

use crate::sync::retry::RetryExecutor;
use crate::sync::types::SyncOutcome;
use crate::sync::unit::SyncUnit;

use futures::future::join_all;
use std::time::Duration;
use tracing::debug;

pub struct StageScheduler {
	executor: RetryExecutor,
	cooldown: Duration,
}

impl StageScheduler {
	pub fn new(executor: RetryExecutor, cooldown: Duration) -> Self {
		Self { executor, cooldown }
	}

	/// Run every unit of one stage concurrently; outcomes in submission order.
	pub async fn run_stage(&self, units: &[SyncUnit]) -> Vec<SyncOutcome> {
		debug!("Running stage with {} units", units.len());
		join_all(units.iter().map(|unit| self.executor.run(unit))).await
	}

	/// Cooldown between stages.
	pub async fn cooldown(&self) {
		tokio::time::sleep(self.cooldown).await;
	}
}
