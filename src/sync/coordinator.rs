//! Top-level driver for full and daily sync runs.
//!
//! The coordinator composes the stage plan, agreement fanout, stage
//! scheduler, and retry executor into one run: expand each stage's kinds
//! into units at the moment the stage starts, run the stage to completion,
//! record every outcome, and aggregate the lot into a `RunSummary`. A run
//! never aborts because an entity kind failed; the only error that can
//! escape is a misconfigured plan or registry, which is checked before any
//! unit executes.
//!
//! Daily runs cover a reduced, externally configured entity subset and scope
//! accounting years to the current period; full runs cover every kind with
//! full history.

use crate::sync::fanout::AgreementFanout;
use crate::sync::plan::SyncPlan;
use crate::sync::scheduler::StageScheduler;
use crate::sync::sink::SyncLogSink;
use crate::sync::types::{
    EntityKind, OperationVariant, PlanError, RunSummary, SyncOutcome,
};
use crate::sync::unit::SyncRegistry;

use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Which of the two documented run modes to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Full,
    Daily,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Full => "full",
            RunMode::Daily => "daily",
        }
    }

    /// Daily sync trades completeness for speed on the heaviest kind only.
    fn variant_for(&self, kind: EntityKind) -> OperationVariant {
        match (self, kind) {
            (RunMode::Daily, EntityKind::AccountingYears) => OperationVariant::CurrentPeriod,
            _ => OperationVariant::FullHistory,
        }
    }
}

pub struct SyncRunCoordinator {
    plan: SyncPlan,
    registry: SyncRegistry,
    fanout: AgreementFanout,
    scheduler: StageScheduler,
    sink: Arc<dyn SyncLogSink>,
    daily_entities: Vec<EntityKind>,
}

impl SyncRunCoordinator {
    /// Wire up a coordinator, failing fast on a misconfigured plan or an
    /// unregistered entity kind.
    pub fn new(
        plan: SyncPlan,
        registry: SyncRegistry,
        fanout: AgreementFanout,
        scheduler: StageScheduler,
        sink: Arc<dyn SyncLogSink>,
        daily_entities: Vec<EntityKind>,
    ) -> Result<Self, PlanError> {
        plan.validate()?;
        registry.ensure_covers(&EntityKind::ALL)?;
        Ok(Self {
            plan,
            registry,
            fanout,
            scheduler,
            sink,
            daily_entities,
        })
    }

    /// Sync every entity kind with full history.
    pub async fn run_full(&self) -> Result<RunSummary, PlanError> {
        self.run(RunMode::Full, &EntityKind::ALL).await
    }

    /// Sync the configured daily subset, accounting years scoped to the
    /// current period.
    pub async fn run_daily(&self) -> Result<RunSummary, PlanError> {
        let subset = self.daily_entities.clone();
        self.run(RunMode::Daily, &subset).await
    }

    async fn run(&self, mode: RunMode, kinds: &[EntityKind]) -> Result<RunSummary, PlanError> {
        let run_started = Utc::now();
        let clock = Instant::now();
        let stages = self.plan.stages_for(kinds);
        let total_stages = stages.len();

        info!(
            "Starting {} sync: {} entity kinds across {} stages",
            mode.as_str(),
            kinds.len(),
            total_stages
        );

        let mut outcomes: Vec<SyncOutcome> = Vec::new();

        for (index, stage) in stages.iter().enumerate() {
            let mut units = Vec::new();
            for kind in stage {
                let registration = self
                    .registry
                    .get(*kind)
                    .ok_or(PlanError::Unregistered(*kind))?;
                let variant = mode.variant_for(*kind);

                match self.fanout.expand(*kind, registration, variant).await {
                    Ok(expanded) if expanded.is_empty() => {
                        warn!("No active agreements for {}; reporting as skipped", kind);
                        let outcome = SyncOutcome::skipped(
                            *kind,
                            None,
                            "no active agreements",
                            Utc::now(),
                        );
                        self.record_outcome(&outcome).await;
                        outcomes.push(outcome);
                    }
                    Ok(expanded) => units.extend(expanded),
                    Err(failure) => {
                        error!("Failed to expand {} into sync units: {}", kind, failure);
                        let outcome =
                            SyncOutcome::error(*kind, None, failure.to_string(), Utc::now());
                        self.record_outcome(&outcome).await;
                        outcomes.push(outcome);
                    }
                }
            }

            info!(
                "Stage {}/{}: running {} units",
                index + 1,
                total_stages,
                units.len()
            );

            let stage_outcomes = self.scheduler.run_stage(&units).await;
            for outcome in &stage_outcomes {
                self.record_outcome(outcome).await;
            }
            outcomes.extend(stage_outcomes);

            if index + 1 < total_stages {
                self.scheduler.cooldown().await;
            }
        }

        let summary = RunSummary::from_outcomes(run_started, clock.elapsed(), &outcomes);
        info!(
            "{} sync finished in {} ms ({} kinds, status {:?})",
            mode.as_str(),
            summary.duration_ms,
            summary.results.len(),
            summary.status
        );

        if let Err(e) = self.sink.flush(&summary).await {
            warn!("Failed to flush run summary: {}", e);
        }
        Ok(summary)
    }

    async fn record_outcome(&self, outcome: &SyncOutcome) {
        if let Err(e) = self.sink.record(outcome).await {
            warn!("Failed to record sync outcome for {}: {}", outcome.entity, e);
        }
    }
}
