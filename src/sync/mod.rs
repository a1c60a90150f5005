//! Sync Orchestration Module
//!
//! This module contains the core logic for driving a full or daily sync of
//! accounting data across every active agreement. It is composed of several
//! submodules, each responsible for one aspect of a run:
//!
//! - `coordinator`: The main entry point. Composes the plan, fanout, scheduler, and retry executor into one run and aggregates the summary.
//! - `plan`: The static stage table expressing which entity kinds must sync before which, and which may run concurrently.
//! - `fanout`: Expands one entity kind into per-agreement or aggregate sync units at the moment a stage starts.
//! - `scheduler`: Runs one stage's units concurrently with all-settle semantics and applies the inter-stage cooldown.
//! - `retry`: Bounded fixed-delay retry around one unit, with expected-absence short-circuit.
//! - `unit`: The sync unit descriptor, the two operation shapes, and the closed registry mapping entity kinds to operations.
//! - `services`: The per-entity operations that actually pull from the API and upsert into the store.
//! - `sink`: The durable audit trail of outcomes and run summaries.
//! - `types`: Entity kinds, outcomes, summaries, and the failure taxonomy.
//!
//! Unit failures never escape the retry executor, stage failures never
//! escape the scheduler, and the only error a run itself can raise is a
//! configuration error detected before any unit executes.

/// Main coordinator for full and daily runs
pub mod coordinator;
/// Expansion of entity kinds into sync units
pub mod fanout;
/// Dependency-ordered stage table
pub mod plan;
/// Bounded retry around one sync unit
pub mod retry;
/// Concurrent stage execution
pub mod scheduler;
/// Per-entity sync operations
pub mod services;
/// Durable sync log
pub mod sink;
/// Core types and failure taxonomy
pub mod types;
/// Sync units and the operation registry
pub mod unit;

pub use coordinator::*;
pub use types::*;
