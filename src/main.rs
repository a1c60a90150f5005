mod agreements;
mod api;
mod config;
mod store;
mod sync;

use crate::agreements::{AgreementDirectory, FileAgreementDirectory};
use crate::api::AccountingApiClient;
use crate::config::Settings;
use crate::store::{FileRecordStore, RecordStore};
use crate::sync::coordinator::SyncRunCoordinator;
use crate::sync::fanout::AgreementFanout;
use crate::sync::plan::SyncPlan;
use crate::sync::retry::{RetryExecutor, RetryPolicy};
use crate::sync::scheduler::StageScheduler;
use crate::sync::services::standard_registry;
use crate::sync::sink::{FileSyncLogSink, SyncLogSink};
use crate::sync::types::RunStatus;

use std::sync::Arc;
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() {
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::from_default_env()
				.add_directive(tracing::Level::INFO.into()),
		)
		.with_target(false)
		.with_thread_ids(false)
		.with_thread_names(false)
		.with_file(false)
		.with_line_number(false)
		.with_timer(tracing_subscriber::fmt::time::time())
		.init();

	let settings = match Settings::from_env() {
		Ok(settings) => settings,
		Err(e) => {
			error!("Invalid configuration: {}", e);
			std::process::exit(2);
		}
	};

	let mode = std::env::args().nth(1).unwrap_or_else(|| "full".to_string());

	info!("Starting accounting sync service ({} mode)", mode);

	if let Err(e) = tokio::fs::create_dir_all(&settings.data_dir).await {
		error!("Failed to create data directory {:?}: {}", settings.data_dir, e);
		std::process::exit(2);
	}

	let client = Arc::new(AccountingApiClient::new(
		settings.api_url.clone(),
		settings.app_secret_token.clone(),
		settings.page_size,
	));
	let directory: Arc<dyn AgreementDirectory> = Arc::new(FileAgreementDirectory::new(
		settings.data_dir.join("agreements.json"),
	));
	let store: Arc<dyn RecordStore> = Arc::new(FileRecordStore::new(settings.data_dir.clone()));
	let sink: Arc<dyn SyncLogSink> = Arc::new(FileSyncLogSink::new(settings.data_dir.clone()));

	let registry = standard_registry(client, store, directory.clone());

	let coordinator = match SyncRunCoordinator::new(
		SyncPlan::standard(),
		registry,
		AgreementFanout::new(directory),
		StageScheduler::new(
			RetryExecutor::new(RetryPolicy {
				max_attempts: settings.retry_attempts,
				delay: settings.retry_delay,
			}),
			settings.stage_cooldown,
		),
		sink,
		settings.daily_entities.clone(),
	) {
		Ok(coordinator) => coordinator,
		Err(e) => {
			error!("Sync plan is misconfigured: {}", e);
			std::process::exit(2);
		}
	};

	let result = match mode.as_str() {
		"full" => coordinator.run_full().await,
		"daily" => coordinator.run_daily().await,
		other => {
			error!("Unknown sync mode: {} (expected \"full\" or \"daily\")", other);
			std::process::exit(2);
		}
	};

	match result {
		Ok(summary) => {
			println!("{}", serde_json::to_string_pretty(&summary).unwrap());
			if summary.status == RunStatus::PartialFailure {
				std::process::exit(1);
			}
		}
		Err(e) => {
			error!("Sync run aborted: {}", e);
			std::process::exit(2);
		}
	}
}
