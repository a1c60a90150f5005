//! Environment-driven configuration.
//!
//! The daily-mode entity subset lives here rather than in the sync core: the
//! set of kinds worth refreshing every day is operational data that has
//! historically changed piecemeal, so it is overridable without a rebuild.

use crate::sync::types::EntityKind;

use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_API_URL: &str = "https://restapi.e-conomic.com";
const DEFAULT_PAGE_SIZE: usize = 1000;
const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_DELAY_SECS: u64 = 5;
const DEFAULT_STAGE_COOLDOWN_SECS: u64 = 1;

/// Entity kinds refreshed by the daily run when `SYNC_DAILY_ENTITIES` is not
/// set. Reference data (payment terms, VAT accounts, groups, departments)
/// only moves on full syncs.
const DEFAULT_DAILY_ENTITIES: [EntityKind; 7] = [
	EntityKind::Products,
	EntityKind::Customers,
	EntityKind::Suppliers,
	EntityKind::Accounts,
	EntityKind::AccountingYears,
	EntityKind::Journals,
	EntityKind::Invoices,
];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("{0} must be set in the environment")]
	Missing(&'static str),

	#[error("invalid value for {name}: {message}")]
	Invalid { name: &'static str, message: String },
}

#[derive(Debug, Clone)]
pub struct Settings {
	pub api_url: String,
	pub app_secret_token: String,
	pub page_size: usize,
	pub data_dir: PathBuf,
	pub retry_attempts: u32,
	pub retry_delay: Duration,
	pub stage_cooldown: Duration,
	pub daily_entities: Vec<EntityKind>,
}

impl Settings {
	pub fn from_env() -> Result<Self, ConfigError> {
		let app_secret_token =
			env::var("APP_SECRET_TOKEN").map_err(|_| ConfigError::Missing("APP_SECRET_TOKEN"))?;

		Ok(Self {
			api_url: env::var("ACCOUNTING_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
			app_secret_token,
			page_size: parse_var("SYNC_PAGE_SIZE", DEFAULT_PAGE_SIZE)?,
			data_dir: env::var("SYNC_DATA_DIR")
				.map(PathBuf::from)
				.unwrap_or_else(|_| PathBuf::from("./data")),
			retry_attempts: parse_var("SYNC_RETRY_ATTEMPTS", DEFAULT_RETRY_ATTEMPTS)?,
			retry_delay: Duration::from_secs(parse_var(
				"SYNC_RETRY_DELAY_SECS",
				DEFAULT_RETRY_DELAY_SECS,
			)?),
			stage_cooldown: Duration::from_secs(parse_var(
				"SYNC_STAGE_COOLDOWN_SECS",
				DEFAULT_STAGE_COOLDOWN_SECS,
			)?),
			daily_entities: daily_entities_from_env()?,
		})
	}
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError>
where
	T::Err: std::fmt::Display,
{
	match env::var(name) {
		Ok(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
			name,
			message: e.to_string(),
		}),
		Err(_) => Ok(default),
	}
}

fn daily_entities_from_env() -> Result<Vec<EntityKind>, ConfigError> {
	match env::var("SYNC_DAILY_ENTITIES") {
		Ok(value) => value
			.split(',')
			.map(str::trim)
			.filter(|s| !s.is_empty())
			.map(|s| {
				s.parse().map_err(|e: crate::sync::types::PlanError| {
					ConfigError::Invalid {
						name: "SYNC_DAILY_ENTITIES",
						message: e.to_string(),
					}
				})
			})
			.collect(),
		Err(_) => Ok(DEFAULT_DAILY_ENTITIES.to_vec()),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn daily_entity_names_parse_from_a_comma_list() {
		let parsed: Result<Vec<EntityKind>, _> = "invoices, customers,accountingYears"
			.split(',')
			.map(str::trim)
			.map(str::parse)
			.collect();

		assert_eq!(
			parsed.unwrap(),
			vec![
				EntityKind::Invoices,
				EntityKind::Customers,
				EntityKind::AccountingYears,
			]
		);
	}

	#[test]
	fn default_daily_subset_is_a_subset_of_all_kinds() {
		for kind in DEFAULT_DAILY_ENTITIES {
			assert!(EntityKind::ALL.contains(&kind));
		}
	}
}
