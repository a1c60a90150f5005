//!
//! HTTP client for the accounting REST API.
//!
//! Authentication uses two headers per request: the application's secret
//! token and the agreement's grant token. Collection endpoints are paginated
//! with `skippages`/`pagesize` query parameters; this client walks the pages
//! until the response stops advertising a `nextPage` link. All methods are
//! async and designed for use with Tokio.

use super::types::*;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

const APP_SECRET_HEADER: &str = "X-AppSecretToken";
const GRANT_TOKEN_HEADER: &str = "X-AgreementGrantToken";

/// Accounting REST API client
#[derive(Clone)]
pub struct AccountingApiClient {
	/// The underlying HTTP client.
	http_client: Client,
	/// Base URL of the accounting API, without a trailing slash.
	base_url: String,
	/// Application secret token sent with every request.
	app_secret_token: String,
	/// Number of records requested per page.
	page_size: usize,
}

impl AccountingApiClient {
	/// Create a new API client.
	///
	/// # Arguments
	/// * `base_url` - Root of the accounting REST API.
	/// * `app_secret_token` - Application credential sent with every request.
	/// * `page_size` - Records per page for collection endpoints.
	pub fn new(base_url: String, app_secret_token: String, page_size: usize) -> Self {
		let http_client = Client::builder()
			.timeout(Duration::from_secs(30))
			.build()
			.expect("Failed to create HTTP client");

		Self {
			http_client,
			base_url: base_url.trim_end_matches('/').to_string(),
			app_secret_token,
			page_size,
		}
	}

	/// Fetch a single page of a collection resource.
	pub async fn fetch_page(
		&self,
		grant_token: &str,
		path: &str,
		skip_pages: usize,
	) -> Result<ResourcePage, ApiError> {
		let url = format!("{}/{}", self.base_url, path);
		let response = self
			.http_client
			.get(&url)
			.header(APP_SECRET_HEADER, &self.app_secret_token)
			.header(GRANT_TOKEN_HEADER, grant_token)
			.query(&[("skippages", skip_pages), ("pagesize", self.page_size)])
			.send()
			.await?;

		Self::check_status(response.status(), path)?;

		response.json::<ResourcePage>().await.map_err(|e| ApiError::Malformed {
			path: path.to_string(),
			message: e.to_string(),
		})
	}

	/// Fetch every record of a collection resource, walking all pages.
	pub async fn fetch_collection(
		&self,
		grant_token: &str,
		path: &str,
	) -> Result<Vec<serde_json::Value>, ApiError> {
		let mut records = Vec::new();
		let mut skip_pages = 0;

		loop {
			let page = self.fetch_page(grant_token, path, skip_pages).await?;
			let page_len = page.collection.len();
			records.extend(page.collection);

			let has_next = page
				.pagination
				.as_ref()
				.and_then(|p| p.next_page.as_ref())
				.is_some();
			if !has_next || page_len == 0 {
				break;
			}
			skip_pages += 1;
		}

		debug!("Fetched {} records from {}", records.len(), path);
		Ok(records)
	}

	/// Fetch a single (non-collection) resource as raw JSON.
	pub async fn fetch_resource(
		&self,
		grant_token: &str,
		path: &str,
	) -> Result<serde_json::Value, ApiError> {
		let url = format!("{}/{}", self.base_url, path);
		let response = self
			.http_client
			.get(&url)
			.header(APP_SECRET_HEADER, &self.app_secret_token)
			.header(GRANT_TOKEN_HEADER, grant_token)
			.send()
			.await?;

		Self::check_status(response.status(), path)?;

		response
			.json::<serde_json::Value>()
			.await
			.map_err(|e| ApiError::Malformed {
				path: path.to_string(),
				message: e.to_string(),
			})
	}

	fn check_status(status: StatusCode, path: &str) -> Result<(), ApiError> {
		if status.is_success() {
			return Ok(());
		}
		match status {
			StatusCode::NOT_FOUND => Err(ApiError::NotFound(path.to_string())),
			StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
				Err(ApiError::Unauthorized(path.to_string()))
			}
			other => Err(ApiError::Upstream {
				status: other.as_u16(),
				path: path.to_string(),
			}),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn status_classification_matches_the_failure_taxonomy() {
		assert!(AccountingApiClient::check_status(StatusCode::OK, "accounts").is_ok());
		assert!(matches!(
			AccountingApiClient::check_status(StatusCode::NOT_FOUND, "accounting-years/2026"),
			Err(ApiError::NotFound(_))
		));
		assert!(matches!(
			AccountingApiClient::check_status(StatusCode::UNAUTHORIZED, "customers"),
			Err(ApiError::Unauthorized(_))
		));
		assert!(matches!(
			AccountingApiClient::check_status(StatusCode::FORBIDDEN, "customers"),
			Err(ApiError::Unauthorized(_))
		));
		assert!(matches!(
			AccountingApiClient::check_status(StatusCode::BAD_GATEWAY, "invoices/booked"),
			Err(ApiError::Upstream { status: 502, .. })
		));
		assert!(matches!(
			AccountingApiClient::check_status(StatusCode::TOO_MANY_REQUESTS, "products"),
			Err(ApiError::Upstream { status: 429, .. })
		));
	}
}
