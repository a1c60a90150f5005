//! Wire types for the accounting REST API.

use serde::Deserialize;

/// One page of a paginated collection resource.
///
/// Every collection endpoint returns its records in `collection` together
/// with a `pagination` block carrying a `nextPage` link while more pages
/// remain.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourcePage {
	#[serde(default)]
	pub collection: Vec<serde_json::Value>,
	#[serde(default)]
	pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
	#[serde(default)]
	pub next_page: Option<String>,
	#[serde(default)]
	pub results: Option<u64>,
}

/// Errors from the accounting API, classified by what the caller can do
/// about them.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
	/// The resource legitimately does not exist (HTTP 404).
	#[error("resource not found: {0}")]
	NotFound(String),

	/// The grant token was rejected for this resource (HTTP 401/403).
	#[error("authorization rejected for {0}")]
	Unauthorized(String),

	/// The API answered but with a failure status (timeouts, rate limits,
	/// 5xx-class responses).
	#[error("upstream failure {status} on {path}")]
	Upstream { status: u16, path: String },

	#[error("transport error: {0}")]
	Transport(#[from] reqwest::Error),

	#[error("malformed response from {path}: {message}")]
	Malformed { path: String, message: String },
}
