//! Request and response types for the admin API

use crate::error::{AdminError, AdminResult};
use crate::serialize::AdminRecord;
use serde::{Deserialize, Serialize};

/// Query parameters for the list endpoint
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQueryParams {
	/// Rows to skip
	pub offset: Option<u64>,
	/// Rows to return
	pub limit: Option<u64>,
	/// Search query
	pub search: Option<String>,
	/// Sort column (prefix with "-" for descending)
	pub sort_by: Option<String>,
	/// Remaining `field[__lookup]=value` pairs, in query order
	pub filters: Vec<(String, String)>,
}

impl ListQueryParams {
	/// Parse a raw query string
	///
	/// Empty values for the reserved keys count as absent.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_panel::types::ListQueryParams;
	///
	/// let params = ListQueryParams::from_query("offset=10&limit=5&name__icontains=fin").unwrap();
	/// assert_eq!(params.offset, Some(10));
	/// assert_eq!(params.limit, Some(5));
	/// assert_eq!(params.filters, vec![("name__icontains".to_string(), "fin".to_string())]);
	/// ```
	pub fn from_query(query: &str) -> AdminResult<Self> {
		let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)
			.map_err(|e| AdminError::BadRequest(format!("Invalid query string: {}", e)))?;

		let mut params = Self::default();
		for (key, value) in pairs {
			match key.as_str() {
				"offset" => params.offset = parse_u64(&key, &value)?,
				"limit" => params.limit = parse_u64(&key, &value)?,
				"search" => params.search = non_empty(value),
				"sort_by" => params.sort_by = non_empty(value),
				_ => params.filters.push((key, value)),
			}
		}
		Ok(params)
	}
}

fn non_empty(value: String) -> Option<String> {
	if value.trim().is_empty() {
		None
	} else {
		Some(value)
	}
}

/// Parse a non-negative integer that SQLite can bind (at most `i64::MAX`)
fn parse_u64(key: &str, value: &str) -> AdminResult<Option<u64>> {
	if value.trim().is_empty() {
		return Ok(None);
	}
	value
		.trim()
		.parse::<i64>()
		.ok()
		.and_then(|n| u64::try_from(n).ok())
		.map(Some)
		.ok_or_else(|| AdminError::BadRequest(format!("'{}' must be a non-negative integer", key)))
}

/// Response for the list endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse {
	/// Total count of matching records
	pub total: u64,
	/// Records on this page
	pub results: Vec<AdminRecord>,
}

/// Request body for sign-in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignInRequest {
	pub username: String,
	pub password: String,
}

/// Response for delete
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
	pub id: i64,
}

/// Per-model entry of the configuration endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfiguration {
	pub name: String,
	/// Granted actions: "view", "add", "change", "delete"
	pub permissions: Vec<String>,
	pub list_display: Vec<String>,
	pub list_filter: Vec<String>,
	pub search_fields: Vec<String>,
	pub ordering: Vec<String>,
	pub list_per_page: u64,
}

/// Response for the configuration endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigurationResponse {
	pub site_name: String,
	pub username_field: String,
	pub models: Vec<ModelConfiguration>,
}

/// Error body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	pub detail: String,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_from_query_reserved_and_filters() {
		let params = ListQueryParams::from_query(
			"search=final%20round&sort_by=-created_at&tournament_id=3&offset=&name__in=a,b",
		)
		.unwrap();
		assert_eq!(params.search.as_deref(), Some("final round"));
		assert_eq!(params.sort_by.as_deref(), Some("-created_at"));
		assert_eq!(params.offset, None);
		assert_eq!(params.limit, None);
		assert_eq!(
			params.filters,
			vec![
				("tournament_id".to_string(), "3".to_string()),
				("name__in".to_string(), "a,b".to_string()),
			]
		);
	}

	#[test]
	fn test_from_query_empty() {
		assert_eq!(
			ListQueryParams::from_query("").unwrap(),
			ListQueryParams::default()
		);
	}

	#[test]
	fn test_from_query_rejects_negative_limit() {
		let err = ListQueryParams::from_query("limit=-1").unwrap_err();
		assert!(matches!(err, AdminError::BadRequest(msg) if msg.contains("limit")));
	}

	#[test]
	fn test_from_query_rejects_offset_beyond_i64() {
		let err = ListQueryParams::from_query("offset=18446744073709551615").unwrap_err();
		assert!(matches!(err, AdminError::BadRequest(msg) if msg.contains("offset")));

		let params = ListQueryParams::from_query("offset=9223372036854775807").unwrap();
		assert_eq!(params.offset, Some(i64::MAX as u64));
	}
}
