//! Error types for the admin API
//!
//! Every handler returns [`AdminResult`]; the router turns an [`AdminError`]
//! into a JSON `{"detail": ...}` response with the matching status code.

use hyper::StatusCode;
use thiserror::Error;

/// Admin panel error type
#[derive(Debug, Error)]
pub enum AdminError {
	/// Model not registered with the admin site
	#[error("{0} model is not registered")]
	ModelNotRegistered(String),

	/// Model registered twice
	#[error("{0} model is already registered")]
	AlreadyRegistered(String),

	/// Record or route not found
	#[error("{0}")]
	NotFound(String),

	/// Missing or invalid session
	#[error("{0}")]
	Unauthorized(String),

	/// Permission denied
	#[error("{0}")]
	PermissionDenied(String),

	/// Malformed request (unknown filter field, bad body, ...)
	#[error("{0}")]
	BadRequest(String),

	/// Database error
	#[error("Database error: {0}")]
	Database(String),

	/// Misconfigured site or settings
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Result type for admin panel operations
pub type AdminResult<T> = Result<T, AdminError>;

impl From<sqlx::Error> for AdminError {
	fn from(err: sqlx::Error) -> Self {
		AdminError::Database(err.to_string())
	}
}

impl AdminError {
	/// HTTP status code for this error
	pub fn status(&self) -> StatusCode {
		match self {
			AdminError::ModelNotRegistered(_) | AdminError::NotFound(_) => StatusCode::NOT_FOUND,
			AdminError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
			AdminError::PermissionDenied(_) => StatusCode::FORBIDDEN,
			AdminError::BadRequest(_) => StatusCode::BAD_REQUEST,
			AdminError::AlreadyRegistered(_)
			| AdminError::Database(_)
			| AdminError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	/// Message sent to the client
	///
	/// Database and registry errors are logged by the router and replaced with
	/// a generic message here.
	pub fn client_message(&self) -> String {
		match self {
			AdminError::Database(_) => "Database operation failed".to_string(),
			AdminError::AlreadyRegistered(_) => "Internal server error".to_string(),
			other => other.to_string(),
		}
	}
}
