//! Admin panel settings
//!
//! Settings are read from `ADMIN_`-prefixed environment variables or built in
//! code with the `with_*` methods.

use std::env;
use thiserror::Error;

/// Default prefix for admin environment variables
pub const ENV_PREFIX: &str = "ADMIN_";

/// Errors raised while loading settings
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
	#[error("Missing environment variable: {0}")]
	MissingVariable(String),

	#[error("Invalid value for {key}: {error}")]
	ParseError { key: String, error: String },
}

/// Environment variable reader with prefix support
#[derive(Debug, Clone)]
pub struct Env {
	prefix: String,
}

impl Env {
	pub fn new(prefix: impl Into<String>) -> Self {
		Self {
			prefix: prefix.into(),
		}
	}

	fn key_name(&self, key: &str) -> String {
		format!("{}{}", self.prefix, key)
	}

	/// Read a required string value
	pub fn str(&self, key: &str) -> Result<String, SettingsError> {
		let full_key = self.key_name(key);
		env::var(&full_key).map_err(|_| SettingsError::MissingVariable(full_key))
	}

	/// Read a string value with a default
	pub fn str_with_default(&self, key: &str, default: &str) -> String {
		env::var(self.key_name(key)).unwrap_or_else(|_| default.to_string())
	}

	/// Read an unsigned integer with a default
	pub fn u64_with_default(&self, key: &str, default: u64) -> Result<u64, SettingsError> {
		let full_key = self.key_name(key);
		match env::var(&full_key) {
			Ok(val) => val
				.trim()
				.parse::<u64>()
				.map_err(|e| SettingsError::ParseError {
					key: full_key,
					error: e.to_string(),
				}),
			Err(_) => Ok(default),
		}
	}
}

/// Admin panel settings
#[derive(Debug, Clone)]
pub struct AdminSettings {
	/// Key used to sign session tokens
	pub secret_key: String,
	/// Site name shown in the configuration endpoint
	pub site_name: String,
	/// Path prefix the API is mounted under (e.g. "/admin"), empty for root
	pub url_prefix: String,
	/// Registered model used for sign-in
	pub user_model: String,
	/// Column holding the user name on the user model
	pub username_field: String,
	/// Column holding the argon2 password hash on the user model
	pub password_field: String,
	/// Cookie name carrying the session token
	pub session_id_key: String,
	/// Session lifetime in seconds
	pub session_expired_at: u64,
	/// Database connection URL
	pub database_url: String,
}

impl AdminSettings {
	/// Create settings with defaults and the given signing key
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_panel::AdminSettings;
	///
	/// let settings = AdminSettings::new("secret").with_site_name("Tournaments");
	/// assert_eq!(settings.site_name, "Tournaments");
	/// assert_eq!(settings.session_id_key, "admin_session_id");
	/// ```
	pub fn new(secret_key: impl Into<String>) -> Self {
		Self {
			secret_key: secret_key.into(),
			site_name: "Admin".to_string(),
			url_prefix: String::new(),
			user_model: "User".to_string(),
			username_field: "username".to_string(),
			password_field: "password".to_string(),
			session_id_key: "admin_session_id".to_string(),
			session_expired_at: 144_000,
			database_url: "sqlite::memory:".to_string(),
		}
	}

	/// Load settings from `ADMIN_*` environment variables
	///
	/// `ADMIN_SECRET_KEY` is required; everything else falls back to the
	/// defaults of [`AdminSettings::new`].
	pub fn from_env() -> Result<Self, SettingsError> {
		Self::from_env_with(&Env::new(ENV_PREFIX))
	}

	pub fn from_env_with(env: &Env) -> Result<Self, SettingsError> {
		let defaults = Self::new(env.str("SECRET_KEY")?);
		Ok(Self {
			site_name: env.str_with_default("SITE_NAME", &defaults.site_name),
			url_prefix: normalize_prefix(&env.str_with_default("URL_PREFIX", "")),
			user_model: env.str_with_default("USER_MODEL", &defaults.user_model),
			username_field: env
				.str_with_default("USER_MODEL_USERNAME_FIELD", &defaults.username_field),
			password_field: env
				.str_with_default("USER_MODEL_PASSWORD_FIELD", &defaults.password_field),
			session_id_key: env.str_with_default("SESSION_ID_KEY", &defaults.session_id_key),
			session_expired_at: env
				.u64_with_default("SESSION_EXPIRED_AT", defaults.session_expired_at)?,
			database_url: env.str_with_default("DATABASE_URL", &defaults.database_url),
			..defaults
		})
	}

	pub fn with_site_name(mut self, name: impl Into<String>) -> Self {
		self.site_name = name.into();
		self
	}

	pub fn with_url_prefix(mut self, prefix: &str) -> Self {
		self.url_prefix = normalize_prefix(prefix);
		self
	}

	pub fn with_user_model(mut self, model: impl Into<String>) -> Self {
		self.user_model = model.into();
		self
	}

	pub fn with_username_field(mut self, field: impl Into<String>) -> Self {
		self.username_field = field.into();
		self
	}

	pub fn with_password_field(mut self, field: impl Into<String>) -> Self {
		self.password_field = field.into();
		self
	}

	pub fn with_session_id_key(mut self, key: impl Into<String>) -> Self {
		self.session_id_key = key.into();
		self
	}

	pub fn with_session_expired_at(mut self, seconds: u64) -> Self {
		self.session_expired_at = seconds;
		self
	}

	pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
		self.database_url = url.into();
		self
	}
}

/// Normalize a mount prefix to `/segment` form (no trailing slash)
fn normalize_prefix(prefix: &str) -> String {
	let trimmed = prefix.trim().trim_matches('/');
	if trimmed.is_empty() {
		String::new()
	} else {
		format!("/{}", trimmed)
	}
}
