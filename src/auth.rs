//! Session authentication
//!
//! A successful sign-in issues an HS256 JWT carrying the user id. The token
//! travels in an HttpOnly cookie named by `settings.session_id_key`.

use crate::error::{AdminError, AdminResult};
use crate::settings::AdminSettings;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::Utc;
use http::HeaderMap;
use http::header::COOKIE;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// The signed-in operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUser {
	pub id: i64,
	pub username: String,
}

/// Claims stored in the session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
	/// User id
	pub session_id: i64,
	/// Expiry as a unix timestamp
	pub exp: i64,
}

/// Hash a password into an argon2 PHC string
pub fn hash_password(password: &str) -> AdminResult<String> {
	let salt = SaltString::generate(&mut OsRng);
	Argon2::default()
		.hash_password(password.as_bytes(), &salt)
		.map(|hash| hash.to_string())
		.map_err(|e| AdminError::Configuration(format!("Failed to hash password: {}", e)))
}

/// Verify `password` against a stored PHC string
///
/// Malformed hashes never verify.
pub fn verify_password(password: &str, phc: &str) -> bool {
	match PasswordHash::new(phc) {
		Ok(parsed) => Argon2::default()
			.verify_password(password.as_bytes(), &parsed)
			.is_ok(),
		Err(_) => false,
	}
}

/// Issue a session token for `user_id`
pub fn encode_session(settings: &AdminSettings, user_id: i64) -> AdminResult<String> {
	let claims = SessionClaims {
		session_id: user_id,
		exp: Utc::now().timestamp() + settings.session_expired_at as i64,
	};
	encode(
		&Header::new(Algorithm::HS256),
		&claims,
		&EncodingKey::from_secret(settings.secret_key.as_bytes()),
	)
	.map_err(|e| AdminError::Configuration(format!("Failed to sign session: {}", e)))
}

/// Validate a session token and return the user id
pub fn decode_session(settings: &AdminSettings, token: &str) -> AdminResult<i64> {
	let mut validation = Validation::new(Algorithm::HS256);
	validation.leeway = 0;
	decode::<SessionClaims>(
		token,
		&DecodingKey::from_secret(settings.secret_key.as_bytes()),
		&validation,
	)
	.map(|data| data.claims.session_id)
	.map_err(|e| {
		tracing::debug!(error = %e, "rejected session token");
		AdminError::Unauthorized("Unauthorized".to_string())
	})
}

/// Find cookie `name` in the request headers
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
	headers
		.get_all(COOKIE)
		.iter()
		.filter_map(|value| value.to_str().ok())
		.flat_map(|value| value.split(';'))
		.filter_map(|pair| pair.trim().split_once('='))
		.find(|(key, _)| *key == name)
		.map(|(_, value)| value)
}

/// `Set-Cookie` value carrying a fresh session
pub fn session_cookie(settings: &AdminSettings, token: &str) -> String {
	format!(
		"{}={}; HttpOnly; Path=/; Max-Age={}; SameSite=Lax",
		settings.session_id_key, token, settings.session_expired_at
	)
}

/// `Set-Cookie` value clearing the session
pub fn clear_session_cookie(settings: &AdminSettings) -> String {
	format!(
		"{}=; HttpOnly; Path=/; Max-Age=0; SameSite=Lax",
		settings.session_id_key
	)
}
