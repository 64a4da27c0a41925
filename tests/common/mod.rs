//! Shared fixtures for admin API integration tests
//!
//! Every test gets its own in-memory SQLite database with a small tournament
//! schema, an [`AdminSite`] with the `User` model registered, and a
//! cookie-keeping [`TestClient`] that drives [`AdminApp`] in-process.

#![allow(dead_code)]

use bytes::Bytes;
use chrono::{DateTime, Duration, TimeZone, Utc};
use http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use http::{HeaderMap, Method, Request, StatusCode};
use http_body_util::BodyExt;
use reinhardt_panel::auth::hash_password;
use reinhardt_panel::models::{FieldKind, ModelSchema};
use reinhardt_panel::{AdminApp, AdminDatabase, AdminSettings, AdminSite, ModelAdminConfig};
use rstest::fixture;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "correct horse battery staple";

const SCHEMA_SQL: &[&str] = &[
	"CREATE TABLE users (
		id INTEGER PRIMARY KEY AUTOINCREMENT,
		username TEXT NOT NULL UNIQUE,
		password TEXT NOT NULL,
		is_superuser BOOLEAN NOT NULL DEFAULT 0,
		is_active BOOLEAN NOT NULL DEFAULT 1
	)",
	"CREATE TABLE tournaments (
		id INTEGER PRIMARY KEY AUTOINCREMENT,
		name TEXT NOT NULL
	)",
	"CREATE TABLE participants (
		id INTEGER PRIMARY KEY AUTOINCREMENT,
		name TEXT NOT NULL
	)",
	"CREATE TABLE events (
		id INTEGER PRIMARY KEY AUTOINCREMENT,
		name TEXT NOT NULL,
		tournament_id INTEGER NOT NULL REFERENCES tournaments (id),
		created_at TEXT NOT NULL,
		updated_at TEXT NOT NULL
	)",
	"CREATE TABLE event_participants (
		event_id INTEGER NOT NULL REFERENCES events (id),
		participant_id INTEGER NOT NULL REFERENCES participants (id)
	)",
];

pub fn user_schema() -> ModelSchema {
	ModelSchema::new("User", "users")
		.field("username", FieldKind::Text)
		.field("password", FieldKind::Text)
		.field("is_superuser", FieldKind::Boolean)
		.field("is_active", FieldKind::Boolean)
}

pub fn tournament_schema() -> ModelSchema {
	ModelSchema::new("Tournament", "tournaments").field("name", FieldKind::Text)
}

pub fn event_schema() -> ModelSchema {
	ModelSchema::new("Event", "events")
		.field("name", FieldKind::Text)
		.foreign_key("tournament", "Tournament")
		.many_to_many(
			"participants",
			"Participant",
			"event_participants",
			"event_id",
			"participant_id",
		)
		.field("created_at", FieldKind::DateTime)
		.field("updated_at", FieldKind::DateTime)
}

/// An event row as inserted by the fixtures
#[derive(Debug, Clone)]
pub struct Event {
	pub id: i64,
	pub name: String,
	pub tournament_id: i64,
	pub participant_ids: Vec<i64>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

/// Fixture state: the app plus the seeded admin user
pub struct TestApp {
	pub app: AdminApp,
	pub user_id: i64,
}

impl TestApp {
	pub fn client(&self) -> TestClient {
		TestClient::new(self.app.clone())
	}

	pub fn db(&self) -> &AdminDatabase {
		self.app.db()
	}

	pub fn site(&self) -> &AdminSite {
		self.app.site()
	}

	pub async fn insert_tournament(&self, name: &str) -> i64 {
		sqlx::query("INSERT INTO tournaments (name) VALUES (?)")
			.bind(name)
			.execute(self.db().pool())
			.await
			.expect("Failed to insert tournament")
			.last_insert_rowid()
	}

	pub async fn insert_participant(&self, name: &str) -> i64 {
		sqlx::query("INSERT INTO participants (name) VALUES (?)")
			.bind(name)
			.execute(self.db().pool())
			.await
			.expect("Failed to insert participant")
			.last_insert_rowid()
	}

	pub async fn insert_event(
		&self,
		name: &str,
		tournament_id: i64,
		participant_ids: &[i64],
		created_at: DateTime<Utc>,
	) -> Event {
		let updated_at = created_at + Duration::hours(6);
		let id = sqlx::query(
			"INSERT INTO events (name, tournament_id, created_at, updated_at) VALUES (?, ?, ?, ?)",
		)
		.bind(name)
		.bind(tournament_id)
		.bind(created_at)
		.bind(updated_at)
		.execute(self.db().pool())
		.await
		.expect("Failed to insert event")
		.last_insert_rowid();

		for participant_id in participant_ids {
			sqlx::query("INSERT INTO event_participants (event_id, participant_id) VALUES (?, ?)")
				.bind(id)
				.bind(participant_id)
				.execute(self.db().pool())
				.await
				.expect("Failed to link participant");
		}

		Event {
			id,
			name: name.to_string(),
			tournament_id,
			participant_ids: participant_ids.to_vec(),
			created_at,
			updated_at,
		}
	}

	pub async fn insert_user(&self, username: &str, password: &str, is_superuser: bool) -> i64 {
		sqlx::query("INSERT INTO users (username, password, is_superuser) VALUES (?, ?, ?)")
			.bind(username)
			.bind(hash_password(password).expect("Failed to hash password"))
			.bind(is_superuser)
			.execute(self.db().pool())
			.await
			.expect("Failed to insert user")
			.last_insert_rowid()
	}

	pub fn register_event_admin(&self) {
		self.app
			.site()
			.register(ModelAdminConfig::new(event_schema()))
			.expect("Failed to register Event admin");
	}
}

/// Base timestamp with a non-zero microsecond part
pub fn base_timestamp() -> DateTime<Utc> {
	Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 15)
		.single()
		.expect("valid timestamp")
		+ Duration::microseconds(123_456)
}

/// Fresh database, schema, site and superuser
#[fixture]
pub async fn test_app() -> TestApp {
	reinhardt_panel::logging::init_test_logging();

	let db = AdminDatabase::connect("sqlite::memory:")
		.await
		.expect("Failed to open database");
	for sql in SCHEMA_SQL {
		sqlx::query(sql)
			.execute(db.pool())
			.await
			.expect("Failed to create schema");
	}

	let site = AdminSite::new("Tournament Admin");
	site.register(
		ModelAdminConfig::builder(user_schema())
			.list_display(vec!["id", "username"])
			.exclude(vec!["password"])
			.build(),
	)
	.expect("Failed to register User admin");

	let app = AdminApp::new(
		Arc::new(site),
		Arc::new(db),
		AdminSettings::new("test-secret-key"),
	);
	let test_app = TestApp { app, user_id: 0 };
	let user_id = test_app
		.insert_user(ADMIN_USERNAME, ADMIN_PASSWORD, true)
		.await;

	TestApp {
		user_id,
		..test_app
	}
}

/// Fixture app with one tournament, two participants and one event
#[fixture]
pub async fn event_app(#[future] test_app: TestApp) -> (TestApp, Event) {
	let app = test_app.await;
	let tournament_id = app.insert_tournament("Spring Open").await;
	let alice = app.insert_participant("Alice").await;
	let bob = app.insert_participant("Bob").await;
	let event = app
		.insert_event("Final", tournament_id, &[alice, bob], base_timestamp())
		.await;
	(app, event)
}

/// Response captured by [`TestClient`]
#[derive(Debug)]
pub struct TestResponse {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub body: Bytes,
}

impl TestResponse {
	pub fn json(&self) -> Value {
		serde_json::from_slice(&self.body).expect("Response body is not JSON")
	}
}

/// In-process client keeping cookies between requests
pub struct TestClient {
	app: AdminApp,
	cookies: HashMap<String, String>,
}

impl TestClient {
	pub fn new(app: AdminApp) -> Self {
		Self {
			app,
			cookies: HashMap::new(),
		}
	}

	pub fn has_cookie(&self, name: &str) -> bool {
		self.cookies.contains_key(name)
	}

	fn store_cookies(&mut self, headers: &HeaderMap) {
		for value in headers.get_all(SET_COOKIE) {
			let Ok(value) = value.to_str() else { continue };
			let (pair, attributes) = value.split_once(';').unwrap_or((value, ""));
			let Some((name, cookie)) = pair.split_once('=') else {
				continue;
			};
			if cookie.is_empty() || attributes.contains("Max-Age=0") {
				self.cookies.remove(name.trim());
			} else {
				self.cookies
					.insert(name.trim().to_string(), cookie.to_string());
			}
		}
	}

	pub async fn request(&mut self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
		let mut builder = Request::builder().method(method).uri(uri);
		if !self.cookies.is_empty() {
			let header = self
				.cookies
				.iter()
				.map(|(k, v)| format!("{}={}", k, v))
				.collect::<Vec<_>>()
				.join("; ");
			builder = builder.header(COOKIE, header);
		}
		let bytes = match body {
			Some(json) => {
				builder = builder.header(CONTENT_TYPE, "application/json");
				Bytes::from(serde_json::to_vec(&json).expect("Failed to encode body"))
			}
			None => Bytes::new(),
		};
		let request = builder.body(bytes).expect("Failed to build request");

		let response = self.app.handle(request).await;
		let (parts, body) = response.into_parts();
		self.store_cookies(&parts.headers);
		let body = body
			.collect()
			.await
			.expect("Failed to read body")
			.to_bytes();

		TestResponse {
			status: parts.status,
			headers: parts.headers,
			body,
		}
	}

	pub async fn get(&mut self, uri: &str) -> TestResponse {
		self.request(Method::GET, uri, None).await
	}

	pub async fn post(&mut self, uri: &str, body: Value) -> TestResponse {
		self.request(Method::POST, uri, Some(body)).await
	}

	pub async fn delete(&mut self, uri: &str) -> TestResponse {
		self.request(Method::DELETE, uri, None).await
	}

	pub async fn sign_in(&mut self, username: &str, password: &str) -> TestResponse {
		self.post(
			"/api/sign-in",
			serde_json::json!({ "username": username, "password": password }),
		)
		.await
	}

	/// Sign in as the fixture superuser, asserting success
	pub async fn sign_in_admin(&mut self) {
		let response = self.sign_in(ADMIN_USERNAME, ADMIN_PASSWORD).await;
		assert_eq!(response.status, StatusCode::OK, "sign-in failed: {:?}", response.body);
	}
}
