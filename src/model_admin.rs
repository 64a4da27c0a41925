//! Model admin configuration and trait
//!
//! This module defines how models are listed and managed through the admin API.

use crate::auth::{AdminUser, verify_password};
use crate::database::AdminDatabase;
use crate::error::{AdminError, AdminResult};
use crate::models::ModelSchema;
use crate::query::{Filter, FilterOperator, FilterValue};
use crate::settings::AdminSettings;
use async_trait::async_trait;
use serde_json::Value;

/// Default page size for list views
pub const DEFAULT_LIST_PER_PAGE: u64 = 10;

/// Trait for configuring model administration
///
/// Implement this trait to customize how a model is listed and managed.
/// [`ModelAdminConfig`] covers the common cases without a custom type.
#[async_trait]
pub trait ModelAdmin: Send + Sync {
	/// Schema of the administered model
	fn schema(&self) -> &ModelSchema;

	/// Get the model name
	fn model_name(&self) -> &str {
		&self.schema().name
	}

	/// Columns shown by the list view
	fn list_display(&self) -> Vec<&str> {
		vec![self.schema().pk.as_str()]
	}

	/// Columns offered as list filters
	fn list_filter(&self) -> Vec<&str> {
		vec![]
	}

	/// Columns searched by the `search` query parameter
	fn search_fields(&self) -> Vec<&str> {
		vec![]
	}

	/// Ordering for list view (prefix with "-" for descending)
	///
	/// Empty means primary key ascending.
	fn ordering(&self) -> Vec<&str> {
		vec![]
	}

	/// Number of items per page when the request gives no `limit`
	fn list_per_page(&self) -> u64 {
		DEFAULT_LIST_PER_PAGE
	}

	/// Fields never serialized (e.g. password hashes)
	fn exclude(&self) -> Vec<&str> {
		vec![]
	}

	/// Check if user has permission to view this model
	async fn has_view_permission(&self, _user: &AdminUser) -> bool {
		true
	}

	/// Check if user has permission to add instances
	async fn has_add_permission(&self, _user: &AdminUser) -> bool {
		true
	}

	/// Check if user has permission to change instances
	async fn has_change_permission(&self, _user: &AdminUser) -> bool {
		true
	}

	/// Check if user has permission to delete instances
	async fn has_delete_permission(&self, _user: &AdminUser) -> bool {
		true
	}

	/// Resolve sign-in credentials to a user id
	///
	/// Only called on the admin registered for the configured user model.
	/// The default looks the user up by `settings.username_field`, verifies
	/// the argon2 hash stored in `settings.password_field` and rejects rows
	/// whose `is_superuser` or `is_active` column is false.
	async fn authenticate(
		&self,
		db: &AdminDatabase,
		settings: &AdminSettings,
		username: &str,
		password: &str,
	) -> AdminResult<Option<i64>> {
		let schema = self.schema();
		for column in [&settings.username_field, &settings.password_field] {
			if !schema.has_column(column) {
				return Err(AdminError::Configuration(format!(
					"{} model has no '{}' column",
					schema.name, column
				)));
			}
		}

		let filter = Filter::new(
			&settings.username_field,
			FilterOperator::Eq,
			FilterValue::String(username.to_string()),
		);
		let Some(record) = db.find_one(schema, &[filter], &[]).await? else {
			return Ok(None);
		};

		let Some(hash) = record.get(&settings.password_field).and_then(Value::as_str) else {
			return Ok(None);
		};
		if !verify_password(password, hash) {
			return Ok(None);
		}

		for flag in ["is_superuser", "is_active"] {
			if record.get(flag).is_some_and(|v| !is_truthy(v)) {
				return Ok(None);
			}
		}

		Ok(record.get(&schema.pk).and_then(Value::as_i64))
	}
}

fn is_truthy(value: &Value) -> bool {
	match value {
		Value::Bool(b) => *b,
		Value::Number(n) => n.as_i64().is_some_and(|n| n != 0),
		Value::Null => false,
		_ => true,
	}
}

/// Configuration-based model admin implementation
///
/// # Examples
///
/// ```
/// use reinhardt_panel::models::{FieldKind, ModelSchema};
/// use reinhardt_panel::{ModelAdmin, ModelAdminConfig};
///
/// let schema = ModelSchema::new("Event", "events").field("name", FieldKind::Text);
/// let admin = ModelAdminConfig::builder(schema)
///     .list_display(vec!["id", "name"])
///     .search_fields(vec!["name"])
///     .ordering(vec!["-id"])
///     .build();
///
/// assert_eq!(admin.model_name(), "Event");
/// assert_eq!(admin.ordering(), vec!["-id"]);
/// ```
#[derive(Debug, Clone)]
pub struct ModelAdminConfig {
	schema: ModelSchema,
	list_display: Vec<String>,
	list_filter: Vec<String>,
	search_fields: Vec<String>,
	ordering: Vec<String>,
	list_per_page: u64,
	exclude: Vec<String>,
}

impl ModelAdminConfig {
	/// Admin with default options for `schema`
	pub fn new(schema: ModelSchema) -> Self {
		Self {
			list_display: vec![schema.pk.clone()],
			schema,
			list_filter: vec![],
			search_fields: vec![],
			ordering: vec![],
			list_per_page: DEFAULT_LIST_PER_PAGE,
			exclude: vec![],
		}
	}

	pub fn builder(schema: ModelSchema) -> ModelAdminConfigBuilder {
		ModelAdminConfigBuilder {
			config: Self::new(schema),
		}
	}
}

#[async_trait]
impl ModelAdmin for ModelAdminConfig {
	fn schema(&self) -> &ModelSchema {
		&self.schema
	}

	fn list_display(&self) -> Vec<&str> {
		self.list_display.iter().map(String::as_str).collect()
	}

	fn list_filter(&self) -> Vec<&str> {
		self.list_filter.iter().map(String::as_str).collect()
	}

	fn search_fields(&self) -> Vec<&str> {
		self.search_fields.iter().map(String::as_str).collect()
	}

	fn ordering(&self) -> Vec<&str> {
		self.ordering.iter().map(String::as_str).collect()
	}

	fn list_per_page(&self) -> u64 {
		self.list_per_page
	}

	fn exclude(&self) -> Vec<&str> {
		self.exclude.iter().map(String::as_str).collect()
	}
}

/// Builder for [`ModelAdminConfig`]
#[derive(Debug, Clone)]
pub struct ModelAdminConfigBuilder {
	config: ModelAdminConfig,
}

fn owned(items: Vec<&str>) -> Vec<String> {
	items.into_iter().map(str::to_string).collect()
}

impl ModelAdminConfigBuilder {
	pub fn list_display(mut self, fields: Vec<&str>) -> Self {
		self.config.list_display = owned(fields);
		self
	}

	pub fn list_filter(mut self, fields: Vec<&str>) -> Self {
		self.config.list_filter = owned(fields);
		self
	}

	pub fn search_fields(mut self, fields: Vec<&str>) -> Self {
		self.config.search_fields = owned(fields);
		self
	}

	pub fn ordering(mut self, fields: Vec<&str>) -> Self {
		self.config.ordering = owned(fields);
		self
	}

	pub fn list_per_page(mut self, per_page: u64) -> Self {
		self.config.list_per_page = per_page;
		self
	}

	pub fn exclude(mut self, fields: Vec<&str>) -> Self {
		self.config.exclude = owned(fields);
		self
	}

	pub fn build(self) -> ModelAdminConfig {
		self.config
	}
}
