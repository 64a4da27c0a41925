//! Admin site registry

use crate::error::{AdminError, AdminResult};
use crate::model_admin::ModelAdmin;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of model admins keyed by model name
///
/// # Examples
///
/// ```
/// use reinhardt_panel::models::{FieldKind, ModelSchema};
/// use reinhardt_panel::{AdminSite, ModelAdminConfig};
///
/// let site = AdminSite::new("Tournaments");
/// let schema = ModelSchema::new("Event", "events").field("name", FieldKind::Text);
/// site.register(ModelAdminConfig::new(schema)).unwrap();
///
/// assert_eq!(site.registered_models(), vec!["Event".to_string()]);
/// assert!(site.get_model_admin("Event").is_ok());
/// ```
pub struct AdminSite {
	name: String,
	registry: RwLock<HashMap<String, Arc<dyn ModelAdmin>>>,
}

impl AdminSite {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			registry: RwLock::new(HashMap::new()),
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Register a model admin
	///
	/// Fails when an admin for the same model name is already registered.
	pub fn register<A>(&self, admin: A) -> AdminResult<()>
	where
		A: ModelAdmin + 'static,
	{
		self.register_arc(Arc::new(admin))
	}

	pub fn register_arc(&self, admin: Arc<dyn ModelAdmin>) -> AdminResult<()> {
		let model_name = admin.model_name().to_string();
		let mut registry = self.registry.write();
		if registry.contains_key(&model_name) {
			return Err(AdminError::AlreadyRegistered(model_name));
		}
		tracing::debug!(model = %model_name, "registered model admin");
		registry.insert(model_name, admin);
		Ok(())
	}

	/// Remove a model admin, returning whether it was registered
	pub fn unregister(&self, model_name: &str) -> bool {
		self.registry.write().remove(model_name).is_some()
	}

	pub fn get_model_admin(&self, model_name: &str) -> AdminResult<Arc<dyn ModelAdmin>> {
		self.registry
			.read()
			.get(model_name)
			.cloned()
			.ok_or_else(|| AdminError::ModelNotRegistered(model_name.to_string()))
	}

	pub fn is_registered(&self, model_name: &str) -> bool {
		self.registry.read().contains_key(model_name)
	}

	/// Registered model names, sorted
	pub fn registered_models(&self) -> Vec<String> {
		let mut names: Vec<String> = self.registry.read().keys().cloned().collect();
		names.sort();
		names
	}
}
