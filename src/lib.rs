//! # reinhardt-panel
//!
//! JSON admin API over registered database models.
//!
//! Applications describe their tables with [`models::ModelSchema`], register a
//! [`ModelAdmin`] per model on an [`AdminSite`], and mount an [`AdminApp`]:
//!
//! - `POST /api/sign-in`, `POST /api/sign-out`, `GET /api/me`
//! - `GET /api/configuration`
//! - `GET /api/list/{Model}` returning `{"total": .., "results": [..]}`
//! - `GET /api/retrieve/{Model}/{id}`
//! - `DELETE /api/delete/{Model}/{id}`
//!
//! List payloads contain scalar and foreign-key (`<name>_id`) columns with
//! ISO-8601 timestamps. Many-to-many relations only appear in detail views.
//!
//! ## Example
//!
//! ```no_run
//! use reinhardt_panel::models::{FieldKind, ModelSchema};
//! use reinhardt_panel::{AdminApp, AdminDatabase, AdminServer, AdminSettings, AdminSite, ModelAdminConfig};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! reinhardt_panel::logging::init_logging();
//! let settings = AdminSettings::from_env()?;
//! let db = AdminDatabase::connect(&settings.database_url).await?;
//!
//! let site = AdminSite::new(settings.site_name.clone());
//! site.register(
//!     ModelAdminConfig::builder(
//!         ModelSchema::new("Event", "events")
//!             .field("name", FieldKind::Text)
//!             .foreign_key("tournament", "Tournament"),
//!     )
//!     .search_fields(vec!["name"])
//!     .build(),
//! )?;
//!
//! let app = AdminApp::new(Arc::new(site), Arc::new(db), settings);
//! AdminServer::new(app).listen("127.0.0.1:8000".parse()?).await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod database;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod model_admin;
pub mod models;
pub mod query;
pub mod router;
pub mod serialize;
pub mod server;
pub mod settings;
pub mod site;
pub mod types;

pub use auth::AdminUser;
pub use database::AdminDatabase;
pub use error::{AdminError, AdminResult};
pub use model_admin::{ModelAdmin, ModelAdminConfig};
pub use router::AdminApp;
pub use server::AdminServer;
pub use settings::{AdminSettings, SettingsError};
pub use site::AdminSite;
