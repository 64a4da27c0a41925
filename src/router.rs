//! Route dispatch
//!
//! [`AdminApp`] maps method and path onto the handlers in
//! [`crate::handlers`] and renders errors as `{"detail": ...}` bodies.

use crate::database::AdminDatabase;
use crate::error::{AdminError, AdminResult};
use crate::handlers::{self, AdminContext, json_response};
use crate::settings::AdminSettings;
use crate::site::AdminSite;
use crate::types::ErrorResponse;
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{Method, Request, Response, StatusCode};
use http_body_util::Full;
use std::sync::Arc;

/// Resolved route
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
	SignIn,
	SignOut,
	Me,
	Configuration,
	List { model: String },
	Retrieve { model: String, pk: String },
	Delete { model: String, pk: String },
}

impl Route {
	fn allowed_method(&self) -> Method {
		match self {
			Route::SignIn | Route::SignOut => Method::POST,
			Route::Me | Route::Configuration | Route::List { .. } | Route::Retrieve { .. } => {
				Method::GET
			}
			Route::Delete { .. } => Method::DELETE,
		}
	}
}

/// Match a path (with the mount prefix removed) to a route
pub fn resolve(path: &str) -> Option<Route> {
	let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
	let route = match segments.as_slice() {
		["api", "sign-in"] => Route::SignIn,
		["api", "sign-out"] => Route::SignOut,
		["api", "me"] => Route::Me,
		["api", "configuration"] => Route::Configuration,
		["api", "list", model] => Route::List {
			model: model.to_string(),
		},
		["api", "retrieve", model, pk] => Route::Retrieve {
			model: model.to_string(),
			pk: pk.to_string(),
		},
		["api", "delete", model, pk] => Route::Delete {
			model: model.to_string(),
			pk: pk.to_string(),
		},
		_ => return None,
	};
	Some(route)
}

/// The admin application
///
/// Cheap to clone; all state is shared.
#[derive(Clone)]
pub struct AdminApp {
	ctx: AdminContext,
}

impl AdminApp {
	pub fn new(site: Arc<AdminSite>, db: Arc<AdminDatabase>, settings: AdminSettings) -> Self {
		Self {
			ctx: AdminContext {
				site,
				db,
				settings: Arc::new(settings),
			},
		}
	}

	pub fn site(&self) -> &Arc<AdminSite> {
		&self.ctx.site
	}

	pub fn db(&self) -> &Arc<AdminDatabase> {
		&self.ctx.db
	}

	pub fn settings(&self) -> &AdminSettings {
		&self.ctx.settings
	}

	/// Handle a request whose body has been fully read
	pub async fn handle(&self, req: Request<Bytes>) -> Response<Full<Bytes>> {
		let method = req.method().clone();
		let path = req.uri().path().to_string();

		match self.dispatch(req).await {
			Ok(response) => {
				tracing::debug!(%method, %path, status = response.status().as_u16(), "admin request");
				response
			}
			Err(err) => error_response(&method, &path, err),
		}
	}

	async fn dispatch(&self, req: Request<Bytes>) -> AdminResult<Response<Full<Bytes>>> {
		let prefix = self.ctx.settings.url_prefix.as_str();
		let path = req.uri().path();
		let relative = match path.strip_prefix(prefix) {
			Some(rest) if prefix.is_empty() || rest.is_empty() || rest.starts_with('/') => rest,
			_ => return Err(AdminError::NotFound("Not Found".to_string())),
		};

		let route =
			resolve(relative).ok_or_else(|| AdminError::NotFound("Not Found".to_string()))?;
		if req.method() != route.allowed_method() {
			return method_not_allowed();
		}

		let ctx = &self.ctx;
		match route {
			Route::SignIn => handlers::sign_in(ctx, req).await,
			Route::SignOut => handlers::sign_out(ctx, req).await,
			Route::Me => handlers::me(ctx, req).await,
			Route::Configuration => handlers::configuration(ctx, req).await,
			Route::List { model } => handlers::list(ctx, req, &model).await,
			Route::Retrieve { model, pk } => handlers::retrieve(ctx, req, &model, &pk).await,
			Route::Delete { model, pk } => handlers::delete(ctx, req, &model, &pk).await,
		}
	}
}

fn method_not_allowed() -> AdminResult<Response<Full<Bytes>>> {
	json_response(
		StatusCode::METHOD_NOT_ALLOWED,
		&ErrorResponse {
			detail: "Method Not Allowed".to_string(),
		},
	)
}

fn error_response(method: &Method, path: &str, err: AdminError) -> Response<Full<Bytes>> {
	let status = err.status();
	if status.is_server_error() {
		tracing::error!(%method, path, error = %err, "admin request failed");
	} else {
		tracing::debug!(%method, path, status = status.as_u16(), error = %err, "admin request rejected");
	}

	let body = ErrorResponse {
		detail: err.client_message(),
	};
	json_response(status, &body).unwrap_or_else(|_| {
		let mut response = Response::new(Full::new(Bytes::from_static(
			b"{\"detail\":\"Internal server error\"}",
		)));
		*response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
		response
			.headers_mut()
			.insert(CONTENT_TYPE, http::HeaderValue::from_static("application/json"));
		response
	})
}
