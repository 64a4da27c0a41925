//! HTTP handlers for the admin API
//!
//! Each handler takes the shared [`AdminContext`] plus the request and
//! returns a JSON response. Errors bubble up as [`AdminError`] and are
//! rendered by the router.

use crate::auth::{
	AdminUser, clear_session_cookie, cookie_value, decode_session, encode_session, session_cookie,
};
use crate::database::AdminDatabase;
use crate::error::{AdminError, AdminResult};
use crate::model_admin::ModelAdmin;
use crate::query::{Filter, FilterCondition, FilterOperator, FilterValue, parse_lookup};
use crate::settings::AdminSettings;
use crate::site::AdminSite;
use crate::types::{
	ConfigurationResponse, DeleteResponse, ListQueryParams, ListResponse, ModelConfiguration,
	SignInRequest,
};
use bytes::Bytes;
use http::header::{CONTENT_TYPE, SET_COOKIE};
use http::{HeaderMap, Request, Response, StatusCode};
use http_body_util::Full;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Upper bound for `limit` on list requests
pub const MAX_PAGE_SIZE: u64 = 1000;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AdminContext {
	pub site: Arc<AdminSite>,
	pub db: Arc<AdminDatabase>,
	pub settings: Arc<AdminSettings>,
}

/// Serialize `body` into a JSON response
pub fn json_response<T: Serialize>(
	status: StatusCode,
	body: &T,
) -> AdminResult<Response<Full<Bytes>>> {
	let bytes = serde_json::to_vec(body)
		.map_err(|e| AdminError::Configuration(format!("Failed to serialize response: {}", e)))?;
	Response::builder()
		.status(status)
		.header(CONTENT_TYPE, "application/json")
		.body(Full::new(Bytes::from(bytes)))
		.map_err(|e| AdminError::Configuration(e.to_string()))
}

fn with_cookie(
	mut response: Response<Full<Bytes>>,
	cookie: &str,
) -> AdminResult<Response<Full<Bytes>>> {
	let value = cookie
		.parse()
		.map_err(|_| AdminError::Configuration("Invalid session cookie value".to_string()))?;
	response.headers_mut().insert(SET_COOKIE, value);
	Ok(response)
}

fn user_admin(ctx: &AdminContext) -> AdminResult<Arc<dyn ModelAdmin>> {
	ctx.site
		.get_model_admin(&ctx.settings.user_model)
		.map_err(|_| {
			AdminError::Configuration(format!(
				"User model '{}' is not registered",
				ctx.settings.user_model
			))
		})
}

/// Resolve the session cookie to the signed-in user
pub async fn current_user(ctx: &AdminContext, headers: &HeaderMap) -> AdminResult<AdminUser> {
	let unauthorized = || AdminError::Unauthorized("Unauthorized".to_string());

	let token = cookie_value(headers, &ctx.settings.session_id_key).ok_or_else(unauthorized)?;
	let user_id = decode_session(&ctx.settings, token)?;

	let admin = user_admin(ctx)?;
	let record = ctx
		.db
		.get(admin.schema(), user_id, &[ctx.settings.password_field.as_str()])
		.await?
		.ok_or_else(unauthorized)?;

	let username = match record.get(&ctx.settings.username_field) {
		Some(Value::String(s)) => s.clone(),
		Some(other) => other.to_string(),
		None => String::new(),
	};
	Ok(AdminUser {
		id: user_id,
		username,
	})
}

/// `POST /api/sign-in`
pub async fn sign_in(ctx: &AdminContext, req: Request<Bytes>) -> AdminResult<Response<Full<Bytes>>> {
	let payload: SignInRequest = serde_json::from_slice(req.body())
		.map_err(|e| AdminError::BadRequest(format!("Invalid sign-in payload: {}", e)))?;

	let admin = user_admin(ctx)?;
	let user_id = admin
		.authenticate(&ctx.db, &ctx.settings, &payload.username, &payload.password)
		.await?
		.ok_or_else(|| {
			tracing::info!(username = %payload.username, "admin sign-in rejected");
			AdminError::Unauthorized("Invalid credentials".to_string())
		})?;

	let token = encode_session(&ctx.settings, user_id)?;
	tracing::info!(user_id, "admin signed in");

	let response = json_response(StatusCode::OK, &serde_json::json!({}))?;
	with_cookie(response, &session_cookie(&ctx.settings, &token))
}

/// `POST /api/sign-out`
pub async fn sign_out(ctx: &AdminContext, _req: Request<Bytes>) -> AdminResult<Response<Full<Bytes>>> {
	let response = json_response(StatusCode::OK, &serde_json::json!({}))?;
	with_cookie(response, &clear_session_cookie(&ctx.settings))
}

/// `GET /api/me`
pub async fn me(ctx: &AdminContext, req: Request<Bytes>) -> AdminResult<Response<Full<Bytes>>> {
	let user = current_user(ctx, req.headers()).await?;
	json_response(StatusCode::OK, &user)
}

/// Validate a sort expression against the model's columns
fn resolve_sort<'a>(admin: &'a dyn ModelAdmin, requested: Option<&'a str>) -> AdminResult<Option<&'a str>> {
	let Some(sort_by) = requested.or_else(|| admin.ordering().first().copied()) else {
		return Ok(None);
	};
	let column = sort_by.strip_prefix('-').unwrap_or(sort_by);
	if !admin.schema().has_column(column) {
		return Err(AdminError::BadRequest(format!(
			"Unknown sort field '{}'",
			column
		)));
	}
	Ok(Some(sort_by))
}

/// `GET /api/list/{model}`
///
/// Returns `{total, results}`. Records carry scalar and foreign-key columns;
/// many-to-many relations are never part of list payloads.
pub async fn list(
	ctx: &AdminContext,
	req: Request<Bytes>,
	model_name: &str,
) -> AdminResult<Response<Full<Bytes>>> {
	let user = current_user(ctx, req.headers()).await?;

	let model_admin = ctx.site.get_model_admin(model_name)?;
	if !model_admin.has_view_permission(&user).await {
		return Err(AdminError::PermissionDenied("Permission denied".to_string()));
	}
	let schema = model_admin.schema();

	let params = ListQueryParams::from_query(req.uri().query().unwrap_or(""))?;

	// Search: OR across search fields
	if let Some(field) = model_admin
		.search_fields()
		.into_iter()
		.find(|field| !schema.has_column(field))
	{
		return Err(AdminError::Configuration(format!(
			"{} search field '{}' is not a column",
			model_name, field
		)));
	}
	let search_condition = match params.search.as_ref() {
		Some(search) if !model_admin.search_fields().is_empty() => {
			Some(FilterCondition::or_filters(
				model_admin
					.search_fields()
					.iter()
					.map(|field| {
						Filter::new(
							*field,
							FilterOperator::Contains,
							FilterValue::String(search.clone()),
						)
					})
					.collect(),
			))
		}
		_ => None,
	};

	// Filters: AND across query-string lookups
	let filters = params
		.filters
		.iter()
		.map(|(key, value)| parse_lookup(schema, key, value))
		.collect::<AdminResult<Vec<_>>>()?;

	let sort_by = resolve_sort(model_admin.as_ref(), params.sort_by.as_deref())?;
	let offset = params.offset.unwrap_or(0);
	let limit = params
		.limit
		.unwrap_or_else(|| model_admin.list_per_page())
		.min(MAX_PAGE_SIZE);
	let exclude = model_admin.exclude();

	let results = ctx
		.db
		.list(
			schema,
			search_condition.as_ref(),
			&filters,
			sort_by,
			offset,
			limit,
			&exclude,
		)
		.await?;
	let total = ctx
		.db
		.count(schema, search_condition.as_ref(), &filters)
		.await?;

	tracing::debug!(
		model = model_name,
		total,
		returned = results.len(),
		"admin list"
	);
	json_response(StatusCode::OK, &ListResponse { total, results })
}

fn parse_pk(model_name: &str, raw: &str) -> AdminResult<i64> {
	raw.parse::<i64>()
		.map_err(|_| AdminError::NotFound(format!("{} {} not found", model_name, raw)))
}

/// `GET /api/retrieve/{model}/{id}`
///
/// Detail records also carry each many-to-many relation as a list of ids.
pub async fn retrieve(
	ctx: &AdminContext,
	req: Request<Bytes>,
	model_name: &str,
	raw_pk: &str,
) -> AdminResult<Response<Full<Bytes>>> {
	let user = current_user(ctx, req.headers()).await?;

	let model_admin = ctx.site.get_model_admin(model_name)?;
	if !model_admin.has_view_permission(&user).await {
		return Err(AdminError::PermissionDenied("Permission denied".to_string()));
	}
	let schema = model_admin.schema();
	let pk = parse_pk(model_name, raw_pk)?;
	let exclude = model_admin.exclude();

	let mut record = ctx
		.db
		.get(schema, pk, &exclude)
		.await?
		.ok_or_else(|| AdminError::NotFound(format!("{} {} not found", model_name, pk)))?;

	for (field, relation) in schema.many_to_many_fields() {
		if exclude.contains(&field) {
			continue;
		}
		let ids = ctx.db.many_to_many_ids(relation, pk).await?;
		record.insert(field.to_string(), Value::from(ids));
	}

	json_response(StatusCode::OK, &record)
}

/// `DELETE /api/delete/{model}/{id}`
pub async fn delete(
	ctx: &AdminContext,
	req: Request<Bytes>,
	model_name: &str,
	raw_pk: &str,
) -> AdminResult<Response<Full<Bytes>>> {
	let user = current_user(ctx, req.headers()).await?;

	let model_admin = ctx.site.get_model_admin(model_name)?;
	if !model_admin.has_delete_permission(&user).await {
		return Err(AdminError::PermissionDenied("Permission denied".to_string()));
	}
	let pk = parse_pk(model_name, raw_pk)?;

	let deleted = ctx.db.delete(model_admin.schema(), pk).await?;
	if deleted == 0 {
		return Err(AdminError::NotFound(format!(
			"{} {} not found",
			model_name, pk
		)));
	}

	tracing::info!(model = model_name, pk, user_id = user.id, "admin deleted record");
	json_response(StatusCode::OK, &DeleteResponse { id: pk })
}

async fn granted_permissions(admin: &dyn ModelAdmin, user: Option<&AdminUser>) -> Vec<String> {
	let Some(user) = user else {
		return vec![];
	};
	let mut granted = Vec::new();
	if admin.has_view_permission(user).await {
		granted.push("view".to_string());
	}
	if admin.has_add_permission(user).await {
		granted.push("add".to_string());
	}
	if admin.has_change_permission(user).await {
		granted.push("change".to_string());
	}
	if admin.has_delete_permission(user).await {
		granted.push("delete".to_string());
	}
	granted
}

fn owned(items: Vec<&str>) -> Vec<String> {
	items.into_iter().map(str::to_string).collect()
}

/// `GET /api/configuration`
///
/// Public; permissions are only listed for a signed-in user.
pub async fn configuration(
	ctx: &AdminContext,
	req: Request<Bytes>,
) -> AdminResult<Response<Full<Bytes>>> {
	let user = current_user(ctx, req.headers()).await.ok();

	let mut models = Vec::new();
	for name in ctx.site.registered_models() {
		let admin = ctx.site.get_model_admin(&name)?;
		models.push(ModelConfiguration {
			permissions: granted_permissions(admin.as_ref(), user.as_ref()).await,
			list_display: owned(admin.list_display()),
			list_filter: owned(admin.list_filter()),
			search_fields: owned(admin.search_fields()),
			ordering: owned(admin.ordering()),
			list_per_page: admin.list_per_page(),
			name,
		});
	}

	json_response(
		StatusCode::OK,
		&ConfigurationResponse {
			site_name: ctx.site.name().to_string(),
			username_field: ctx.settings.username_field.clone(),
			models,
		},
	)
}
