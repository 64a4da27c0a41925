//! List endpoint integration tests
//!
//! Drives `GET /api/list/{Model}` through the full router: session check,
//! model lookup, search, filters, sorting, pagination and serialization.

mod common;

use chrono::Duration;
use common::{Event, TestApp, event_app, event_schema, test_app};
use http::StatusCode;
use reinhardt_panel::ModelAdminConfig;
use reinhardt_panel::serialize::isoformat;
use rstest::rstest;
use serde_json::json;

#[rstest]
#[tokio::test]
async fn test_list_registered_model(#[future] event_app: (TestApp, Event)) {
	let (app, event) = event_app.await;
	app.register_event_admin();

	let mut client = app.client();
	client.sign_in_admin().await;
	let response = client.get("/api/list/Event").await;

	assert_eq!(response.status, StatusCode::OK);
	let data = response.json();
	assert_eq!(data["total"], json!(1));
	let item = &data["results"][0];
	assert_eq!(item["id"], json!(event.id));
	assert_eq!(item["name"], json!(event.name));
	assert_eq!(item["tournament_id"], json!(event.tournament_id));
	assert_eq!(item["created_at"], json!(isoformat(&event.created_at)));
	assert_eq!(item["updated_at"], json!(isoformat(&event.updated_at)));
	assert!(item.get("participants").is_none());
}

#[rstest]
#[tokio::test]
async fn test_list_timestamps_are_isoformat(#[future] event_app: (TestApp, Event)) {
	let (app, _event) = event_app.await;
	app.register_event_admin();

	let mut client = app.client();
	client.sign_in_admin().await;
	let data = client.get("/api/list/Event").await.json();

	let item = &data["results"][0];
	assert_eq!(item["created_at"], json!("2024-03-05T14:30:15.123456+00:00"));
	assert_eq!(item["updated_at"], json!("2024-03-05T20:30:15.123456+00:00"));
}

#[rstest]
#[tokio::test]
async fn test_list_never_contains_many_to_many(#[future] event_app: (TestApp, Event)) {
	let (app, event) = event_app.await;
	app.register_event_admin();
	let second = app
		.insert_event(
			"Semi final",
			event.tournament_id,
			&event.participant_ids,
			common::base_timestamp() - Duration::days(1),
		)
		.await;

	let mut client = app.client();
	client.sign_in_admin().await;
	let data = client.get("/api/list/Event").await.json();

	assert_eq!(data["total"], json!(2));
	let results = data["results"].as_array().unwrap();
	assert_eq!(results.len(), 2);
	for item in results {
		let keys: Vec<&str> = item
			.as_object()
			.unwrap()
			.keys()
			.map(String::as_str)
			.collect();
		assert!(!keys.contains(&"participants"));
		assert!(!keys.contains(&"tournament"));
	}
	assert_eq!(results[1]["id"], json!(second.id));
}

#[rstest]
#[tokio::test]
async fn test_list_requires_sign_in(#[future] event_app: (TestApp, Event)) {
	let (app, _event) = event_app.await;
	app.register_event_admin();

	let mut client = app.client();
	let response = client.get("/api/list/Event").await;

	assert_eq!(response.status, StatusCode::UNAUTHORIZED);
	assert_eq!(response.json(), json!({"detail": "Unauthorized"}));
}

#[rstest]
#[tokio::test]
async fn test_list_unregistered_model(#[future] event_app: (TestApp, Event)) {
	let (app, _event) = event_app.await;

	let mut client = app.client();
	client.sign_in_admin().await;
	let response = client.get("/api/list/Event").await;

	assert_eq!(response.status, StatusCode::NOT_FOUND);
	assert_eq!(
		response.json(),
		json!({"detail": "Event model is not registered"})
	);
}

#[rstest]
#[tokio::test]
async fn test_list_excluded_fields_are_hidden(#[future] test_app: TestApp) {
	let app = test_app.await;

	let mut client = app.client();
	client.sign_in_admin().await;
	let data = client.get("/api/list/User").await.json();

	assert_eq!(data["total"], json!(1));
	let item = &data["results"][0];
	assert_eq!(item["id"], json!(app.user_id));
	assert_eq!(item["username"], json!(common::ADMIN_USERNAME));
	assert_eq!(item["is_superuser"], json!(true));
	assert!(item.get("password").is_none());
}

/// Six events across two tournaments, created one day apart
async fn seed_events(app: &TestApp) -> Vec<Event> {
	let spring = app.insert_tournament("Spring Open").await;
	let autumn = app.insert_tournament("Autumn Cup").await;
	let mut events = Vec::new();
	for (i, (name, tournament)) in [
		("Qualifier A", spring),
		("Qualifier B", spring),
		("Quarter final", spring),
		("Semi final", autumn),
		("Final", autumn),
		("Exhibition", autumn),
	]
	.into_iter()
	.enumerate()
	{
		let created_at = common::base_timestamp() + Duration::days(i as i64);
		events.push(app.insert_event(name, tournament, &[], created_at).await);
	}
	events
}

fn names(data: &serde_json::Value) -> Vec<String> {
	data["results"]
		.as_array()
		.unwrap()
		.iter()
		.map(|item| item["name"].as_str().unwrap().to_string())
		.collect()
}

#[rstest]
#[tokio::test]
async fn test_list_offset_and_limit(#[future] test_app: TestApp) {
	let app = test_app.await;
	app.register_event_admin();
	seed_events(&app).await;

	let mut client = app.client();
	client.sign_in_admin().await;
	let data = client.get("/api/list/Event?offset=2&limit=3").await.json();

	assert_eq!(data["total"], json!(6));
	assert_eq!(
		names(&data),
		vec!["Quarter final", "Semi final", "Final"]
	);
}

#[rstest]
#[tokio::test]
async fn test_list_default_page_size(#[future] test_app: TestApp) {
	let app = test_app.await;
	app.site()
		.register(
			ModelAdminConfig::builder(event_schema())
				.list_per_page(4)
				.build(),
		)
		.unwrap();
	seed_events(&app).await;

	let mut client = app.client();
	client.sign_in_admin().await;
	let data = client.get("/api/list/Event").await.json();

	assert_eq!(data["total"], json!(6));
	assert_eq!(data["results"].as_array().unwrap().len(), 4);
}

#[rstest]
#[tokio::test]
async fn test_list_search_across_search_fields(#[future] test_app: TestApp) {
	let app = test_app.await;
	app.site()
		.register(
			ModelAdminConfig::builder(event_schema())
				.search_fields(vec!["name"])
				.build(),
		)
		.unwrap();
	seed_events(&app).await;

	let mut client = app.client();
	client.sign_in_admin().await;
	let data = client.get("/api/list/Event?search=FINAL").await.json();

	assert_eq!(data["total"], json!(3));
	assert_eq!(names(&data), vec!["Quarter final", "Semi final", "Final"]);
}

#[rstest]
#[tokio::test]
async fn test_list_search_field_without_column(#[future] event_app: (TestApp, Event)) {
	let (app, _event) = event_app.await;
	app.site()
		.register(
			ModelAdminConfig::builder(event_schema())
				.search_fields(vec!["name", "participants"])
				.build(),
		)
		.unwrap();

	let mut client = app.client();
	client.sign_in_admin().await;
	let response = client.get("/api/list/Event?search=Final").await;

	assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(
		response.json(),
		json!({"detail": "Configuration error: Event search field 'participants' is not a column"})
	);
}

#[rstest]
#[tokio::test]
async fn test_list_filters_and_sorting(#[future] test_app: TestApp) {
	let app = test_app.await;
	app.register_event_admin();
	let events = seed_events(&app).await;
	let autumn = events[3].tournament_id;

	let mut client = app.client();
	client.sign_in_admin().await;
	let data = client
		.get(&format!(
			"/api/list/Event?tournament_id={}&sort_by=-name",
			autumn
		))
		.await
		.json();
	assert_eq!(data["total"], json!(3));
	assert_eq!(names(&data), vec!["Semi final", "Final", "Exhibition"]);

	let data = client
		.get("/api/list/Event?name__startswith=Qual&id__gt=1")
		.await
		.json();
	assert_eq!(data["total"], json!(1));
	assert_eq!(names(&data), vec!["Qualifier B"]);
}

#[rstest]
#[tokio::test]
async fn test_list_default_ordering(#[future] test_app: TestApp) {
	let app = test_app.await;
	app.site()
		.register(
			ModelAdminConfig::builder(event_schema())
				.ordering(vec!["-created_at"])
				.build(),
		)
		.unwrap();
	seed_events(&app).await;

	let mut client = app.client();
	client.sign_in_admin().await;
	let data = client.get("/api/list/Event?limit=2").await.json();

	assert_eq!(names(&data), vec!["Exhibition", "Final"]);
}

#[rstest]
#[case("/api/list/Event?participants=1")]
#[case("/api/list/Event?tournament=1")]
#[case("/api/list/Event?tournament_id=abc")]
#[case("/api/list/Event?sort_by=participants")]
#[case("/api/list/Event?limit=-5")]
#[case("/api/list/Event?offset=18446744073709551615")]
#[tokio::test]
async fn test_list_rejects_bad_parameters(#[future] test_app: TestApp, #[case] uri: &str) {
	let app = test_app.await;
	app.register_event_admin();

	let mut client = app.client();
	client.sign_in_admin().await;
	let response = client.get(uri).await;

	assert_eq!(response.status, StatusCode::BAD_REQUEST);
	assert!(response.json()["detail"].is_string());
}
