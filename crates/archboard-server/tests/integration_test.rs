//! End-to-end tests for the archboard HTTP API.
//!
//! Each test builds a fresh router over an in-memory SQLite database and
//! sends requests with `tower::ServiceExt::oneshot`, without starting a
//! network server. Auto-save uses a short delay so the debounce can be
//! observed in real time.

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use archboard_server::config::EditorConfig;
use archboard_server::router::build_router;
use archboard_server::state::AppState;

const AUTOSAVE: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

fn test_app() -> Router {
    let state = AppState::in_memory(EditorConfig {
        autosave_delay: AUTOSAVE,
        snapshot_interval: Duration::from_secs(300),
    })
    .expect("failed to create in-memory AppState");
    build_router(state)
}

async fn send(
    app: &Router,
    method: &str,
    path: &str,
    user: Option<&str>,
    body: Option<Body>,
) -> (StatusCode, Vec<u8>, Option<String>) {
    let mut request = Request::builder().method(method).uri(path);
    if let Some(user) = user {
        request = request.header("x-user-id", user);
    }
    if body.is_some() {
        request = request.header("content-type", "application/json");
    }
    let response = app
        .clone()
        .oneshot(request.body(body.unwrap_or_else(Body::empty)).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get("content-type")
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec(), content_type)
}

fn parse(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap_or(json!(null))
}

async fn get_json(app: &Router, path: &str) -> (StatusCode, Value) {
    let (status, bytes, _) = send(app, "GET", path, None, None).await;
    (status, parse(&bytes))
}

async fn post_json(app: &Router, path: &str, body: Value) -> (StatusCode, Value) {
    post_json_as(app, path, None, body).await
}

async fn post_json_as(
    app: &Router,
    path: &str,
    user: Option<&str>,
    body: Value,
) -> (StatusCode, Value) {
    let body = Body::from(serde_json::to_vec(&body).unwrap());
    let (status, bytes, _) = send(app, "POST", path, user, Some(body)).await;
    (status, parse(&bytes))
}

async fn delete_as(app: &Router, path: &str, user: Option<&str>) -> (StatusCode, Value) {
    let (status, bytes, _) = send(app, "DELETE", path, user, None).await;
    (status, parse(&bytes))
}

async fn command(app: &Router, diagram: &str, body: Value) -> Value {
    let (status, response) = post_json(app, diagram, body.clone()).await;
    assert_eq!(status, StatusCode::OK, "command {} failed: {:?}", body, response);
    response
}

async fn add_node(app: &Router, diagram: &str, kind: &str) -> String {
    let response = command(app, diagram, json!({ "op": "add_node", "kind": kind })).await;
    response["nodeId"].as_str().unwrap().to_string()
}

async fn connect(app: &Router, diagram: &str, source: &str, target: &str) -> String {
    let response = command(
        app,
        diagram,
        json!({ "op": "connect", "source": source, "target": target }),
    )
    .await;
    response["edgeId"].as_str().unwrap().to_string()
}

// ---------------------------------------------------------------------------
// Diagram lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn new_diagram_opens_empty_and_ready() {
    let app = test_app();
    let (status, view) = get_json(&app, "/projects/p1/diagrams/architecture").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["phase"], "ready");
    assert_eq!(view["type"], "architecture");
    assert_eq!(view["projectId"], "p1");
    assert_eq!(view["autosave"], true);
    assert_eq!(view["loadFailed"], false);
    assert_eq!(view["nodes"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn unknown_diagram_kind_is_rejected() {
    let app = test_app();
    let (status, body) = get_json(&app, "/projects/p1/diagrams/sequence").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn client_server_diagram_survives_reopen() {
    let app = test_app();
    let diagram = "/projects/p1/diagrams/architecture";
    let client = add_node(&app, diagram, "client").await;
    let server = add_node(&app, diagram, "server").await;
    let edge = connect(&app, diagram, &client, &server).await;

    command(
        &app,
        diagram,
        json!({ "op": "edit_node", "id": client, "patch": { "label": "Browser" } }),
    )
    .await;

    // Wait out the auto-save debounce, then drop the editor.
    tokio::time::sleep(AUTOSAVE * 5).await;
    let (status, _) = delete_as(&app, &format!("{}/session", diagram), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, view) = get_json(&app, diagram).await;
    let nodes = view["nodes"].as_array().unwrap();
    let edges = view["edges"].as_array().unwrap();
    assert_eq!(nodes.len(), 2);
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0]["id"], edge.as_str());
    assert_eq!(edges[0]["source"], client.as_str());
    assert_eq!(edges[0]["target"], server.as_str());
    assert_eq!(edges[0]["style"]["animated"], true);
    let browser = nodes.iter().find(|n| n["id"] == client.as_str()).unwrap();
    assert_eq!(browser["type"], "client");
    assert_eq!(browser["data"]["label"], "Browser");
    assert!(view["save"]["revision"].as_u64().unwrap() >= 1);
}

#[tokio::test]
async fn manual_save_skips_the_debounce() {
    let app = test_app();
    let diagram = "/projects/p2/diagrams/frontend";
    command(&app, diagram, json!({ "op": "set_autosave", "enabled": false })).await;
    add_node(&app, diagram, "page").await;

    let (status, body) = post_json(&app, &format!("{}/save", diagram), json!({})).await;
    assert_eq!(status, StatusCode::OK, "{:?}", body);
    assert_eq!(body["saved"], true);
    assert_eq!(body["outcome"]["outcome"], "saved");
    assert_eq!(body["outcome"]["revision"], 1);

    let (_, notices) = get_json(&app, "/notices?project=p2").await;
    let notices = notices.as_array().unwrap();
    assert_eq!(notices.last().unwrap()["level"], "success");
}

#[tokio::test]
async fn database_tables_are_seeded_and_edges_labelled() {
    let app = test_app();
    let diagram = "/projects/p1/diagrams/database";
    let users = add_node(&app, diagram, "table").await;
    let orders = add_node(&app, diagram, "table").await;
    connect(&app, diagram, &users, &orders).await;

    let (_, view) = get_json(&app, diagram).await;
    let table = &view["nodes"][0];
    assert_eq!(table["data"]["label"], "new_table");
    let fields = table["data"]["fields"].as_array().unwrap();
    assert_eq!(fields.len(), 3);
    assert_eq!(fields[0]["name"], "id");
    assert_eq!(fields[0]["isPK"], true);
    assert_eq!(view["edges"][0]["label"], "1:N");
}

#[tokio::test]
async fn delete_selection_removes_attached_edges() {
    let app = test_app();
    let diagram = "/projects/p1/diagrams/architecture";
    let a = add_node(&app, diagram, "api").await;
    let b = add_node(&app, diagram, "cache").await;
    let c = add_node(&app, diagram, "database").await;
    connect(&app, diagram, &a, &b).await;
    connect(&app, diagram, &b, &c).await;

    command(&app, diagram, json!({ "op": "select", "nodes": [b] })).await;
    let response = command(&app, diagram, json!({ "op": "delete_selection" })).await;
    assert_eq!(response["removed"]["nodes"], 1);
    assert_eq!(response["removed"]["edges"], 2);
    assert_eq!(response["view"]["nodes"].as_array().unwrap().len(), 2);
    assert_eq!(response["view"]["edges"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn editing_a_missing_node_is_not_found() {
    let app = test_app();
    let (status, body) = post_json(
        &app,
        "/projects/p1/diagrams/architecture",
        json!({ "op": "move_node", "id": "ghost", "position": { "x": 1.0, "y": 2.0 } }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn reset_clears_and_saves() {
    let app = test_app();
    let diagram = "/projects/p1/diagrams/architecture";
    add_node(&app, diagram, "api").await;
    let response = command(&app, diagram, json!({ "op": "reset" })).await;
    assert_eq!(response["save"]["outcome"], "saved");
    assert_eq!(response["view"]["nodes"].as_array().unwrap().len(), 0);
}

// ---------------------------------------------------------------------------
// Import / export
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_import_clears_the_diagram() {
    let app = test_app();
    let diagram = "/projects/p1/diagrams/architecture";
    add_node(&app, diagram, "api").await;

    let (status, view) = post_json(
        &app,
        &format!("{}/import", diagram),
        json!({ "nodes": [], "edges": [] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["nodes"].as_array().unwrap().len(), 0);
    assert_eq!(view["edges"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn import_without_edges_is_rejected_and_graph_kept() {
    let app = test_app();
    let diagram = "/projects/p1/diagrams/architecture";
    add_node(&app, diagram, "api").await;
    get_json(&app, "/notices?project=p1").await;

    let (status, body) = post_json(&app, &format!("{}/import", diagram), json!({ "nodes": [] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (_, view) = get_json(&app, diagram).await;
    assert_eq!(view["nodes"].as_array().unwrap().len(), 1);
    let (_, notices) = get_json(&app, "/notices?project=p1").await;
    assert_eq!(notices[0]["level"], "error");
}

#[tokio::test]
async fn export_then_import_restores_the_graph() {
    let app = test_app();
    let source = "/projects/p1/diagrams/architecture";
    let a = add_node(&app, source, "gateway").await;
    let b = add_node(&app, source, "worker").await;
    connect(&app, source, &a, &b).await;

    let (status, document) = get_json(&app, &format!("{}/export", source)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(document["version"], "1.0");
    assert_eq!(document["type"], "architecture");
    assert_eq!(document["projectId"], "p1");
    assert!(document["exportedAt"].is_string());

    let target = "/projects/p9/diagrams/architecture";
    let (status, view) = post_json(&app, &format!("{}/import", target), document.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["nodes"], document["nodes"]);
    assert_eq!(view["edges"], document["edges"]);
}

#[tokio::test]
async fn png_export_is_an_image() {
    let app = test_app();
    let diagram = "/projects/p1/diagrams/frontend";
    add_node(&app, diagram, "page").await;
    let (status, bytes, content_type) =
        send(&app, "GET", &format!("{}/export.png", diagram), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("image/png"));
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
}

// ---------------------------------------------------------------------------
// Version history
// ---------------------------------------------------------------------------

#[tokio::test]
async fn snapshot_restore_and_delete_versions() {
    let app = test_app();
    let diagram = "/projects/p1/diagrams/architecture";
    let history = format!("{}/history", diagram);

    let (_, empty) = post_json(&app, &history, json!({})).await;
    assert!(empty["created"].is_null());

    add_node(&app, diagram, "api").await;
    let (_, snap) = post_json(&app, &history, json!({})).await;
    let version = snap["created"]["id"].as_str().unwrap().to_string();
    assert_eq!(snap["created"]["nodeCount"], 1);

    add_node(&app, diagram, "queue").await;
    let response = command(&app, diagram, json!({ "op": "restore_version", "id": version })).await;
    assert_eq!(response["view"]["nodes"].as_array().unwrap().len(), 1);

    let (_, listed) = get_json(&app, &history).await;
    assert_eq!(listed["total"], 1);

    let (status, after) = delete_as(&app, &format!("{}/{}", history, version), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(after["total"], 0);
    let (status, _) = delete_as(&app, &format!("{}/{}", history, version), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

#[tokio::test]
async fn rest_baseline_template_round_trip() {
    let app = test_app();
    let diagram = "/projects/p1/diagrams/architecture";
    let client = add_node(&app, diagram, "client").await;
    let api = add_node(&app, diagram, "api").await;
    let db = add_node(&app, diagram, "database").await;
    connect(&app, diagram, &client, &api).await;
    connect(&app, diagram, &api, &db).await;

    let (status, saved) = post_json_as(
        &app,
        "/templates/architecture",
        Some("u1"),
        json!({ "projectId": "p1", "name": "REST baseline" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{:?}", saved);
    assert_eq!(saved["nodeCount"], 3);
    assert_eq!(saved["edgeCount"], 2);
    let template_id = saved["id"].as_str().unwrap().to_string();

    let (_, bytes, _) = send(&app, "GET", "/templates/architecture", Some("u1"), None).await;
    let listed = parse(&bytes);
    let names: Vec<&str> = listed["templates"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"REST baseline"));

    // Apply to a fresh diagram in another project.
    let other = "/projects/p2/diagrams/architecture";
    let (status, response) = post_json_as(
        &app,
        other,
        Some("u1"),
        json!({ "op": "apply_template", "id": template_id }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{:?}", response);
    assert_eq!(response["view"]["nodes"].as_array().unwrap().len(), 3);
    assert_eq!(response["view"]["edges"].as_array().unwrap().len(), 2);

    let (status, _) = delete_as(&app, &format!("/templates/id/{}", template_id), Some("u1")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = delete_as(&app, &format!("/templates/id/{}", template_id), Some("u1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn notices_reach_only_their_own_user_and_project() {
    let app = test_app();
    add_node(&app, "/projects/p1/diagrams/architecture", "api").await;
    let (status, _) = post_json_as(
        &app,
        "/templates/architecture",
        Some("alice"),
        json!({ "projectId": "p1", "name": "secret plan" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = post_json(&app, "/projects/p1/diagrams/architecture/save", json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let (_, bytes, _) = send(&app, "GET", "/notices?project=p2", Some("bob"), None).await;
    assert_eq!(parse(&bytes), json!([]));
    let (_, anonymous) = get_json(&app, "/notices").await;
    assert_eq!(anonymous, json!([]));

    let (_, bytes, _) = send(&app, "GET", "/notices", Some("alice"), None).await;
    let alice = parse(&bytes);
    let messages: Vec<&str> = alice
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["message"].as_str().unwrap())
        .collect();
    assert_eq!(messages, vec!["Template 'secret plan' saved"]);

    let (_, project) = get_json(&app, "/notices?project=p1").await;
    assert_eq!(project[0]["message"], "Diagram saved");
}

#[tokio::test]
async fn anonymous_callers_see_starters_but_cannot_save() {
    let app = test_app();
    let (status, listed) = get_json(&app, "/templates/database").await;
    assert_eq!(status, StatusCode::OK);
    let templates = listed["templates"].as_array().unwrap();
    assert!(templates.iter().all(|t| t["source"] == "starter"));
    assert_eq!(templates[0]["id"], "starter:users-orders");

    let (status, body) = post_json(
        &app,
        "/templates/database",
        json!({ "projectId": "p1", "name": "mine" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn starters_apply_to_matching_kind_only() {
    let app = test_app();
    let response = command(
        &app,
        "/projects/p1/diagrams/database",
        json!({ "op": "apply_template", "id": "starter:users-orders" }),
    )
    .await;
    assert!(!response["view"]["nodes"].as_array().unwrap().is_empty());

    let (status, _) = post_json(
        &app,
        "/projects/p1/diagrams/frontend",
        json!({ "op": "apply_template", "id": "starter:users-orders" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Environment configuration
// ---------------------------------------------------------------------------

#[tokio::test]
async fn env_variables_crud() {
    let app = test_app();
    let env = "/projects/p1/env";

    let (status, created) = post_json(
        &app,
        env,
        json!({ "id": "temp-1", "name": "API_URL", "development": "http://localhost:8080" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{:?}", created);
    let id = created["id"].as_str().unwrap().to_string();
    assert!(!id.starts_with("temp-"));
    assert_eq!(created["isSecret"], false);

    let (status, updated) = post_json(
        &app,
        env,
        json!({ "id": id, "name": "API_URL", "production": "https://api.example.com", "isSecret": true }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["id"], id.as_str());
    assert_eq!(updated["isSecret"], true);

    let (status, _) = post_json(&app, env, json!({ "name": "API_URL" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = post_json(&app, env, json!({ "name": "  " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, listed) = get_json(&app, env).await;
    assert_eq!(listed["variables"].as_array().unwrap().len(), 1);

    let (status, _) = delete_as(&app, &format!("{}/{}", env, id), None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, listed) = get_json(&app, env).await;
    assert!(listed["variables"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn palette_lists_styled_kinds() {
    let app = test_app();
    let (status, body) = get_json(&app, "/palette/database").await;
    assert_eq!(status, StatusCode::OK);
    let sections = body["sections"].as_array().unwrap();
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0]["family"], "database");
    let table = sections[0]["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|item| item["kind"] == "table")
        .unwrap();
    assert!(table["color"].as_str().unwrap().starts_with('#'));
}
