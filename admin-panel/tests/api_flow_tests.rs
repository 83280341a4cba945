use admin_panel::record::render_cell_in;
use admin_panel::{
    AdminController, AdminHttpClient, AdminPanel, FieldRules, FileSessionStore, SessionHandle, SessionStore,
    TokenSource,
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn controller_for(server: &MockServer, session: Arc<SessionHandle>) -> AdminController {
    let logged_in = session.is_authenticated();
    let client = AdminHttpClient::new(&server.uri(), session, Duration::from_secs(5)).unwrap();
    AdminController::new(client, AdminPanel::new(FieldRules::default(), logged_in))
}

fn logged_in_session() -> Arc<SessionHandle> {
    let session = Arc::new(SessionHandle::in_memory());
    session.store_token("tok".to_string());
    session
}

async fn mount_rows(server: &MockServer, table: &str, rows: serde_json::Value, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/{}", table)))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": rows })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn login_stores_token_and_discovers_tables() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({"email": "ops@example.com", "password": "secret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"token": "tok"}})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/allroutes"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": ["/auth", "/app", "/widget"]})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileSessionStore::new(dir.path().join("session.json")));
    let session = Arc::new(SessionHandle::open(store.clone()).unwrap());
    let mut controller = controller_for(&server, session.clone()).await;

    assert!(controller.login("ops@example.com", "secret").await);
    assert!(controller.panel.logged_in);
    assert_eq!(controller.panel.tables, vec!["widget"]);
    assert_eq!(session.bearer_token().as_deref(), Some("tok"));
    let persisted = store.load().unwrap();
    assert_eq!(persisted.token.as_deref(), Some("tok"));
    assert_eq!(persisted.server_url, Some(server.uri()));
}

#[tokio::test]
async fn invalid_login_leaves_token_unset() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    let session = Arc::new(SessionHandle::in_memory());
    session.set_server_url("http://previous:5000");
    let mut controller = controller_for(&server, session.clone()).await;

    assert!(!controller.login("ops@example.com", "wrong").await);
    assert!(!controller.panel.logged_in);
    assert!(session.bearer_token().is_none());
    assert_eq!(session.server_url().as_deref(), Some("http://previous:5000"));
    assert_eq!(
        controller.panel.login_error.as_deref(),
        Some("Invalid username or password")
    );
}

#[tokio::test]
async fn login_failure_shows_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Account locked"})))
        .mount(&server)
        .await;

    let mut controller = controller_for(&server, Arc::new(SessionHandle::in_memory())).await;

    assert!(!controller.login("ops@example.com", "pw").await);
    assert_eq!(controller.panel.login_error.as_deref(), Some("Account locked"));
}

#[tokio::test]
async fn listing_derives_columns_and_formats_dates() {
    let server = MockServer::start().await;
    mount_rows(
        &server,
        "widget",
        json!([{"id": 1, "name": "a", "created_on": "2024-01-01T00:00:00Z"}]),
        1,
    )
    .await;

    let mut controller = controller_for(&server, logged_in_session()).await;
    assert!(controller.select_table("widget").await);

    let panel = &controller.panel;
    assert_eq!(panel.columns(), vec!["id", "name", "created_on"]);
    let row = &panel.rows[0];
    let cell = render_cell_in("created_on", &row["created_on"], &Utc);
    assert_ne!(cell, "2024-01-01T00:00:00Z");
    assert_eq!(cell, "1/1/2024, 12:00:00 AM");
    assert_eq!(render_cell_in("name", &row["name"], &Utc), "\"a\"");
}

#[tokio::test]
async fn empty_table_has_no_columns() {
    let server = MockServer::start().await;
    mount_rows(&server, "widget", json!([]), 1).await;

    let mut controller = controller_for(&server, logged_in_session()).await;
    assert!(controller.select_table("widget").await);
    assert!(controller.panel.rows.is_empty());
    assert!(controller.panel.columns().is_empty());
}

#[tokio::test]
async fn edit_sends_flattened_foreign_key() {
    let server = MockServer::start().await;
    mount_rows(
        &server,
        "widget",
        json!([{"id": 1, "name": "a", "category": {"id": 5, "name": "x"}}]),
        2,
    )
    .await;
    Mock::given(method("PUT"))
        .and(path("/widget/1"))
        .and(header("authorization", "Bearer tok"))
        .and(body_json(json!({"id": 1, "name": "a", "category_id": 5})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
        .expect(1)
        .mount(&server)
        .await;

    let mut controller = controller_for(&server, logged_in_session()).await;
    controller.select_table("widget").await;
    let row = controller.panel.rows[0].clone();
    controller.panel.open_edit("widget", &row);

    assert!(controller.submit_dialog().await);
    assert!(!controller.panel.dialog.is_open());
    assert_eq!(
        controller.panel.last_notification().unwrap().message,
        "Record updated successfully"
    );
}

#[tokio::test]
async fn add_splits_comma_separated_text() {
    let server = MockServer::start().await;
    mount_rows(&server, "widget", json!([{"id": 1, "name": "a", "tags": ["x"]}]), 2).await;
    Mock::given(method("POST"))
        .and(path("/widget"))
        .and(body_json(json!({"name": "b", "tags": ["a", "b", "c"]})))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let mut controller = controller_for(&server, logged_in_session()).await;
    controller.select_table("widget").await;
    controller.panel.open_add();
    assert_eq!(controller.panel.dialog.fields(), ["name", "tags"]);
    controller.panel.set_field("name", "b");
    controller.panel.set_field("tags", "a,b,c");

    assert!(controller.submit_dialog().await);
}

#[tokio::test]
async fn confirmed_delete_issues_one_call_and_refetches() {
    let server = MockServer::start().await;
    mount_rows(&server, "widget", json!([{"id": 7, "name": "a"}]), 2).await;
    Mock::given(method("DELETE"))
        .and(path("/widget/7"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let mut controller = controller_for(&server, logged_in_session()).await;
    controller.select_table("widget").await;
    let row = controller.panel.rows[0].clone();
    controller.panel.open_delete("widget", &row);

    assert!(controller.confirm_delete().await);
    assert!(!controller.panel.dialog.is_open());
    // Not a delete dialog any more: nothing is sent.
    assert!(!controller.confirm_delete().await);
}

#[tokio::test]
async fn delete_encodes_id_as_one_path_segment() {
    let server = MockServer::start().await;
    mount_rows(&server, "widget", json!([{"id": "9#x", "name": "a"}, {"id": 9, "name": "b"}]), 2).await;
    Mock::given(method("DELETE"))
        .and(path("/widget/9%23x"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/widget/9"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let mut controller = controller_for(&server, logged_in_session()).await;
    controller.select_table("widget").await;
    let row = controller.panel.rows[0].clone();
    controller.panel.open_delete("widget", &row);

    assert!(controller.confirm_delete().await);
}

#[tokio::test]
async fn ids_with_reserved_characters_stay_in_the_path() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/widget/7%3Fx"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/widget/a%2Fb"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = AdminHttpClient::new(&server.uri(), logged_in_session(), Duration::from_secs(5)).unwrap();
    client.delete("widget", "7?x").await.unwrap();
    client.update("widget", "a/b", &admin_panel::Record::new()).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.url.query().is_none()));
}

#[tokio::test]
async fn failed_write_keeps_dialog_open() {
    let server = MockServer::start().await;
    mount_rows(&server, "widget", json!([{"id": 1, "name": "a"}]), 1).await;
    Mock::given(method("PUT"))
        .and(path("/widget/1"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({"message": "name is taken"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut controller = controller_for(&server, logged_in_session()).await;
    controller.select_table("widget").await;
    let row = controller.panel.rows[0].clone();
    controller.panel.open_edit("widget", &row);

    assert!(!controller.submit_dialog().await);
    assert!(controller.panel.dialog.is_open());
    let messages: Vec<String> = controller
        .panel
        .drain_notifications()
        .into_iter()
        .map(|n| n.message)
        .collect();
    assert_eq!(messages, vec!["name is taken", "Failed to edit record"]);
}

#[tokio::test]
async fn run_all_survives_partial_failure() {
    let server = MockServer::start().await;
    mount_rows(&server, "alpha", json!([{"id": 1}, {"id": 2}]), 1).await;
    Mock::given(method("GET"))
        .and(path("/beta"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let mut controller = controller_for(&server, logged_in_session()).await;
    controller.panel.tables = vec!["alpha".to_string(), "beta".to_string()];

    assert!(!controller.run_all().await);
    let panel = &controller.panel;
    assert_eq!(panel.rows_for("alpha").unwrap().len(), 2);
    assert!(panel.rows_for("beta").unwrap().is_empty());
    assert_eq!(panel.success_count, 1);
    assert_eq!(panel.total_count, 2);
    assert_eq!(
        panel.last_notification().unwrap().message,
        "Successfully loaded 1 of 2 tables"
    );
}

#[tokio::test]
async fn unauthorized_clears_token_and_logs_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/widget"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let session = logged_in_session();
    let mut controller = controller_for(&server, session.clone()).await;

    assert!(!controller.select_table("widget").await);
    assert!(!controller.panel.logged_in);
    assert!(session.bearer_token().is_none());
    let first = controller.panel.drain_notifications().remove(0);
    assert_eq!(first.message, "Session expired. Please log in again.");
}

#[tokio::test]
async fn logout_clears_stored_token() {
    let server = MockServer::start().await;
    let session = logged_in_session();
    session.set_server_url(server.uri());
    let mut controller = controller_for(&server, session.clone()).await;

    controller.logout();
    assert!(!controller.panel.logged_in);
    assert!(session.bearer_token().is_none());
    assert_eq!(session.server_url(), Some(server.uri()));
}
