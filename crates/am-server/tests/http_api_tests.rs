use actix_web::{test, web, App};
use am_core::EventBus;
use am_health::HealthMonitor;
use am_layers::ShellHookLayer;
use am_logger::LlmLoggerRegistry;
use am_server::{AppState, Cli};
use clap::Parser;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

async fn test_state() -> (TempDir, AppState) {
    let dir = TempDir::new().unwrap();
    let am_dir = dir.path().join("am");
    tokio::fs::create_dir_all(&am_dir).await.unwrap();

    let cli = Cli::parse_from(["am-server", "--am-dir", am_dir.to_str().unwrap()]);
    let bus = EventBus::new();
    let health_monitor = Arc::new(HealthMonitor::with_t_degrade(std::time::Duration::from_secs(30)));
    let shell_hook = Arc::new(ShellHookLayer::new(bus.clone()));
    let logger_registry = Arc::new(LlmLoggerRegistry::new(am_dir.clone(), bus.clone(), false));
    let sessions_blob_path = dir.path().join("sessions.json");

    let state = AppState::new(
        cli,
        am_dir,
        true,
        bus,
        logger_registry,
        health_monitor,
        shell_hook,
        sessions_blob_path,
        json!({ "tabs": [], "activeTabId": null }),
        CancellationToken::new(),
    );

    (dir, state)
}

#[actix_web::test]
async fn health_endpoint_reports_system_status() {
    let (_dir, state) = test_state().await;
    let data = web::Data::new(state);

    let app = test::init_service(
        App::new().app_data(data.clone()).configure(am_server::configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/am/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(body.get("status").is_some());
    assert!(body.get("layers").is_some());
}

#[actix_web::test]
async fn conversations_for_unknown_tab_return_empty_list_not_404() {
    let (_dir, state) = test_state().await;
    let data = web::Data::new(state);

    let app = test::init_service(
        App::new().app_data(data.clone()).configure(am_server::configure),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/am/llm/conversations/no-such-tab")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["count"], 0);
    assert!(body["conversations"].as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn log_then_enable_round_trips_through_the_same_session_logger() {
    let (_dir, state) = test_state().await;
    let data = web::Data::new(state);

    let app = test::init_service(
        App::new().app_data(data.clone()).configure(am_server::configure),
    )
    .await;

    let log_req = test::TestRequest::post()
        .uri("/api/am/log")
        .set_json(&json!({
            "tabId": "tab-1",
            "tabName": "main",
            "workspace": "/tmp/project",
            "entryType": "user_input",
            "content": "echo hi",
        }))
        .to_request();
    let resp = test::call_service(&app, log_req).await;
    assert!(resp.status().is_success());

    let enable_req = test::TestRequest::post()
        .uri("/api/am/enable")
        .set_json(&json!({
            "tabId": "tab-1",
            "tabName": "main",
            "workspace": "/tmp/project",
            "enabled": false,
        }))
        .to_request();
    let resp = test::call_service(&app, enable_req).await;
    assert!(resp.status().is_success());

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["enabled"], false);
}

#[actix_web::test]
async fn install_hooks_returns_a_preview_snippet_without_touching_disk() {
    let (_dir, state) = test_state().await;
    let data = web::Data::new(state);

    let app = test::init_service(
        App::new().app_data(data.clone()).configure(am_server::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/am/install-hooks")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert!(body["content"].as_str().unwrap().len() > 0);
}

#[actix_web::test]
async fn apply_hooks_rejects_an_unknown_shell() {
    let (_dir, state) = test_state().await;
    let data = web::Data::new(state);

    let app = test::init_service(
        App::new().app_data(data.clone()).configure(am_server::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/am/apply-hooks")
        .set_json(&json!({ "shell": "fish", "preview": true }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn sessions_blob_round_trips_and_persists_to_disk() {
    let (dir, state) = test_state().await;
    let blob_path = state.sessions_blob_path.clone();
    let data = web::Data::new(state);

    let app = test::init_service(
        App::new().app_data(data.clone()).configure(am_server::configure),
    )
    .await;

    let post_req = test::TestRequest::post()
        .uri("/api/sessions")
        .set_json(&json!({ "tabs": ["a", "b"], "activeTabId": "a" }))
        .to_request();
    let resp = test::call_service(&app, post_req).await;
    assert!(resp.status().is_success());

    let get_req = test::TestRequest::get().uri("/api/sessions").to_request();
    let resp = test::call_service(&app, get_req).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["activeTabId"], "a");

    assert!(blob_path.exists());
    let _ = dir;
}

#[actix_web::test]
async fn recoverable_sessions_list_is_empty_for_a_fresh_am_dir() {
    let (_dir, state) = test_state().await;
    let data = web::Data::new(state);

    let app = test::init_service(
        App::new().app_data(data.clone()).configure(am_server::configure),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/am/sessions/recoverable")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(body["sessions"].as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn validate_endpoint_succeeds_on_an_empty_am_dir() {
    let (_dir, state) = test_state().await;
    let data = web::Data::new(state);

    let app = test::init_service(
        App::new().app_data(data.clone()).configure(am_server::configure),
    )
    .await;

    let req = test::TestRequest::post().uri("/api/am/validate").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
}

#[actix_web::test]
async fn validate_run_folds_into_health_metrics() {
    let (dir, state) = test_state().await;
    tokio::fs::write(
        state.am_dir.join("llm-conv-tab1-abc.json"),
        r#"{"turns":[{"content":"a perfectly normal reply here"}]}"#,
    )
    .await
    .unwrap();
    tokio::fs::write(state.am_dir.join("llm-conv-tab1-def.json"), "{not json")
        .await
        .unwrap();

    let data = web::Data::new(state);
    let app = test::init_service(
        App::new().app_data(data.clone()).configure(am_server::configure),
    )
    .await;

    let req = test::TestRequest::post().uri("/api/am/validate").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
    let report: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(report["valid"], 1);
    assert_eq!(report["corrupted"], 1);

    let health_req = test::TestRequest::get().uri("/api/am/health").to_request();
    let resp = test::call_service(&app, health_req).await;
    let health: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(health["metrics"]["validFiles"], 1);
    assert_eq!(health["metrics"]["validationErrors"], 1);
    assert_eq!(health["metrics"]["conversationsValidated"], 1);

    let _ = dir;
}

#[actix_web::test]
async fn hook_ping_accepts_an_arbitrary_body() {
    let (_dir, state) = test_state().await;
    let data = web::Data::new(state);

    let app = test::init_service(
        App::new().app_data(data.clone()).configure(am_server::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/am/hook")
        .set_payload("whatever the hook script sends")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
}
