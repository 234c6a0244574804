//! End-to-end tests of the HTTP surface against the in-memory store.

use std::io::Write;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use hit_counter::api::{create_router, AppState, RouterOptions};
use hit_counter::config::{Config, ResponseKind, SettingsKind};
use hit_counter::counter::CounterMode;
use hit_counter::store::MemoryConnector;

fn app(config: &Config, connector: &MemoryConnector) -> Router {
    create_router(
        AppState::from_config(config, connector.clone()),
        RouterOptions::default(),
    )
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Option<usize>, String) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let length = response
        .headers()
        .get(header::CONTENT_LENGTH)
        .map(|v| v.to_str().unwrap().parse().unwrap());
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, length, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn each_request_increments_by_exactly_one() {
    let connector = MemoryConnector::new();
    let app = app(&Config::default(), &connector);

    for expected in 1..=5 {
        let (status, length, body) = get(&app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            format!("Hello World, this website has been visited {} times", expected)
        );
        assert_eq!(length, Some(body.len()));
    }

    assert_eq!(connector.connections(), 5);
}

#[tokio::test]
async fn check_then_set_mode_reports_two_on_first_visit() {
    let config = Config {
        counter_mode: CounterMode::CheckThenSet,
        ..Config::default()
    };
    let connector = MemoryConnector::new();
    let app = app(&config, &connector);

    let (_, _, body) = get(&app, "/").await;
    assert!(body.ends_with("visited 2 times"));
    let (_, _, body) = get(&app, "/").await;
    assert!(body.ends_with("visited 3 times"));
}

#[tokio::test]
async fn custom_counter_key_is_used() {
    let config = Config {
        counter_key: "visits".to_string(),
        ..Config::default()
    };
    let connector = MemoryConnector::new();
    let app = app(&config, &connector);

    get(&app, "/").await;
    assert_eq!(connector.value("visits").as_deref(), Some("1"));
    assert_eq!(connector.value("hit_count"), None);
}

#[tokio::test]
async fn json_file_settings_are_read_per_request() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"redis_host": "cache-a", "redis_password": "one"}}"#).unwrap();
    file.flush().unwrap();

    let config = Config {
        settings_source: SettingsKind::JsonFile,
        store_config_file: file.path().to_path_buf(),
        ..Config::default()
    };
    let connector = MemoryConnector::new();
    let app = app(&config, &connector);

    get(&app, "/").await;
    assert_eq!(connector.last_settings().unwrap().host, "cache-a");

    std::fs::write(file.path(), r#"{"redis_host": "cache-b", "redis_password": "two"}"#).unwrap();
    get(&app, "/").await;
    let settings = connector.last_settings().unwrap();
    assert_eq!(settings.host, "cache-b");
    assert_eq!(settings.password.as_deref(), Some("two"));
}

#[tokio::test]
async fn missing_settings_file_is_a_server_error() {
    let config = Config {
        settings_source: SettingsKind::JsonFile,
        store_config_file: "/nonexistent/config.json".into(),
        ..Config::default()
    };
    let connector = MemoryConnector::new();
    let app = app(&config, &connector);

    let (status, _, _) = get(&app, "/").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(connector.connections(), 0);
}

#[tokio::test]
async fn corrupt_counter_is_a_server_error() {
    let connector = MemoryConnector::new();
    connector.insert("hit_count", "not-a-number");
    let app = app(&Config::default(), &connector);

    let (status, _, body) = get(&app, "/").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Internal Server Error");
}

#[tokio::test]
async fn message_file_is_served_verbatim() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "Greetings from group_vars\nsecond line\n").unwrap();
    file.flush().unwrap();

    let config = Config {
        response_mode: ResponseKind::MessageFile,
        message_file: file.path().to_path_buf(),
        ..Config::default()
    };
    let connector = MemoryConnector::new();
    let app = app(&config, &connector);

    let (status, length, body) = get(&app, "/any/path").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Greetings from group_vars\nsecond line\n");
    assert_eq!(length, Some(body.len()));
    assert_eq!(connector.connections(), 0);
}

#[tokio::test]
async fn missing_message_file_is_a_server_error() {
    let config = Config {
        response_mode: ResponseKind::MessageFile,
        message_file: "/nonexistent/custom_message.txt".into(),
        ..Config::default()
    };
    let app = app(&config, &MemoryConnector::new());

    let (status, _, _) = get(&app, "/").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
