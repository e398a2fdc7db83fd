use std::process::{Command, Output};
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use serde_json::{Value, json};

const BIN: &str = env!("CARGO_BIN_EXE_kafka-reporting");

fn run(args: &[&str], env: &[(&str, &str)]) -> Output {
    Command::new(BIN)
        .args(args)
        .env_clear()
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .envs(env.iter().copied())
        .output()
        .unwrap()
}

async fn run_async(args: &'static [&'static str], env: Vec<(&'static str, String)>) -> Output {
    tokio::task::spawn_blocking(move || {
        Command::new(BIN)
            .args(args)
            .env_clear()
            .current_dir(env!("CARGO_MANIFEST_DIR"))
            .envs(env)
            .output()
            .unwrap()
    })
    .await
    .unwrap()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn archive_reports_every_missing_variable() {
    let output = run(
        &["archive", "--topic", "usage", "--partition", "0", "swift", "--container", "c"],
        &[("REPORTING_SERVER", "reporting.example.org")],
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(
        stderr(&output).contains(
            "Error: missing environment variables: REPORTING_USERNAME REPORTING_TOKEN \
             OS_AUTH_URL OS_USERNAME OS_PASSWORD OS_TENANT_NAME"
        ),
        "{}",
        stderr(&output)
    );
    assert!(output.stdout.is_empty());
}

#[test]
fn gcs_needs_service_account() {
    let output = run(
        &["archive", "--topic", "usage", "--partition", "0", "gcs", "--bucket", "b"],
        &[
            ("REPORTING_SERVER", "h"),
            ("REPORTING_USERNAME", "u"),
            ("REPORTING_TOKEN", "t"),
        ],
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("missing environment variables: GOOGLE_SERVICE_ACCOUNT"));
}

#[test]
fn broken_config_file_is_fatal() {
    let dir = std::env::temp_dir().join(format!("kafka-reporting-cli-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("broken.toml");
    std::fs::write(&path, "[retry\nmax_attempts = 1").unwrap();

    let output = run(&["--config", path.to_str().unwrap(), "status"], &[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Error: config (parse)"), "{}", stderr(&output));
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn explicit_missing_config_is_fatal() {
    let output = run(&["--config", "/nonexistent/kafka-reporting.toml", "status"], &[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Error: config (read)"), "{}", stderr(&output));

    let output = run(
        &["status"],
        &[("KAFKA_REPORTING_CONFIG", "/nonexistent/kafka-reporting.toml")],
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Error: config (read)"), "{}", stderr(&output));
}

// ── против fake API ──

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn reporting_env(server: &str) -> Vec<(&'static str, String)> {
    vec![
        ("REPORTING_SERVER", server.to_string()),
        ("REPORTING_USERNAME", "u".to_string()),
        ("REPORTING_TOKEN", "t".to_string()),
    ]
}

#[tokio::test(flavor = "multi_thread")]
async fn get_prints_records() {
    let app = Router::new().route(
        "/v1/topic/usage/0/-1",
        get(|| async {
            axum::Json(json!({"messages": [{"message": {"n": 1}, "next_offset": 8}]}))
        }),
    );
    let server = spawn(app).await;

    let output = run_async(
        &["get", "--topic", "usage", "--partition", "0", "--offset", "-1"],
        reporting_env(&server),
    )
    .await;

    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), r#"[{"n":1}]"#);
}

#[tokio::test(flavor = "multi_thread")]
async fn hello_world_posts_envelope() {
    let seen: Arc<Mutex<Vec<Value>>> = Arc::default();
    let app = Router::new()
        .route(
            "/v1/topic/greetings",
            post(|State(seen): State<Arc<Mutex<Vec<Value>>>>, body: Bytes| async move {
                let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
                seen.lock().unwrap().push(body);
                StatusCode::NO_CONTENT
            }),
        )
        .with_state(seen.clone());
    let server = spawn(app).await;

    let output = run_async(&["hello-world", "--topic", "greetings"], reporting_env(&server)).await;

    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let envelope = &seen[0][0];
    assert_eq!(envelope["schema"], json!("hello-world"));
    assert_eq!(envelope["version"], json!(1));
    assert_eq!(envelope["data"]["hello"], json!("world"));
    assert_eq!(envelope["data"]["answer"], json!(42));
}
