//! Supervisor lifecycle tests against a loopback test double.
//!
//! The double plays the enhancement server's HTTP role (health + upscale
//! endpoints) while the supervised child is an inert `sleep`, so lifecycle
//! behavior is observable without real model loading.

use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use vermeer_upscale::{
    CommandSpec, Supervisor, SupervisorState, UpscaleConfig, UpscaleErrorKind,
};

/// Tracks how many requests are inside the upscale handler at once.
#[derive(Default)]
struct Concurrency {
    current: AtomicUsize,
    max_seen: AtomicUsize,
}

impl Concurrency {
    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_seen.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Serve a test double on an ephemeral loopback port.
async fn spawn_double(healthy: bool, concurrency: Arc<Concurrency>) -> u16 {
    let status = if healthy { "healthy" } else { "starting" };
    let app = Router::new()
        .route(
            "/health",
            get(move || async move { Json(serde_json::json!({ "status": status })) }),
        )
        .route(
            "/upscale",
            post(move |_body: Json<serde_json::Value>| {
                let concurrency = concurrency.clone();
                async move {
                    concurrency.enter();
                    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                    concurrency.exit();
                    Json(serde_json::json!({
                        "success": true,
                        "message": "Image upscaled successfully",
                        "image_base64": "aGVsbG8=",
                        "width": 1920,
                        "height": 1080,
                    }))
                }
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    port
}

fn config_on(port: u16, start: CommandSpec) -> UpscaleConfig {
    let mut config = UpscaleConfig::new("127.0.0.1", port, start);
    config.poll_interval_ms = 50;
    config.health_timeout_secs = 2;
    config.stop_grace_secs = 1;
    config
}

fn sleeper() -> CommandSpec {
    CommandSpec::new("sleep", &["300"])
}

#[tokio::test]
async fn start_reaches_running_once_probe_succeeds() {
    let port = spawn_double(true, Arc::default()).await;
    let supervisor = Supervisor::new(config_on(port, sleeper()));

    supervisor.start().await.unwrap();
    assert_eq!(supervisor.state(), SupervisorState::Running);
    assert!(supervisor.is_healthy().await);

    supervisor.stop().await;
    assert_eq!(supervisor.state(), SupervisorState::Stopped);
}

#[tokio::test]
async fn never_healthy_probe_times_out_without_false_success() {
    // The double answers, but always "starting"; the child stays alive.
    let port = spawn_double(false, Arc::default()).await;
    let supervisor = Supervisor::new(config_on(port, sleeper()));

    let err = supervisor.start().await.unwrap_err();
    assert!(
        matches!(err.kind, UpscaleErrorKind::HealthTimeout(_)),
        "expected HealthTimeout, got {}",
        err
    );
    assert_eq!(supervisor.state(), SupervisorState::Failed);
}

#[tokio::test]
async fn child_exit_during_polling_is_a_crash_not_a_timeout() {
    // Nothing listens on the port and the child exits immediately.
    let port = spawn_double(false, Arc::default()).await;
    let mut config = config_on(port, CommandSpec::new("true", &[]));
    config.port = 1; // unreachable; the probe can never succeed
    let supervisor = Supervisor::new(config);

    let err = supervisor.start().await.unwrap_err();
    assert!(
        matches!(err.kind, UpscaleErrorKind::Crashed(_)),
        "expected Crashed, got {}",
        err
    );
    assert_eq!(supervisor.state(), SupervisorState::Failed);
}

#[tokio::test]
async fn spawn_failure_is_reported_immediately() {
    let supervisor = Supervisor::new(config_on(
        1,
        CommandSpec::new("definitely-not-a-real-binary", &[]),
    ));

    let err = supervisor.start().await.unwrap_err();
    assert!(matches!(err.kind, UpscaleErrorKind::StartFailed(_)));
}

#[tokio::test]
async fn upscale_requires_a_running_server() {
    let supervisor = Supervisor::new(config_on(1, sleeper()));
    let err = supervisor.upscale(&[1, 2, 3], None).await.unwrap_err();
    assert!(matches!(err.kind, UpscaleErrorKind::NotRunning(_)));
}

#[tokio::test]
async fn concurrent_upscales_never_overlap_at_the_server() {
    let concurrency = Arc::new(Concurrency::default());
    let port = spawn_double(true, concurrency.clone()).await;
    let supervisor = Arc::new(Supervisor::new(config_on(port, sleeper())));

    supervisor.start().await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..4 {
        let supervisor = supervisor.clone();
        handles.push(tokio::spawn(async move {
            supervisor.upscale(&[0u8; 32], Some(1080)).await
        }));
    }
    for handle in handles {
        let outcome = handle.await.unwrap().unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.image.as_deref(), Some(&b"hello"[..]));
        assert_eq!(outcome.width, Some(1920));
    }

    assert_eq!(
        concurrency.max_seen.load(Ordering::SeqCst),
        1,
        "requests overlapped at the test double"
    );

    supervisor.stop().await;
}

#[tokio::test]
async fn ensure_running_skips_lifecycle_when_already_healthy() {
    let port = spawn_double(true, Arc::default()).await;
    // Install command would fail if it ever ran.
    let config = config_on(port, sleeper())
        .with_install_command(CommandSpec::new("false", &[]));
    let supervisor = Supervisor::new(config);
    assert_eq!(supervisor.state(), SupervisorState::Uninstalled);

    supervisor.ensure_running(true).await.unwrap();
    assert_eq!(supervisor.state(), SupervisorState::Running);
}

#[tokio::test]
async fn failed_install_halts_the_transition() {
    let port = spawn_double(false, Arc::default()).await;
    let config = config_on(port, sleeper())
        .with_install_command(CommandSpec::new("false", &[]));
    let supervisor = Supervisor::new(config);

    let err = supervisor.ensure_running(false).await.unwrap_err();
    assert!(matches!(err.kind, UpscaleErrorKind::InstallFailed(_)));
    assert_eq!(supervisor.state(), SupervisorState::Uninstalled);
}

#[tokio::test]
async fn stop_without_a_server_is_a_quiet_noop() {
    let supervisor = Supervisor::new(config_on(1, sleeper()));
    supervisor.stop().await;
    assert_eq!(supervisor.state(), SupervisorState::Stopped);
}
