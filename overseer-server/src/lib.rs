//! Axum front-end: route tree, action dispatch, and HTTP status projection
//! (§4.C10).
//!
//! Every handler's job ends at submitting the whole controller action as a
//! job on the scheduler and awaiting its result through a one-shot channel
//! — nothing here ever holds a controller or process lock across an
//! `.await` on the request-handling task itself.

mod admission;
mod error;
mod handlers;
mod middleware;
mod status;

use std::future::Future;
use std::sync::Arc;

use axum::middleware as axum_middleware;
use axum::routing::{get, post};
use axum::Router;
use overseer_controller::Controller;
use overseer_scheduler::SchedulerHandle;
use tower_http::cors::CorsLayer;

pub use admission::AdmissionGate;
pub use status::{ActionId, StatusTable};

#[derive(Clone)]
pub struct AppState {
    controller: Arc<Controller>,
    admission: Arc<AdmissionGate>,
}

/// Run `fut` as a single job on `scheduler`, and await its result through a
/// one-shot channel, so the calling task never blocks on controller
/// internals directly (§4.C6, §4.C10).
async fn run_on_scheduler<T, Fut>(scheduler: &SchedulerHandle, fut: Fut) -> T
where
    Fut: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let (tx, rx) = tokio::sync::oneshot::channel();
    scheduler.submit(async move {
        let _ = tx.send(fut.await);
    });
    rx.await.expect("scheduler job dropped without sending a result")
}

/// Build the full route tree rooted at `/api/controller`, plus an uncounted
/// `/healthz` liveness endpoint, gated by admission control and gzip
/// response encoding.
pub fn build_router(controller: Arc<Controller>, admission_cap: usize) -> Router {
    let state = AppState {
        controller,
        admission: AdmissionGate::new(admission_cap),
    };

    let api = Router::new()
        .route("/api/controller", get(handlers::controller_info))
        .route(
            "/api/controller/presets",
            get(handlers::list_presets).post(handlers::apply_preset_group),
        )
        .route("/api/controller/presets/{group}", get(handlers::get_preset_group))
        .route("/api/controller/processes", get(handlers::list_processes))
        .route("/api/controller/processes/{process}", get(handlers::process_info))
        .route(
            "/api/controller/processes/{process}/action",
            post(handlers::process_action),
        )
        .route("/api/controller/processes/{process}/log", get(handlers::process_log))
        .route(
            "/api/controller/processes/{process}/configs",
            get(handlers::process_configs),
        )
        .route(
            "/api/controller/processes/{process}/configs/{config}",
            get(handlers::process_config),
        )
        .route(
            "/api/controller/processes/{process}/configs/{config}/options/{option}",
            get(handlers::get_process_option)
                .put(handlers::set_process_option)
                .delete(handlers::remove_process_option),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::admission_gate,
        ));

    Router::new()
        .merge(api)
        .route("/healthz", get(handlers::healthz))
        .layer(axum_middleware::from_fn(middleware::gzip_response))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve the router until a shutdown signal arrives, then return
/// once in-flight requests drain.
pub async fn serve(host: &str, port: u16, router: Router) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    tracing::info!(%host, port, "overseer-server listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

/// Wait for Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for Ctrl-C");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to listen for SIGTERM")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received, draining in-flight requests");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use overseer_presets::Presets;
    use std::collections::HashMap;
    use tower::ServiceExt;

    fn build_state_router() -> Router {
        let processes = HashMap::new();
        let presets = Presets::new();
        let scheduler = SchedulerHandle::start(1, 2);
        let controller = Controller::new(processes, presets, scheduler);
        build_router(controller, 64)
    }

    fn build_state_router_with_cap(cap: usize) -> Router {
        let processes = HashMap::new();
        let presets = Presets::new();
        let scheduler = SchedulerHandle::start(1, 2);
        let controller = Controller::new(processes, presets, scheduler);
        build_router(controller, cap)
    }

    fn build_echo_router() -> (Router, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let yaml = format!(
            r#"
serviceconfig:
  controller:
    processes:
      process:
        - name: echo
          executable: /bin/echo
          root: {root}
          data: {root}
          args: []
          options:
            scheme:
              - name: cmdline
                option:
                  - name: arg
                    default: hi
                    required: true
    presets:
      preset:
        - name: loud
          process:
            - name: echo
              scheme:
                - name: cmdline
                  option:
                    - name: arg
                      value: ["bye"]
"#,
            root = dir.path().display()
        );
        let config = overseer_config::OverseerConfig::from_yaml_str(&yaml).unwrap();
        let scheduler = SchedulerHandle::start(1, 2);
        let controller = Controller::from_config(&config, scheduler).unwrap();
        (build_router(controller, 64), dir)
    }

    #[tokio::test]
    async fn healthz_is_not_gated_and_returns_ok() {
        let app = build_state_router();
        let response = app
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_process_returns_404() {
        let app = build_state_router();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/controller/processes/ghost")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn controller_info_reports_pid() {
        let app = build_state_router();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/controller")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn get_set_remove_process_option_round_trip() {
        let (app, _dir) = build_echo_router();

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/controller/processes/echo/configs/cmdline/options/arg")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/api/controller/processes/echo/configs/cmdline/options/arg")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"value": "there"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/api/controller/processes/echo/configs/cmdline/options/arg")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"value": "there", "array_value": ["bye"]}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/controller/processes/echo/configs/cmdline/options/arg")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn process_action_start_then_stop() {
        let (app, _dir) = build_echo_router();

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/controller/processes/echo/action")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"action": "start"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/controller/processes/echo/action")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"action": "bogus"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/controller/processes/echo/action")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"action": "stop"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn apply_preset_group_then_unknown_group_is_not_found() {
        let (app, _dir) = build_echo_router();

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/controller/presets")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"name": "loud"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/controller/presets/ghost")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn accept_encoding_gzip_compresses_the_response() {
        let app = build_state_router();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/healthz")
                    .header(header::ACCEPT_ENCODING, "gzip")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_ENCODING).unwrap(),
            "gzip"
        );
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(!body.is_empty());
    }

    #[tokio::test]
    async fn admission_gate_rejects_once_capacity_is_exhausted() {
        let app = build_state_router_with_cap(0);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/controller")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
