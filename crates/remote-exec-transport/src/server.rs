//! Axum server for the `/exec` endpoint.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use remote_exec_core::{ExecRequest, ExecutionOutcome, Executor};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::ServerConfig;

/// Body returned by the liveness probe.
pub const LIVENESS_MESSAGE: &str = "Remote-exec server is running.";

/// Server error.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        source: std::io::Error,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Handler state.
#[derive(Clone)]
struct ExecState {
    executor: Arc<dyn Executor>,
}

/// Create the protocol router.
///
/// # Example
/// ```ignore
/// let app = router(Arc::new(QuickJsExecutor::new()));
/// ```
#[must_use]
pub fn router(executor: Arc<dyn Executor>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/exec", post(exec_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(ExecState { executor })
}

/// Bind `config.addr` and serve until the process stops.
///
/// # Errors
/// Returns error if the address cannot be bound or serving fails.
pub async fn serve(config: &ServerConfig, executor: Arc<dyn Executor>) -> Result<(), ServeError> {
    let listener = TcpListener::bind(config.addr)
        .await
        .map_err(|source| ServeError::Bind {
            addr: config.addr,
            source,
        })?;
    serve_listener(listener, executor).await
}

/// Serve on an already bound listener.
///
/// # Errors
/// Returns error if serving fails.
pub async fn serve_listener(
    listener: TcpListener,
    executor: Arc<dyn Executor>,
) -> Result<(), ServeError> {
    tracing::info!("Starting remote-exec server on {}", listener.local_addr()?);
    axum::serve(listener, router(executor)).await?;
    Ok(())
}

async fn index_handler() -> &'static str {
    LIVENESS_MESSAGE
}

/// Decode, execute, and always answer with an `ExecutionOutcome`.
///
/// A body that is not a valid request is reported in the failure shape too.
async fn exec_handler(
    State(state): State<ExecState>,
    body: Bytes,
) -> (StatusCode, Json<ExecutionOutcome>) {
    let outcome = match serde_json::from_slice::<ExecRequest>(&body) {
        Ok(request) => {
            let (bundle, call) = request.into_parts();
            state.executor.execute(bundle, call).await
        }
        Err(e) => {
            tracing::error!("Execution error: invalid request: {e}");
            ExecutionOutcome::failure(
                format!("invalid request: {e}"),
                format!("InvalidRequest: {e}\n"),
                String::new(),
            )
        }
    };

    let status =
        StatusCode::from_u16(outcome.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(outcome))
}

#[cfg(test)]
mod tests {
    use std::{net::SocketAddr, time::Duration};

    use axum::{body::Body, http::Request};
    use remote_exec_client::{
        BufferConsole, Definition, DispatchError, Dispatcher, DispatcherConfig, HelperRegistry,
        HttpTransport, RemoteSwitch,
    };
    use remote_exec_executor::QuickJsExecutor;
    use serde_json::{Map, Value, json};
    use tower::ServiceExt;

    use super::*;

    fn app() -> Router {
        router(Arc::new(QuickJsExecutor::new()))
    }

    async fn post_exec(body: impl Into<Body>) -> (StatusCode, Value) {
        let request = Request::post("/exec")
            .header("content-type", "application/json")
            .body(body.into())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn spawn_server(app: Router) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn test_liveness_probe() {
        let request = Request::get("/").body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], LIVENESS_MESSAGE.as_bytes());
    }

    #[tokio::test]
    async fn test_exec_success() {
        let body = json!({
            "code": "function f() { console.log('hi'); return 1 + 1; }",
            "func_name": "f",
        });
        let (status, value) = post_exec(body.to_string()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(value, json!({ "status": "ok", "result": 2, "stdout": "hi\n" }));
    }

    #[tokio::test]
    async fn test_exec_failure_is_500() {
        let body = json!({
            "code": "function f(a) { console.log('start', a); throw new TypeError('bad'); }",
            "func_name": "f",
            "args": [7],
        });
        let (status, value) = post_exec(body.to_string()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(value["status"], "error");
        assert_eq!(value["error"], "bad");
        assert_eq!(value["stdout"], "start 7\n");
        assert!(value["traceback"].as_str().unwrap().starts_with("TypeError: bad"));
    }

    #[tokio::test]
    async fn test_missing_entry_is_500() {
        let body = json!({ "code": "function g() {}", "func_name": "f" });
        let (status, value) = post_exec(body.to_string()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(value["error"].as_str().unwrap().contains("'f'"));
    }

    #[tokio::test]
    async fn test_malformed_request_reported_as_failure() {
        let (status, value) = post_exec("{\"func_name\": \"f\"}").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(value["status"], "error");
        assert!(value["error"].as_str().unwrap().contains("code"));
        assert_eq!(value["stdout"], "");

        let (status, value) = post_exec("not json").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(value["status"], "error");
    }

    #[tokio::test]
    async fn test_end_to_end_over_http() {
        let addr = spawn_server(app()).await;

        let registry = HelperRegistry::new();
        registry.register(Definition::inline(
            "hello_world",
            "@remote_func\nfunction hello_world() {\n  console.log('Hello, world!');\n  return 42;\n}",
        ));

        let console = Arc::new(BufferConsole::new());
        let dispatcher: Dispatcher = Dispatcher::builder(
            Definition::inline(
                "test",
                "function test() {\n  console.log('Running remotely!');\n  return hello_world() + 81;\n}",
            ),
            |_: &[Value], _: &Map<String, Value>| Ok(json!(123)),
        )
        .helpers(&registry)
        .config(
            DispatcherConfig::default()
                .endpoint(format!("http://{addr}/exec"))
                .switch(RemoteSwitch::Fixed(true)),
        )
        .transport(Arc::new(HttpTransport::new()))
        .console(Arc::clone(&console) as _)
        .build()
        .unwrap();

        let result = dispatcher.call(vec![], Map::new()).await.unwrap();
        assert_eq!(result, json!(123));
        assert_eq!(
            console.contents(),
            "[REMOTE STDOUT]\nRunning remotely!\nHello, world!\n"
        );
    }

    #[tokio::test]
    async fn test_end_to_end_remote_failure() {
        let addr = spawn_server(app()).await;
        let dispatcher: Dispatcher = Dispatcher::builder(
            Definition::inline("f", "function f() { return 1n / 0n; }"),
            |_: &[Value], _: &Map<String, Value>| Ok(Value::Null),
        )
        .config(
            DispatcherConfig::default()
                .endpoint(format!("http://{addr}/exec"))
                .switch(RemoteSwitch::Fixed(true))
                .echo_traceback(false),
        )
        .console(Arc::new(BufferConsole::new()))
        .build()
        .unwrap();

        let err = dispatcher.call(vec![], Map::new()).await.unwrap_err();
        assert!(matches!(err, DispatchError::RemoteExecution { .. }));
    }

    #[tokio::test]
    async fn test_slow_server_times_out() {
        let slow = Router::new().route(
            "/exec",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        );
        let addr = spawn_server(slow).await;

        let dispatcher: Dispatcher = Dispatcher::builder(
            Definition::inline("f", "function f() {}"),
            |_: &[Value], _: &Map<String, Value>| Ok(Value::Null),
        )
        .config(
            DispatcherConfig::default()
                .endpoint(format!("http://{addr}/exec"))
                .switch(RemoteSwitch::Fixed(true))
                .timeout(Duration::from_millis(200)),
        )
        .console(Arc::new(BufferConsole::new()))
        .build()
        .unwrap();

        let err = dispatcher.call(vec![], Map::new()).await.unwrap_err();
        assert!(matches!(err, DispatchError::Timeout(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let dispatcher: Dispatcher = Dispatcher::builder(
            Definition::inline("f", "function f() {}"),
            |_: &[Value], _: &Map<String, Value>| Ok(Value::Null),
        )
        .config(
            DispatcherConfig::default()
                .endpoint(format!("http://{addr}/exec"))
                .switch(RemoteSwitch::Fixed(true)),
        )
        .build()
        .unwrap();

        let err = dispatcher.call(vec![], Map::new()).await.unwrap_err();
        assert!(matches!(err, DispatchError::Transport(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_non_json_error_page_is_protocol_error() {
        let proxy = Router::new().route(
            "/exec",
            post(|| async { (StatusCode::BAD_GATEWAY, "<html>bad gateway</html>") }),
        );
        let addr = spawn_server(proxy).await;

        let dispatcher: Dispatcher = Dispatcher::builder(
            Definition::inline("f", "function f() {}"),
            |_: &[Value], _: &Map<String, Value>| Ok(Value::Null),
        )
        .config(
            DispatcherConfig::default()
                .endpoint(format!("http://{addr}/exec"))
                .switch(RemoteSwitch::Fixed(true)),
        )
        .build()
        .unwrap();

        let err = dispatcher.call(vec![], Map::new()).await.unwrap_err();
        assert!(
            matches!(err, DispatchError::Protocol { ref body } if body == "<html>bad gateway</html>")
        );
    }
}
