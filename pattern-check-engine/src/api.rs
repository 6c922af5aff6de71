use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use pattern_check_core::config::PluginConfig;
use pattern_check_protocol::execution::{ExecuteTaskRequest, ExecutionResult, PayloadHandlerRequest};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::error::EngineError;
use crate::plugin::Plugin;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginServiceConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

fn default_bind_address() -> String {
    "0.0.0.0:8095".to_string()
}

impl Default for PluginServiceConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

impl From<&PluginConfig> for PluginServiceConfig {
    fn from(config: &PluginConfig) -> Self {
        Self {
            bind_address: config.http_bind.clone(),
        }
    }
}

/// Handle to a running plugin service.
pub struct ServiceHandle {
    local_addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
}

impl ServiceHandle {
    /// Address the listener actually bound, useful with port `0`.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops accepting connections and lets in-flight requests finish.
    pub fn shutdown(self) {
        let _ = self.shutdown.send(());
    }
}

#[derive(Clone)]
struct PluginApiState {
    plugin: Arc<dyn Plugin>,
}

/// Builder to expose a plugin over HTTP.
pub struct PluginApiBuilder {
    plugin: Arc<dyn Plugin>,
}

impl PluginApiBuilder {
    pub fn new(plugin: Arc<dyn Plugin>) -> Self {
        Self { plugin }
    }

    pub fn into_router(self) -> Router {
        let state = PluginApiState {
            plugin: self.plugin,
        };

        Router::new()
            .route("/health", get(health))
            .route("/info", get(describe))
            .route("/execute", post(execute))
            .route("/payload", post(handle_payload))
            .with_state(state)
    }

    pub async fn serve(self, config: PluginServiceConfig) -> anyhow::Result<ServiceHandle> {
        let router = self.into_router();
        let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
        let local_addr = listener.local_addr()?;
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            info!(address = %local_addr, "starting pattern check service");
            if let Err(err) = axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = rx.await;
                })
                .await
            {
                warn!(?err, "pattern check service stopped with error");
            }
        });

        Ok(ServiceHandle {
            local_addr,
            shutdown: tx,
        })
    }
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn describe(State(state): State<PluginApiState>) -> impl IntoResponse {
    Json(state.plugin.describe())
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    code: String,
    message: String,
}

async fn execute(
    State(state): State<PluginApiState>,
    Json(request): Json<ExecuteTaskRequest>,
) -> Result<Json<ExecutionResult>, (StatusCode, Json<ErrorResponse>)> {
    state
        .plugin
        .evaluate(request)
        .await
        .map(Json)
        .map_err(map_error)
}

async fn handle_payload(
    State(state): State<PluginApiState>,
    Json(request): Json<PayloadHandlerRequest>,
) -> Result<Json<ExecutionResult>, (StatusCode, Json<ErrorResponse>)> {
    state
        .plugin
        .handle_payload(request)
        .await
        .map(Json)
        .map_err(map_error)
}

fn map_error(err: EngineError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &err {
        EngineError::UnsupportedPlatform(_) => StatusCode::BAD_REQUEST,
        EngineError::Rules(_) | EngineError::PayloadSerialization(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        EngineError::StepReport(_) => StatusCode::BAD_GATEWAY,
        EngineError::NotSupported(_) => StatusCode::NOT_IMPLEMENTED,
    };
    warn!(code = err.code(), error = %err, "request failed");

    (
        status,
        Json(ErrorResponse {
            code: err.code().into(),
            message: err.to_string(),
        }),
    )
}
