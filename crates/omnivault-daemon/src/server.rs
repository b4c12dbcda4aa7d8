// SPDX-FileCopyrightText: 2026 OmniVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Daemon HTTP server built on axum.
//!
//! Routes, shared state, the auto-lock timer, and the graceful shutdown
//! sequence. The daemon owns exactly one [`EncryptedStore`]; concurrency
//! control lives inside the store, so handlers stay straight-line code.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use secrecy::SecretString;
use serde::Deserialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use omnivault_config::{OmniVaultConfig, Paths};
use omnivault_core::protocol::{
    ChangePasswordRequest, ErrorBody, ErrorCode, InitRequest, ListResponse, SecretListItem,
    SecretResponse, SetSecretRequest, StatusResponse, SuccessResponse, UnlockRequest,
    MIN_PASSWORD_LEN,
};
use omnivault_core::{Metadata, OmniVaultError, Secret};
use omnivault_store::{Argon2Params, EncryptedStore};

/// Upper bound on a single request, mirroring the client-side timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How long shutdown waits for in-flight connections to drain.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Delay between answering `/stop` and triggering shutdown, so the response
/// reaches the client first.
const STOP_REPLY_GRACE: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// Daemon
// ---------------------------------------------------------------------------

/// The OmniVault daemon: one store, one endpoint, one auto-lock timer.
pub struct Daemon {
    paths: Paths,
    state: DaemonState,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct DaemonState {
    store: Arc<EncryptedStore>,
    auto_lock: Arc<AutoLock>,
    shutdown: CancellationToken,
    started_at: Instant,
}

impl DaemonState {
    /// Re-arm the auto-lock timer. Called on every successful request that
    /// touches the encrypted store.
    fn touch(&self) {
        self.auto_lock.reset(self.store.clone());
    }
}

impl Daemon {
    /// Build a daemon for the given path set and configuration.
    pub fn new(paths: Paths, config: &OmniVaultConfig) -> Self {
        let params = Argon2Params {
            time: config.vault.kdf_time_cost,
            memory: config.vault.kdf_memory_cost,
            threads: config.vault.kdf_parallelism,
            key_len: 32,
        };

        let store = Arc::new(EncryptedStore::with_argon2_params(
            &paths.vault_file,
            &paths.meta_file,
            params,
        ));

        Self {
            state: DaemonState {
                store,
                auto_lock: Arc::new(AutoLock::new(Duration::from_secs(
                    config.daemon.auto_lock_secs,
                ))),
                shutdown: CancellationToken::new(),
                started_at: Instant::now(),
            },
            paths,
        }
    }

    /// Override the auto-lock timeout (finer than the config's seconds
    /// granularity; used by tests).
    pub fn with_auto_lock(mut self, timeout: Duration) -> Self {
        self.state.auto_lock = Arc::new(AutoLock::new(timeout));
        self
    }

    /// Run the daemon until `cancel` fires (signal, `/stop`, or caller).
    ///
    /// Shutdown sequence: stop accepting connections, cancel the auto-lock
    /// timer, lock the vault (persisting dirty writes), wait up to 5 s for
    /// the transport, then remove the socket and PID files. Every step is
    /// best-effort; failures are logged and do not prevent later steps.
    pub async fn run(self, cancel: CancellationToken) -> omnivault_core::Result<()> {
        self.paths.ensure_config_dir()?;
        self.paths.cleanup_socket();

        // `/stop` cancels the daemon's own token; tie it to the caller's.
        let cancel = cancel.clone();
        let internal = self.state.shutdown.clone();
        let linked = cancel.clone();
        tokio::spawn(async move {
            internal.cancelled().await;
            linked.cancel();
        });

        let app = router(self.state.clone());
        let server_task = self.bind_and_serve(app, cancel.clone()).await?;

        self.write_pid_file();

        cancel.cancelled().await;
        info!("shutting down daemon");

        // Release the linking task if shutdown came from the caller's token.
        self.state.shutdown.cancel();
        self.state.auto_lock.cancel();

        if let Err(e) = self.state.store.lock().await {
            warn!(error = %e, "failed to lock vault on shutdown");
        }

        match tokio::time::timeout(SHUTDOWN_TIMEOUT, server_task).await {
            Ok(Ok(Ok(()))) => debug!("transport shut down cleanly"),
            Ok(Ok(Err(e))) => warn!(error = %e, "transport shutdown error"),
            Ok(Err(e)) => warn!(error = %e, "server task panicked"),
            Err(_) => warn!("transport did not shut down within timeout"),
        }

        self.paths.cleanup_socket();
        self.paths.cleanup_pid_file();

        info!("daemon stopped");
        Ok(())
    }

    /// Bind the platform endpoint and start serving in a background task.
    #[cfg(unix)]
    async fn bind_and_serve(
        &self,
        app: Router,
        cancel: CancellationToken,
    ) -> omnivault_core::Result<JoinHandle<std::io::Result<()>>> {
        use std::os::unix::fs::PermissionsExt;

        let listener = tokio::net::UnixListener::bind(&self.paths.socket_path)?;
        std::fs::set_permissions(
            &self.paths.socket_path,
            std::fs::Permissions::from_mode(0o600),
        )?;

        info!(endpoint = %self.paths.socket_path.display(), "daemon listening");

        Ok(tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(cancel.cancelled_owned())
                .await
        }))
    }

    /// Loopback TCP fallback where Unix sockets are unavailable.
    #[cfg(not(unix))]
    async fn bind_and_serve(
        &self,
        app: Router,
        cancel: CancellationToken,
    ) -> omnivault_core::Result<JoinHandle<std::io::Result<()>>> {
        let listener = tokio::net::TcpListener::bind(&self.paths.tcp_addr).await?;

        info!(endpoint = %self.paths.tcp_addr, "daemon listening");

        Ok(tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(cancel.cancelled_owned())
                .await
        }))
    }

    /// Write the daemon PID file (mode 0600). Failure is non-fatal.
    fn write_pid_file(&self) {
        let pid = std::process::id().to_string();
        if let Err(e) = std::fs::write(&self.paths.pid_file, pid) {
            warn!(error = %e, "failed to write PID file");
            return;
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Err(e) = std::fs::set_permissions(
                &self.paths.pid_file,
                std::fs::Permissions::from_mode(0o600),
            ) {
                warn!(error = %e, "failed to set PID file permissions");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Auto-lock timer
// ---------------------------------------------------------------------------

/// Single-shot inactivity timer that locks the store when it fires.
///
/// `reset` aborts the previous timer task before arming a new one, so
/// timers never stack and activity always pushes the deadline to now + T.
struct AutoLock {
    timeout: Duration,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl AutoLock {
    fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            handle: Mutex::new(None),
        }
    }

    fn reset(&self, store: Arc<EncryptedStore>) {
        let timeout = self.timeout;
        let mut guard = self.handle.lock().expect("auto-lock mutex poisoned");
        if let Some(previous) = guard.take() {
            previous.abort();
        }
        *guard = Some(tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if store.is_locked().await {
                return;
            }
            match store.lock().await {
                Ok(()) => info!("vault auto-locked after inactivity"),
                Err(e) => warn!(error = %e, "auto-lock failed"),
            }
        }));
    }

    fn cancel(&self) {
        let mut guard = self.handle.lock().expect("auto-lock mutex poisoned");
        if let Some(previous) = guard.take() {
            previous.abort();
        }
    }
}

// ---------------------------------------------------------------------------
// Router and handlers
// ---------------------------------------------------------------------------

/// Build the daemon router.
pub fn router(state: DaemonState) -> Router {
    Router::new()
        .route("/status", get(handle_status))
        .route("/init", post(handle_init))
        .route("/unlock", post(handle_unlock))
        .route("/lock", post(handle_lock))
        .route("/change-password", post(handle_change_password))
        .route("/secrets", get(handle_list))
        .route(
            "/secret/{*path}",
            get(handle_get)
                .put(handle_set)
                .delete(handle_delete),
        )
        .route("/stop", post(handle_stop))
        .fallback(handle_not_found)
        .method_not_allowed_fallback(handle_method_not_allowed)
        .layer(axum::middleware::from_fn(bound_request))
        .with_state(state)
}

/// Bound every request (body read included) to [`REQUEST_TIMEOUT`].
async fn bound_request(req: axum::extract::Request, next: axum::middleware::Next) -> Response {
    match tokio::time::timeout(REQUEST_TIMEOUT, next.run(req)).await {
        Ok(response) => response,
        Err(_) => ApiError(OmniVaultError::Internal("request timed out".to_string())).into_response(),
    }
}

/// Error wrapper translating [`OmniVaultError`] into the wire error shape.
struct ApiError(OmniVaultError);

impl From<OmniVaultError> for ApiError {
    fn from(err: OmniVaultError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = ErrorCode::from(&self.0);
        let status =
            StatusCode::from_u16(code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if code == ErrorCode::InternalError {
            warn!(error = %self.0, "request failed");
        }

        let body = ErrorBody {
            error: self.0.to_string(),
            code: Some(code),
            details: None,
        };
        (status, Json(body)).into_response()
    }
}

/// Unwrap a JSON body, mapping extractor rejections to `INVALID_REQUEST`.
fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(_) => Err(OmniVaultError::InvalidRequest("invalid request body".to_string()).into()),
    }
}

async fn handle_status(State(state): State<DaemonState>) -> Json<StatusResponse> {
    let locked = state.store.is_locked().await;
    Json(StatusResponse {
        running: true,
        locked,
        vault_exists: state.store.vault_exists(),
        secret_count: state.store.secret_count().await,
        unlocked_at: state.store.unlocked_at().await,
        uptime: format_uptime(state.started_at.elapsed().as_secs()),
    })
}

async fn handle_init(
    State(state): State<DaemonState>,
    body: Result<Json<InitRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let req = json_body(body)?;

    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(OmniVaultError::InvalidRequest(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        ))
        .into());
    }

    state.store.init(&SecretString::from(req.password)).await?;
    state.touch();
    Ok(Json(SuccessResponse::ok("vault initialized")))
}

async fn handle_unlock(
    State(state): State<DaemonState>,
    body: Result<Json<UnlockRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let req = json_body(body)?;

    state
        .store
        .unlock(&SecretString::from(req.password))
        .await?;
    state.touch();
    Ok(Json(SuccessResponse::ok("vault unlocked")))
}

async fn handle_lock(
    State(state): State<DaemonState>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.auto_lock.cancel();
    state.store.lock().await?;
    Ok(Json(SuccessResponse::ok("vault locked")))
}

async fn handle_change_password(
    State(state): State<DaemonState>,
    body: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let req = json_body(body)?;

    if req.new_password.len() < MIN_PASSWORD_LEN {
        return Err(OmniVaultError::InvalidRequest(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        ))
        .into());
    }

    state
        .store
        .change_password(
            &SecretString::from(req.old_password),
            &SecretString::from(req.new_password),
        )
        .await?;
    state.touch();
    Ok(Json(SuccessResponse::ok("password changed")))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default)]
    prefix: String,
}

async fn handle_list(
    State(state): State<DaemonState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, ApiError> {
    let paths = state.store.list(&query.prefix).await?;

    let mut items = Vec::with_capacity(paths.len());
    for path in paths {
        // A single undecryptable entry must not break the whole listing.
        let Ok(secret) = state.store.get(&path).await else {
            warn!(path = %path, "skipping unreadable secret in listing");
            continue;
        };

        let mut tags: Vec<String> = secret.metadata.tags.keys().cloned().collect();
        tags.sort();

        items.push(SecretListItem {
            path,
            has_value: secret.has_value(),
            has_fields: secret.has_fields(),
            tags,
            updated_at: secret.metadata.modified_at,
        });
    }

    state.touch();
    let count = items.len();
    Ok(Json(ListResponse {
        secrets: items,
        count,
    }))
}

async fn handle_get(
    State(state): State<DaemonState>,
    Path(path): Path<String>,
) -> Result<Json<SecretResponse>, ApiError> {
    let secret = state.store.get(&path).await?;
    state.touch();

    Ok(Json(SecretResponse {
        path,
        value: secret.primary_value(),
        fields: secret.fields,
        tags: secret.metadata.tags,
        created_at: secret.metadata.created_at,
        updated_at: secret.metadata.modified_at,
    }))
}

async fn handle_set(
    State(state): State<DaemonState>,
    Path(path): Path<String>,
    body: Result<Json<SetSecretRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let req = json_body(body)?;

    let secret = Secret {
        value: req.value,
        value_bytes: None,
        fields: req.fields,
        metadata: Metadata {
            tags: req.tags,
            ..Metadata::default()
        },
    };

    state.store.set(&path, secret).await?;
    state.touch();
    Ok(Json(SuccessResponse::ok("secret saved")))
}

async fn handle_delete(
    State(state): State<DaemonState>,
    Path(path): Path<String>,
) -> Result<Json<SuccessResponse>, ApiError> {
    state.store.delete(&path).await?;
    state.touch();
    Ok(Json(SuccessResponse::ok("secret deleted")))
}

async fn handle_stop(State(state): State<DaemonState>) -> Json<SuccessResponse> {
    info!("stop requested over IPC");
    let shutdown = state.shutdown.clone();
    tokio::spawn(async move {
        // Give the response time to flush before tearing the listener down.
        tokio::time::sleep(STOP_REPLY_GRACE).await;
        shutdown.cancel();
    });
    Json(SuccessResponse::ok("daemon stopping"))
}

async fn handle_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: "not found".to_string(),
            code: None,
            details: None,
        }),
    )
        .into_response()
}

async fn handle_method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorBody {
            error: "method not allowed".to_string(),
            code: None,
            details: None,
        }),
    )
        .into_response()
}

/// Format seconds into a human-readable duration string.
fn format_uptime(secs: u64) -> String {
    let days = secs / 86400;
    let hours = (secs % 86400) / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}
