// SPDX-FileCopyrightText: 2026 OmniVault Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The daemon client: endpoint dialing and typed request methods.
//!
//! Each request opens a fresh connection, performs one HTTP/1.1 exchange,
//! and closes -- the protocol is strictly one request, one response. The
//! endpoint kind (Unix socket vs loopback TCP) is chosen at construction
//! time; the wire protocol is identical on both.

use std::time::Duration;

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::client::conn::http1;
use hyper::{header, Method, Request};
use hyper_util::rt::TokioIo;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use omnivault_config::Paths;
use omnivault_core::protocol::{
    ChangePasswordRequest, ErrorBody, InitRequest, ListResponse, SecretResponse,
    SetSecretRequest, StatusResponse, SuccessResponse, UnlockRequest,
};

use crate::error::{ClientError, DaemonError};

/// Default per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How long the liveness probe waits for a dial.
const PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Where the daemon listens.
#[derive(Debug, Clone)]
enum Endpoint {
    #[cfg(unix)]
    Unix(std::path::PathBuf),
    #[cfg_attr(unix, allow(dead_code))]
    Tcp(String),
}

/// Client for the OmniVault daemon.
#[derive(Debug, Clone)]
pub struct Client {
    endpoint: Endpoint,
    timeout: Duration,
}

impl Client {
    /// Build a client for the endpoint described by `paths`.
    pub fn new(paths: &Paths) -> Self {
        #[cfg(unix)]
        let endpoint = Endpoint::Unix(paths.socket_path.clone());

        #[cfg(not(unix))]
        let endpoint = Endpoint::Tcp(paths.tcp_addr.clone());

        Self {
            endpoint,
            timeout: REQUEST_TIMEOUT,
        }
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether a daemon is reachable at the endpoint.
    ///
    /// On POSIX this checks the socket file exists, then attempts a
    /// 1-second dial; elsewhere it is a 1-second TCP dial.
    pub async fn is_running(&self) -> bool {
        match &self.endpoint {
            #[cfg(unix)]
            Endpoint::Unix(path) => {
                if !path.exists() {
                    return false;
                }
                matches!(
                    tokio::time::timeout(PROBE_TIMEOUT, tokio::net::UnixStream::connect(path))
                        .await,
                    Ok(Ok(_))
                )
            }
            Endpoint::Tcp(addr) => matches!(
                tokio::time::timeout(PROBE_TIMEOUT, tokio::net::TcpStream::connect(addr)).await,
                Ok(Ok(_))
            ),
        }
    }

    // ------------------------------------------------------------------
    // Typed surface
    // ------------------------------------------------------------------

    /// `GET /status`
    pub async fn status(&self) -> Result<StatusResponse, ClientError> {
        self.request(Method::GET, "/status", None::<&()>).await
    }

    /// `POST /init`
    pub async fn init(&self, password: &str) -> Result<SuccessResponse, ClientError> {
        let body = InitRequest {
            password: password.to_string(),
        };
        self.request(Method::POST, "/init", Some(&body)).await
    }

    /// `POST /unlock`
    pub async fn unlock(&self, password: &str) -> Result<SuccessResponse, ClientError> {
        let body = UnlockRequest {
            password: password.to_string(),
        };
        self.request(Method::POST, "/unlock", Some(&body)).await
    }

    /// `POST /lock`
    pub async fn lock(&self) -> Result<SuccessResponse, ClientError> {
        self.request(Method::POST, "/lock", None::<&()>).await
    }

    /// `POST /change-password`
    pub async fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
    ) -> Result<SuccessResponse, ClientError> {
        let body = ChangePasswordRequest {
            old_password: old_password.to_string(),
            new_password: new_password.to_string(),
        };
        self.request(Method::POST, "/change-password", Some(&body))
            .await
    }

    /// `GET /secrets?prefix=<prefix>`
    pub async fn list(&self, prefix: &str) -> Result<ListResponse, ClientError> {
        let path = if prefix.is_empty() {
            "/secrets".to_string()
        } else {
            format!("/secrets?prefix={prefix}")
        };
        self.request(Method::GET, &path, None::<&()>).await
    }

    /// `GET /secret/<path>`
    pub async fn get(&self, path: &str) -> Result<SecretResponse, ClientError> {
        self.request(Method::GET, &format!("/secret/{path}"), None::<&()>)
            .await
    }

    /// `PUT /secret/<path>`
    pub async fn set(
        &self,
        path: &str,
        value: Option<String>,
        fields: std::collections::HashMap<String, String>,
        tags: std::collections::HashMap<String, String>,
    ) -> Result<SuccessResponse, ClientError> {
        let body = SetSecretRequest {
            value,
            fields,
            tags,
        };
        self.request(Method::PUT, &format!("/secret/{path}"), Some(&body))
            .await
    }

    /// `DELETE /secret/<path>`
    pub async fn delete(&self, path: &str) -> Result<SuccessResponse, ClientError> {
        self.request(Method::DELETE, &format!("/secret/{path}"), None::<&()>)
            .await
    }

    /// `POST /stop` -- the daemon shuts down after replying.
    pub async fn stop(&self) -> Result<SuccessResponse, ClientError> {
        self.request(Method::POST, "/stop", None::<&()>).await
    }

    // ------------------------------------------------------------------
    // Transport
    // ------------------------------------------------------------------

    /// Issue one request and decode the JSON response.
    async fn request<B, T>(
        &self,
        method: Method,
        path_and_query: &str,
        body: Option<&B>,
    ) -> Result<T, ClientError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let payload = match body {
            Some(value) => Some(
                serde_json::to_vec(value)
                    .map_err(|e| ClientError::Transport(format!("encode request: {e}")))?,
            ),
            None => None,
        };

        let (status, bytes) = tokio::time::timeout(
            self.timeout,
            self.send(method, path_and_query, payload),
        )
        .await
        .map_err(|_| ClientError::Transport("request timed out".to_string()))??;

        if status >= 400 {
            if let Ok(err_body) = serde_json::from_slice::<ErrorBody>(&bytes) {
                if !err_body.error.is_empty() {
                    return Err(DaemonError {
                        status,
                        code: err_body.code,
                        message: err_body.error,
                    }
                    .into());
                }
            }
            return Err(ClientError::Transport(format!(
                "request failed with status {status}"
            )));
        }

        serde_json::from_slice(&bytes)
            .map_err(|e| ClientError::Transport(format!("decode response: {e}")))
    }

    /// Dial the endpoint and perform one HTTP/1.1 exchange.
    async fn send(
        &self,
        method: Method,
        path_and_query: &str,
        payload: Option<Vec<u8>>,
    ) -> Result<(u16, Bytes), ClientError> {
        let request = build_request(method, path_and_query, payload)?;

        match &self.endpoint {
            #[cfg(unix)]
            Endpoint::Unix(path) => {
                let stream = tokio::net::UnixStream::connect(path)
                    .await
                    .map_err(|e| ClientError::Connect(format!("{}: {e}", path.display())))?;
                roundtrip(TokioIo::new(stream), request).await
            }
            Endpoint::Tcp(addr) => {
                let stream = tokio::net::TcpStream::connect(addr)
                    .await
                    .map_err(|e| ClientError::Connect(format!("{addr}: {e}")))?;
                roundtrip(TokioIo::new(stream), request).await
            }
        }
    }
}

/// Build the HTTP request. The authority is irrelevant -- the transport is
/// already pinned to the local endpoint -- but HTTP/1.1 still wants a Host.
fn build_request(
    method: Method,
    path_and_query: &str,
    payload: Option<Vec<u8>>,
) -> Result<Request<Full<Bytes>>, ClientError> {
    let mut builder = Request::builder()
        .method(method)
        .uri(format!("http://localhost{path_and_query}"))
        .header(header::HOST, "localhost");

    if payload.is_some() {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
    }

    let body = match payload {
        Some(bytes) => Full::new(Bytes::from(bytes)),
        None => Full::default(),
    };

    builder
        .body(body)
        .map_err(|e| ClientError::Transport(format!("build request: {e}")))
}

/// Handshake, send, and collect the response over any byte stream.
async fn roundtrip<S>(
    io: TokioIo<S>,
    request: Request<Full<Bytes>>,
) -> Result<(u16, Bytes), ClientError>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send + 'static,
{
    let (mut sender, connection) = http1::handshake(io)
        .await
        .map_err(|e| ClientError::Transport(format!("handshake: {e}")))?;

    // Drive the connection until the exchange completes.
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            debug!(error = %e, "connection closed with error");
        }
    });

    let response = sender
        .send_request(request)
        .await
        .map_err(|e| ClientError::Transport(format!("send: {e}")))?;

    let status = response.status().as_u16();
    let bytes = response
        .into_body()
        .collect()
        .await
        .map_err(|e| ClientError::Transport(format!("read response: {e}")))?
        .to_bytes();

    Ok((status, bytes))
}
