//! Error normalizer: the one place failures become client responses.
//!
//! Handlers and the auth stages return `AppError`, whose `IntoResponse` only
//! sets the status and tags the response with `RaisedError`. This layer sits
//! outermost, picks the tag up and writes the JSON body:
//!
//! ```text
//! { "success": false, "message": "...", "timestamp": "...", "path": "...",
//!   "details": [...]?, "stackTrace": "..."? }
//! ```
//!
//! Failures produced below our own code (axum's 405, tower-http's 413, ...)
//! carry no tag; any such 4xx/5xx without a JSON body is rebuilt from its
//! status so it gets the same shape.
//!
//! `stackTrace` is only written in development mode. Every normalized failure
//! is logged once with message, stack, url, method and caller ip.

use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use axum::{
    Json, Router,
    body::Body,
    extract::{ConnectInfo, OriginalUri, State},
    http::{Method, Request, StatusCode, Uri, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::config::AppEnv;
use crate::error::{AppError, FieldError, INTERNAL_MESSAGE, RaisedError};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    pub timestamp: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
}

/// Request facts captured before the inner service consumes the request.
#[derive(Debug, Clone)]
pub struct RequestInfo {
    pub method: Method,
    pub uri: Uri,
    pub ip: Option<IpAddr>,
}

impl RequestInfo {
    pub fn from_request(req: &Request<Body>) -> Self {
        let uri = req
            .extensions()
            .get::<OriginalUri>()
            .map(|o| o.0.clone())
            .unwrap_or_else(|| req.uri().clone());

        Self {
            method: req.method().clone(),
            uri,
            ip: client_ip(req),
        }
    }
}

// First x-forwarded-for hop wins over the socket peer.
fn client_ip(req: &Request<Body>) -> Option<IpAddr> {
    let forwarded = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse::<IpAddr>().ok());

    forwarded.or_else(|| {
        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
    })
}

/// Must be the outermost layer so every `AppError` passes through it.
pub fn apply(router: Router, app_env: AppEnv) -> Router {
    router.layer(middleware::from_fn_with_state(app_env, normalize_errors))
}

async fn normalize_errors(
    State(app_env): State<AppEnv>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let info = RequestInfo::from_request(&req);
    let mut res = next.run(req).await;

    let err = match res.extensions_mut().remove::<RaisedError>() {
        Some(RaisedError(err)) => err,
        None if is_unshaped_failure(&res) => Arc::new(untagged_failure(res.status())),
        None => return res,
    };

    let mut normalized = normalize(&err, &info, app_env, Utc::now());

    // keep headers set on the way out (x-request-id etc.)
    for (name, value) in res.headers() {
        if *name != header::CONTENT_TYPE && *name != header::CONTENT_LENGTH {
            normalized.headers_mut().append(name.clone(), value.clone());
        }
    }

    normalized
}

fn is_unshaped_failure(res: &Response) -> bool {
    let status = res.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return false;
    }

    let is_json = res
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));
    !is_json
}

fn untagged_failure(status: StatusCode) -> AppError {
    let message = if status.is_server_error() {
        INTERNAL_MESSAGE
    } else {
        status.canonical_reason().unwrap_or("Request failed")
    };
    AppError::status(status, message)
}

/// Classify, log and render one failure.
pub fn normalize(
    err: &AppError,
    info: &RequestInfo,
    app_env: AppEnv,
    now: DateTime<Utc>,
) -> Response {
    let classified = err.classify();
    let stack = err.report();
    let ip = info
        .ip
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    if classified.status.is_server_error() {
        tracing::error!(
            status = classified.status.as_u16(),
            stack = %stack,
            url = %info.uri,
            method = %info.method,
            ip = %ip,
            "request failed: {err}"
        );
    } else {
        tracing::warn!(
            status = classified.status.as_u16(),
            stack = %stack,
            url = %info.uri,
            method = %info.method,
            ip = %ip,
            "request rejected: {err}"
        );
    }

    let body = ErrorResponse {
        success: false,
        message: classified.message,
        timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        path: info.uri.path().to_string(),
        details: classified.details,
        stack_trace: app_env.is_development().then_some(stack),
    };

    (classified.status, Json(body)).into_response()
}
