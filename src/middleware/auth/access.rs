//! Bearer token verification -> AuthCtx in request extensions.
//!
//! Two modes:
//! - `require_auth`: no token or a bad token is a uniform 401.
//! - `optional_auth`: failures are swallowed and the request continues
//!   without an identity.
//!
//! The specific verification reason is logged but never returned to the
//! caller.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::middleware::bearer_auth::bearer_token;
use crate::services::auth::CredentialVerifier;
use crate::state::AppState;

/// Require a verified bearer token on every route of `router`.
///
/// ```ignore
/// let videos = Router::new().route("/videos/{id}/stream", get(stream));
/// let videos = middleware::auth::access::require_auth(videos, state.clone());
/// ```
pub fn require_auth(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(state, authenticate))
}

/// Attach an identity when a valid token is present; never reject.
pub fn optional_auth(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(state, optional_authenticate))
}

/// Verify the request's bearer token into an `AuthCtx`.
///
/// Missing tokens and every `VerificationFailure` collapse into the same
/// `Unauthorized`.
pub fn verify_request(
    verifier: &CredentialVerifier,
    headers: &HeaderMap,
) -> Result<AuthCtx, AppError> {
    let Some(token) = bearer_token(headers) else {
        tracing::debug!("missing bearer token");
        return Err(AppError::unauthorized());
    };

    match verifier.verify(token) {
        Ok(claims) => Ok(AuthCtx::new(claims)),
        Err(failure) => {
            tracing::warn!(
                reason = failure.reason(),
                error = %failure,
                "access token verification failed"
            );
            Err(AppError::unauthorized())
        }
    }
}

// Re-running on an already authenticated request verifies again and replaces
// the context.
async fn authenticate(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_ctx = verify_request(&state.verifier, req.headers())?;

    // middleware -> extractor hand-off
    req.extensions_mut().insert(auth_ctx);

    Ok(next.run(req).await)
}

async fn optional_authenticate(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    match verify_request(&state.verifier, req.headers()) {
        Ok(auth_ctx) => {
            req.extensions_mut().insert(auth_ctx);
        }
        Err(_) => {
            req.extensions_mut().remove::<AuthCtx>();
        }
    }

    next.run(req).await
}
