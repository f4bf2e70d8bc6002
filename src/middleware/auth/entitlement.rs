//! Video entitlement gate.
//!
//! Runs after an authentication stage. Admins pass without a lookup; everyone
//! else needs a live `Capability::VideoAccess` answer of `true`. A `false`
//! answer, a lookup error and a missing identity are all the same 403.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::services::auth::Role;
use crate::services::entitlement::{Capability, EntitlementLookup};
use crate::state::AppState;

pub const VIDEO_ACCESS_DENIED: &str = "Video access requires a completed purchase";

pub fn require_video_access(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(state, video_access_gate))
}

pub async fn authorize_video_access(
    lookup: &dyn EntitlementLookup,
    ctx: Option<&AuthCtx>,
) -> Result<(), AppError> {
    let Some(ctx) = ctx else {
        tracing::warn!("video access requested without identity");
        return Err(AppError::forbidden(VIDEO_ACCESS_DENIED));
    };

    if ctx.role() == Role::Admin {
        return Ok(());
    }

    match lookup
        .has_capability(ctx.subject_id(), Capability::VideoAccess)
        .await
    {
        Ok(true) => Ok(()),
        Ok(false) => {
            tracing::info!(subject_id = ctx.subject_id(), "no qualifying purchase");
            Err(AppError::forbidden(VIDEO_ACCESS_DENIED))
        }
        Err(err) => {
            // fail closed
            tracing::error!(
                subject_id = ctx.subject_id(),
                error = %err,
                "entitlement lookup failed"
            );
            Err(AppError::forbidden(VIDEO_ACCESS_DENIED))
        }
    }
}

async fn video_access_gate(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_ctx = req.extensions().get::<AuthCtx>().cloned();
    authorize_video_access(state.entitlements.as_ref(), auth_ctx.as_ref()).await?;

    Ok(next.run(req).await)
}
