//! Role gate: mandatory authentication followed by an allowed-role check.
//!
//! Roles are matched exactly against an explicit set. ADMIN only satisfies a
//! gate whose set lists it.

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
use crate::middleware::auth::access::verify_request;
use crate::services::auth::Role;
use crate::state::AppState;

pub const INSUFFICIENT_ROLE_MESSAGE: &str = "Insufficient permissions";

/// Set of roles a gate accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllowedRoles(&'static [Role]);

impl AllowedRoles {
    pub const ADMIN_ONLY: Self = Self(&[Role::Admin]);
    pub const MEMBER_OR_ADMIN: Self = Self(&[Role::Member, Role::Admin]);

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }
}

pub fn require_role(
    router: Router<AppState>,
    state: AppState,
    allowed: AllowedRoles,
) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(
        (state, allowed),
        role_gate,
    ))
}

pub fn authorize_role(ctx: &AuthCtx, allowed: AllowedRoles) -> Result<(), AppError> {
    if allowed.contains(ctx.role()) {
        return Ok(());
    }

    tracing::warn!(
        subject_id = ctx.subject_id(),
        role = ctx.role().as_str(),
        "role not permitted"
    );
    Err(AppError::forbidden(INSUFFICIENT_ROLE_MESSAGE))
}

async fn role_gate(
    State((state, allowed)): State<(AppState, AllowedRoles)>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    // Unauthorized from here propagates unchanged
    let auth_ctx = verify_request(&state.verifier, req.headers())?;
    authorize_role(&auth_ctx, allowed)?;

    req.extensions_mut().insert(auth_ctx);
    Ok(next.run(req).await)
}
