/*
 * Responsibility
 * - URL structure of v1
 * - Which auth stage guards which routes (route_layer per group)
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::v1::handlers::{
    account::{admin_overview, me},
    catalog::catalog,
    health::health,
    videos::{record_progress, stream},
};
use crate::middleware::auth::{
    access,
    entitlement::require_video_access,
    roles::{AllowedRoles, require_role},
};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let public = Router::new().route("/health", get(health));

    let optional = access::optional_auth(
        Router::new().route("/catalog", get(catalog)),
        state.clone(),
    );

    let members = require_role(
        Router::new().route("/me", get(me)),
        state.clone(),
        AllowedRoles::MEMBER_OR_ADMIN,
    );

    let admins = require_role(
        Router::new().route("/admin/overview", get(admin_overview)),
        state.clone(),
        AllowedRoles::ADMIN_ONLY,
    );

    // route_layer added last runs first: authenticate, then the entitlement gate
    let videos = Router::new()
        .route("/videos/{video_id}/stream", get(stream))
        .route("/videos/{video_id}/progress", post(record_progress));
    let videos = require_video_access(videos, state.clone());
    let videos = access::require_auth(videos, state);

    public
        .merge(optional)
        .merge(members)
        .merge(admins)
        .merge(videos)
}
