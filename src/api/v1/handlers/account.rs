/*
 * Responsibility
 * - GET /me (member or admin), GET /admin/overview (admin only)
 * - Role checks happen in the route layers; handlers only read AuthCtx
 */
use axum::{Json, extract::State};

use crate::{
    api::v1::{
        dto::account::{AdminOverviewResponse, IdentityResponse},
        extractors::AuthCtxExtractor,
    },
    config::AppEnv,
    state::AppState,
};

pub async fn me(AuthCtxExtractor(auth_ctx): AuthCtxExtractor) -> Json<IdentityResponse> {
    Json(IdentityResponse {
        role: auth_ctx.role(),
        expires_at: auth_ctx.claims.expires_at,
        subject_id: auth_ctx.claims.subject_id,
    })
}

pub async fn admin_overview(
    State(state): State<AppState>,
    AuthCtxExtractor(auth_ctx): AuthCtxExtractor,
) -> Json<AdminOverviewResponse> {
    let environment = match state.app_env {
        AppEnv::Development => "development",
        AppEnv::Production => "production",
    };

    Json(AdminOverviewResponse {
        subject_id: auth_ctx.claims.subject_id,
        environment,
    })
}
