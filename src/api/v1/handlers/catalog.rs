/*
 * Responsibility
 * - GET /catalog: publicly reachable, personalised when a viewer is known
 */
use axum::Json;

use crate::api::v1::{dto::catalog::CatalogResponse, extractors::MaybeAuthCtx};

pub async fn catalog(MaybeAuthCtx(auth_ctx): MaybeAuthCtx) -> Json<CatalogResponse> {
    Json(CatalogResponse {
        personalized: auth_ctx.is_some(),
        viewer: auth_ctx.map(|ctx| ctx.claims.subject_id),
    })
}
