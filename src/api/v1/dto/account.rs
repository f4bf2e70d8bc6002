/*
 * Responsibility
 * - Response DTOs for identity-centric endpoints
 */
use serde::Serialize;

use crate::services::auth::Role;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityResponse {
    pub subject_id: String,
    pub role: Role,
    pub expires_at: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOverviewResponse {
    pub subject_id: String,
    pub environment: &'static str,
}
