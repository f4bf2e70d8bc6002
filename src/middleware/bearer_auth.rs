/*
 * Responsibility
 * - Pull the bearer token out of the Authorization header
 * - The "Bearer " scheme is stripped here; verification happens elsewhere
 */
use axum::http::{HeaderMap, header};

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
