/*
 * Responsibility
 * - Request authorization stages, each an axum middleware:
 *   - access: bearer verification (mandatory / optional) -> AuthCtx
 *   - roles: role gate on top of mandatory authentication
 *   - entitlement: purchase-backed video access gate
 */
pub mod access;
pub mod entitlement;
pub mod roles;
