/*
 * Responsibility
 * - The authenticated-request context type handlers see
 * - Inserted into request extensions by the authentication stage only;
 *   handlers and gates receive it as a value
 */
use crate::services::auth::{Role, TokenClaims};

/// Identity attached to a request after successful token verification.
///
/// Lives for a single request and is never cached across requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCtx {
    pub claims: TokenClaims,
}

impl AuthCtx {
    pub fn new(claims: TokenClaims) -> Self {
        Self { claims }
    }

    pub fn subject_id(&self) -> &str {
        &self.claims.subject_id
    }

    pub fn role(&self) -> Role {
        self.claims.role
    }
}
