/*
 * Responsibility
 * - Shared context attached to the Router (AppState)
 *   - verifier: CredentialVerifier, entitlements: EntitlementLookup, app_env
 * - Read-only after startup; Clone is cheap (Arc inside)
 */
use std::sync::Arc;

use crate::config::AppEnv;
use crate::services::{auth::CredentialVerifier, entitlement::EntitlementLookup};

#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<CredentialVerifier>,
    pub entitlements: Arc<dyn EntitlementLookup>,
    pub app_env: AppEnv,
}

impl AppState {
    pub fn new(
        verifier: Arc<CredentialVerifier>,
        entitlements: Arc<dyn EntitlementLookup>,
        app_env: AppEnv,
    ) -> Self {
        Self {
            verifier,
            entitlements,
            app_env,
        }
    }
}
