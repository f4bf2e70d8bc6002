use async_trait::async_trait;
use sqlx::PgPool;
use std::time::Duration;

use crate::repos::purchase_repo;
use crate::services::entitlement::{Capability, EntitlementError, EntitlementLookup};

/// Postgres-backed entitlement lookup.
///
/// Each call is bounded by `timeout`; an elapsed query is reported as
/// `EntitlementError::Timeout` and the in-flight query future is dropped.
#[derive(Clone, Debug)]
pub struct PgEntitlementLookup {
    pool: PgPool,
    timeout: Duration,
}

impl PgEntitlementLookup {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[async_trait]
impl EntitlementLookup for PgEntitlementLookup {
    async fn has_capability(
        &self,
        subject_id: &str,
        capability: Capability,
    ) -> Result<bool, EntitlementError> {
        let query =
            purchase_repo::has_completed_purchase_granting(&self.pool, subject_id, capability);

        match tokio::time::timeout(self.timeout, query).await {
            Ok(res) => Ok(res?),
            Err(_) => Err(EntitlementError::Timeout(self.timeout)),
        }
    }
}
