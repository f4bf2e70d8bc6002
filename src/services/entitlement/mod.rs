//! Entitlement lookup: does a subject hold a purchase granting a capability?
//!
//! Every check is a live lookup against the store. Nothing here caches
//! decisions; callers decide how to treat failures (the video gate fails closed).
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::repos::error::RepoError;

pub mod postgres;

pub use postgres::PgEntitlementLookup;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    VideoAccess,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::VideoAccess => "video_access",
        }
    }
}

#[derive(Debug, Error)]
pub enum EntitlementError {
    #[error("entitlement store error: {0}")]
    Store(#[from] RepoError),
    #[error("entitlement lookup timed out after {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait EntitlementLookup: Send + Sync {
    // Returns whether `subject_id` currently holds `capability`.
    async fn has_capability(
        &self,
        subject_id: &str,
        capability: Capability,
    ) -> Result<bool, EntitlementError>;
}
