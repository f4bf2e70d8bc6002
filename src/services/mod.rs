pub mod auth;
pub mod entitlement;
