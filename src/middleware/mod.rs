/*
 * Responsibility
 * - Public interface of the middleware layers
 * - auth stages, bearer extraction, error normalizer, http plumbing
 */
pub mod auth;
pub mod bearer_auth;
pub mod error_normalizer;
pub mod http;
