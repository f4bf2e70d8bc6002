/*!
 * Authentication context extractor
 *
 * Responsibility:
 * - Hand the authenticated request context (AuthCtx) to handlers
 * - axum-specific code lives in core, the type itself in types
 *
 * Public API:
 * - AuthCtx
 * - AuthCtxExtractor
 * - MaybeAuthCtx
 */

mod core;
mod types;

pub use core::{AuthCtxExtractor, MaybeAuthCtx};
pub use types::AuthCtx;
