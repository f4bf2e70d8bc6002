pub mod auth_ctx;
pub mod validated_json;
pub mod video_id;

pub use auth_ctx::{AuthCtx, AuthCtxExtractor, MaybeAuthCtx};
pub use validated_json::{Validate, ValidatedJson};
pub use video_id::VideoId;
