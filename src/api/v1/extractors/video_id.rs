/*
 * Responsibility
 * - Take `{video_id}` from the path and check its shape before the handler runs
 * - Undecodable path params (bad percent-encoding etc.) surface as
 *   AppError::PathParams, shape failures as a videoId validation failure
 */
use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};

use crate::error::{AppError, FieldError};

pub const INVALID_VIDEO_ID: &str = "Invalid video id";
const MAX_VIDEO_ID_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoId(pub String);

fn check_video_id(raw: &str) -> Result<(), AppError> {
    let well_formed = !raw.is_empty()
        && raw.len() <= MAX_VIDEO_ID_LEN
        && raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if well_formed {
        Ok(())
    } else {
        Err(AppError::validation(
            INVALID_VIDEO_ID,
            vec![FieldError::new(
                "videoId",
                "must be 1-64 characters of [A-Za-z0-9_-]",
            )],
        ))
    }
}

impl<S> FromRequestParts<S> for VideoId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state).await?;
        check_video_id(&raw)?;
        Ok(Self(raw))
    }
}
