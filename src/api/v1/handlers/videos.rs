/*
 * Responsibility
 * - Video endpoints behind authentication + the entitlement gate
 * - Path video ids are checked by VideoId; bodies go through ValidatedJson
 */
use axum::{Json, http::StatusCode};

use crate::{
    api::v1::{
        dto::videos::{ProgressResponse, RecordProgressRequest, StreamResponse},
        extractors::{AuthCtxExtractor, ValidatedJson, VideoId},
    },
    error::AppError,
};

pub async fn stream(
    VideoId(video_id): VideoId,
    AuthCtxExtractor(auth_ctx): AuthCtxExtractor,
) -> Result<Json<StreamResponse>, AppError> {
    Ok(Json(StreamResponse {
        video_id,
        subject_id: auth_ctx.claims.subject_id,
        access: "granted",
    }))
}

pub async fn record_progress(
    VideoId(video_id): VideoId,
    AuthCtxExtractor(_auth_ctx): AuthCtxExtractor,
    ValidatedJson(req): ValidatedJson<RecordProgressRequest>,
) -> Result<(StatusCode, Json<ProgressResponse>), AppError> {
    Ok((
        StatusCode::ACCEPTED,
        Json(ProgressResponse {
            video_id,
            position_seconds: req.position_seconds,
            completed: req.position_seconds >= req.duration_seconds,
        }),
    ))
}
