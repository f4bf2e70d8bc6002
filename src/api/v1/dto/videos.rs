/*
 * Responsibility
 * - Video request/response DTOs
 * - Request DTOs implement Validate (field paths are camelCase, dotted)
 */
use serde::{Deserialize, Serialize};

use crate::api::v1::extractors::Validate;
use crate::error::FieldErrors;

pub const MIN_PLAYBACK_RATE: f64 = 0.25;
pub const MAX_PLAYBACK_RATE: f64 = 4.0;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordProgressRequest {
    pub position_seconds: f64,
    pub duration_seconds: f64,
    #[serde(default)]
    pub playback: Option<PlaybackSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PlaybackSettings {
    pub rate: f64,
}

impl Validate for RecordProgressRequest {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        if !self.position_seconds.is_finite() || self.position_seconds < 0.0 {
            errors.push("positionSeconds", "must be a number >= 0");
        }
        if !self.duration_seconds.is_finite() || self.duration_seconds <= 0.0 {
            errors.push("durationSeconds", "must be a number > 0");
        } else if self.position_seconds > self.duration_seconds {
            errors.push("positionSeconds", "must not exceed durationSeconds");
        }
        if let Some(playback) = &self.playback
            && !(MIN_PLAYBACK_RATE..=MAX_PLAYBACK_RATE).contains(&playback.rate)
        {
            errors.push("playback.rate", "must be between 0.25 and 4");
        }

        errors.into_result()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamResponse {
    pub video_id: String,
    pub subject_id: String,
    pub access: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    pub video_id: String,
    pub position_seconds: f64,
    pub completed: bool,
}
