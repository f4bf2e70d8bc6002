/*
 * Responsibility
 * - JSON body extraction + DTO validation in one extractor
 * - Body-shape failures (bad JSON, wrong content type) surface as
 *   AppError::Rejection, field checks as AppError::Schema
 */
use axum::{
    Json,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;

use crate::error::{AppError, FieldErrors};

/// Field-level checks a request DTO runs after deserialisation.
pub trait Validate {
    // Errors are reported in check order, fields as dotted paths.
    fn validate(&self) -> Result<(), FieldErrors>;
}

pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate().map_err(AppError::Schema)?;
        Ok(Self(value))
    }
}
