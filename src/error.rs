use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use actix_web::ResponseError;
use log::{debug, error};
use thiserror::Error;

use crate::models::ErrorBody;

/// Client-caused rejection of a creation payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub(crate) enum ValidationError {
    #[error("Name is required.")]
    NameRequired,
    #[error("Valid lat/lng are required.")]
    InvalidCoordinates,
}

/// Opaque failure of the document store (connectivity, auth, quota, ...).
#[derive(Debug, Error)]
#[error(transparent)]
pub(crate) struct StoreError(#[from] anyhow::Error);

impl From<mongodb::error::Error> for StoreError {
    fn from(e: mongodb::error::Error) -> Self {
        Self(e.into())
    }
}

#[derive(Debug, Error)]
pub(crate) enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("document store failure: {0}")]
    Store(#[from] StoreError),
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        let message = match self {
            Error::Validation(e) => {
                debug!("rejected location payload: {}", e);
                e.to_string()
            }
            Error::Store(e) => {
                error!("{:#}", e);
                "Internal server error.".to_owned()
            }
        };
        HttpResponse::build(self.status_code()).json(ErrorBody { error: message })
    }
}
