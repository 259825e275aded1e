use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use repas_core::RepasError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WebError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Core(#[from] RepasError),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebError::BadRequest(_) => StatusCode::BAD_REQUEST,
            WebError::NotFound(_) => StatusCode::NOT_FOUND,
            WebError::Core(e) => match e {
                RepasError::InvalidInput(_) | RepasError::UnsupportedExtension(_) => {
                    StatusCode::BAD_REQUEST
                }
                RepasError::ConfigurationMissing | RepasError::StorageUnavailable => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                RepasError::Upload(_) | RepasError::Insert { .. } | RepasError::Query { .. } => {
                    StatusCode::BAD_GATEWAY
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        };
        if status.is_server_error() {
            tracing::error!("{}", self);
        }

        (status, self.to_string()).into_response()
    }
}
