use api_types::ErrorResponse;
use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::{EngineError, ErrorKind};

pub use server::{router, run, run_with_listener, spawn_with_listener};

mod containers;
mod kinds;
mod mapping;
mod operations;
mod server;

pub enum ServerError {
    Engine(EngineError),
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match (err, err.kind()) {
        (EngineError::KeyNotFound(_), _) => StatusCode::NOT_FOUND,
        (_, ErrorKind::Validation) => StatusCode::UNPROCESSABLE_ENTITY,
        (_, ErrorKind::Precondition | ErrorKind::Conflict) => StatusCode::CONFLICT,
        (_, ErrorKind::Store) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let ServerError::Engine(err) = self;
        let status = status_for_engine_error(&err);
        let kind = err.kind();
        let body = ErrorResponse {
            kind: kind.as_str().to_string(),
            error: message_for_engine_error(err),
            retryable: kind.is_retryable(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}
