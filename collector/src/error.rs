use axum::{
    http::StatusCode,
    response::{
        IntoResponse,
        Response,
    },
};
use census_sink::SinkError;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("unsupported content type {0:?}, expected application/json")]
    UnsupportedMediaType(String),
    #[error("request body exceeds {0} bytes")]
    PayloadTooLarge(usize),
    #[error("timed out reading request body")]
    Timeout,
    #[error("unable to read request body: {0}")]
    ReadBody(axum::Error),
    #[error("unable to decode record: {0}")]
    BadRecord(#[from] serde_json::Error),
    #[error("unable to store record: {0}")]
    Store(#[from] SinkError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Timeout => StatusCode::REQUEST_TIMEOUT,
            Self::ReadBody(_) | Self::BadRecord(_) => StatusCode::BAD_REQUEST,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{self}");
        } else {
            debug!(%status, "rejected record: {self}");
        }
        (status, format!("Error: {self}")).into_response()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn maps_errors_to_status_codes() {
        assert_eq!(
            AppError::UnsupportedMediaType("text/plain".into()).status(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(AppError::PayloadTooLarge(10).status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(AppError::Timeout.status(), StatusCode::REQUEST_TIMEOUT);
        let decode = serde_json::from_str::<()>("{").unwrap_err();
        assert_eq!(AppError::from(decode).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::from(SinkError::UnknownSpec("x".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
