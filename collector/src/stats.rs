use crate::{
    error::AppError,
    router::AppState,
};
use axum::{
    body::Body,
    extract::State,
    http::{
        header::CONTENT_TYPE,
        HeaderMap,
        StatusCode,
    },
};
use census_report::Record;
use http_body_util::LengthLimitError;
use std::error::Error as _;

/// `POST /api/v1/stats`: store one record.
pub(crate) async fn store_record(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Result<StatusCode, AppError> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !is_json(content_type) {
        return Err(AppError::UnsupportedMediaType(content_type.to_string()));
    }

    let read = axum::body::to_bytes(body, state.max_body_bytes);
    let bytes = match tokio::time::timeout(state.read_timeout, read).await {
        Err(_) => return Err(AppError::Timeout),
        Ok(Err(err)) if exceeds_limit(&err) => return Err(AppError::PayloadTooLarge(state.max_body_bytes)),
        Ok(Err(err)) => return Err(AppError::ReadBody(err)),
        Ok(Ok(bytes)) => bytes,
    };

    let mut record: Record = serde_json::from_slice(&bytes)?;
    // The receipt time is authoritative, whatever the sender claimed.
    record.stamp_now();
    trace!(?record, "received record");

    state.sink.store(&record).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Media type check that ignores parameters such as `charset`.
fn is_json(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|media_type| media_type.trim().eq_ignore_ascii_case("application/json"))
}

fn exceeds_limit(err: &axum::Error) -> bool {
    std::iter::successors(err.source(), |e| (*e).source()).any(|e| e.is::<LengthLimitError>())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn json_media_type_ignores_parameters() {
        assert!(is_json("application/json"));
        assert!(is_json("application/json; charset=utf-8"));
        assert!(is_json("Application/JSON"));
        assert!(!is_json(""));
        assert!(!is_json("text/plain"));
        assert!(!is_json("application/jsonx"));
        assert!(!is_json("application/x-www-form-urlencoded"));
    }
}
