use axum::{
    extract::{Path, State},
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};

use crate::infra::http::error::ApiError;
use crate::infra::http::state::AppState;
use crate::infra::uploads::UploadStorageError;

/// Serve a stored binary. Media is public by design, so the CORS policy here
/// is wide open rather than tied to the configured frontend origins.
pub async fn serve(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, ApiError> {
    let data = state.storage.read(&path).await.map_err(|err| match err {
        UploadStorageError::InvalidPath => ApiError::bad_request("Invalid media path"),
        UploadStorageError::Io(io)
            if io.kind() == std::io::ErrorKind::NotFound =>
        {
            ApiError::not_found("Media not found")
        }
        UploadStorageError::Io(io) => {
            tracing::error!(error = %io, path = %path, "media read failed");
            ApiError::internal()
        }
    })?;

    let mime = mime_guess::from_path(&path).first_or_octet_stream();

    let mut response = data.into_response();
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=86400"),
    );

    Ok(response)
}
