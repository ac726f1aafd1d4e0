use std::path::Path;

use axum::body::Body;
use axum::http::{header, HeaderValue, Request};
use axum::response::Response;
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::error::ToolkitError;

/// Creates a directory and all missing parents with mode `rwxr-xr-x`.
///
/// Succeeds without touching anything when the directory already exists.
pub async fn create_dir_if_not_exist(path: impl AsRef<Path>) -> Result<(), ToolkitError> {
    let path = path.as_ref();
    let mut builder = tokio::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(0o755);
    builder.create(path).await?;
    Ok(())
}

/// Serves `dir/file_name` as a forced browser download under `display_name`.
///
/// Byte serving, range requests, and caching headers are delegated to
/// [`ServeFile`]; this only adds the `Content-Disposition` header so the
/// browser saves the payload instead of rendering it.
pub async fn download_static_file(
    req: Request<Body>,
    dir: impl AsRef<Path>,
    file_name: &str,
    display_name: &str,
) -> Result<Response, ToolkitError> {
    let disposition = format!(
        "attachment; filename=\"{}\"",
        display_name.replace('"', "\\\"")
    );
    let disposition = HeaderValue::from_str(&disposition)?;

    let path = dir.as_ref().join(file_name);
    let response = match ServeFile::new(path).oneshot(req).await {
        Ok(response) => response,
        Err(infallible) => match infallible {},
    };

    let mut response = response.map(Body::new);
    response
        .headers_mut()
        .insert(header::CONTENT_DISPOSITION, disposition);
    Ok(response)
}
