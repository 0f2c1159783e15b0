use super::{ApiError, AppState};
use axum::extract::State;
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use std::path::{Component, Path, PathBuf};

const INDEX_FILE: &str = "index.html";

/// Serves files from the public directory; any other `GET` gets the main page.
pub(crate) async fn static_fallback(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return ApiError::not_found("Not found").into_response();
    }

    let public_dir = state.public_dir.as_path();
    let mut target = public_dir.join(INDEX_FILE);
    let request_path = decode_request_path(uri.path());
    if let Some(path) = request_path.and_then(|decoded| resolve_static_path(public_dir, &decoded)) {
        if tokio::fs::metadata(&path).await.map(|meta| meta.is_file()).unwrap_or(false) {
            target = path;
        }
    }

    match tokio::fs::read(&target).await {
        Ok(bytes) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, content_type_for(&target))],
            bytes,
        )
            .into_response(),
        Err(error) => {
            tracing::warn!(path = %target.display(), error = %error, "static file unavailable");
            ApiError::not_found("Not found").into_response()
        }
    }
}

/// Percent-decodes a URI path. `None` when the decoded bytes are not UTF-8.
pub(crate) fn decode_request_path(raw: &str) -> Option<String> {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let high = (bytes[i + 1] as char).to_digit(16);
            let low = (bytes[i + 2] as char).to_digit(16);
            if let (Some(high), Some(low)) = (high, low) {
                out.push(((high << 4) | low) as u8);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8(out).ok()
}

/// Maps a decoded request path onto the public directory. Returns `None` for the root and
/// for anything that is not a plain relative path.
pub(crate) fn resolve_static_path(public_dir: &Path, request_path: &str) -> Option<PathBuf> {
    let relative = Path::new(request_path.trim_start_matches('/'));
    if relative.as_os_str().is_empty() {
        return None;
    }
    if !relative
        .components()
        .all(|component| matches!(component, Component::Normal(_)))
    {
        return None;
    }
    Some(public_dir.join(relative))
}

fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") | Some("mjs") => "text/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("ico") => "image/x-icon",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::{content_type_for, decode_request_path, resolve_static_path};
    use std::path::{Path, PathBuf};

    #[test]
    fn plain_paths_resolve_inside_public_dir() {
        let root = Path::new("/srv/public");
        assert_eq!(
            resolve_static_path(root, "/css/style.css"),
            Some(PathBuf::from("/srv/public/css/style.css"))
        );
        assert_eq!(resolve_static_path(root, "/"), None);
    }

    #[test]
    fn traversal_attempts_fall_back() {
        let root = Path::new("/srv/public");
        assert_eq!(resolve_static_path(root, "/../secret.txt"), None);
        assert_eq!(resolve_static_path(root, "/js/../../etc/passwd"), None);
    }

    #[test]
    fn request_paths_are_percent_decoded() {
        assert_eq!(decode_request_path("/my%20file.css").as_deref(), Some("/my file.css"));
        assert_eq!(decode_request_path("/caf%C3%A9.txt").as_deref(), Some("/café.txt"));
        assert_eq!(decode_request_path("/100%.txt").as_deref(), Some("/100%.txt"));
        assert_eq!(decode_request_path("/%ff"), None);
    }

    #[test]
    fn encoded_traversal_still_falls_back() {
        let root = Path::new("/srv/public");
        let decoded = decode_request_path("/%2E%2E/secret.txt").expect("utf-8");
        assert_eq!(resolve_static_path(root, &decoded), None);
    }

    #[test]
    fn content_type_follows_extension() {
        assert_eq!(content_type_for(Path::new("index.html")), "text/html; charset=utf-8");
        assert_eq!(content_type_for(Path::new("blob.bin")), "application/octet-stream");
    }
}
