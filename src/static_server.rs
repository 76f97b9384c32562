use mime_guess::from_path;
use rust_embed::RustEmbed;
use spin_sdk::http::Response;

use crate::core::errors::ApiError;
use crate::core::helpers::CORS_ORIGIN;

#[derive(RustEmbed)]
#[folder = "static"]
struct Assets;

/// Serves the embedded browser client. Extensionless paths fall back to
/// `index.html` so the client can route them itself.
pub fn serve_static(path: &str) -> anyhow::Result<Response> {
    let requested = match path.trim_start_matches('/') {
        "" => "index.html",
        p => p,
    };

    let (file_path, file) = match Assets::get(requested) {
        Some(file) => (requested, file),
        None if !requested.contains('.') => match Assets::get("index.html") {
            Some(file) => ("index.html", file),
            None => return Ok(ApiError::NotFound("File not found".to_string()).into()),
        },
        None => return Ok(ApiError::NotFound("File not found".to_string()).into()),
    };

    let mime = from_path(file_path).first_or_octet_stream();

    Ok(Response::builder()
        .status(200)
        .header("Content-Type", mime.as_ref())
        .header("Access-Control-Allow-Origin", CORS_ORIGIN)
        .body(file.data.to_vec())
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content_type(resp: &Response) -> String {
        resp.header("content-type")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    }

    #[test]
    fn serves_index_for_root() {
        let resp = serve_static("/").unwrap();
        assert_eq!(*resp.status(), 200);
        assert!(content_type(&resp).starts_with("text/html"));
    }

    #[test]
    fn guesses_asset_types() {
        let resp = serve_static("/app.js").unwrap();
        assert_eq!(*resp.status(), 200);
        assert!(content_type(&resp).contains("javascript"));

        let resp = serve_static("/style.css").unwrap();
        assert!(content_type(&resp).starts_with("text/css"));
    }

    #[test]
    fn client_routes_fall_back_to_index() {
        let resp = serve_static("/blog/welcome").unwrap();
        assert!(content_type(&resp).starts_with("text/html"));
    }

    #[test]
    fn missing_files_are_not_found() {
        let resp = serve_static("/missing.png").unwrap();
        assert_eq!(*resp.status(), 404);
    }
}
