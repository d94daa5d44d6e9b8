//! Stylesheet and wall scripts, embedded in the binary.

use axum::extract::Path;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use rust_embed::Embed;

#[derive(Embed)]
#[folder = "assets/"]
struct Assets;

const CACHE_CONTROL: &str = "public, max-age=86400";

/// GET /assets/{*path}
///
/// Each asset carries an ETag derived from its embedded content hash, so a
/// revalidating browser gets a bodyless 304 until the binary changes.
pub async fn serve(Path(path): Path<String>, headers: HeaderMap) -> Response {
    let Some(file) = Assets::get(&path) else {
        tracing::debug!("Unknown asset requested: {}", path);
        return StatusCode::NOT_FOUND.into_response();
    };

    let etag = etag(&file.metadata.sha256_hash());
    let fresh = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.split(',').any(|tag| tag.trim() == etag));
    if fresh {
        return (
            StatusCode::NOT_MODIFIED,
            [(header::ETAG, etag), (header::CACHE_CONTROL, CACHE_CONTROL.to_string())],
        )
            .into_response();
    }

    let mime = mime_guess::from_path(&path).first_or_octet_stream();
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime.as_ref().to_string()),
            (header::CACHE_CONTROL, CACHE_CONTROL.to_string()),
            (header::ETAG, etag),
        ],
        file.data.to_vec(),
    )
        .into_response()
}

fn etag(hash: &[u8]) -> String {
    let hex: String = hash.iter().take(8).map(|b| format!("{:02x}", b)).collect();
    format!("\"{}\"", hex)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[tokio::test]
    async fn serves_embedded_stylesheet() {
        let response = serve(Path("css/site.css".to_string()), HeaderMap::new()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/css"
        );
    }

    #[tokio::test]
    async fn wall_script_is_javascript() {
        let response = serve(Path("js/wall.js".to_string()), HeaderMap::new()).await;
        assert_eq!(response.status(), StatusCode::OK);
        let mime = response.headers().get(header::CONTENT_TYPE).unwrap();
        assert!(mime.to_str().unwrap().contains("javascript"));
    }

    #[tokio::test]
    async fn matching_etag_is_not_modified() {
        let first = serve(Path("js/wall.js".to_string()), HeaderMap::new()).await;
        let tag = first.headers().get(header::ETAG).unwrap().clone();

        let mut headers = HeaderMap::new();
        headers.insert(header::IF_NONE_MATCH, tag.clone());
        let again = serve(Path("js/wall.js".to_string()), headers).await;
        assert_eq!(again.status(), StatusCode::NOT_MODIFIED);
        assert_eq!(again.headers().get(header::ETAG).unwrap(), &tag);

        let mut stale = HeaderMap::new();
        stale.insert(header::IF_NONE_MATCH, HeaderValue::from_static("\"0000\""));
        let changed = serve(Path("js/wall.js".to_string()), stale).await;
        assert_eq!(changed.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_asset_is_404() {
        let response = serve(Path("nope.js".to_string()), HeaderMap::new()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
