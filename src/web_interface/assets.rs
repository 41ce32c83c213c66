use rust_embed::RustEmbed;
use warp::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use warp::reply::{self, Response};
use warp::Reply;

/// The polling page, compiled into the binary.
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/web/"]
struct Assets;

const INDEX: &str = "index.html";

/// Looks up an embedded file by request path; the empty path maps to the index page.
pub fn asset_response(path: &str) -> Option<Response> {
    let path = match path.trim_start_matches('/') {
        "" => INDEX,
        p => p,
    };
    let file = Assets::get(path)?;
    let mime = mime_guess::from_path(path).first_or_octet_stream();

    let response = reply::with_header(file.data.into_owned(), CONTENT_TYPE, mime.as_ref());
    Some(reply::with_header(response, CACHE_CONTROL, "no-cache").into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use warp::http::StatusCode;

    #[test]
    fn root_serves_index() {
        let response = asset_response("").unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/html");
    }

    #[test]
    fn script_and_style_have_their_types() {
        let script = asset_response("script.js").unwrap();
        assert!(script.headers()[CONTENT_TYPE]
            .to_str()
            .unwrap()
            .contains("javascript"));
        let style = asset_response("style.css").unwrap();
        assert_eq!(style.headers()[CONTENT_TYPE], "text/css");
    }

    #[test]
    fn unknown_files_are_absent() {
        assert!(asset_response("missing.png").is_none());
        assert!(asset_response("../Cargo.toml").is_none());
    }
}
