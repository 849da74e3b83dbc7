//! Browser listener script.
//!
//! Pages opt in to live reload by including this script from the notifier.

use axum::http::header;
use axum::response::IntoResponse;

/// Path the script is served under.
pub(crate) const SCRIPT_PATH: &str = "/livereload.js";

const SCRIPT: &str = include_str!("../assets/livereload.js");

/// Serve the embedded listener script.
pub(crate) async fn serve_client_script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/javascript; charset=utf-8")],
        SCRIPT,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn test_script_speaks_the_reload_protocol() {
        assert!(SCRIPT.contains(r#"RELOAD_SIGNAL = "reload""#));
        assert!(SCRIPT.contains("RECONNECT_DELAY_MS = 1000"));
    }

    #[tokio::test]
    async fn test_serve_client_script() {
        let response = serve_client_script().await.into_response();

        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/javascript; charset=utf-8"
        );
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body.as_ref(), SCRIPT.as_bytes());
    }
}
