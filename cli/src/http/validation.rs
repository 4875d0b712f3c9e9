//! Request extraction helpers

use axum::extract::rejection::JsonRejection;
use axum::http::{header, HeaderMap};
use ccproxy_core::api::Headers;

use super::models::HttpServerError;

/// Inbound headers as a plain map. Values that are not visible ASCII are dropped.
/// Repeated headers are folded into one value, `; ` separated for `cookie` and
/// `, ` separated otherwise.
pub fn client_headers(headers: &HeaderMap) -> Headers {
    let mut out = Headers::new();
    for (name, value) in headers {
        let Ok(value) = value.to_str() else {
            continue;
        };
        let separator = if *name == header::COOKIE { "; " } else { ", " };
        out.entry(name.as_str().to_string())
            .and_modify(|folded: &mut String| {
                folded.push_str(separator);
                folded.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
    out
}

pub fn invalid_json(rejection: JsonRejection) -> HttpServerError {
    HttpServerError::InvalidRequest(rejection.body_text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_client_headers_skips_opaque_values() {
        let mut map = HeaderMap::new();
        map.insert("authorization", HeaderValue::from_static("Bearer t"));
        map.insert(
            "x-binary",
            HeaderValue::from_bytes(&[0xfa, 0xfb]).unwrap(),
        );

        let headers = client_headers(&map);
        assert_eq!(headers.get("authorization").map(String::as_str), Some("Bearer t"));
        assert!(!headers.contains_key("x-binary"));
    }

    #[test]
    fn test_client_headers_folds_repeated_values() {
        let mut map = HeaderMap::new();
        map.append(header::COOKIE, HeaderValue::from_static("sid=1"));
        map.append(header::COOKIE, HeaderValue::from_static("theme=dark"));
        map.append(header::ACCEPT, HeaderValue::from_static("application/json"));
        map.append(header::ACCEPT, HeaderValue::from_static("text/plain"));
        map.append("x-trace-id", HeaderValue::from_static("abc"));

        let headers = client_headers(&map);
        assert_eq!(headers.get("cookie").map(String::as_str), Some("sid=1; theme=dark"));
        assert_eq!(
            headers.get("accept").map(String::as_str),
            Some("application/json, text/plain")
        );
        assert_eq!(headers.get("x-trace-id").map(String::as_str), Some("abc"));
    }
}
