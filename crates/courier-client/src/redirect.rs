//! Redirect handling for the transport.
//!
//! `301`, `302` and `303` are retried as a body-less `GET`; `307` and `308`
//! replay the original method and body. Credentials are not forwarded to a
//! different host or port.

use courier_core::{Method, RawResponse, Request};
use url::Url;

/// Default bound on followed redirects per call.
pub const DEFAULT_MAX_REDIRECTS: u32 = 20;

/// Returns true for the statuses that carry a followable `Location`.
#[must_use]
pub fn is_redirect(status: i32) -> bool {
    matches!(status, 301 | 302 | 303 | 307 | 308)
}

/// Returns the `Location` of a redirect response.
pub(crate) fn location(response: &RawResponse) -> Option<String> {
    if !is_redirect(response.status()) {
        return None;
    }
    response
        .headers()
        .first("Location")
        .map(str::trim)
        .filter(|location| !location.is_empty())
        .map(str::to_string)
}

/// Rewrites `request` for the hop from `from` to `to` answered with `status`.
pub(crate) fn follow(request: Request, status: i32, from: &Url, to: &Url) -> Request {
    let mut request = request.with_url(to.as_str());

    if matches!(status, 301 | 302 | 303) && request.method() != Method::Get {
        request = request
            .with_method(Method::Get)
            .without_body()
            .without_header("Content-Type");
    }

    if !same_authority(from, to) {
        request = request.without_header("Authorization");
    }
    request
}

fn same_authority(a: &Url, b: &Url) -> bool {
    a.host_str() == b.host_str()
        && a.port_or_known_default() == b.port_or_known_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::ResponseHeaders;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn post() -> Request {
        Request::builder("https://api.example.com/a")
            .method(Method::Post)
            .header("authorization", "Bearer abc")
            .json_body(r#"{"x":1}"#)
            .build()
            .unwrap()
    }

    #[test]
    fn test_location_only_for_redirect_statuses() {
        let headers = ResponseHeaders::from_pairs([("location", "/next")]);
        let redirect = RawResponse::new(302, None, headers.clone(), "");
        let ok = RawResponse::new(200, None, headers, "");

        assert_eq!(location(&redirect).as_deref(), Some("/next"));
        assert_eq!(location(&ok), None);
        assert_eq!(
            location(&RawResponse::new(301, None, ResponseHeaders::default(), "")),
            None
        );
    }

    #[test]
    fn test_303_switches_to_get_without_body() {
        let from = url("https://api.example.com/a");
        let to = url("https://api.example.com/b");
        let next = follow(post(), 303, &from, &to);

        assert_eq!(next.method(), Method::Get);
        assert!(next.body().is_none());
        assert!(next.header_ignore_case("Content-Type").is_none());
        assert_eq!(next.url(), "https://api.example.com/b");
        assert_eq!(next.header("authorization"), Some("Bearer abc"));
    }

    #[test]
    fn test_307_replays_method_and_body() {
        let from = url("https://api.example.com/a");
        let to = url("https://api.example.com/b");
        let next = follow(post(), 307, &from, &to);

        assert_eq!(next.method(), Method::Post);
        assert_eq!(next.body().map(|b| b.as_ref()), Some(&br#"{"x":1}"#[..]));
    }

    #[test]
    fn test_cross_origin_drops_authorization() {
        let from = url("https://api.example.com/a");
        for to in ["https://other.example.com/a", "https://api.example.com:8443/a"] {
            let next = follow(post(), 308, &from, &url(to));
            assert!(next.header_ignore_case("Authorization").is_none(), "{to}");
        }
    }
}
