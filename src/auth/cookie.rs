use axum::http::{header, HeaderMap};
use cookie::{Cookie, SameSite};
use time::Duration;

/// Name of the session cookie carrying the signed bearer token.
pub const SESSION_COOKIE: &str = "token";

/// `Set-Cookie` value establishing a session. Seven-day lifetime,
/// HttpOnly + Secure, SameSite=None so the browser sends it on
/// cross-origin requests from the web client.
pub fn session_cookie(token: &str, ttl_days: i64) -> String {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .max_age(Duration::days(ttl_days))
        .build()
        .to_string()
}

/// `Set-Cookie` value clearing the session on logout (Max-Age=0).
pub fn expired_session_cookie() -> String {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .max_age(Duration::ZERO)
        .build()
        .to_string()
}

/// Pull the bearer token out of the request's `Cookie` header(s).
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(|c| c.ok())
        .find(|c| c.name() == SESSION_COOKIE)
        .map(|c| c.value().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn session_cookie_carries_required_flags() {
        let value = session_cookie("abc.def.ghi", 7);
        assert!(value.starts_with("token=abc.def.ghi"));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("Secure"));
        assert!(value.contains("SameSite=None"));
        assert!(value.contains("Path=/"));
        assert!(value.contains("Max-Age=604800")); // 7 days
    }

    #[test]
    fn expired_cookie_clears_the_session() {
        let value = expired_session_cookie();
        assert!(value.starts_with("token=;"));
        assert!(value.contains("Max-Age=0"));
    }

    #[test]
    fn token_extracted_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("other=1; token=my-jwt; theme=dark"),
        );
        assert_eq!(token_from_headers(&headers).as_deref(), Some("my-jwt"));
    }

    #[test]
    fn missing_cookie_yields_none() {
        let headers = HeaderMap::new();
        assert_eq!(token_from_headers(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark"));
        assert_eq!(token_from_headers(&headers), None);
    }
}
