//! Session transport: bearer header or httpOnly cookie.

use axum::http::{
    header::{AUTHORIZATION, COOKIE},
    HeaderMap, HeaderValue,
};

pub const SESSION_COOKIE_NAME: &str = "access_token";

/// Pull the token from the request. The `Authorization: Bearer` header wins
/// over the session cookie.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    extract_bearer_token(headers).or_else(|| extract_cookie_token(headers))
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

fn extract_cookie_token(headers: &HeaderMap) -> Option<String> {
    // Browsers may send several Cookie headers over HTTP/2
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            let (key, val) = pair.trim().split_once('=')?;
            (key.trim() == SESSION_COOKIE_NAME && !val.trim().is_empty())
                .then(|| val.trim().to_string())
        })
}

/// Build the `Set-Cookie` value carrying a freshly issued token
pub fn session_cookie(token: &str, max_age_seconds: i64, secure: bool) -> Option<HeaderValue> {
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_seconds}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).ok()
}

/// Build the `Set-Cookie` value that removes the session cookie
pub fn clear_session_cookie(secure: bool) -> HeaderValue {
    if secure {
        HeaderValue::from_static("access_token=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0; Secure")
    } else {
        HeaderValue::from_static("access_token=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_bearer_header_takes_priority_over_cookie() {
        let map = headers(&[
            ("authorization", "Bearer header-token"),
            ("cookie", "access_token=cookie-token"),
        ]);
        assert_eq!(extract_token(&map).as_deref(), Some("header-token"));
    }

    #[test]
    fn test_cookie_fallback() {
        let map = headers(&[("cookie", "theme=dark; access_token=cookie-token; lang=en")]);
        assert_eq!(extract_token(&map).as_deref(), Some("cookie-token"));

        let map = headers(&[
            ("cookie", "theme=dark"),
            ("cookie", "access_token=second-header"),
        ]);
        assert_eq!(extract_token(&map).as_deref(), Some("second-header"));
    }

    #[test]
    fn test_malformed_bearer_falls_back_to_cookie() {
        let map = headers(&[
            ("authorization", "Basic dXNlcjpwYXNz"),
            ("cookie", "access_token=cookie-token"),
        ]);
        assert_eq!(extract_token(&map).as_deref(), Some("cookie-token"));

        let map = headers(&[("authorization", "Bearer   ")]);
        assert_eq!(extract_token(&map), None);
    }

    #[test]
    fn test_no_token() {
        assert_eq!(extract_token(&HeaderMap::new()), None);
        let map = headers(&[("cookie", "access_token=; other=1")]);
        assert_eq!(extract_token(&map), None);
        let map = headers(&[("cookie", "not_access_token=abc")]);
        assert_eq!(extract_token(&map), None);
    }

    #[test]
    fn test_cookie_attributes() {
        let cookie = session_cookie("abc", 600, false).unwrap();
        let cookie = cookie.to_str().unwrap();
        assert!(cookie.starts_with("access_token=abc;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=600"));
        assert!(!cookie.contains("Secure"));

        let secure = session_cookie("abc", 600, true).unwrap();
        assert!(secure.to_str().unwrap().ends_with("; Secure"));

        let cleared = clear_session_cookie(false);
        assert!(cleared.to_str().unwrap().contains("Max-Age=0"));
    }
}
