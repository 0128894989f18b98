//! `refreshToken` cookie handling

use axum::http::{header::COOKIE, HeaderMap};

use crate::common::config::REFRESH_TOKEN_TTL_SECS;

pub const REFRESH_COOKIE: &str = "refreshToken";

fn attributes(secure: bool) -> &'static str {
    if secure {
        "Path=/; HttpOnly; Secure; SameSite=Strict"
    } else {
        "Path=/; HttpOnly; SameSite=Strict"
    }
}

/// `Set-Cookie` value carrying a refresh token for 7 days
pub fn refresh_cookie(token: &str, secure: bool) -> String {
    format!(
        "{}={}; {}; Max-Age={}",
        REFRESH_COOKIE,
        token,
        attributes(secure),
        REFRESH_TOKEN_TTL_SECS
    )
}

/// `Set-Cookie` value that expires the refresh token immediately
pub fn clear_refresh_cookie(secure: bool) -> String {
    format!("{}=; {}; Max-Age=0", REFRESH_COOKIE, attributes(secure))
}

/// Reads the refresh token from the request's `Cookie` headers
pub fn read_refresh_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == REFRESH_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_cookie_attributes() {
        let cookie = refresh_cookie("abc.def.ghi", true);
        assert_eq!(
            cookie,
            "refreshToken=abc.def.ghi; Path=/; HttpOnly; Secure; SameSite=Strict; Max-Age=604800"
        );
        assert!(!refresh_cookie("t", false).contains("Secure"));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        assert!(clear_refresh_cookie(true).starts_with("refreshToken=;"));
        assert!(clear_refresh_cookie(true).ends_with("Max-Age=0"));
    }

    #[test]
    fn test_read_refresh_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, "theme=dark; refreshToken=tok123; lang=en".parse().unwrap());
        assert_eq!(read_refresh_cookie(&headers).as_deref(), Some("tok123"));

        let mut empty = HeaderMap::new();
        empty.insert(COOKIE, "refreshToken=".parse().unwrap());
        assert!(read_refresh_cookie(&empty).is_none());
        assert!(read_refresh_cookie(&HeaderMap::new()).is_none());
    }
}
