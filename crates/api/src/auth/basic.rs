//! Basic Authorization header parsing

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

/// Credentials carried in a `Authorization: Basic` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub secret: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("basic auth credentials in header invalid")]
pub struct MalformedHeader;

impl Credentials {
    /// Extract Basic credentials from request headers.
    ///
    /// `Ok(None)` when no Basic header is present at all — callers decide
    /// whether that is a 401 (protected endpoints) or an anonymous flow
    /// (registration). A header that is present but undecodable is an error
    /// so it surfaces as 400, never as a silent anonymous registration.
    pub fn from_headers(headers: &HeaderMap) -> Result<Option<Self>, MalformedHeader> {
        let header = match headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
            Some(value) => value,
            None => return Ok(None),
        };

        let encoded = match split_basic_scheme(header) {
            Some(rest) => rest,
            None => return Ok(None),
        };

        let decoded = BASE64.decode(encoded).map_err(|_| MalformedHeader)?;
        let decoded = String::from_utf8(decoded).map_err(|_| MalformedHeader)?;

        // Secrets may themselves contain ':', usernames may not
        let (username, secret) = decoded.split_once(':').ok_or(MalformedHeader)?;
        if username.is_empty() {
            return Err(MalformedHeader);
        }

        Ok(Some(Self {
            username: username.to_string(),
            secret: secret.to_string(),
        }))
    }
}

/// Scheme match is case-insensitive per RFC 7617.
fn split_basic_scheme(header: &str) -> Option<&str> {
    let (scheme, rest) = header.split_once(' ')?;
    scheme.eq_ignore_ascii_case("Basic").then(|| rest.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn basic(username: &str, secret: &str) -> String {
        format!("Basic {}", BASE64.encode(format!("{username}:{secret}")))
    }

    #[test]
    fn test_parses_valid_header() {
        let headers = headers_with_auth(&basic("alice", "s3cret"));
        let creds = Credentials::from_headers(&headers).unwrap().unwrap();
        assert_eq!(creds.username, "alice");
        assert_eq!(creds.secret, "s3cret");
    }

    #[test]
    fn test_secret_may_contain_colon() {
        let headers = headers_with_auth(&basic("alice", "a:b:c"));
        let creds = Credentials::from_headers(&headers).unwrap().unwrap();
        assert_eq!(creds.secret, "a:b:c");
    }

    #[test]
    fn test_missing_header_is_none() {
        assert_eq!(Credentials::from_headers(&HeaderMap::new()), Ok(None));
    }

    #[test]
    fn test_non_basic_scheme_is_none() {
        let headers = headers_with_auth("Bearer some-token");
        assert_eq!(Credentials::from_headers(&headers), Ok(None));
    }

    #[test]
    fn test_scheme_is_case_insensitive() {
        let encoded = BASE64.encode("bob:pw");
        let headers = headers_with_auth(&format!("basic {encoded}"));
        let creds = Credentials::from_headers(&headers).unwrap().unwrap();
        assert_eq!(creds.username, "bob");
    }

    #[test]
    fn test_invalid_base64_is_error() {
        let headers = headers_with_auth("Basic ///not-base64///");
        assert_eq!(Credentials::from_headers(&headers), Err(MalformedHeader));
    }

    #[test]
    fn test_missing_separator_is_error() {
        let encoded = BASE64.encode("no-colon-here");
        let headers = headers_with_auth(&format!("Basic {encoded}"));
        assert_eq!(Credentials::from_headers(&headers), Err(MalformedHeader));
    }

    #[test]
    fn test_empty_username_is_error() {
        let encoded = BASE64.encode(":secret-only");
        let headers = headers_with_auth(&format!("Basic {encoded}"));
        assert_eq!(Credentials::from_headers(&headers), Err(MalformedHeader));
    }
}
