use std::borrow::Cow;

use tracing::warn;
use url::Url;

use crate::expiration::parse_cookie_date;
use crate::{Cookie, Expiration};

impl<'c> Cookie<'c> {
    /// Parses a `Set-Cookie` header value into a [`Cookie`].
    ///
    /// The first `name=value` segment is mandatory. Everything after it is
    /// an attribute: `Expires`, `Domain` and `Path` are recognized
    /// (case-insensitively), a bare `Secure` token sets the secure flag,
    /// and anything else is ignored so that unknown attributes never fail
    /// the parse.
    ///
    /// `source` is the URL the response came from: it provides the default
    /// domain (its host) and path when the header doesn't carry them, so a
    /// parsed cookie always has both.
    ///
    /// An `Expires` date that cannot be parsed downgrades the cookie to a
    /// session cookie instead of failing.
    ///
    /// # Example
    ///
    /// ```rust
    /// use barattolo::Cookie;
    /// use barattolo::url::Url;
    ///
    /// let source = Url::parse("https://example.com/app").unwrap();
    /// let cookie = Cookie::parse("sid=abc123; Domain=example.com; Path=/; Secure", &source).unwrap();
    /// assert_eq!(cookie.name_value(), ("sid", "abc123"));
    /// assert_eq!(cookie.domain(), Some("example.com"));
    /// assert_eq!(cookie.path(), Some("/"));
    /// assert!(cookie.secure());
    /// assert!(cookie.expires().is_session());
    ///
    /// // Domain and path default from the source URL.
    /// let source = Url::parse("http://x.test/p/q").unwrap();
    /// let cookie = Cookie::parse("a=1", &source).unwrap();
    /// assert_eq!(cookie.domain(), Some("x.test"));
    /// assert_eq!(cookie.path(), Some("/p/q"));
    /// ```
    pub fn parse(header: &'c str, source: &Url) -> Result<Cookie<'c>, ParseError> {
        let mut segments = header.split(';');
        // `split` always yields at least one item.
        let first = segments.next().unwrap_or_default().trim();

        let (name, value) = match first.split_once('=') {
            Some((name, value)) => (name.trim(), value.trim()),
            None => {
                let e = MissingPairError {
                    fragment: first.to_string(),
                };
                return Err(ParseError::MissingPair(e));
            }
        };
        if name.is_empty() {
            let e = EmptyNameError {
                value: value.to_string(),
            };
            return Err(ParseError::EmptyName(e));
        }

        let mut cookie = Cookie::new(name, value);
        for segment in segments {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            match segment.split_once('=') {
                None => {
                    // `Secure` is the only bare attribute acted upon;
                    // `HttpOnly` and friends fall through here.
                    if segment.eq_ignore_ascii_case("secure") {
                        cookie.secure = true;
                    }
                }
                Some((key, attr_value)) => {
                    let key = key.trim();
                    let attr_value = attr_value.trim();
                    if key.eq_ignore_ascii_case("expires") {
                        match parse_cookie_date(attr_value) {
                            Ok(t) => cookie.expires = Expiration::DateTime(t),
                            Err(error) => {
                                warn!(
                                    date = attr_value,
                                    %error,
                                    "cannot parse `Expires` attribute, downgrading to a session cookie"
                                );
                            }
                        }
                    } else if key.eq_ignore_ascii_case("domain") {
                        // An empty value means "no domain restriction".
                        cookie.domain =
                            (!attr_value.is_empty()).then(|| Cow::Borrowed(attr_value));
                    } else if key.eq_ignore_ascii_case("path") {
                        cookie.path = (!attr_value.is_empty()).then(|| Cow::Borrowed(attr_value));
                    }
                }
            }
        }

        if cookie.domain.is_none() {
            if let Some(host) = source.host_str() {
                cookie.domain = Some(Cow::Owned(host.to_owned()));
            }
        }
        if cookie.path.is_none() {
            cookie.path = Some(Cow::Owned(source.path().to_owned()));
        }

        Ok(cookie)
    }
}

#[derive(Debug)]
#[non_exhaustive]
/// The error returned by [`Cookie::parse()`].
pub enum ParseError {
    MissingPair(MissingPairError),
    EmptyName(EmptyNameError),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to parse a cookie out of a `Set-Cookie` header value")
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::MissingPair(e) => Some(e),
            ParseError::EmptyName(e) => Some(e),
        }
    }
}

#[derive(Debug)]
/// An error that occurs when the mandatory first segment of a `Set-Cookie`
/// header value doesn't contain a name-value separator (`=`).
pub struct MissingPairError {
    fragment: String,
}

impl std::fmt::Display for MissingPairError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Expected a name-value pair, but no `=` was found in `{}`",
            self.fragment
        )
    }
}

impl std::error::Error for MissingPairError {}

#[derive(Debug)]
/// An error that occurs when the mandatory first segment of a `Set-Cookie`
/// header value has an empty name (e.g. `=value`).
pub struct EmptyNameError {
    value: String,
}

impl std::fmt::Display for EmptyNameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "The name of a cookie cannot be empty, but found an empty name with `{}` as value",
            self.value
        )
    }
}

impl std::error::Error for EmptyNameError {}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use googletest::prelude::{displays_as, eq, verify_that};
    use url::Url;

    use crate::{Cookie, Expiration};
    use time::macros::datetime;

    fn source(url: &str) -> Url {
        Url::parse(url).unwrap()
    }

    #[test]
    fn parses_all_recognized_attributes() {
        let uri = source("https://example.com/app");
        let cookie =
            Cookie::parse("sid=abc123; Domain=example.com; Path=/; Secure", &uri).unwrap();
        assert_eq!(cookie.name_value(), ("sid", "abc123"));
        assert_eq!(cookie.domain(), Some("example.com"));
        assert_eq!(cookie.path(), Some("/"));
        assert!(cookie.secure());
        assert_eq!(cookie.expires(), Expiration::Session);
    }

    #[test]
    fn defaults_domain_and_path_from_source() {
        let uri = source("http://x.test/p/q");
        let cookie = Cookie::parse("a=1", &uri).unwrap();
        assert_eq!(cookie.name_value(), ("a", "1"));
        assert_eq!(cookie.domain(), Some("x.test"));
        assert_eq!(cookie.path(), Some("/p/q"));
        assert!(!cookie.secure());
    }

    #[test]
    fn parses_expires_attribute() {
        let uri = source("https://example.com/");
        let cookie =
            Cookie::parse("a=1; expires=Wed, 09-Jun-2021 10:18:14 GMT", &uri).unwrap();
        assert_eq!(
            cookie.expires_datetime(),
            Some(datetime!(2021-06-09 10:18:14 UTC))
        );
    }

    #[test]
    fn bad_expires_degrades_to_session() {
        let uri = source("https://example.com/");
        let cookie = Cookie::parse("a=1; expires=whenever", &uri).unwrap();
        assert_eq!(cookie.name_value(), ("a", "1"));
        assert!(cookie.expires().is_session());
    }

    #[test]
    fn attribute_keys_are_case_insensitive() {
        let uri = source("https://example.com/");
        let cookie =
            Cookie::parse("a=1; DOMAIN=other.test; path=/x; SECURE", &uri).unwrap();
        assert_eq!(cookie.domain(), Some("other.test"));
        assert_eq!(cookie.path(), Some("/x"));
        assert!(cookie.secure());
    }

    #[test]
    fn empty_domain_and_path_values_mean_absent() {
        let uri = source("https://example.com/app");
        let cookie = Cookie::parse("a=1; Domain=; Path=", &uri).unwrap();
        // Absent after the attribute pass, so the source defaults kick in.
        assert_eq!(cookie.domain(), Some("example.com"));
        assert_eq!(cookie.path(), Some("/app"));
    }

    #[test]
    fn unknown_attributes_are_ignored() {
        let uri = source("https://example.com/");
        let cookie =
            Cookie::parse("a=1; HttpOnly; SameSite=Lax; Max-Age=3600; mystery", &uri).unwrap();
        assert_eq!(cookie.name_value(), ("a", "1"));
        assert!(!cookie.secure());
        assert!(cookie.expires().is_session());
    }

    #[test]
    fn value_keeps_everything_after_the_first_equals() {
        let uri = source("https://example.com/");
        let cookie = Cookie::parse("token=a=b=c", &uri).unwrap();
        assert_eq!(cookie.value(), "a=b=c");
    }

    #[test]
    fn missing_pair_is_an_error() -> googletest::Result<()> {
        let uri = source("https://example.com/");
        let err = Cookie::parse("just-a-token", &uri).unwrap_err();
        verify_that!(
            err.source().unwrap().to_string(),
            displays_as(eq(
                "Expected a name-value pair, but no `=` was found in `just-a-token`"
            ))
        )
    }

    #[test]
    fn empty_name_is_an_error() -> googletest::Result<()> {
        let uri = source("https://example.com/");
        let err = Cookie::parse("=value", &uri).unwrap_err();
        verify_that!(
            err.source().unwrap().to_string(),
            displays_as(eq(
                "The name of a cookie cannot be empty, but found an empty name with `value` as value"
            ))
        )
    }

    #[test]
    fn tolerates_missing_space_after_semicolon() {
        let uri = source("https://example.com/");
        let cookie = Cookie::parse("a=1;Secure;Domain=example.com", &uri).unwrap();
        assert!(cookie.secure());
        assert_eq!(cookie.domain(), Some("example.com"));
    }
}
