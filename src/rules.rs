//! Cookie eligibility checks.
//!
//! Given a stored [`Cookie`] and the URL of an outgoing request, decide
//! whether the cookie should travel with it. All checks are pure; the
//! expiration of a cookie is the jar's business, not this module's.
//!
//! Domain and path use **containment** matching (the request host must
//! contain the cookie domain as a substring, likewise for paths). This is
//! deliberately looser than the RFC 6265 suffix/prefix rules and is kept
//! that way: tightening it would change which cookies are sent.

use url::Url;

use crate::Cookie;

/// Returns `true` if `cookie` is eligible to be sent with a request to
/// `request_url`.
///
/// Eligibility requires all three of the domain, path, and secure checks
/// to pass.
///
/// # Example
///
/// ```rust
/// use barattolo::{is_eligible, Cookie};
/// use barattolo::url::Url;
///
/// let cookie = Cookie::new("sid", "abc").set_domain("example.com").set_secure(true);
///
/// let https = Url::parse("https://example.com/").unwrap();
/// assert!(is_eligible(&cookie, &https));
///
/// // A secure cookie never travels over plain http.
/// let http = Url::parse("http://example.com/").unwrap();
/// assert!(!is_eligible(&cookie, &http));
/// ```
pub fn is_eligible(cookie: &Cookie<'_>, request_url: &Url) -> bool {
    domain_matches(cookie, request_url)
        && path_matches(cookie, request_url)
        && secure_matches(cookie, request_url)
}

fn domain_matches(cookie: &Cookie<'_>, request_url: &Url) -> bool {
    let Some(host) = request_url.host_str() else {
        return false;
    };
    match cookie.domain() {
        Some(domain) => host.contains(domain),
        None => true,
    }
}

fn path_matches(cookie: &Cookie<'_>, request_url: &Url) -> bool {
    let request_path = request_url.path();
    // A rootless request path only accepts cookies that are themselves
    // unrestricted or scoped to the root.
    if request_path.is_empty() || request_path == "/" {
        return matches!(cookie.path(), None | Some("/"));
    }
    match cookie.path() {
        Some(path) => request_path.contains(path),
        None => true,
    }
}

fn secure_matches(cookie: &Cookie<'_>, request_url: &Url) -> bool {
    // `Url` normalizes the scheme to lowercase, so a plain comparison is
    // already case-insensitive.
    !cookie.secure() || request_url.scheme() == "https"
}

#[cfg(test)]
mod tests {
    use super::is_eligible;
    use crate::Cookie;
    use url::Url;

    fn url(value: &str) -> Url {
        Url::parse(value).unwrap()
    }

    #[test]
    fn domain_uses_containment() {
        let cookie = Cookie::new("a", "1").set_domain("example.com");
        assert!(is_eligible(&cookie, &url("http://example.com/")));
        assert!(is_eligible(&cookie, &url("http://www.example.com/")));
        assert!(!is_eligible(&cookie, &url("http://example.org/")));
    }

    #[test]
    fn absent_domain_never_restricts() {
        let cookie = Cookie::new("a", "1");
        assert!(is_eligible(&cookie, &url("http://anything.test/")));
    }

    #[test]
    fn secure_requires_https() {
        let cookie = Cookie::new("a", "1").set_domain("example.com").set_secure(true);
        assert!(!is_eligible(&cookie, &url("http://example.com/")));
        assert!(is_eligible(&cookie, &url("https://example.com/")));

        let relaxed = Cookie::new("a", "1").set_domain("example.com");
        assert!(is_eligible(&relaxed, &url("http://example.com/")));
    }

    #[test]
    fn path_uses_containment() {
        let cookie = Cookie::new("a", "1").set_path("/admin");
        assert!(is_eligible(&cookie, &url("http://x.test/admin/users")));
        assert!(!is_eligible(&cookie, &url("http://x.test/public")));
    }

    #[test]
    fn root_request_path_only_accepts_root_cookies() {
        let root = Cookie::new("a", "1").set_path("/");
        let scoped = Cookie::new("b", "2").set_path("/admin");
        let unrestricted = Cookie::new("c", "3");

        let request = url("http://x.test/");
        assert!(is_eligible(&root, &request));
        assert!(!is_eligible(&scoped, &request));
        assert!(is_eligible(&unrestricted, &request));
    }

    #[test]
    fn root_cookie_path_matches_deeper_requests() {
        let cookie = Cookie::new("a", "1").set_path("/");
        assert!(is_eligible(&cookie, &url("http://x.test/deep/down")));
    }
}
