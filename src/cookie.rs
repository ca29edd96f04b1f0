use crate::expiration::{format_cookie_date, Expiration};
use std::borrow::Cow;
use std::fmt;
use time::OffsetDateTime;

/// A cookie held by the jar: a name/value pair plus the attributes that
/// decide where (and for how long) it is sent.
///
/// ## Constructing a `Cookie`
///
/// To construct a cookie with only a name/value, use [`Cookie::new()`]:
///
/// ```rust
/// use barattolo::Cookie;
///
/// let cookie = Cookie::new("name", "value");
/// assert_eq!(cookie.to_string(), "name=value");
/// ```
///
/// ## Building a `Cookie`
///
/// To construct more elaborate cookies, use `Cookie`'s `set_*` methods.
///
/// ```rust
/// use barattolo::Cookie;
///
/// let cookie = Cookie::new("sid", "abc123")
///     .set_domain("example.com")
///     .set_path("/")
///     .set_secure(true);
/// ```
///
/// Cookies can also be parsed out of a `Set-Cookie` header value with
/// [`Cookie::parse()`].
#[derive(Debug, Clone)]
pub struct Cookie<'c> {
    /// The cookie's name.
    pub(crate) name: Cow<'c, str>,
    /// The cookie's value.
    pub(crate) value: Cow<'c, str>,
    /// The cookie's domain, if any.
    pub(crate) domain: Option<Cow<'c, str>>,
    /// The cookie's path, if any.
    pub(crate) path: Option<Cow<'c, str>>,
    /// Whether this cookie was marked Secure.
    pub(crate) secure: bool,
    /// The cookie's expiration.
    pub(crate) expires: Expiration,
}

impl<'c> Cookie<'c> {
    /// Creates a new [`Cookie`] with the given name and value.
    ///
    /// The cookie starts out as a session cookie with no domain or path
    /// restriction and without the `Secure` flag.
    ///
    /// # Example
    ///
    /// ```rust
    /// use barattolo::Cookie;
    ///
    /// let cookie = Cookie::new("name", "value");
    /// assert_eq!(cookie.name_value(), ("name", "value"));
    /// assert!(cookie.expires().is_session());
    ///
    /// // This is equivalent to `from` with a `(name, value)` tuple:
    /// let cookie = Cookie::from(("name", "value"));
    /// assert_eq!(cookie.name_value(), ("name", "value"));
    /// ```
    pub fn new<N, V>(name: N, value: V) -> Self
    where
        N: Into<Cow<'c, str>>,
        V: Into<Cow<'c, str>>,
    {
        Cookie {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: None,
            secure: false,
            expires: Expiration::Session,
        }
    }

    /// Converts `self` into a [`Cookie`] with a static lifetime with as few
    /// allocations as possible.
    ///
    /// # Example
    ///
    /// ```
    /// use barattolo::Cookie;
    ///
    /// let c = Cookie::new("a", "b");
    /// let owned_cookie = c.into_owned();
    /// assert_eq!(owned_cookie.name_value(), ("a", "b"));
    /// ```
    pub fn into_owned(self) -> Cookie<'static> {
        let to_owned = |s: Cow<'c, str>| match s {
            Cow::Borrowed(s) => Cow::Owned(s.to_owned()),
            Cow::Owned(s) => Cow::Owned(s),
        };
        Cookie {
            name: to_owned(self.name),
            value: to_owned(self.value),
            domain: self.domain.map(to_owned),
            path: self.path.map(to_owned),
            secure: self.secure,
            expires: self.expires,
        }
    }

    /// Returns the name of `self`.
    ///
    /// # Example
    ///
    /// ```
    /// use barattolo::Cookie;
    ///
    /// let c = Cookie::new("name", "value");
    /// assert_eq!(c.name(), "name");
    /// ```
    #[inline]
    pub fn name(&self) -> &str {
        self.name.as_ref()
    }

    /// Returns the value of `self`.
    ///
    /// # Example
    ///
    /// ```
    /// use barattolo::Cookie;
    ///
    /// let c = Cookie::new("name", "value");
    /// assert_eq!(c.value(), "value");
    /// ```
    #[inline]
    pub fn value(&self) -> &str {
        self.value.as_ref()
    }

    /// Returns the name and value of `self` as a tuple.
    ///
    /// # Example
    ///
    /// ```
    /// use barattolo::Cookie;
    ///
    /// let c = Cookie::new("name", "value");
    /// assert_eq!(c.name_value(), ("name", "value"));
    /// ```
    #[inline]
    pub fn name_value(&self) -> (&str, &str) {
        (self.name(), self.value())
    }

    /// Returns the `Domain` of the cookie if one was specified.
    ///
    /// This does not consider whether the `Domain` is valid; validation is
    /// left to higher-level libraries, as needed. However, if the `Domain`
    /// starts with a leading `.`, the leading `.` is stripped.
    ///
    /// # Example
    ///
    /// ```
    /// use barattolo::Cookie;
    ///
    /// let c = Cookie::new("name", "value");
    /// assert_eq!(c.domain(), None);
    ///
    /// let c = Cookie::new("name", "value").set_domain("crates.io");
    /// assert_eq!(c.domain(), Some("crates.io"));
    ///
    /// let c = Cookie::new("name", "value").set_domain(".crates.io");
    /// assert_eq!(c.domain(), Some("crates.io"));
    /// ```
    #[inline]
    pub fn domain(&self) -> Option<&str> {
        match self.domain {
            Some(ref c) => {
                let domain = c.as_ref();
                domain.strip_prefix('.').or(Some(domain))
            }
            None => None,
        }
    }

    /// Returns the `Path` of the cookie if one was specified.
    ///
    /// # Example
    ///
    /// ```
    /// use barattolo::Cookie;
    ///
    /// let c = Cookie::new("name", "value");
    /// assert_eq!(c.path(), None);
    ///
    /// let c = Cookie::new("name", "value").set_path("/admin");
    /// assert_eq!(c.path(), Some("/admin"));
    /// ```
    #[inline]
    pub fn path(&self) -> Option<&str> {
        match self.path {
            Some(ref c) => Some(c.as_ref()),
            None => None,
        }
    }

    /// Returns whether this cookie was marked `Secure`.
    ///
    /// A secure cookie is only eligible for requests sent over `https`.
    ///
    /// # Example
    ///
    /// ```
    /// use barattolo::Cookie;
    ///
    /// let c = Cookie::new("name", "value");
    /// assert!(!c.secure());
    ///
    /// let c = Cookie::new("name", "value").set_secure(true);
    /// assert!(c.secure());
    /// ```
    #[inline]
    pub fn secure(&self) -> bool {
        self.secure
    }

    /// Returns the [`Expiration`] of the cookie.
    ///
    /// # Example
    ///
    /// ```
    /// use barattolo::{Cookie, Expiration};
    ///
    /// let c = Cookie::new("name", "value");
    /// assert_eq!(c.expires(), Expiration::Session);
    /// ```
    #[inline]
    pub fn expires(&self) -> Expiration {
        self.expires
    }

    /// Returns the expiration date-time of the cookie if there is one.
    ///
    /// # Example
    ///
    /// ```
    /// use barattolo::Cookie;
    /// use barattolo::time::OffsetDateTime;
    ///
    /// let c = Cookie::new("name", "value");
    /// assert_eq!(c.expires_datetime(), None);
    ///
    /// let expires = OffsetDateTime::now_utc();
    /// let c = Cookie::new("name", "value").set_expires(expires);
    /// assert_eq!(c.expires_datetime(), Some(expires));
    /// ```
    #[inline]
    pub fn expires_datetime(&self) -> Option<OffsetDateTime> {
        self.expires.datetime()
    }
}

/// Methods to set fields in a [`Cookie`].
impl<'c> Cookie<'c> {
    /// Sets the name of `self`, replacing the current name.
    /// It returns the modified cookie.
    ///
    /// # Example
    ///
    /// ```
    /// use barattolo::Cookie;
    ///
    /// let mut c = Cookie::new("name", "value");
    /// assert_eq!(c.name(), "name");
    ///
    /// c = c.set_name("foo");
    /// assert_eq!(c.name(), "foo");
    /// ```
    pub fn set_name<N: Into<Cow<'c, str>>>(mut self, name: N) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the value of `self`, replacing the current value.
    /// It returns the modified cookie.
    ///
    /// # Example
    ///
    /// ```
    /// use barattolo::Cookie;
    ///
    /// let mut c = Cookie::new("name", "value");
    /// assert_eq!(c.value(), "value");
    ///
    /// c = c.set_value("bar");
    /// assert_eq!(c.value(), "bar");
    /// ```
    pub fn set_value<V: Into<Cow<'c, str>>>(mut self, value: V) -> Self {
        self.value = value.into();
        self
    }

    /// Sets the `domain` of `self` to `domain`.
    ///
    /// # Example
    ///
    /// ```
    /// use barattolo::Cookie;
    ///
    /// let mut c = Cookie::new("name", "value");
    /// assert_eq!(c.domain(), None);
    ///
    /// c = c.set_domain("rust-lang.org");
    /// assert_eq!(c.domain(), Some("rust-lang.org"));
    /// ```
    pub fn set_domain<D: Into<Cow<'c, str>>>(mut self, domain: D) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Unsets the `domain` of `self`.
    ///
    /// # Example
    ///
    /// ```
    /// use barattolo::Cookie;
    ///
    /// let mut c = Cookie::new("name", "value").set_domain("rust-lang.org");
    /// assert_eq!(c.domain(), Some("rust-lang.org"));
    ///
    /// c = c.unset_domain();
    /// assert_eq!(c.domain(), None);
    /// ```
    pub fn unset_domain(mut self) -> Self {
        self.domain = None;
        self
    }

    /// Sets the `path` of `self` to `path`.
    ///
    /// # Example
    ///
    /// ```
    /// use barattolo::Cookie;
    ///
    /// let mut c = Cookie::new("name", "value");
    /// assert_eq!(c.path(), None);
    ///
    /// c = c.set_path("/");
    /// assert_eq!(c.path(), Some("/"));
    /// ```
    pub fn set_path<P: Into<Cow<'c, str>>>(mut self, path: P) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Unsets the `path` of `self`.
    pub fn unset_path(mut self) -> Self {
        self.path = None;
        self
    }

    /// Sets whether the cookie is `Secure`.
    pub fn set_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Sets the expiration of `self` to `expires`.
    ///
    /// Passing `Expiration::Session` (or, via the `From` conversions,
    /// `None`) turns the cookie back into a session cookie.
    ///
    /// # Example
    ///
    /// ```
    /// use barattolo::Cookie;
    /// use barattolo::time::OffsetDateTime;
    ///
    /// let expires = OffsetDateTime::now_utc();
    /// let c = Cookie::new("name", "value").set_expires(expires);
    /// assert_eq!(c.expires_datetime(), Some(expires));
    /// ```
    pub fn set_expires<E: Into<Expiration>>(mut self, expires: E) -> Self {
        self.expires = expires.into();
        self
    }
}

impl fmt::Display for Cookie<'_> {
    /// Formats the cookie `self` as a `Set-Cookie` header value.
    ///
    /// The expiration date is rendered in the legacy cookie date pattern,
    /// `Wdy, dd-Mon-yyyy hh:mm:ss GMT`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use barattolo::Cookie;
    ///
    /// let cookie = Cookie::new("foo", "bar").set_path("/");
    /// assert_eq!(cookie.to_string(), "foo=bar; Path=/");
    /// ```
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}={}", self.name(), self.value())?;

        if self.secure() {
            write!(f, "; Secure")?;
        }

        if let Some(path) = self.path() {
            write!(f, "; Path={}", path)?;
        }

        if let Some(domain) = self.domain() {
            write!(f, "; Domain={}", domain)?;
        }

        if let Some(time) = self.expires_datetime() {
            let time = format_cookie_date(time).map_err(|_| fmt::Error)?;
            write!(f, "; Expires={}", time)?;
        }

        Ok(())
    }
}

impl<'a, 'b> PartialEq<Cookie<'b>> for Cookie<'a> {
    fn eq(&self, other: &Cookie<'b>) -> bool {
        let so_far_so_good = self.name() == other.name()
            && self.value() == other.value()
            && self.secure() == other.secure()
            && self.expires() == other.expires();

        if !so_far_so_good {
            return false;
        }

        match (self.path(), other.path()) {
            (Some(a), Some(b)) if a.eq_ignore_ascii_case(b) => {}
            (None, None) => {}
            _ => return false,
        };

        match (self.domain(), other.domain()) {
            (Some(a), Some(b)) if a.eq_ignore_ascii_case(b) => {}
            (None, None) => {}
            _ => return false,
        };

        true
    }
}

impl<'a, N, V> From<(N, V)> for Cookie<'a>
where
    N: Into<Cow<'a, str>>,
    V: Into<Cow<'a, str>>,
{
    fn from((name, value): (N, V)) -> Self {
        Cookie::new(name, value)
    }
}

impl<'a> AsRef<Cookie<'a>> for Cookie<'a> {
    fn as_ref(&self) -> &Cookie<'a> {
        self
    }
}

#[cfg(test)]
mod tests {
    use crate::Cookie;
    use time::macros::datetime;

    #[test]
    fn format() {
        let cookie = Cookie::new("foo", "bar");
        assert_eq!(&cookie.to_string(), "foo=bar");

        let cookie = Cookie::new("foo", "bar").set_secure(true);
        assert_eq!(&cookie.to_string(), "foo=bar; Secure");

        let cookie = Cookie::new("foo", "bar").set_path("/");
        assert_eq!(&cookie.to_string(), "foo=bar; Path=/");

        let cookie = Cookie::new("foo", "bar").set_domain("www.rust-lang.org");
        assert_eq!(&cookie.to_string(), "foo=bar; Domain=www.rust-lang.org");

        let cookie = Cookie::new("foo", "bar").set_domain(".rust-lang.org");
        assert_eq!(&cookie.to_string(), "foo=bar; Domain=rust-lang.org");

        let cookie = Cookie::new("foo", "bar").set_expires(datetime!(2021-06-09 10:18:14 UTC));
        assert_eq!(
            &cookie.to_string(),
            "foo=bar; Expires=Wed, 09-Jun-2021 10:18:14 GMT"
        );

        let cookie = Cookie::new("sid", "abc123")
            .set_domain("example.com")
            .set_path("/")
            .set_secure(true);
        assert_eq!(
            &cookie.to_string(),
            "sid=abc123; Secure; Path=/; Domain=example.com"
        );
    }

    #[test]
    fn equality_ignores_domain_and_path_case() {
        let a = Cookie::new("foo", "bar").set_domain("Example.COM").set_path("/App");
        let b = Cookie::new("foo", "bar").set_domain("example.com").set_path("/app");
        assert_eq!(a, b);
    }

    #[test]
    fn equality_is_name_and_value_sensitive() {
        assert_ne!(Cookie::new("foo", "bar"), Cookie::new("Foo", "bar"));
        assert_ne!(Cookie::new("foo", "bar"), Cookie::new("foo", "baz"));
        assert_ne!(
            Cookie::new("foo", "bar"),
            Cookie::new("foo", "bar").set_secure(true)
        );
    }

    #[test]
    fn into_owned_preserves_fields() {
        let name = String::from("token");
        let cookie = Cookie::new(name.as_str(), "opaque")
            .set_domain("example.com")
            .set_expires(datetime!(2030-01-01 00:00:00 UTC));
        let owned = cookie.clone().into_owned();
        assert_eq!(owned, cookie);
    }
}
