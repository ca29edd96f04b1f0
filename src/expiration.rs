use time::format_description::FormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

/// A cookie's expiration: either a date-time or session.
///
/// An `Expiration` is constructible with `Expiration::from()` via any of:
///
///   * `None` -> `Expiration::Session`
///   * `Some(OffsetDateTime)` -> `Expiration::DateTime`
///   * `OffsetDateTime` -> `Expiration::DateTime`
///
/// ```rust
/// use barattolo::Expiration;
/// use barattolo::time::OffsetDateTime;
///
/// let expires = Expiration::from(None);
/// assert_eq!(expires, Expiration::Session);
///
/// let now = OffsetDateTime::now_utc();
/// let expires = Expiration::from(now);
/// assert_eq!(expires, Expiration::DateTime(now));
///
/// let expires = Expiration::from(Some(now));
/// assert_eq!(expires, Expiration::DateTime(now));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Expiration {
    /// Expiration for a "permanent" cookie at a specific date-time.
    DateTime(OffsetDateTime),
    /// Expiration for a "session" cookie. The jar defines the "session":
    /// a session cookie lives until the jar is cleared or the process
    /// ends, and is never written out when the jar is persisted.
    Session,
}

impl Expiration {
    /// Returns `true` if `self` is an `Expiration::DateTime`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use barattolo::Expiration;
    /// use barattolo::time::OffsetDateTime;
    ///
    /// let expires = Expiration::from(None);
    /// assert!(!expires.is_datetime());
    ///
    /// let expires = Expiration::from(OffsetDateTime::now_utc());
    /// assert!(expires.is_datetime());
    /// ```
    pub fn is_datetime(&self) -> bool {
        match self {
            Expiration::DateTime(_) => true,
            Expiration::Session => false,
        }
    }

    /// Returns `true` if `self` is an `Expiration::Session`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use barattolo::Expiration;
    /// use barattolo::time::OffsetDateTime;
    ///
    /// let expires = Expiration::from(None);
    /// assert!(expires.is_session());
    ///
    /// let expires = Expiration::from(OffsetDateTime::now_utc());
    /// assert!(!expires.is_session());
    /// ```
    pub fn is_session(&self) -> bool {
        match self {
            Expiration::DateTime(_) => false,
            Expiration::Session => true,
        }
    }

    /// Returns the inner [`OffsetDateTime`] if `self` is a `DateTime`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use barattolo::Expiration;
    /// use barattolo::time::OffsetDateTime;
    ///
    /// let expires = Expiration::from(None);
    /// assert!(expires.datetime().is_none());
    ///
    /// let now = OffsetDateTime::now_utc();
    /// let expires = Expiration::from(now);
    /// assert_eq!(expires.datetime(), Some(now));
    /// ```
    pub fn datetime(&self) -> Option<OffsetDateTime> {
        match self {
            Expiration::Session => None,
            Expiration::DateTime(v) => Some(*v),
        }
    }

    /// Applies `f` to the inner `OffsetDateTime` if `self` is a `DateTime` and
    /// returns the mapped `Expiration`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use barattolo::Expiration;
    /// use barattolo::time::{Duration, OffsetDateTime};
    ///
    /// let now = OffsetDateTime::now_utc();
    /// let one_week = Duration::weeks(1);
    ///
    /// let expires = Expiration::from(now);
    /// assert_eq!(expires.map(|t| t + one_week).datetime(), Some(now + one_week));
    ///
    /// let expires = Expiration::from(None);
    /// assert_eq!(expires.map(|t| t + one_week).datetime(), None);
    /// ```
    pub fn map<F>(self, f: F) -> Self
    where
        F: FnOnce(OffsetDateTime) -> OffsetDateTime,
    {
        match self {
            Expiration::Session => Expiration::Session,
            Expiration::DateTime(v) => Expiration::DateTime(f(v)),
        }
    }
}

impl<T: Into<Option<OffsetDateTime>>> From<T> for Expiration {
    fn from(option: T) -> Self {
        match option.into() {
            Some(value) => Expiration::DateTime(value),
            None => Expiration::Session,
        }
    }
}

/// The legacy cookie date pattern, e.g. `Wed, 09-Jun-2021 10:18:14 GMT`.
static COOKIE_DATE: &[FormatItem<'static>] = format_description!(
    "[weekday repr:short], [day]-[month repr:short]-[year] [hour]:[minute]:[second] GMT"
);

/// The RFC 1123 variant with spaces, e.g. `Wed, 09 Jun 2021 10:18:14 GMT`.
/// Servers emit both; see <http://tools.ietf.org/html/rfc2616#section-3.3.1>.
static RFC1123_DATE: &[FormatItem<'static>] = format_description!(
    "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
);

/// Parses the value of an `Expires` cookie attribute.
///
/// The legacy `Wdy, dd-Mon-yyyy hh:mm:ss GMT` pattern is tried first, then
/// the RFC 1123 pattern with spaces instead of dashes.
///
/// # Example
///
/// ```rust
/// use barattolo::parse_cookie_date;
///
/// let parsed = parse_cookie_date("Wed, 09-Jun-2021 10:18:14 GMT").unwrap();
/// assert_eq!(parsed.year(), 2021);
///
/// // The spaced variant is accepted too.
/// let spaced = parse_cookie_date("Wed, 09 Jun 2021 10:18:14 GMT").unwrap();
/// assert_eq!(parsed, spaced);
/// ```
pub fn parse_cookie_date(value: &str) -> Result<OffsetDateTime, time::error::Parse> {
    PrimitiveDateTime::parse(value, &COOKIE_DATE)
        .or_else(|_| PrimitiveDateTime::parse(value, &RFC1123_DATE))
        .map(|t| t.assume_utc())
}

/// Formats a date-time in the legacy cookie date pattern.
///
/// # Example
///
/// ```rust
/// use barattolo::{format_cookie_date, parse_cookie_date};
///
/// let parsed = parse_cookie_date("Wed, 09-Jun-2021 10:18:14 GMT").unwrap();
/// assert_eq!(
///     format_cookie_date(parsed).unwrap(),
///     "Wed, 09-Jun-2021 10:18:14 GMT"
/// );
/// ```
pub fn format_cookie_date(value: OffsetDateTime) -> Result<String, time::error::Format> {
    value.to_offset(UtcOffset::UTC).format(&COOKIE_DATE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn parses_legacy_pattern() {
        let parsed = parse_cookie_date("Wed, 09-Jun-2021 10:18:14 GMT").unwrap();
        assert_eq!(parsed, datetime!(2021-06-09 10:18:14 UTC));
    }

    #[test]
    fn parses_rfc1123_pattern() {
        let parsed = parse_cookie_date("Wed, 21 Oct 2015 07:28:00 GMT").unwrap();
        assert_eq!(parsed, datetime!(2015-10-21 07:28:00 UTC));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_cookie_date("tomorrow-ish").is_err());
        assert!(parse_cookie_date("").is_err());
    }

    #[test]
    fn formats_legacy_pattern() {
        let formatted = format_cookie_date(datetime!(2021-06-09 10:18:14 UTC)).unwrap();
        assert_eq!(formatted, "Wed, 09-Jun-2021 10:18:14 GMT");
    }

    #[test]
    fn format_parse_round_trip() {
        let expires = datetime!(2030-01-02 03:04:05 UTC);
        let wire = format_cookie_date(expires).unwrap();
        assert_eq!(parse_cookie_date(&wire).unwrap(), expires);
    }
}
