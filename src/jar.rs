use time::OffsetDateTime;
use tracing::{debug, warn};
use url::Url;

use crate::parse::ParseError;
use crate::rules;
use crate::storage::{Storage, StorageError, StoredCookie};
use crate::Cookie;

/// The storage key under which the serialized cookie array lives.
const STORAGE_KEY: &str = "cookies";

/// A jar of cookies collected from server responses.
///
/// The jar owns an ordered collection of [`Cookie`]s (insertion order is
/// the order cookies appear in the header payload), keyed by name:
/// inserting a cookie whose name is already present replaces the old one
/// in place. Expired cookies are swept out lazily, whenever the jar
/// builds a header payload or saves itself.
///
/// Persistence goes through a [`Storage`] collaborator: [`save`] writes
/// every cookie that has a future expiration, [`load`] reads them back.
/// Session cookies (no expiration) live only as long as the jar.
///
/// The jar is designed for one logical caller at a time; wrap it in a
/// lock if it must be shared across threads.
///
/// # Example
///
/// ```rust
/// use barattolo::{CookieJar, MemoryStorage};
/// use barattolo::url::Url;
///
/// let mut jar = CookieJar::new(MemoryStorage::new());
/// jar.load();
///
/// let source = Url::parse("https://example.com/app").unwrap();
/// jar.register_set_cookie_header("sid=abc123; Domain=example.com; Path=/; Secure", &source)?;
///
/// assert_eq!(jar.get_value("sid")?, Some("abc123"));
/// assert_eq!(jar.header_payload(&source), "sid=abc123");
///
/// // A secure cookie never travels over plain http.
/// let insecure = Url::parse("http://example.com/app").unwrap();
/// assert_eq!(jar.header_payload(&insecure), "");
///
/// jar.save()?;
/// # Ok::<_, Box<dyn std::error::Error>>(())
/// ```
///
/// [`save`]: CookieJar::save
/// [`load`]: CookieJar::load
pub struct CookieJar<S> {
    cookies: Vec<Cookie<'static>>,
    storage: S,
    clock: fn() -> OffsetDateTime,
}

impl<S: Storage> CookieJar<S> {
    /// Creates an empty jar persisting through `storage`.
    ///
    /// The jar samples `OffsetDateTime::now_utc` once per operation for
    /// its expiration checks; use [`CookieJar::with_clock`] to supply a
    /// different time source.
    pub fn new(storage: S) -> Self {
        Self::with_clock(storage, OffsetDateTime::now_utc)
    }

    /// Creates an empty jar with an explicit time source.
    ///
    /// Each public operation samples `clock` exactly once, so every
    /// expiration decision within one call uses the same instant.
    ///
    /// # Example
    ///
    /// ```rust
    /// use barattolo::{CookieJar, MemoryStorage};
    /// use barattolo::time::macros::datetime;
    ///
    /// let jar = CookieJar::with_clock(MemoryStorage::new(), || {
    ///     datetime!(2030-01-01 00:00:00 UTC)
    /// });
    /// assert!(jar.is_empty());
    /// ```
    pub fn with_clock(storage: S, clock: fn() -> OffsetDateTime) -> Self {
        Self {
            cookies: Vec::new(),
            storage,
            clock,
        }
    }

    /// Loads persisted cookies from storage.
    ///
    /// Only entries with an expiration strictly in the future make it
    /// into the jar: expired entries are stale, and an entry without an
    /// expiration should never have been written in the first place, so
    /// neither is trusted. Missing or corrupt data yields an empty jar,
    /// never an error.
    pub fn load(&mut self) {
        let now = (self.clock)();
        let Some(serialized) = self.storage.get(STORAGE_KEY) else {
            return;
        };
        let records: Vec<StoredCookie> = match serde_json::from_str(&serialized) {
            Ok(records) => records,
            Err(error) => {
                warn!(%error, "discarding corrupt cookie data from storage");
                return;
            }
        };
        let total = records.len();
        for record in records {
            let cookie = record.into_cookie();
            match cookie.expires_datetime() {
                Some(expiration) if expiration > now => self.cookies.push(cookie),
                _ => {}
            }
        }
        debug!(loaded = self.cookies.len(), total, "loaded cookies from storage");
    }

    /// Saves the jar to storage and flushes it durably.
    ///
    /// A save doubles as a sweep: cookies whose expiration has passed are
    /// dropped from the jar for good. Session cookies stay in memory but
    /// are never written out, so they don't survive a reload.
    ///
    /// Write and flush failures propagate to the caller; the in-memory
    /// jar is unaffected by them.
    pub fn save(&mut self) -> Result<(), StorageError> {
        let now = (self.clock)();
        self.cookies.retain(|cookie| match cookie.expires_datetime() {
            Some(expiration) => expiration >= now,
            None => true,
        });
        let records: Vec<StoredCookie> = self
            .cookies
            .iter()
            .filter(|cookie| cookie.expires().is_datetime())
            .map(StoredCookie::from)
            .collect();
        debug!(saved = records.len(), retained = self.cookies.len(), "saving cookies");
        let serialized = serde_json::to_string(&records).map_err(StorageError::new)?;
        self.storage.put(STORAGE_KEY, &serialized)?;
        self.storage.flush()
    }

    /// Returns the cookie stored under `name`, if any.
    ///
    /// The lookup is exact and case-sensitive. An empty `name` is an
    /// error: a cookie without a name cannot exist, so there is nothing
    /// meaningful to look up.
    ///
    /// # Example
    ///
    /// ```rust
    /// use barattolo::{Cookie, CookieJar, MemoryStorage};
    ///
    /// let mut jar = CookieJar::new(MemoryStorage::new());
    /// jar.add(Cookie::new("sid", "abc123"));
    ///
    /// assert_eq!(jar.get("sid")?.unwrap().value(), "abc123");
    /// assert!(jar.get("SID")?.is_none());
    /// assert!(jar.get("").is_err());
    /// # Ok::<_, barattolo::errors::EmptyKeyError>(())
    /// ```
    pub fn get(&self, name: &str) -> Result<Option<&Cookie<'static>>, EmptyKeyError> {
        if name.is_empty() {
            return Err(EmptyKeyError);
        }
        Ok(self.cookies.iter().find(|cookie| cookie.name() == name))
    }

    /// Returns the value of the cookie stored under `name`, if any.
    ///
    /// Same lookup rules as [`CookieJar::get`].
    pub fn get_value(&self, name: &str) -> Result<Option<&str>, EmptyKeyError> {
        Ok(self.get(name)?.map(Cookie::value))
    }

    /// Builds the `Cookie:` header value for a request to `request_url`.
    ///
    /// Eligible cookies (see [`is_eligible`]) are joined as
    /// `name=value; name=value; ...` in insertion order. The scan doubles
    /// as lazy pruning: any cookie whose expiration is at or before now is
    /// removed from the jar and never considered, eligible or not. Returns
    /// an empty string when nothing is eligible.
    ///
    /// [`is_eligible`]: crate::is_eligible
    ///
    /// # Example
    ///
    /// ```rust
    /// use barattolo::{Cookie, CookieJar, MemoryStorage};
    /// use barattolo::url::Url;
    ///
    /// let mut jar = CookieJar::new(MemoryStorage::new());
    /// jar.add(Cookie::new("a", "1").set_domain("example.com"));
    /// jar.add(Cookie::new("b", "2").set_domain("example.com"));
    /// jar.add(Cookie::new("c", "3").set_domain("other.test"));
    ///
    /// let url = Url::parse("http://example.com/").unwrap();
    /// assert_eq!(jar.header_payload(&url), "a=1; b=2");
    /// ```
    pub fn header_payload(&mut self, request_url: &Url) -> String {
        let now = (self.clock)();
        self.cookies.retain(|cookie| match cookie.expires_datetime() {
            Some(expiration) => expiration > now,
            None => true,
        });
        let mut payload = String::new();
        for cookie in self
            .cookies
            .iter()
            .filter(|cookie| rules::is_eligible(cookie, request_url))
        {
            if !payload.is_empty() {
                payload.push_str("; ");
            }
            payload.push_str(cookie.name());
            payload.push('=');
            payload.push_str(cookie.value());
        }
        payload
    }

    /// Adds `cookie` to the jar.
    ///
    /// Cookie names are case-sensitive and unique within the jar: if a
    /// cookie with the same name already exists it is replaced in place,
    /// keeping its position. This is also how a server expires a cookie
    /// explicitly, by re-setting it with an `Expires` date in the past.
    ///
    /// # Example
    ///
    /// ```rust
    /// use barattolo::{Cookie, CookieJar, MemoryStorage};
    ///
    /// let mut jar = CookieJar::new(MemoryStorage::new());
    /// jar.add(Cookie::new("sid", "abc"));
    /// jar.add(Cookie::new("sid", "def"));
    ///
    /// assert_eq!(jar.len(), 1);
    /// assert_eq!(jar.get_value("sid")?, Some("def"));
    /// # Ok::<_, barattolo::errors::EmptyKeyError>(())
    /// ```
    pub fn add(&mut self, cookie: Cookie<'static>) {
        match self
            .cookies
            .iter_mut()
            .find(|existing| existing.name() == cookie.name())
        {
            Some(existing) => *existing = cookie,
            None => self.cookies.push(cookie),
        }
    }

    /// Parses a `Set-Cookie` header value received from `source` and adds
    /// the resulting cookie to the jar.
    ///
    /// A parse failure is reported to the caller and leaves the jar
    /// untouched; it never affects cookies already stored.
    pub fn register_set_cookie_header(
        &mut self,
        header: &str,
        source: &Url,
    ) -> Result<(), ParseError> {
        let cookie = Cookie::parse(header, source)?.into_owned();
        self.add(cookie);
        Ok(())
    }

    /// Removes every cookie from the jar.
    ///
    /// The backing storage is not touched until the next [`save`].
    ///
    /// [`save`]: CookieJar::save
    pub fn clear(&mut self) {
        self.cookies.clear();
    }

    /// Returns `true` if the jar holds no cookies.
    ///
    /// This check never prunes: a jar holding only expired cookies
    /// reports non-empty until a [`header_payload`] or [`save`] call
    /// sweeps them out.
    ///
    /// [`header_payload`]: CookieJar::header_payload
    /// [`save`]: CookieJar::save
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Returns the number of cookies in the jar, expired ones included.
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    /// Iterates over the stored cookies in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, Cookie<'static>> {
        self.cookies.iter()
    }

    /// Returns a reference to the storage collaborator.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Consumes the jar, returning the storage collaborator.
    pub fn into_storage(self) -> S {
        self.storage
    }
}

impl<S> std::fmt::Debug for CookieJar<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieJar")
            .field("cookies", &self.cookies)
            .finish_non_exhaustive()
    }
}

/// The error returned by jar lookups given an empty cookie name.
#[derive(Debug, thiserror::Error)]
#[error("The lookup key for a cookie cannot be empty")]
pub struct EmptyKeyError;
