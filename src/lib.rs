//! A crate to manage HTTP cookies on the client side.
//!
//! # Overview
//!
//! `barattolo` is a cookie jar for HTTP clients:
//!
//! - It parses `Set-Cookie` response headers into [`Cookie`]s, via [`Cookie::parse`]
//! - It stores cookies and builds the `Cookie` header value for outgoing requests,
//!   via [`CookieJar`]
//! - It persists the jar across process restarts through a pluggable key-value
//!   [`Storage`] collaborator
//!
//! In particular:
//!
//! - Cookies are keyed by name: re-setting a cookie replaces the previous one
//! - Expired cookies are swept out lazily, on reads and saves
//! - Session cookies (no `Expires` attribute) are never persisted
//! - Unknown `Set-Cookie` attributes never fail a parse
//!
//! # Non-goals
//!
//! `barattolo` is deliberately a simplified, browser-like jar, not a full
//! RFC 6265 implementation: domain and path matching use loose containment
//! checks rather than suffix/prefix rules, `Max-Age` is not consulted, and
//! `HttpOnly`/`SameSite` are parsed over but not enforced. It assumes one
//! logical caller at a time per jar.
//!
//! # Quickstart
//!
//! ## Collecting and replaying cookies
//!
//! ```rust
//! use barattolo::{CookieJar, MemoryStorage};
//! use barattolo::url::Url;
//!
//! let mut jar = CookieJar::new(MemoryStorage::new());
//! jar.load();
//!
//! // A response from `source` carried a `Set-Cookie` header.
//! let source = Url::parse("https://example.com/app").unwrap();
//! jar.register_set_cookie_header("sid=abc123; Domain=example.com; Path=/; Secure", &source)?;
//!
//! // Before the next request, ask the jar what to send.
//! assert_eq!(jar.header_payload(&source), "sid=abc123");
//!
//! // The secure cookie stays home on a plain-http request.
//! let insecure = Url::parse("http://example.com/app").unwrap();
//! assert_eq!(jar.header_payload(&insecure), "");
//!
//! jar.save()?;
//! # Ok::<_, Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Building cookies directly
//!
//! ```rust
//! use barattolo::{Cookie, CookieJar, MemoryStorage};
//!
//! let mut jar = CookieJar::new(MemoryStorage::new());
//! jar.add(
//!     Cookie::new("theme", "dark")
//!         .set_domain("example.com")
//!         .set_path("/"),
//! );
//! assert_eq!(jar.get_value("theme")?, Some("dark"));
//! # Ok::<_, barattolo::errors::EmptyKeyError>(())
//! ```

mod cookie;
mod expiration;
mod jar;
mod parse;
mod rules;
mod storage;

pub use cookie::Cookie;
pub use expiration::{format_cookie_date, parse_cookie_date, Expiration};
pub use jar::CookieJar;
pub use rules::is_eligible;
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use time;
pub use url;

/// Errors that can occur when using `barattolo`.
pub mod errors {
    pub use crate::jar::EmptyKeyError;
    pub use crate::parse::{EmptyNameError, MissingPairError, ParseError};
    pub use crate::storage::StorageError;
}
