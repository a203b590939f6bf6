//! Session configuration

use chrono::{DateTime, Utc};
use salvo_core::http::cookie::{
    self,
    time::{Duration, OffsetDateTime},
    Cookie,
};
use std::fmt;

use crate::codec::DEFAULT_MAX_COOKIE_BYTES;

/// Default name of the session cookie
pub const DEFAULT_COOKIE_NAME: &str = "express:sess";

/// SameSite cookie attribute
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SameSite {
    /// Strict - cookie only sent for same-site requests
    Strict,
    /// Lax - cookie sent for same-site requests and top-level navigations
    Lax,
    /// None - cookie sent for all requests (requires Secure)
    None,
}

impl From<SameSite> for cookie::SameSite {
    fn from(same_site: SameSite) -> Self {
        match same_site {
            SameSite::Strict => cookie::SameSite::Strict,
            SameSite::Lax => cookie::SameSite::Lax,
            SameSite::None => cookie::SameSite::None,
        }
    }
}

/// Attributes of the outbound session cookie.
///
/// The middleware hands each request its own copy (see
/// [`SessionDepotExt::session_options_mut`](crate::SessionDepotExt::session_options_mut)),
/// so a handler can change the cookie of the current response without
/// touching the configuration used for later requests.
#[derive(Clone, Debug, PartialEq)]
pub struct CookieOptions {
    /// Name of the session cookie (default: "express:sess")
    pub name: String,

    /// Cookie path (default: "/")
    pub path: String,

    /// Cookie domain (default: None - current domain only)
    pub domain: Option<String>,

    /// Max age in seconds. Takes precedence over `expires`.
    /// When both are None the cookie expires when the browser closes.
    pub max_age: Option<u64>,

    /// Absolute expiry date
    pub expires: Option<DateTime<Utc>>,

    /// Secure flag for cookie (default: false)
    pub secure: bool,

    /// HttpOnly flag for cookie (default: true)
    pub http_only: bool,

    /// SameSite attribute for cookie (default: not sent)
    pub same_site: Option<SameSite>,

    /// Replace a same-named cookie already set on the response (default: true)
    pub overwrite: bool,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            name: DEFAULT_COOKIE_NAME.to_string(),
            path: "/".to_string(),
            domain: None,
            max_age: None,
            expires: None,
            secure: false,
            http_only: true,
            same_site: None,
            overwrite: true,
        }
    }
}

impl CookieOptions {
    /// Build the session cookie carrying `value`
    pub fn build_cookie(&self, value: String) -> Cookie<'static> {
        let mut cookie_builder = self.base_cookie(value);

        if let Some(max_age) = self.max_age {
            let max_age = Duration::seconds(i64::try_from(max_age).unwrap_or(i64::MAX));
            cookie_builder = cookie_builder
                .max_age(max_age)
                .expires(OffsetDateTime::now_utc().saturating_add(max_age));
        } else if let Some(expires) = self.expires {
            if let Ok(expires) = OffsetDateTime::from_unix_timestamp(expires.timestamp()) {
                cookie_builder = cookie_builder.expires(expires);
            }
        }

        cookie_builder.build()
    }

    /// Build a cookie that deletes the session on the client
    pub fn removal_cookie(&self) -> Cookie<'static> {
        self.base_cookie(String::new())
            .max_age(Duration::ZERO)
            .expires(OffsetDateTime::UNIX_EPOCH)
            .build()
    }

    fn base_cookie(&self, value: String) -> cookie::CookieBuilder<'static> {
        let mut cookie_builder = Cookie::build((self.name.clone(), value))
            .path(self.path.clone())
            .http_only(self.http_only)
            .secure(self.secure);

        if let Some(domain) = self.domain.clone() {
            cookie_builder = cookie_builder.domain(domain);
        }

        if let Some(same_site) = self.same_site {
            cookie_builder = cookie_builder.same_site(same_site.into());
        }

        cookie_builder
    }
}

/// Configuration for the session middleware
///
/// Validated once, when the handler is built: see
/// [`CookieSessionHandler::new`](crate::CookieSessionHandler::new).
#[derive(Clone)]
pub struct SessionConfig {
    /// Secret keys for signing cookies.
    /// The first key is used for signing new cookies.
    /// All keys are tried when verifying signatures (for key rotation).
    pub keys: Vec<Vec<u8>>,

    /// Whether cookies are signed (default: true)
    pub signed: bool,

    /// Whether cookie bodies are encrypted (default: false)
    pub encrypt: bool,

    /// AES-256 key, exactly 32 bytes, required when `encrypt` is set
    pub encryption_key: Option<Vec<u8>>,

    /// Cookie attributes, copied into every request
    pub cookie: CookieOptions,

    /// Largest cookie value the middleware will emit (default: 4093)
    pub max_cookie_bytes: usize,

    /// Trust `X-Forwarded-Proto` to detect HTTPS behind a proxy (default: false)
    pub trust_proxy: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            signed: true,
            encrypt: false,
            encryption_key: None,
            cookie: CookieOptions::default(),
            max_cookie_bytes: DEFAULT_MAX_COOKIE_BYTES,
            trust_proxy: false,
        }
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("keys", &format_args!("[{} redacted]", self.keys.len()))
            .field("signed", &self.signed)
            .field("encrypt", &self.encrypt)
            .field("encryption_key", &self.encryption_key.as_ref().map(|_| "redacted"))
            .field("cookie", &self.cookie)
            .field("max_cookie_bytes", &self.max_cookie_bytes)
            .field("trust_proxy", &self.trust_proxy)
            .finish()
    }
}

impl SessionConfig {
    /// Create a new signed session configuration with the given key
    pub fn new<K: AsRef<[u8]>>(key: K) -> Self {
        Self::with_keys([key])
    }

    /// Create a new signed session configuration with multiple keys for rotation.
    /// The first key signs, every key verifies.
    pub fn with_keys<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        Self {
            keys: keys.into_iter().map(|k| k.as_ref().to_vec()).collect(),
            ..Default::default()
        }
    }

    /// Create a configuration for unsigned cookies
    pub fn unsigned() -> Self {
        Self {
            signed: false,
            ..Default::default()
        }
    }

    /// Set whether cookies are signed (default: true)
    pub fn with_signed(mut self, signed: bool) -> Self {
        self.signed = signed;
        self
    }

    /// Turn on encryption with a 32-byte AES-256 key
    pub fn with_encryption_key<K: AsRef<[u8]>>(mut self, key: K) -> Self {
        self.encrypt = true;
        self.encryption_key = Some(key.as_ref().to_vec());
        self
    }

    /// Set whether cookie bodies are encrypted (default: false)
    pub fn with_encrypt(mut self, encrypt: bool) -> Self {
        self.encrypt = encrypt;
        self
    }

    /// Set the cookie name (default: "express:sess")
    pub fn with_cookie_name<S: Into<String>>(mut self, name: S) -> Self {
        self.cookie.name = name.into();
        self
    }

    /// Set the cookie path (default: "/")
    pub fn with_cookie_path<S: Into<String>>(mut self, path: S) -> Self {
        self.cookie.path = path.into();
        self
    }

    /// Set the cookie domain
    pub fn with_cookie_domain<S: Into<String>>(mut self, domain: S) -> Self {
        self.cookie.domain = Some(domain.into());
        self
    }

    /// Set the HttpOnly flag (default: true)
    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.cookie.http_only = http_only;
        self
    }

    /// Set the Secure flag (default: false)
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.cookie.secure = secure;
        self
    }

    /// Set the SameSite attribute
    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.cookie.same_site = Some(same_site);
        self
    }

    /// Set max age in seconds
    /// Pass None for session cookie (expires when browser closes)
    pub fn with_max_age(mut self, max_age: impl Into<Option<u64>>) -> Self {
        self.cookie.max_age = max_age.into();
        self
    }

    /// Set max age from Duration
    pub fn with_max_age_duration(
        mut self,
        duration: impl Into<Option<std::time::Duration>>,
    ) -> Self {
        self.cookie.max_age = duration.into().map(|d| d.as_secs());
        self
    }

    /// Set an absolute expiry date, used when no max age is set
    pub fn with_expires(mut self, expires: DateTime<Utc>) -> Self {
        self.cookie.expires = Some(expires);
        self
    }

    /// Set whether to replace a same-named cookie already on the response (default: true)
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.cookie.overwrite = overwrite;
        self
    }

    /// Set the largest cookie value that may be emitted (default: 4093)
    pub fn with_max_cookie_bytes(mut self, max_cookie_bytes: usize) -> Self {
        self.max_cookie_bytes = max_cookie_bytes;
        self
    }

    /// Trust `X-Forwarded-Proto` when deciding whether the connection is secure
    pub fn with_trust_proxy(mut self, trust_proxy: bool) -> Self {
        self.trust_proxy = trust_proxy;
        self
    }
}
