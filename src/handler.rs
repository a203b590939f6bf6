//! Cookie session middleware handler for Salvo

use salvo_core::http::cookie::Cookie;
use salvo_core::http::header::{HeaderValue, SET_COOKIE};
use salvo_core::http::StatusError;
use salvo_core::prelude::*;
use std::sync::Arc;

use crate::codec::{self, CryptoOptions};
use crate::config::{CookieOptions, SessionConfig};
use crate::error::SessionError;
use crate::keyring::KeyRing;
use crate::session::{CommitAction, Session};

pub(crate) const SESSION_KEY: &str = "salvo.cookie.session";
pub(crate) const SESSION_OPTIONS_KEY: &str = "salvo.cookie.session.options";

struct Inner {
    keys: KeyRing,
    crypto: CryptoOptions,
    cookie: CookieOptions,
    max_cookie_bytes: usize,
    trust_proxy: bool,
}

/// Stateless session middleware for Salvo
///
/// The whole session lives in a single cookie. On each request the cookie is
/// verified and decoded into a [`Session`] placed in the [`Depot`]; after the
/// rest of the chain has run, the cookie is re-issued only if the session
/// changed, or expired if the session was destroyed.
#[derive(Clone)]
pub struct CookieSessionHandler {
    inner: Arc<Inner>,
}

impl CookieSessionHandler {
    /// Create a new session handler.
    ///
    /// Fails if signing is on without keys, or if encryption is on without a
    /// valid 32-byte key.
    pub fn new(config: SessionConfig) -> Result<Self, SessionError> {
        if config.signed && config.keys.is_empty() {
            return Err(SessionError::MissingKeys);
        }

        let crypto = CryptoOptions::new(
            config.signed,
            config.encrypt,
            config.encryption_key.as_deref(),
        )?;

        Ok(Self {
            inner: Arc::new(Inner {
                keys: KeyRing::new(&config.keys),
                crypto,
                cookie: config.cookie,
                max_cookie_bytes: config.max_cookie_bytes,
                trust_proxy: config.trust_proxy,
            }),
        })
    }

    /// Load the session from the request cookie
    fn load_session(&self, req: &Request) -> Session {
        let Some(cookie) = req.cookie(&self.inner.cookie.name) else {
            return Session::new(None);
        };

        // Clients may percent-encode the value
        let raw = cookie.value();
        let value = urlencoding::decode(raw)
            .map_or_else(|_| raw.to_string(), |v| v.into_owned());

        let decoded = codec::decode(&value, &self.inner.keys, &self.inner.crypto);
        if decoded.is_none() {
            tracing::debug!(
                cookie = %self.inner.cookie.name,
                "Discarding invalid session cookie"
            );
        }
        Session::new(decoded)
    }

    /// Whether the request came over HTTPS
    fn is_secure(&self, req: &Request) -> bool {
        if req.scheme().as_str() == "https" {
            return true;
        }

        self.inner.trust_proxy
            && req
                .headers()
                .get("x-forwarded-proto")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .is_some_and(|proto| proto.trim().eq_ignore_ascii_case("https"))
    }

    /// Apply the session outcome to the response
    fn commit(
        &self,
        session: &Session,
        options: &CookieOptions,
        secure: bool,
        res: &mut Response,
    ) {
        let cookie = match session.commit_action() {
            CommitAction::Keep => return,
            CommitAction::Reject(kind) => {
                let err = SessionError::InvalidReplacement(kind);
                tracing::error!("Failed to commit session: {}", err);
                res.render(StatusError::internal_server_error().brief(err.to_string()));
                return;
            }
            CommitAction::Expire => options.removal_cookie(),
            CommitAction::Save(value) => {
                let inner = &self.inner;
                match codec::encode(&value, &inner.keys, &inner.crypto, inner.max_cookie_bytes) {
                    Ok(encoded) => options.build_cookie(encoded),
                    Err(err) => {
                        tracing::error!("Failed to save session: {}", err);
                        res.render(StatusError::internal_server_error().brief(err.to_string()));
                        return;
                    }
                }
            }
        };

        if options.secure && !secure {
            tracing::debug!(
                cookie = %options.name,
                "Not sending secure session cookie over an insecure connection"
            );
            return;
        }

        write_cookie(res, &cookie, options.overwrite);
    }
}

/// Append `cookie` as a raw `Set-Cookie` header.
///
/// The value is written as is: the codec output only uses cookie-safe
/// characters, and the size ceiling was checked on exactly these bytes.
fn write_cookie(res: &mut Response, cookie: &Cookie<'static>, overwrite: bool) {
    let header = match HeaderValue::from_str(&cookie.to_string()) {
        Ok(header) => header,
        Err(err) => {
            tracing::error!("Invalid session cookie header: {}", err);
            return;
        }
    };

    if overwrite {
        let name = cookie.name();
        res.remove_cookie(name);

        let kept: Vec<HeaderValue> = res
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter(|existing| set_cookie_name(existing) != Some(name))
            .cloned()
            .collect();
        let headers = res.headers_mut();
        headers.remove(SET_COOKIE);
        for existing in kept {
            headers.append(SET_COOKIE, existing);
        }
    }

    res.headers_mut().append(SET_COOKIE, header);
}

fn set_cookie_name(header: &HeaderValue) -> Option<&str> {
    let (name, _) = header.to_str().ok()?.split_once('=')?;
    Some(name.trim())
}

#[async_trait]
impl Handler for CookieSessionHandler {
    async fn handle(
        &self,
        req: &mut Request,
        depot: &mut Depot,
        res: &mut Response,
        ctrl: &mut FlowCtrl,
    ) {
        let session = self.load_session(req);
        let secure = self.is_secure(req);

        depot.insert(SESSION_KEY, session);
        depot.insert(SESSION_OPTIONS_KEY, self.inner.cookie.clone());

        ctrl.call_next(req, depot, res).await;

        // Handlers may have taken the session or options out of the depot
        let session = depot.remove::<Session>(SESSION_KEY).unwrap_or_default();
        let options = depot
            .remove::<CookieOptions>(SESSION_OPTIONS_KEY)
            .unwrap_or_else(|_| self.inner.cookie.clone());

        self.commit(&session, &options, secure, res);
    }
}
