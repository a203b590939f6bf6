//! # salvo-cookie-session
//!
//! Stateless session middleware for the Salvo web framework.
//!
//! The session is stored entirely on the client, in a single cookie: there is
//! no server-side session store. The session object is serialized as JSON,
//! optionally encrypted with AES-256-CBC and signed with HMAC-SHA256.
//!
//! ## Features
//!
//! - **Signed cookies**: tampered cookies are rejected and the request gets a fresh session
//! - **Key rotation**: the first key signs, every configured key verifies
//! - **Optional encryption**: keep the session content unreadable to the client
//! - **Minimal cookie traffic**: the cookie is only re-issued when the session changed
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use salvo::prelude::*;
//! use salvo_cookie_session::{CookieSessionHandler, SessionConfig, SessionDepotExt};
//!
//! #[tokio::main]
//! async fn main() {
//!     let session_config = SessionConfig::with_keys(["current-key", "previous-key"])
//!         .with_cookie_name("session")
//!         .with_max_age(Some(86400));
//!
//!     let session_handler = CookieSessionHandler::new(session_config)
//!         .expect("valid session configuration");
//!
//!     let router = Router::new()
//!         .hoop(session_handler)
//!         .get(index);
//!
//!     let acceptor = TcpListener::new("127.0.0.1:5800").bind().await;
//!     Server::new(acceptor).serve(router).await;
//! }
//!
//! #[handler]
//! async fn index(depot: &mut Depot) -> String {
//!     let session = depot.session_mut().unwrap();
//!     let views: i32 = session.get("views").unwrap_or(0);
//!     session.insert("views", views + 1).unwrap();
//!     format!("{} views", views + 1)
//! }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod handler;
pub mod keyring;
pub mod session;

pub use codec::{CryptoOptions, SessionValue};
pub use config::{CookieOptions, SameSite, SessionConfig};
pub use error::SessionError;
pub use handler::CookieSessionHandler;
pub use keyring::KeyRing;
pub use session::{CommitAction, Session};

/// Extension trait for Depot to easily access session
pub mod depot_ext;
pub use depot_ext::SessionDepotExt;
