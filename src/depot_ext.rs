//! Extension trait for Depot to easily access sessions

use salvo_core::Depot;

use crate::config::CookieOptions;
use crate::handler::{SESSION_KEY, SESSION_OPTIONS_KEY};
use crate::session::Session;

/// Extension trait for Salvo's Depot to provide easy session access
pub trait SessionDepotExt {
    /// Get a reference to the session
    fn session(&self) -> Option<&Session>;

    /// Get a mutable reference to the session
    fn session_mut(&mut self) -> Option<&mut Session>;

    /// Cookie attributes that will be used for this response
    fn session_options(&self) -> Option<&CookieOptions>;

    /// Change the cookie attributes for this response only
    fn session_options_mut(&mut self) -> Option<&mut CookieOptions>;
}

impl SessionDepotExt for Depot {
    fn session(&self) -> Option<&Session> {
        self.get::<Session>(SESSION_KEY).ok()
    }

    fn session_mut(&mut self) -> Option<&mut Session> {
        self.get_mut::<Session>(SESSION_KEY).ok()
    }

    fn session_options(&self) -> Option<&CookieOptions> {
        self.get::<CookieOptions>(SESSION_OPTIONS_KEY).ok()
    }

    fn session_options_mut(&mut self) -> Option<&mut CookieOptions> {
        self.get_mut::<CookieOptions>(SESSION_OPTIONS_KEY).ok()
    }
}
