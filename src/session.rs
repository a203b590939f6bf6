//! Per-request session state and change tracking
//!
//! A [`Session`] is built from whatever the codec decoded from the inbound
//! cookie. It remembers the serialized form of that value so that, once the
//! handler is done, the middleware can tell whether anything changed and
//! which cookie action (if any) the response needs.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::codec::SessionValue;
use crate::error::SessionError;

/// What the middleware must do with the session cookie when the response is sent
#[derive(Debug, Clone, PartialEq)]
pub enum CommitAction {
    /// Leave the client's cookie as it is
    Keep,
    /// Encode the value and set it as the new cookie
    Save(SessionValue),
    /// Delete the cookie on the client
    Expire,
    /// The session was misused; fail the response without touching the cookie
    Reject(String),
}

/// Session wrapper that tracks modifications
#[derive(Debug, Clone)]
pub struct Session {
    /// Current value; `None` once the session has been destroyed
    value: Option<SessionValue>,

    /// Whether no valid cookie came with the request
    is_new: bool,

    /// Serialized value at load time
    initial: String,

    /// Whether the handler assigned a whole new object
    replaced: bool,

    /// Set when the handler tried to replace the session with a non-object
    invalid: Option<String>,
}

impl Session {
    /// Create a session from a decoded cookie (`None` when there was no valid cookie)
    pub fn new(decoded: Option<SessionValue>) -> Self {
        let is_new = decoded.is_none();
        let value = decoded.unwrap_or_default();
        let initial = snapshot(&value);

        Self {
            value: Some(value),
            is_new,
            initial,
            replaced: false,
            invalid: None,
        }
    }

    /// Check if this is a new session
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Check if the session holds any data, or was explicitly replaced with an object
    pub fn is_populated(&self) -> bool {
        match &self.value {
            Some(value) => !value.is_empty() || self.replaced,
            None => false,
        }
    }

    /// Check if the session differs from what was loaded
    pub fn is_changed(&self) -> bool {
        match &self.value {
            Some(value) => snapshot(value) != self.initial,
            None => true,
        }
    }

    /// Check if the session has been destroyed
    pub fn is_destroyed(&self) -> bool {
        self.value.is_none()
    }

    /// Get a value from the session
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get_value(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Get the raw JSON value stored under `key`
    pub fn get_value(&self, key: &str) -> Option<&Value> {
        self.value.as_ref()?.get(key)
    }

    /// Check if a key exists in the session
    pub fn contains(&self, key: &str) -> bool {
        self.get_value(key).is_some()
    }

    /// Number of top-level keys
    pub fn len(&self) -> usize {
        self.value.as_ref().map_or(0, |v| v.len())
    }

    /// Check if the session is empty (no user data)
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The whole session object, `None` once destroyed
    pub fn value(&self) -> Option<&SessionValue> {
        self.value.as_ref()
    }

    /// Set a value in the session, returning the previous one.
    ///
    /// Inserting into a destroyed session starts a fresh one.
    pub fn insert<T: Serialize>(
        &mut self,
        key: impl Into<String>,
        value: T,
    ) -> Result<Option<Value>, SessionError> {
        let value = serde_json::to_value(value)?;
        Ok(self
            .value
            .get_or_insert_with(SessionValue::new)
            .insert(key.into(), value))
    }

    /// Remove a value from the session
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.value.as_mut()?.remove(key)
    }

    /// Clear all session data, keeping the cookie alive
    pub fn clear(&mut self) {
        if let Some(value) = self.value.as_mut() {
            value.clear();
        }
    }

    /// Mark the session for destruction; the cookie is expired on the client
    pub fn destroy(&mut self) {
        self.value = None;
        self.replaced = false;
    }

    /// Replace the whole session.
    ///
    /// An object becomes the new session. `null`, `false`, `0` and `""`
    /// destroy it. Anything else is a usage error: it is returned here and
    /// also fails the response.
    pub fn replace(&mut self, value: Value) -> Result<(), SessionError> {
        match value {
            Value::Object(map) => {
                self.value = Some(map);
                self.replaced = true;
                Ok(())
            }
            value if is_falsy(&value) => {
                self.destroy();
                Ok(())
            }
            value => {
                let kind = kind_of(&value).to_string();
                self.invalid = Some(kind.clone());
                Err(SessionError::InvalidReplacement(kind))
            }
        }
    }

    /// Decide what the response must do with the cookie
    pub fn commit_action(&self) -> CommitAction {
        if let Some(kind) = &self.invalid {
            return CommitAction::Reject(kind.clone());
        }

        match &self.value {
            None => CommitAction::Expire,
            Some(value) if (!self.is_new || self.is_populated()) && self.is_changed() => {
                CommitAction::Save(value.clone())
            }
            Some(_) => CommitAction::Keep,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(None)
    }
}

fn snapshot(value: &SessionValue) -> String {
    // A map of JSON values always serializes
    serde_json::to_string(value).unwrap_or_default()
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
