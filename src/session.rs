//! Per-principal session state.
//!
//! The surrounding web layer owns session persistence (cookies, expiry);
//! this crate only needs a key/value view of one authenticated principal's
//! session. Auth state and transaction state are kept in separate typed
//! structures that never share keys: [`Principal`] here, and the ledger key
//! in [`crate::transaction`].

use std::collections::HashMap;

/// Key/value session store scoped to a single authenticated principal.
///
/// Implementations are provided by the web layer (signed cookies, Redis,
/// ...). Concurrent requests from the same session race last-writer-wins;
/// that hazard is documented, not resolved here.
pub trait SessionStore: Send {
    /// Returns the stored value for `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str);

    /// Removes `key`; does nothing if it is absent.
    fn delete(&mut self, key: &str);
}

/// In-memory [`SessionStore`] backed by a `HashMap`.
///
/// Used in tests and single-process deployments.
#[derive(Debug, Clone, Default)]
pub struct MemorySession {
    values: HashMap<String, String>,
}

impl MemorySession {
    /// Creates an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySession {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_owned(), value.to_owned());
    }

    fn delete(&mut self, key: &str) {
        self.values.remove(key);
    }
}

/// Session key holding the buyer's stable identifier.
const BUYER_ID_KEY: &str = "buyer_uuid";
/// Session key holding the buyer's downstream resource URI.
const BUYER_URI_KEY: &str = "buyer_uri";

/// The authenticated principal a request is scoped to.
///
/// Argument-rewrite hooks and the transaction ledger depend only on these
/// two fields: a stable identifier and the buyer record's resource URI on
/// the downstream service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Stable buyer identifier (e.g. `"idp:9f1c..."`).
    pub id: String,
    /// Resource URI of the buyer record on the downstream service.
    pub buyer_uri: String,
}

impl Principal {
    /// Creates a principal from its identifier and buyer resource URI.
    pub fn new(id: impl Into<String>, buyer_uri: impl Into<String>) -> Self {
        Self { id: id.into(), buyer_uri: buyer_uri.into() }
    }

    /// Loads the principal stored in `session`, if one is signed in.
    #[must_use]
    pub fn load(session: &dyn SessionStore) -> Option<Self> {
        let id = session.get(BUYER_ID_KEY)?;
        let buyer_uri = session.get(BUYER_URI_KEY)?;
        Some(Self { id, buyer_uri })
    }

    /// Persists this principal into `session`.
    pub fn store(&self, session: &mut dyn SessionStore) {
        session.set(BUYER_ID_KEY, &self.id);
        session.set(BUYER_URI_KEY, &self.buyer_uri);
    }

    /// Signs the principal out of `session`. Idempotent.
    pub fn clear(session: &mut dyn SessionStore) {
        session.delete(BUYER_ID_KEY);
        session.delete(BUYER_URI_KEY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_session_roundtrip() {
        let mut session = MemorySession::new();
        assert_eq!(session.get("k"), None);

        session.set("k", "v1");
        assert_eq!(session.get("k").as_deref(), Some("v1"));

        session.set("k", "v2");
        assert_eq!(session.get("k").as_deref(), Some("v2"));

        session.delete("k");
        assert_eq!(session.get("k"), None);
        // Deleting an absent key is fine.
        session.delete("k");
    }

    #[test]
    fn test_principal_store_and_load() {
        let mut session = MemorySession::new();
        assert!(Principal::load(&session).is_none());

        let principal = Principal::new("idp:abc", "/generic/buyer/7/");
        principal.store(&mut session);

        let loaded = Principal::load(&session).unwrap();
        assert_eq!(loaded, principal);
    }

    #[test]
    fn test_principal_clear_is_idempotent() {
        let mut session = MemorySession::new();
        Principal::new("idp:abc", "/generic/buyer/7/").store(&mut session);

        Principal::clear(&mut session);
        assert!(Principal::load(&session).is_none());
        Principal::clear(&mut session);
    }

    #[test]
    fn test_partial_auth_state_is_not_a_principal() {
        let mut session = MemorySession::new();
        session.set("buyer_uuid", "idp:abc");
        assert!(Principal::load(&session).is_none());
    }
}
