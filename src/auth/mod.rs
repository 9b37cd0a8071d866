//! Session credential access.
//!
//! The login flow owns the session; this layer only reads the current token
//! and renders it as a bearer authorization header.

use std::sync::{PoisonError, RwLock};

use crate::config::ClientConfig;

/// Scheme prefix of the authorization header value.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Source of the current auth credential.
pub trait SessionAccessor: Send + Sync {
    /// Current token, or `None` when signed out.
    fn token(&self) -> Option<String>;
}

/// In-memory session shared between the login flow and the API client.
#[derive(Debug, Default)]
pub struct SessionStore {
    token: RwLock<Option<String>>,
}

impl SessionStore {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: RwLock::new(token.filter(|t| !t.trim().is_empty())),
        }
    }

    /// Session restored from `PROMO_API_TOKEN`, if one was configured.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.api_token.clone())
    }

    pub fn set_token(&self, token: impl Into<String>) {
        let token = token.into();
        let mut guard = self.token.write().unwrap_or_else(PoisonError::into_inner);
        *guard = if token.trim().is_empty() {
            None
        } else {
            Some(token)
        };
    }

    pub fn clear(&self) {
        let mut guard = self.token.write().unwrap_or_else(PoisonError::into_inner);
        *guard = None;
    }
}

impl SessionAccessor for SessionStore {
    fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Authorization header value for the session, if a usable token is present.
pub fn bearer_header(session: &dyn SessionAccessor) -> Option<String> {
    let token = session.token()?;
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    Some(format!("{}{}", BEARER_PREFIX, token))
}
