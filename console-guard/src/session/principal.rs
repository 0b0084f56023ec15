//! PrincipalSession - 主体会话
//!
//! Token and identity of the principal signed in to one namespace, persisted
//! under the namespace's own key so a reload restores the session.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use shared::{PrincipalIdentity, TierValue};
use std::sync::Arc;

use super::kv::KeyValueStore;
use crate::error::StorageError;

/// Persisted form of a session
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedSession {
    token: String,
    identity: PrincipalIdentity,
    /// JWT `exp` (Unix seconds), when the token carries one
    expires_at: Option<i64>,
    logged_in_at: i64,
}

#[derive(Debug, Default)]
struct SessionState {
    token: Option<String>,
    identity: Option<PrincipalIdentity>,
    expires_at: Option<i64>,
}

/// 主体会话
pub struct PrincipalSession {
    token_key: String,
    store: Arc<dyn KeyValueStore>,
    state: RwLock<SessionState>,
}

impl PrincipalSession {
    /// Create an empty (signed-out) session bound to `token_key`
    pub fn new(token_key: impl Into<String>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            token_key: token_key.into(),
            store,
            state: RwLock::new(SessionState::default()),
        }
    }

    /// 从 JWT token 中解析过期时间 (Unix timestamp)
    ///
    /// Opaque tokens yield `None` and never expire client-side.
    pub fn parse_jwt_exp(token: &str) -> Option<i64> {
        // JWT 格式: header.payload.signature
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            return None;
        }

        use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
        let payload_bytes = URL_SAFE_NO_PAD.decode(parts[1]).ok()?;
        let payload: serde_json::Value = serde_json::from_slice(&payload_bytes).ok()?;
        payload.get("exp")?.as_i64()
    }

    /// 加载持久化的会话
    ///
    /// Returns whether a live session was restored. An expired token is
    /// discarded and its stored entry removed.
    pub fn restore(&self, now_secs: i64) -> Result<bool, StorageError> {
        let Some(raw) = self.store.get(&self.token_key)? else {
            return Ok(false);
        };

        let persisted: PersistedSession = match serde_json::from_str(&raw) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(key = %self.token_key, error = %e, "Discarding unreadable session");
                self.store.remove(&self.token_key)?;
                return Ok(false);
            }
        };

        if persisted.expires_at.is_some_and(|exp| now_secs >= exp) {
            self.store.remove(&self.token_key)?;
            tracing::info!(username = %persisted.identity.username, "Cached session expired, cleared");
            return Ok(false);
        }

        tracing::info!(username = %persisted.identity.username, "Loaded cached session");
        *self.state.write() = SessionState {
            token: Some(persisted.token),
            identity: Some(persisted.identity),
            expires_at: persisted.expires_at,
        };
        Ok(true)
    }

    /// Store a freshly issued token and identity
    pub fn sign_in(
        &self,
        token: impl Into<String>,
        identity: PrincipalIdentity,
    ) -> Result<(), StorageError> {
        let token = token.into();
        let expires_at = Self::parse_jwt_exp(&token);

        let persisted = PersistedSession {
            token: token.clone(),
            identity: identity.clone(),
            expires_at,
            logged_in_at: shared::util::now_secs(),
        };
        self.store
            .set(&self.token_key, &serde_json::to_string(&persisted)?)?;

        tracing::debug!(username = %identity.username, key = %self.token_key, "Session signed in");
        *self.state.write() = SessionState {
            token: Some(token),
            identity: Some(identity),
            expires_at,
        };
        Ok(())
    }

    /// Drop the token and identity, in memory and in storage
    ///
    /// Memory is cleared even when storage fails.
    pub fn sign_out(&self) -> Result<(), StorageError> {
        *self.state.write() = SessionState::default();
        self.store.remove(&self.token_key)?;
        tracing::debug!(key = %self.token_key, "Session cleared");
        Ok(())
    }

    pub fn token(&self) -> Option<String> {
        self.state.read().token.clone()
    }

    pub fn has_token(&self) -> bool {
        self.state.read().token.is_some()
    }

    pub fn identity(&self) -> Option<PrincipalIdentity> {
        self.state.read().identity.clone()
    }

    /// Tier as delivered; level 0 when signed out
    pub fn tier(&self) -> TierValue {
        self.state
            .read()
            .identity
            .as_ref()
            .map(|i| i.tier.clone())
            .unwrap_or_default()
    }

    pub fn expires_at(&self) -> Option<i64> {
        self.state.read().expires_at
    }

    /// Whether a present token has passed its `exp`
    pub fn is_expired(&self, now_secs: i64) -> bool {
        let state = self.state.read();
        state.token.is_some() && state.expires_at.is_some_and(|exp| now_secs >= exp)
    }

    pub fn token_key(&self) -> &str {
        &self.token_key
    }
}

impl std::fmt::Debug for PrincipalSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("PrincipalSession")
            .field("token_key", &self.token_key)
            .field("has_token", &state.token.is_some())
            .field("identity", &state.identity)
            .finish()
    }
}
