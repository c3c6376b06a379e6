/*
[INPUT]:  Session tokens returned by auth/getToken
[OUTPUT]: Token retrieval and expiration status
[POS]:    Auth layer - token lifecycle management
[UPDATE]: When changing token lifetime or storage strategy
*/

use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, PoisonError, RwLock};

/// Primary session tokens are valid for one trading day.
pub const DEFAULT_TOKEN_TTL_SECONDS: u64 = 24 * 60 * 60;

/// Stored token data with metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenData {
    pub token: String,
    pub obtained_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Thread-safe token store
#[derive(Debug, Clone, Default)]
pub struct TokenStore {
    data: Arc<RwLock<Option<TokenData>>>,
}

impl TokenStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new token with expiration
    pub fn set_token(&self, token: String, expires_seconds: u64) {
        let obtained_at = Utc::now();
        let expires_at = obtained_at + Duration::seconds(expires_seconds as i64);
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(TokenData {
            token,
            obtained_at,
            expires_at,
        });
    }

    /// Get the current token if available and not expired
    pub fn get_token(&self) -> Option<String> {
        let guard = self.data.read().unwrap_or_else(PoisonError::into_inner);
        guard
            .as_ref()
            .filter(|data| Utc::now() <= data.expires_at)
            .map(|data| data.token.clone())
    }

    /// Check if token is expired (or absent)
    pub fn is_expired(&self) -> bool {
        let guard = self.data.read().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(data) => Utc::now() > data.expires_at,
            None => true,
        }
    }

    pub fn token_data(&self) -> Option<TokenData> {
        let guard = self.data.read().unwrap_or_else(PoisonError::into_inner);
        guard.clone()
    }

    /// Clear the stored token
    pub fn clear(&self) {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        *guard = None;
    }
}
