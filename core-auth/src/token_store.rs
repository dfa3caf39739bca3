//! Token Persistence
//!
//! Stores the OAuth token set as one JSON document under a fixed key of the
//! host `SecureStore`. On desktop that key is the `token.json` file next to
//! the binary. The document is always read and written whole.
//!
//! ## Example
//!
//! ```no_run
//! use core_auth::{OAuthTokens, TokenStore};
//! use std::sync::Arc;
//! # use bridge_traits::storage::SecureStore;
//! # async fn example(secure_store: Arc<dyn SecureStore>) -> core_auth::Result<()> {
//! let token_store = TokenStore::new(secure_store, "token.json");
//!
//! let tokens = OAuthTokens::new("access".to_string(), Some("refresh".to_string()), 3600);
//! token_store.save(&tokens).await?;
//!
//! let restored = token_store.load().await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, Result};
use crate::types::OAuthTokens;
use bridge_traits::storage::SecureStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Persistent storage for one OAuth token set
#[derive(Clone)]
pub struct TokenStore {
    secure_store: Arc<dyn SecureStore>,
    key: String,
}

/// On-disk shape of the token set
///
/// `expires_at` is kept as unix seconds so the file stays readable and
/// independent of chrono's serde format.
#[derive(Debug, Serialize, Deserialize)]
struct StoredTokens {
    access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    expires_at: i64,
}

impl TokenStore {
    /// Create a token store that keeps its document under `key`
    pub fn new(secure_store: Arc<dyn SecureStore>, key: impl Into<String>) -> Self {
        let key = key.into();
        debug!(key = %key, "Initializing TokenStore");
        Self { secure_store, key }
    }

    /// Storage key of the token document
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Persist `tokens`, replacing whatever was stored before
    pub async fn save(&self, tokens: &OAuthTokens) -> Result<()> {
        let stored = StoredTokens {
            access_token: tokens.access_token.clone(),
            refresh_token: tokens.refresh_token.clone(),
            expires_at: tokens.expires_at.timestamp(),
        };

        let json = serde_json::to_vec_pretty(&stored).map_err(|e| {
            warn!(error = %e, "Failed to serialize tokens");
            AuthError::SerializationFailed {
                context: "token serialization".to_string(),
                source: e,
            }
        })?;

        self.secure_store
            .set_secret(&self.key, &json)
            .await
            .map_err(|e| {
                warn!(key = %self.key, error = %e, "Failed to store tokens");
                AuthError::SecureStorageUnavailable(e.to_string())
            })?;

        info!(
            key = %self.key,
            has_refresh_token = stored.refresh_token.is_some(),
            "Tokens stored"
        );

        Ok(())
    }

    /// Load the stored token set
    ///
    /// Returns:
    /// - `Ok(Some(tokens))` if a readable document exists
    /// - `Ok(None)` if nothing is stored, or the document was corrupted
    ///   (it is deleted in that case)
    /// - `Err` if the store itself cannot be read
    pub async fn load(&self) -> Result<Option<OAuthTokens>> {
        let data = self.secure_store.get_secret(&self.key).await.map_err(|e| {
            warn!(key = %self.key, error = %e, "Failed to read stored tokens");
            AuthError::SecureStorageUnavailable(e.to_string())
        })?;

        let Some(data) = data else {
            debug!(key = %self.key, "No stored tokens");
            return Ok(None);
        };

        let stored: StoredTokens = match serde_json::from_slice(&data) {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!(
                    key = %self.key,
                    error = %e,
                    "Stored tokens are corrupted, discarding them"
                );

                if let Err(delete_err) = self.secure_store.delete_secret(&self.key).await {
                    warn!(
                        key = %self.key,
                        error = %delete_err,
                        "Failed to delete corrupted token data"
                    );
                }

                return Ok(None);
            }
        };

        let Some(expires_at) = DateTime::<Utc>::from_timestamp(stored.expires_at, 0) else {
            warn!(key = %self.key, "Stored token expiry is out of range, discarding tokens");
            return Ok(None);
        };

        debug!(key = %self.key, "Loaded stored tokens");

        Ok(Some(OAuthTokens {
            access_token: stored.access_token,
            refresh_token: stored.refresh_token,
            expires_at,
        }))
    }

    /// Remove the stored token set
    pub async fn delete(&self) -> Result<()> {
        self.secure_store
            .delete_secret(&self.key)
            .await
            .map_err(|e| AuthError::SecureStorageUnavailable(e.to_string()))?;

        info!(key = %self.key, "Stored tokens deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::BridgeError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory SecureStore for testing
    #[derive(Default)]
    struct MemorySecureStore {
        data: Mutex<HashMap<String, Vec<u8>>>,
        fail: bool,
    }

    #[async_trait]
    impl SecureStore for MemorySecureStore {
        async fn set_secret(&self, key: &str, value: &[u8]) -> bridge_traits::error::Result<()> {
            if self.fail {
                return Err(BridgeError::NotAvailable("store offline".to_string()));
            }
            self.data
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_vec());
            Ok(())
        }

        async fn get_secret(&self, key: &str) -> bridge_traits::error::Result<Option<Vec<u8>>> {
            if self.fail {
                return Err(BridgeError::NotAvailable("store offline".to_string()));
            }
            Ok(self.data.lock().unwrap().get(key).cloned())
        }

        async fn delete_secret(&self, key: &str) -> bridge_traits::error::Result<()> {
            self.data.lock().unwrap().remove(key);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let store = TokenStore::new(Arc::new(MemorySecureStore::default()), "token.json");
        let tokens = OAuthTokens::new("access".to_string(), Some("refresh".to_string()), 3600);

        store.save(&tokens).await.unwrap();
        let loaded = store.load().await.unwrap().unwrap();

        assert_eq!(loaded.access_token, "access");
        assert_eq!(loaded.refresh_token.as_deref(), Some("refresh"));
        // Sub-second precision is dropped on disk
        assert_eq!(loaded.expires_at.timestamp(), tokens.expires_at.timestamp());
    }

    #[tokio::test]
    async fn test_load_missing_is_none() {
        let store = TokenStore::new(Arc::new(MemorySecureStore::default()), "token.json");
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let store = TokenStore::new(Arc::new(MemorySecureStore::default()), "token.json");

        store
            .save(&OAuthTokens::new("first".to_string(), Some("r".to_string()), 60))
            .await
            .unwrap();
        store
            .save(&OAuthTokens::new("second".to_string(), None, 60))
            .await
            .unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.access_token, "second");
        assert_eq!(loaded.refresh_token, None);
    }

    #[tokio::test]
    async fn test_corrupted_document_is_discarded() {
        let backend = Arc::new(MemorySecureStore::default());
        backend
            .set_secret("token.json", b"{not json")
            .await
            .unwrap();
        let store = TokenStore::new(backend.clone(), "token.json");

        assert!(store.load().await.unwrap().is_none());
        assert!(!backend.has_secret("token.json").await.unwrap());
    }

    #[tokio::test]
    async fn test_store_failure_is_reported() {
        let backend = Arc::new(MemorySecureStore {
            fail: true,
            ..Default::default()
        });
        let store = TokenStore::new(backend, "token.json");

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, AuthError::SecureStorageUnavailable(_)));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = TokenStore::new(Arc::new(MemorySecureStore::default()), "token.json");
        store
            .save(&OAuthTokens::new("a".to_string(), None, 60))
            .await
            .unwrap();

        store.delete().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }
}
