//! Credential acquisition for a migration run
//!
//! [`CredentialProvider::obtain`] walks the same ladder every run:
//!
//! ```text
//! stored & valid ──────────────────────────────► use as-is
//! stored & expired & refresh token ──► refresh ─► persist
//! otherwise ──► browser consent ──► exchange ───► persist
//! ```
//!
//! A refresh the token endpoint rejects is fatal. The user deletes the token
//! file to start over with a fresh consent.

use crate::client_secret::ClientSecret;
use crate::error::{AuthError, Result};
use crate::oauth::OAuthFlowManager;
use crate::token_store::TokenStore;
use crate::types::OAuthTokens;
use bridge_traits::auth::AuthCallbackListener;
use bridge_traits::http::HttpClient;
use bridge_traits::storage::FileSystemAccess;
use core_runtime::config::MigrationConfig;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Scopes requested during consent: read the source, append to the library
pub const GOOGLE_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/drive.readonly",
    "https://www.googleapis.com/auth/photoslibrary.appendonly",
];

/// Produces usable credentials, persisting whatever it obtains
pub struct CredentialProvider {
    token_store: TokenStore,
    http_client: Arc<dyn HttpClient>,
    file_system: Arc<dyn FileSystemAccess>,
    listener: Arc<dyn AuthCallbackListener>,
    client_secret_path: PathBuf,
    consent_timeout: Duration,
}

impl CredentialProvider {
    pub fn new(
        config: &MigrationConfig,
        token_store: TokenStore,
        http_client: Arc<dyn HttpClient>,
        file_system: Arc<dyn FileSystemAccess>,
        listener: Arc<dyn AuthCallbackListener>,
    ) -> Self {
        Self {
            token_store,
            http_client,
            file_system,
            listener,
            client_secret_path: config.client_secret_path.clone(),
            consent_timeout: config.consent_timeout,
        }
    }

    /// Return valid credentials, refreshing or asking for consent as needed
    #[instrument(skip(self))]
    pub async fn obtain(&self) -> Result<OAuthTokens> {
        if let Some(mut tokens) = self.token_store.load().await? {
            if tokens.is_valid() {
                debug!("Stored credentials are valid");
                return Ok(tokens);
            }

            if tokens.can_refresh() {
                info!("Stored credentials expired, refreshing");
                self.refresh(&mut tokens).await?;
                return Ok(tokens);
            }

            warn!("Stored credentials expired and cannot be refreshed");
        }

        let tokens = self.consent().await?;
        self.token_store.save(&tokens).await?;
        Ok(tokens)
    }

    /// Refresh `tokens` in place and persist the result
    pub async fn refresh(&self, tokens: &mut OAuthTokens) -> Result<()> {
        let refresh_token = tokens
            .refresh_token
            .clone()
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                AuthError::TokenRefreshFailed("No refresh token available".to_string())
            })?;

        let secret = self.client_secret().await?;
        // The redirect URI plays no part in the refresh grant
        let flow = OAuthFlowManager::new(
            secret.oauth_config(String::new(), GOOGLE_SCOPES),
            Arc::clone(&self.http_client),
        );

        *tokens = flow.refresh_access_token(&refresh_token).await?;
        self.token_store.save(tokens).await
    }

    async fn consent(&self) -> Result<OAuthTokens> {
        let secret = self.client_secret().await?;

        let redirect_uri = self
            .listener
            .start()
            .await
            .map_err(|e| AuthError::AuthenticationFailed(e.to_string()))?;

        let flow = OAuthFlowManager::new(
            secret.oauth_config(redirect_uri, GOOGLE_SCOPES),
            Arc::clone(&self.http_client),
        );
        let (auth_url, verifier) = flow.build_auth_url()?;

        self.listener
            .present_authorization_url(&auth_url)
            .await
            .map_err(|e| AuthError::AuthenticationFailed(e.to_string()))?;

        let callback = tokio::time::timeout(self.consent_timeout, self.listener.wait_for_callback())
            .await
            .map_err(|_| AuthError::ConsentTimeout(self.consent_timeout.as_secs()))?
            .map_err(|e| AuthError::AuthenticationFailed(e.to_string()))?;

        if let Some(error) = callback.error {
            warn!(error = %error, "User did not grant consent");
            return Err(AuthError::ConsentDenied(error));
        }

        let code = callback.code.ok_or_else(|| {
            AuthError::InvalidAuthCode("Redirect did not carry an authorization code".to_string())
        })?;
        let state = callback.state.unwrap_or_default();

        let tokens = flow.exchange_code(&code, &state, &verifier).await?;
        info!("Consent completed");
        Ok(tokens)
    }

    async fn client_secret(&self) -> Result<ClientSecret> {
        ClientSecret::load(self.file_system.as_ref(), &self.client_secret_path).await
    }
}
