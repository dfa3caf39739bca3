//! OAuth client secrets
//!
//! Parses the JSON file downloaded from the Google Cloud console. Desktop
//! clients put their values under `installed`, web clients under `web`.

use crate::error::{AuthError, Result};
use crate::oauth::OAuthConfig;
use bridge_traits::storage::FileSystemAccess;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use tracing::debug;

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// OAuth client registration
#[derive(Clone, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ClientSecret {
    /// Parse a client secrets document
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let file: ClientSecretFile = serde_json::from_slice(data)
            .map_err(|e| AuthError::InvalidClientSecret(e.to_string()))?;

        let secret = file.installed.or(file.web).ok_or_else(|| {
            AuthError::InvalidClientSecret(
                "expected an \"installed\" or \"web\" section".to_string(),
            )
        })?;

        if secret.client_id.trim().is_empty() {
            return Err(AuthError::InvalidClientSecret(
                "client_id is empty".to_string(),
            ));
        }

        Ok(secret)
    }

    /// Read and parse the client secrets file at `path`
    pub async fn load(fs: &dyn FileSystemAccess, path: &Path) -> Result<Self> {
        let exists = fs
            .exists(path)
            .await
            .map_err(|e| AuthError::Other(format!("Cannot access {}: {}", path.display(), e)))?;
        if !exists {
            return Err(AuthError::ClientSecretMissing(path.display().to_string()));
        }

        let data = fs
            .read_file(path)
            .await
            .map_err(|e| AuthError::Other(format!("Cannot read {}: {}", path.display(), e)))?;

        let secret = Self::from_json(&data)?;
        debug!(path = %path.display(), "Loaded OAuth client secrets");
        Ok(secret)
    }

    /// Flow configuration for this client
    pub fn oauth_config(&self, redirect_uri: impl Into<String>, scopes: &[&str]) -> OAuthConfig {
        OAuthConfig {
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            redirect_uri: redirect_uri.into(),
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
            auth_url: self.auth_uri.clone(),
            token_url: self.token_uri.clone(),
        }
    }
}

impl fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSecret")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "[REDACTED]"))
            .field("auth_uri", &self.auth_uri)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_installed_client() {
        let json = br#"{
            "installed": {
                "client_id": "123.apps.googleusercontent.com",
                "project_id": "migrator",
                "auth_uri": "https://accounts.google.com/o/oauth2/auth",
                "token_uri": "https://oauth2.googleapis.com/token",
                "client_secret": "GOCSPX-abc",
                "redirect_uris": ["http://localhost"]
            }
        }"#;

        let secret = ClientSecret::from_json(json).unwrap();
        assert_eq!(secret.client_id, "123.apps.googleusercontent.com");
        assert_eq!(secret.client_secret.as_deref(), Some("GOCSPX-abc"));
        assert_eq!(secret.token_uri, DEFAULT_TOKEN_URI);
    }

    #[test]
    fn test_parse_web_client_with_defaults() {
        let json = br#"{"web": {"client_id": "web-client"}}"#;

        let secret = ClientSecret::from_json(json).unwrap();
        assert_eq!(secret.client_id, "web-client");
        assert_eq!(secret.client_secret, None);
        assert_eq!(secret.auth_uri, DEFAULT_AUTH_URI);
    }

    #[test]
    fn test_rejects_unknown_layout() {
        let err = ClientSecret::from_json(br#"{"other": {}}"#).unwrap_err();
        assert!(matches!(err, AuthError::InvalidClientSecret(_)));

        let err = ClientSecret::from_json(b"not json").unwrap_err();
        assert!(matches!(err, AuthError::InvalidClientSecret(_)));
    }

    #[test]
    fn test_oauth_config_carries_scopes() {
        let secret = ClientSecret::from_json(br#"{"installed": {"client_id": "c"}}"#).unwrap();
        let config = secret.oauth_config("http://localhost:8080/", &["a", "b"]);

        assert_eq!(config.redirect_uri, "http://localhost:8080/");
        assert_eq!(config.scopes, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(config.token_url, DEFAULT_TOKEN_URI);
    }

    #[test]
    fn test_debug_hides_secret() {
        let secret =
            ClientSecret::from_json(br#"{"installed": {"client_id": "c", "client_secret": "s3cr3t"}}"#)
                .unwrap();
        assert!(!format!("{:?}", secret).contains("s3cr3t"));
    }
}
