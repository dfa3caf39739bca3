//! OAuth Redirect Abstraction
//!
//! The interactive consent flow needs two host capabilities: showing the
//! authorization URL to the user and receiving the redirect that carries the
//! authorization code. Desktop hosts do the latter with a loopback listener.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::Result;

/// Query parameters delivered to the redirect URI
///
/// Unknown parameters such as `scope` are ignored when deserializing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AuthorizationCallback {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Set by the provider when the user denied consent
    pub error: Option<String>,
}

/// Receives the OAuth authorization redirect
#[async_trait]
pub trait AuthCallbackListener: Send + Sync {
    /// Start accepting redirects and return the URI to register in the
    /// authorization request. Calling it again returns the same URI.
    async fn start(&self) -> Result<String>;

    /// Show the authorization URL to the user
    async fn present_authorization_url(&self, url: &str) -> Result<()>;

    /// Block until the provider redirects back, returning its parameters
    async fn wait_for_callback(&self) -> Result<AuthorizationCallback>;
}
