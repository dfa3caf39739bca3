//! # Authentication Module
//!
//! Obtains Google OAuth 2.0 credentials for the migration.
//!
//! ## Overview
//!
//! [`CredentialProvider::obtain`] returns usable credentials in one of three
//! ways: a still-valid token file, a refresh of an expired one, or an
//! interactive consent through the user's browser. The result is always
//! written back to the token file.
//!
//! ## Features
//!
//! - OAuth 2.0 authorization code flow with PKCE
//! - Refresh-token exchange
//! - Token persistence via the host `SecureStore`
//! - Client secrets loaded from the downloaded Google JSON file

pub mod client_secret;
pub mod error;
pub mod oauth;
pub mod provider;
pub mod token_store;
pub mod types;

pub use client_secret::ClientSecret;
pub use error::{AuthError, Result};
pub use oauth::{OAuthConfig, OAuthFlowManager, PkceVerifier};
pub use provider::{CredentialProvider, GOOGLE_SCOPES};
pub use token_store::TokenStore;
pub use types::OAuthTokens;
