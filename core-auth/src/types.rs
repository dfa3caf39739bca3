use chrono::{DateTime, Duration, Utc};
use std::fmt;

/// Seconds before the real expiry at which a token stops counting as valid.
/// Keeps a request from starting with a token that dies in flight.
pub const EXPIRY_BUFFER_SECS: i64 = 60;

/// OAuth 2.0 token set.
///
/// Contains the access token, the optional refresh token and the expiration
/// time of the access token.
///
/// # Security
///
/// Tokens must never be logged. The `Debug` implementation redacts them.
///
/// # Examples
///
/// ```
/// use core_auth::OAuthTokens;
///
/// let tokens = OAuthTokens::new(
///     "ya29.a0...".to_string(),
///     Some("1//0g...".to_string()),
///     3600,
/// );
///
/// assert!(tokens.is_valid());
/// assert!(tokens.can_refresh());
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthTokens {
    /// The access token used for API requests
    pub access_token: String,
    /// The refresh token used to obtain new access tokens
    pub refresh_token: Option<String>,
    /// When the access token expires (UTC)
    pub expires_at: DateTime<Utc>,
}

impl OAuthTokens {
    /// Create a new token set expiring `expires_in` seconds from now
    pub fn new(access_token: String, refresh_token: Option<String>, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at: Utc::now() + Duration::seconds(expires_in),
        }
    }

    /// Whether the access token can be used right now
    pub fn is_valid(&self) -> bool {
        !self.access_token.is_empty() && !self.is_expired_with_buffer(EXPIRY_BUFFER_SECS)
    }

    /// Whether a refresh token is available
    pub fn can_refresh(&self) -> bool {
        self.refresh_token
            .as_deref()
            .is_some_and(|token| !token.is_empty())
    }

    /// Check if the access token is expired with a custom buffer
    ///
    /// # Arguments
    ///
    /// * `buffer_seconds` - Number of seconds before expiration to consider expired
    pub fn is_expired_with_buffer(&self, buffer_seconds: i64) -> bool {
        Utc::now() >= self.expires_at - Duration::seconds(buffer_seconds)
    }

    /// Get the time remaining until token expiration
    ///
    /// Returns `None` if the token is already expired.
    pub fn time_until_expiry(&self) -> Option<Duration> {
        let now = Utc::now();
        if now >= self.expires_at {
            None
        } else {
            Some(self.expires_at - now)
        }
    }
}

// Custom Debug implementation to avoid logging tokens
impl fmt::Debug for OAuthTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthTokens")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
