use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parkly_shared::Masked;
use serde::{Deserialize, Serialize};

use crate::ApiError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Drivers who find and book spaces.
    Buyer,
    /// Hosts who list spaces and review detections.
    Seller,
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: Masked<String>,
}

impl Credentials {
    pub fn new(email: &str, password: &str) -> Result<Self, CredentialsError> {
        let email = email.trim();
        let password = password.trim();
        if email.is_empty() || password.is_empty() {
            return Err(CredentialsError::Missing);
        }
        Ok(Self {
            email: email.to_string(),
            password: Masked::new(password.to_string()),
        })
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CredentialsError {
    #[error("Please enter both email and password.")]
    Missing,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: Masked<String>,
    pub user_id: i64,
    pub role: Role,
    #[serde(default)]
    pub name: Option<String>,
    /// Token lifetime in milliseconds.
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// The authenticated user, handed explicitly to every screen that needs it.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: i64,
    pub role: Role,
    pub name: Option<String>,
    pub email: String,
    pub token: Masked<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn from_login(response: LoginResponse, email: &str, now: DateTime<Utc>) -> Self {
        Self {
            user_id: response.user_id,
            role: response.role,
            name: response.name,
            email: email.trim().to_string(),
            token: response.token,
            // A lifetime too large to represent is treated as no expiry.
            expires_at: response
                .expires_in
                .and_then(Duration::try_milliseconds)
                .and_then(|lifetime| now.checked_add_signed(lifetime)),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(false, |at| now >= at)
    }
}

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Exchange credentials for a bearer token.
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, ApiError>;
}
