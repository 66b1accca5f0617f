use chrono::{DateTime, Utc};
use parkly_core::identity::{AuthService, Credentials, Session};
use tracing::{info, warn};

use crate::error::AppError;

/// Validate locally, then exchange the credentials for a session.
pub async fn sign_in(
    auth: &dyn AuthService,
    email: &str,
    password: &str,
    now: DateTime<Utc>,
) -> Result<Session, AppError> {
    let credentials = Credentials::new(email, password)?;

    let response = auth.login(&credentials).await.map_err(|e| {
        warn!("Login failed for {}: {}", credentials.email, e);
        AppError::Login(e)
    })?;

    let session = Session::from_login(response, &credentials.email, now);
    info!("Signed in user {} ({:?})", session.user_id, session.role);
    Ok(session)
}
