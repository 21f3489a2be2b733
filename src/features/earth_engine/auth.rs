use std::fs;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::core::error::AppError;

const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const EXPIRY_LEEWAY_SECONDS: i64 = 60;

/// Refresh-token credentials written out of band by `earthengine authenticate`.
#[derive(Debug, Clone, Deserialize)]
pub struct StoredCredentials {
    pub refresh_token: String,
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Exchanges the stored refresh token for short-lived access tokens and keeps
/// the current one until shortly before it expires.
pub struct TokenProvider {
    credentials: Option<StoredCredentials>,
    http_client: reqwest::Client,
    cached: RwLock<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(credentials: Option<StoredCredentials>, http_client: reqwest::Client) -> Self {
        Self {
            credentials,
            http_client,
            cached: RwLock::new(None),
        }
    }

    /// Reads the credentials file if present. Absence is not an error; the
    /// caller decides whether to warn and keep going.
    pub fn load_credentials(path: &str) -> Option<StoredCredentials> {
        let path = Path::new(path);
        let raw = fs::read_to_string(path).ok()?;
        match serde_json::from_str::<StoredCredentials>(&raw) {
            Ok(credentials) => Some(credentials),
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "failed to parse credentials file");
                None
            }
        }
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    pub async fn access_token(&self) -> Result<String, AppError> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            AppError::upstream(
                "Earth Engine credentials are not configured; run `earthengine authenticate`"
                    .to_string(),
            )
        })?;

        {
            let guard = self.cached.read().await;
            if let Some(token) = guard.as_ref() {
                if Utc::now() < token.expires_at {
                    return Ok(token.access_token.clone());
                }
            }
        }

        let response = self
            .http_client
            .post(TOKEN_ENDPOINT)
            .form(&[
                ("grant_type", "refresh_token"),
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
                ("refresh_token", credentials.refresh_token.as_str()),
            ])
            .send()
            .await
            .map_err(|err| AppError::upstream(format!("token refresh request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".to_string());
            let snippet = text.chars().take(512).collect::<String>();
            return Err(AppError::upstream(format!(
                "token refresh failed with {status}: {snippet}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|err| AppError::upstream(format!("failed to parse token response: {err}")))?;

        let expires_at =
            Utc::now() + Duration::seconds((token.expires_in - EXPIRY_LEEWAY_SECONDS).max(0));
        let access_token = token.access_token.clone();

        let mut guard = self.cached.write().await;
        *guard = Some(CachedToken {
            access_token: token.access_token,
            expires_at,
        });

        Ok(access_token)
    }
}
