//! IAM authentication
//!
//! Exchanges a service-account authorized key for a short-lived IAM token
//! (PS256-signed JWT, see the Yandex IAM docs) and caches the result.

use crate::error::{Result, YandexError};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// Tokens are valid for 12 hours; refresh well before that
const TOKEN_REFRESH_AFTER_SECS: i64 = 3600;
/// Lifetime of the signed JWT itself
const JWT_LIFETIME_SECS: i64 = 600;
const PEM_BEGIN: &str = "-----BEGIN";

/// Service-account authorized key (`yc iam key create --output key.json`)
#[derive(Clone, Serialize, Deserialize)]
pub struct ServiceAccountKey {
    /// Key ID, sent as the JWT `kid`
    pub id: String,

    /// Service account the key belongs to, sent as the JWT `iss`
    pub service_account_id: String,

    /// PEM-encoded RSA private key
    pub private_key: String,
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("id", &self.id)
            .field("service_account_id", &self.service_account_id)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let key: ServiceAccountKey = serde_json::from_value(value)
            .map_err(|e| YandexError::InvalidKey(e.to_string()))?;
        if key.id.is_empty() || key.service_account_id.is_empty() {
            return Err(YandexError::InvalidKey(
                "id and service_account_id must be set".to_string(),
            ));
        }
        if !key.private_key.contains(PEM_BEGIN) {
            return Err(YandexError::InvalidKey(
                "private_key is not PEM encoded".to_string(),
            ));
        }
        Ok(key)
    }

    /// The PEM block without the banner line `yc` puts in front of it
    pub fn private_key_pem(&self) -> &str {
        self.private_key
            .find(PEM_BEGIN)
            .map(|start| &self.private_key[start..])
            .unwrap_or(&self.private_key)
    }

    /// Sign a JWT suitable for the IAM token endpoint
    pub fn sign_jwt(&self, audience: &str, now: DateTime<Utc>) -> Result<String> {
        let mut header = Header::new(Algorithm::PS256);
        header.kid = Some(self.id.clone());

        let claims = JwtClaims {
            aud: audience.to_string(),
            iss: self.service_account_id.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(JWT_LIFETIME_SECS)).timestamp(),
        };

        let key = EncodingKey::from_rsa_pem(self.private_key_pem().as_bytes())?;
        Ok(jsonwebtoken::encode(&header, &claims, &key)?)
    }
}

#[derive(Debug, Serialize)]
struct JwtClaims {
    aud: String,
    iss: String,
    iat: i64,
    exp: i64,
}

/// How requests are authorized
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Exchange a service-account key for IAM tokens
    ServiceAccount(ServiceAccountKey),
    /// Use a pre-issued IAM token as-is
    IamToken(String),
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    jwt: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    iam_token: String,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    obtained_at: DateTime<Utc>,
}

/// IAM token source shared by every request of a client
pub struct IamAuth {
    credentials: Credentials,
    token_url: String,
    cached: Mutex<Option<CachedToken>>,
}

impl IamAuth {
    pub fn new(credentials: Credentials, token_url: impl Into<String>) -> Self {
        Self {
            credentials,
            token_url: token_url.into(),
            cached: Mutex::new(None),
        }
    }

    /// Current IAM token, exchanging a fresh one when the cache is stale
    pub async fn token(&self, http: &reqwest::Client) -> Result<String> {
        let key = match &self.credentials {
            Credentials::IamToken(token) => return Ok(token.clone()),
            Credentials::ServiceAccount(key) => key,
        };

        let mut cached = self.cached.lock().await;
        let now = Utc::now();
        if let Some(entry) = cached.as_ref() {
            if now.signed_duration_since(entry.obtained_at)
                < Duration::seconds(TOKEN_REFRESH_AFTER_SECS)
            {
                return Ok(entry.token.clone());
            }
        }

        tracing::debug!(
            "Exchanging service account key {} for an IAM token",
            key.id
        );
        let token = self.exchange(http, key, now).await?;
        *cached = Some(CachedToken {
            token: token.clone(),
            obtained_at: now,
        });
        Ok(token)
    }

    async fn exchange(
        &self,
        http: &reqwest::Client,
        key: &ServiceAccountKey,
        now: DateTime<Utc>,
    ) -> Result<String> {
        let jwt = key.sign_jwt(&self.token_url, now)?;

        let response = http
            .post(&self.token_url)
            .json(&TokenRequest { jwt: &jwt })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(YandexError::TokenExchange(format!(
                "{}: {}",
                status,
                body.trim()
            )));
        }

        let token: TokenResponse = serde_json::from_str(&body)?;
        Ok(token.iam_token)
    }
}
