//! Bearer tokens for the video service and object storage.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use gcp_auth::TokenProvider;
use showreel_core::error::CoreError;
use tokio::sync::RwLock;

/// OAuth scope covering Vertex AI and Cloud Storage.
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Refresh this long before the provider-reported expiry.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// TTL assumed when the reported expiry cannot be converted.
const FALLBACK_TTL: Duration = Duration::from_secs(50 * 60);

/// Source of bearer tokens.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn token(&self) -> Result<String, CoreError>;
}

/// A fixed token, e.g. from `gcloud auth print-access-token`.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StaticToken(***)")
    }
}

#[async_trait]
impl CredentialProvider for StaticToken {
    async fn token(&self) -> Result<String, CoreError> {
        if self.0.trim().is_empty() {
            return Err(CoreError::Auth("empty access token".into()));
        }
        Ok(self.0.clone())
    }
}

// ---------------------------------------------------------------------------
// Application default credentials
// ---------------------------------------------------------------------------

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Application default credentials with a refresh-ahead cache.
pub struct GcpCredentials {
    provider: Arc<dyn TokenProvider>,
    cache: RwLock<Option<CachedToken>>,
}

impl GcpCredentials {
    /// Discover credentials from the environment (service account file,
    /// metadata server, or gcloud).
    pub async fn discover() -> Result<Self, CoreError> {
        let provider = gcp_auth::provider()
            .await
            .map_err(|e| CoreError::Auth(format!("no usable credentials: {e}")))?;
        Ok(Self::new(provider))
    }

    pub fn new(provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            provider,
            cache: RwLock::new(None),
        }
    }

    async fn refresh(&self, cache: &mut Option<CachedToken>) -> Result<String, CoreError> {
        let token = self
            .provider
            .token(&[CLOUD_PLATFORM_SCOPE])
            .await
            .map_err(|e| CoreError::Auth(format!("failed to obtain access token: {e}")))?;

        let now = Utc::now();
        let expires = token.expires_at();
        let ttl = if expires > now {
            (expires - now).to_std().unwrap_or(FALLBACK_TTL)
        } else {
            Duration::ZERO
        };
        let access_token = token.as_str().to_string();
        *cache = Some(CachedToken {
            access_token: access_token.clone(),
            expires_at: Instant::now() + ttl,
        });
        tracing::debug!(ttl_secs = ttl.as_secs(), "Refreshed access token");
        Ok(access_token)
    }
}

#[async_trait]
impl CredentialProvider for GcpCredentials {
    async fn token(&self) -> Result<String, CoreError> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                if Instant::now() + REFRESH_MARGIN < cached.expires_at {
                    return Ok(cached.access_token.clone());
                }
            }
        }

        let mut cache = self.cache.write().await;
        if let Some(cached) = cache.as_ref() {
            if Instant::now() + REFRESH_MARGIN < cached.expires_at {
                return Ok(cached.access_token.clone());
            }
        }
        self.refresh(&mut cache).await
    }
}
