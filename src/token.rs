//! Bearer-token cache keyed by credential fingerprint.
//!
//! Outbound API calls ask [`CredentialCache`] for a valid token; on miss or
//! expiry it fetches a fresh one through the [`TokenFetcher`] collaborator
//! and caches it with a safety-adjusted TTL. Refreshes are coalesced per
//! fingerprint so concurrent callers share one in-flight fetch.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::cache::CacheStore;
use crate::error::TokenError;

/// Seconds subtracted from `expires_in` so a cached token is never served
/// right at its expiry.
pub const SAFETY_MARGIN_SECS: u64 = 500;

/// Token lifetime assumed when the platform omits `expires_in`.
const DEFAULT_EXPIRES_IN: u64 = 7200;

/// Namespace prefix for credential fingerprints in a shared store.
const FINGERPRINT_PREFIX: &str = "pigeon.credential.";

/// Credential triple exchanged for bearer tokens.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub grant_type: String,
    pub app_id: String,
    pub secret: String,
}

impl Credentials {
    /// The standard `client_credential` grant.
    pub fn client_credential(app_id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            grant_type: "client_credential".to_owned(),
            app_id: app_id.into(),
            secret: secret.into(),
        }
    }

    /// Stable, namespaced cache key for this triple.
    pub fn fingerprint(&self) -> String {
        let joined = format!("{}.{}.{}", self.grant_type, self.app_id, self.secret);
        let digest = Sha256::digest(joined.as_bytes());
        format!("{FINGERPRINT_PREFIX}{}", hex::encode(digest))
    }
}

fn default_expires_in() -> u64 {
    DEFAULT_EXPIRES_IN
}

/// Bearer token as issued by the platform.
///
/// Serde field names mirror the platform JSON and must not change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,

    #[serde(default = "default_expires_in")]
    pub expires_in: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openid: Option<String>,
}

/// Raw token-endpoint response body.
///
/// A non-zero `errcode` is a platform error, never a token.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub errcode: i64,
    #[serde(default)]
    pub errmsg: String,
    pub access_token: Option<String>,
    pub expires_in: Option<u64>,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
    pub openid: Option<String>,
}

impl TokenResponse {
    fn into_token(self) -> Result<Token, TokenError> {
        if self.errcode != 0 {
            return Err(TokenError::Remote {
                code: self.errcode,
                message: self.errmsg,
            });
        }
        let access_token = self.access_token.ok_or_else(|| {
            TokenError::Serialization("token endpoint response carried no access_token".to_owned())
        })?;
        Ok(Token {
            access_token,
            expires_in: self.expires_in.unwrap_or(DEFAULT_EXPIRES_IN),
            refresh_token: self.refresh_token,
            scope: self.scope,
            openid: self.openid,
        })
    }
}

/// Cached record: the token plus its absolute expiry.
#[derive(Debug, Serialize, Deserialize)]
struct CachedToken {
    #[serde(flatten)]
    token: Token,
    expires_at: DateTime<Utc>,
}

/// Remote token endpoint collaborator.
///
/// Transport concerns (HTTP, request encoding, redirects) belong to the
/// implementation; this crate never issues requests itself.
#[async_trait]
pub trait TokenFetcher: Send + Sync {
    async fn fetch(&self, credentials: &Credentials) -> Result<TokenResponse, TokenError>;
}

/// TTL cache of bearer tokens in front of a remote token endpoint.
///
/// The store is an explicit capability; there is no process-wide registry.
/// Fetch failures are surfaced to the caller and never cached, so a
/// stale-but-unexpired token stays usable even when a forced refresh
/// elsewhere fails.
pub struct CredentialCache {
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn TokenFetcher>,
    credentials: Credentials,
    safety_margin: Duration,
    flights: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl CredentialCache {
    pub fn new(
        store: Arc<dyn CacheStore>,
        fetcher: Arc<dyn TokenFetcher>,
        credentials: Credentials,
    ) -> Self {
        Self {
            store,
            fetcher,
            credentials,
            safety_margin: Duration::from_secs(SAFETY_MARGIN_SECS),
            flights: Mutex::new(HashMap::new()),
        }
    }

    /// Override the refresh safety margin.
    pub fn with_safety_margin(mut self, margin: Duration) -> Self {
        self.safety_margin = margin;
        self
    }

    /// Cached token, fetching a fresh one on miss or expiry.
    pub async fn token(&self) -> Result<Token, TokenError> {
        self.get_token(false, None).await
    }

    /// Fresh token, bypassing the cache.
    pub async fn refresh(&self) -> Result<Token, TokenError> {
        self.get_token(true, None).await
    }

    /// Like [`Self::token`]/[`Self::refresh`], with a deadline applied to
    /// the remote fetch only. On timeout nothing is written to the cache.
    pub async fn token_with_deadline(
        &self,
        force_refresh: bool,
        deadline: Duration,
    ) -> Result<Token, TokenError> {
        self.get_token(force_refresh, Some(deadline)).await
    }

    async fn get_token(
        &self,
        force_refresh: bool,
        deadline: Option<Duration>,
    ) -> Result<Token, TokenError> {
        let key = self.credentials.fingerprint();

        if !force_refresh {
            if let Some(token) = self.cached(&key) {
                return Ok(token);
            }
        }

        let flight = self.flight(&key);
        let _guard = flight.lock().await;

        // Another caller may have refreshed while we waited on the flight.
        if !force_refresh {
            if let Some(token) = self.cached(&key) {
                return Ok(token);
            }
        }

        let response = match deadline {
            Some(deadline) => {
                tokio::time::timeout(deadline, self.fetcher.fetch(&self.credentials))
                    .await
                    .map_err(|_| TokenError::Timeout)??
            }
            None => self.fetcher.fetch(&self.credentials).await?,
        };
        let token = response.into_token()?;

        let lifetime = i64::try_from(token.expires_in)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or_else(chrono::Duration::zero);
        let record = CachedToken {
            token,
            expires_at: Utc::now() + lifetime,
        };
        let serialized = serde_json::to_string(&record)
            .map_err(|e| TokenError::Serialization(e.to_string()))?;
        self.store
            .set(&key, serialized, Some(self.effective_ttl(record.token.expires_in)));
        debug!(fingerprint = %key, "cached fresh bearer token");
        Ok(record.token)
    }

    fn cached(&self, key: &str) -> Option<Token> {
        let raw = self.store.get(key)?;
        match serde_json::from_str::<CachedToken>(&raw) {
            Ok(record) => {
                debug!(fingerprint = %key, "bearer token served from cache");
                Some(record.token)
            }
            Err(e) => {
                // An unreadable record is a miss; drop it and refetch.
                warn!(fingerprint = %key, error = %e, "discarding unreadable cached token");
                self.store.delete(key);
                None
            }
        }
    }

    fn effective_ttl(&self, expires_in: u64) -> Duration {
        let secs = expires_in
            .saturating_sub(self.safety_margin.as_secs())
            .max(1);
        Duration::from_secs(secs)
    }

    fn flight(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut flights = self.flights.lock();
        flights.entry(key.to_owned()).or_default().clone()
    }
}
