//! Clients for the services this one depends on: the auth service (identity
//! verification and the user directory) and the payment service (subscription
//! status).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use http::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;
use url::Url;

use crate::models::Role;

const VERIFY_PATH: &str = "api/auth/verify";
const USERS_PATH: &str = "api/users";
const SUBSCRIPTION_STATUS_PATH: &str = "api/subscriptions/status";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("credential rejected")]
    Unauthorized,
    #[error("unexpected status {0}")]
    Status(StatusCode),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: String,
    pub role: Role,
    pub name: String,
    pub email: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DirectoryEntry {
    pub id: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubscriptionStatus {
    has_active_subscription: bool,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Identity, GatewayError>;
}

#[async_trait]
pub trait SubscriptionGate: Send + Sync {
    async fn has_active_subscription(&self, token: &str) -> Result<bool, GatewayError>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn list_users(&self, token: &str) -> Result<Vec<DirectoryEntry>, GatewayError>;
}

/// Paths are joined relative to the base, so it must end in `/` to keep any
/// prefix such as `http://gateway/auth`.
fn as_base(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

pub fn build_client(timeout: Duration) -> Result<reqwest::Client, GatewayError> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

async fn get_json<T: serde::de::DeserializeOwned>(
    client: &reqwest::Client,
    base: &Url,
    path: &str,
    token: &str,
) -> Result<T, GatewayError> {
    let url = base.join(path)?;
    let response = client.get(url).bearer_auth(token).send().await?;
    match response.status() {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(GatewayError::Unauthorized),
        status if !status.is_success() => Err(GatewayError::Status(status)),
        _ => Ok(response.json().await?),
    }
}

/// Auth-service client. Verification results are cached per credential for a
/// short TTL; a zero TTL verifies every request.
pub struct AuthServiceClient {
    client: reqwest::Client,
    base_url: Arc<Url>,
    cache_ttl: Duration,
    cache: Mutex<HashMap<String, (Identity, Instant)>>,
}

impl AuthServiceClient {
    pub fn new(client: reqwest::Client, base_url: Url, cache_ttl: Duration) -> Self {
        Self {
            client,
            base_url: Arc::new(as_base(base_url)),
            cache_ttl,
            cache: Mutex::new(HashMap::new()),
        }
    }

    async fn cached(&self, token: &str) -> Option<Identity> {
        if self.cache_ttl.is_zero() {
            return None;
        }
        let mut cache = self.cache.lock().await;
        match cache.get(token) {
            Some((identity, at)) if at.elapsed() < self.cache_ttl => Some(identity.clone()),
            Some(_) => {
                cache.remove(token);
                None
            }
            None => None,
        }
    }
}

#[async_trait]
impl IdentityProvider for AuthServiceClient {
    async fn verify(&self, token: &str) -> Result<Identity, GatewayError> {
        if let Some(identity) = self.cached(token).await {
            return Ok(identity);
        }
        let identity: Identity = get_json(&self.client, &self.base_url, VERIFY_PATH, token).await?;
        if !self.cache_ttl.is_zero() {
            self.cache
                .lock()
                .await
                .insert(token.to_string(), (identity.clone(), Instant::now()));
        }
        Ok(identity)
    }
}

#[async_trait]
impl UserDirectory for AuthServiceClient {
    async fn list_users(&self, token: &str) -> Result<Vec<DirectoryEntry>, GatewayError> {
        get_json(&self.client, &self.base_url, USERS_PATH, token).await
    }
}

pub struct PaymentServiceClient {
    client: reqwest::Client,
    base_url: Arc<Url>,
}

impl PaymentServiceClient {
    pub fn new(client: reqwest::Client, base_url: Url) -> Self {
        Self {
            client,
            base_url: Arc::new(as_base(base_url)),
        }
    }
}

#[async_trait]
impl SubscriptionGate for PaymentServiceClient {
    async fn has_active_subscription(&self, token: &str) -> Result<bool, GatewayError> {
        let status: SubscriptionStatus = get_json(
            &self.client,
            &self.base_url,
            SUBSCRIPTION_STATUS_PATH,
            token,
        )
        .await?;
        Ok(status.has_active_subscription)
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;

    fn client() -> reqwest::Client {
        build_client(Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn test_verify_caches_identity() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/auth/verify")
                .header("authorization", "Bearer t1");
            then.status(200).json_body(json!({
                "userId": "u1",
                "role": "monitor",
                "name": "Marta",
                "email": "marta@gym.test",
                "isActive": true
            }));
        });
        let auth = AuthServiceClient::new(
            client(),
            Url::parse(&server.base_url()).unwrap(),
            Duration::from_secs(60),
        );

        let first = auth.verify("t1").await.unwrap();
        let second = auth.verify("t1").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.role, Role::Monitor);
        mock.assert_calls(1);
    }

    #[tokio::test]
    async fn test_verify_expired_entry_is_refetched() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/api/auth/verify");
            then.status(200).json_body(json!({
                "userId": "u2",
                "role": "socio",
                "name": "Ana",
                "email": "ana@gym.test"
            }));
        });
        let auth = AuthServiceClient::new(
            client(),
            Url::parse(&server.base_url()).unwrap(),
            Duration::from_millis(50),
        );

        auth.verify("t2").await.unwrap();
        tokio::time::sleep(Duration::from_millis(80)).await;
        auth.verify("t2").await.unwrap();
        mock.assert_calls(2);
        assert_eq!(auth.cache.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_base_url_prefix_is_kept() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/payments/api/subscriptions/status");
            then.status(200)
                .json_body(json!({ "hasActiveSubscription": false }));
        });
        let base = Url::parse(&format!("{}/payments", server.base_url())).unwrap();
        let payments = PaymentServiceClient::new(client(), base);

        assert!(!payments.has_active_subscription("member").await.unwrap());
        mock.assert_calls(1);
    }

    #[tokio::test]
    async fn test_subscription_timeout_is_an_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/subscriptions/status");
            then.status(200)
                .delay(Duration::from_millis(800))
                .json_body(json!({ "hasActiveSubscription": true }));
        });
        let payments = PaymentServiceClient::new(
            build_client(Duration::from_millis(100)).unwrap(),
            Url::parse(&server.base_url()).unwrap(),
        );

        assert!(matches!(
            payments.has_active_subscription("member").await,
            Err(GatewayError::Http(_))
        ));
    }

    #[tokio::test]
    async fn test_verify_rejected_credential() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/auth/verify");
            then.status(401);
        });
        let auth = AuthServiceClient::new(
            client(),
            Url::parse(&server.base_url()).unwrap(),
            Duration::ZERO,
        );

        assert!(matches!(
            auth.verify("bad").await,
            Err(GatewayError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_subscription_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/api/subscriptions/status")
                .header("authorization", "Bearer member");
            then.status(200)
                .json_body(json!({ "hasActiveSubscription": true }));
        });
        let payments = PaymentServiceClient::new(client(), Url::parse(&server.base_url()).unwrap());

        assert!(payments.has_active_subscription("member").await.unwrap());
    }

    #[tokio::test]
    async fn test_subscription_upstream_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/subscriptions/status");
            then.status(500);
        });
        let payments = PaymentServiceClient::new(client(), Url::parse(&server.base_url()).unwrap());

        assert!(matches!(
            payments.has_active_subscription("member").await,
            Err(GatewayError::Status(StatusCode::INTERNAL_SERVER_ERROR))
        ));
    }
}
