//! reqwest implementation of [`ExchangeClient`] against the session API.
//!
//! Endpoints (relative to the configured base URL):
//! - `POST /login` `{providerId, credentials}`
//! - `POST /refresh` `{renewalToken?}` (cookie jar carries the ambient token)
//! - `GET /me`
//! - `POST /logout`
//! - `POST {callback_exchange_path}` `{provider, params}`

use crate::auth_fsm::User;
use crate::claims;
use crate::clock::Clock;
use crate::credential_store::{bounded_seconds, Credential, DEFAULT_CREDENTIAL_LIFETIME_SECS};
use crate::error::{ExchangeError, SessionError, SessionResult};
use crate::exchange::{CallbackArtifact, ExchangeClient, Exchanged, LoginCredentials};
use async_trait::async_trait;
use auth_session_config::Config;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

fn summarize_response_body(body: &str) -> String {
    let mut hasher = DefaultHasher::new();
    body.hash(&mut hasher);
    format!("len={},digest={:016x}", body.len(), hasher.finish())
}

/// Settings for [`HttpExchangeClient`].
#[derive(Debug, Clone)]
pub struct HttpExchangeConfig {
    pub base_url: String,
    pub callback_exchange_path: String,
    pub timeout: Duration,
    /// Lifetime assigned when neither the response nor the token gives one.
    pub default_lifetime: chrono::Duration,
}

impl HttpExchangeConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            callback_exchange_path: auth_session_config::DEFAULT_CALLBACK_EXCHANGE_PATH.to_string(),
            timeout: Duration::from_secs(30),
            default_lifetime: chrono::Duration::seconds(DEFAULT_CREDENTIAL_LIFETIME_SECS),
        }
    }

    pub fn from_config(config: &Config) -> SessionResult<Self> {
        let base_url = config.api_base_url()?;
        Ok(Self {
            base_url: base_url.to_string(),
            callback_exchange_path: config.callback_exchange_path.clone(),
            timeout: Duration::from_secs(config.request_timeout_secs),
            default_lifetime: bounded_seconds(config.default_credential_lifetime_secs),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Login,
    Exchange,
    Renew,
    Profile,
    Logout,
}

impl Operation {
    fn name(self) -> &'static str {
        match self {
            Operation::Login => "login",
            Operation::Exchange => "exchange",
            Operation::Renew => "renew",
            Operation::Profile => "profile",
            Operation::Logout => "logout",
        }
    }

    /// Transport failures count as the failure of the operation itself.
    fn transport_error(self, detail: String) -> ExchangeError {
        match self {
            Operation::Renew => ExchangeError::RenewalFailed(detail),
            _ => ExchangeError::ProviderUnavailable(detail),
        }
    }

    fn status_error(self, status: StatusCode, body_summary: &str) -> ExchangeError {
        let detail = format!("{} returned {} ({})", self.name(), status, body_summary);
        let unavailable =
            status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS;

        match self {
            Operation::Renew => ExchangeError::RenewalFailed(detail),
            _ if unavailable => ExchangeError::ProviderUnavailable(detail),
            Operation::Exchange => ExchangeError::ExchangeFailed(detail),
            Operation::Login | Operation::Profile => ExchangeError::InvalidCredentials(detail),
            Operation::Logout => ExchangeError::ProviderUnavailable(detail),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireUser {
    id: String,
    email: String,
    #[serde(default, alias = "name")]
    display_name: Option<String>,
}

impl From<WireUser> for User {
    fn from(user: WireUser) -> Self {
        Self {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    provider_id: &'a str,
    credentials: &'a LoginCredentials,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    renewal_token: Option<String>,
}

/// Body returned by `/login` and the provider exchange endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssuedResponse {
    #[serde(default)]
    user: Option<WireUser>,
    credential: String,
    #[serde(default)]
    expires_in_seconds: Option<i64>,
    #[serde(default)]
    renewal_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    #[serde(default)]
    user: Option<WireUser>,
    access_credential: String,
    #[serde(default)]
    expires_in_seconds: Option<i64>,
    #[serde(default)]
    renewal_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    user: WireUser,
}

/// HTTP client for the session API.
#[derive(Clone)]
pub struct HttpExchangeClient {
    http_client: reqwest::Client,
    config: HttpExchangeConfig,
    clock: Arc<dyn Clock>,
}

impl HttpExchangeClient {
    pub fn new(config: HttpExchangeConfig, clock: Arc<dyn Clock>) -> SessionResult<Self> {
        let http_client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.timeout)
            .build()
            .map_err(|e| SessionError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            config,
            clock,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn send(
        &self,
        op: Operation,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ExchangeError> {
        let response = request
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                warn!(operation = op.name(), error = %e, "Request failed");
                op.transport_error(e.to_string())
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let body_summary = summarize_response_body(&body);
        warn!(
            operation = op.name(),
            status = %status,
            body_summary = %body_summary,
            "Request rejected"
        );
        Err(op.status_error(status, &body_summary))
    }

    async fn read_json<T: DeserializeOwned>(
        op: Operation,
        response: reqwest::Response,
    ) -> Result<T, ExchangeError> {
        response
            .json::<T>()
            .await
            .map_err(|e| op.transport_error(format!("unexpected {} response: {}", op.name(), e)))
    }

    fn issue(
        &self,
        access_token: String,
        expires_in_seconds: Option<i64>,
        renewal_token: Option<String>,
    ) -> Credential {
        Credential::issued(
            access_token,
            expires_in_seconds,
            self.clock.now(),
            self.config.default_lifetime,
        )
        .with_renewal_token(renewal_token)
    }

    /// User from the response body, else from claims, else from `GET /me`.
    async fn resolve_user(
        &self,
        op: Operation,
        user: Option<WireUser>,
        credential: &Credential,
    ) -> Result<User, ExchangeError> {
        if let Some(user) = user {
            return Ok(user.into());
        }

        match claims::decode(credential.access_token()) {
            Ok(claims) => Ok(claims.into()),
            Err(e) => {
                debug!(operation = op.name(), reason = %e, "Claims insufficient, fetching profile");
                self.fetch_profile(credential).await.map_err(|e| match op {
                    Operation::Renew => ExchangeError::RenewalFailed(e.to_string()),
                    _ => e,
                })
            }
        }
    }
}

#[async_trait]
impl ExchangeClient for HttpExchangeClient {
    async fn exchange_callback(
        &self,
        artifact: &CallbackArtifact,
    ) -> Result<Exchanged, ExchangeError> {
        let op = Operation::Exchange;
        debug!(provider = %artifact.provider, "Exchanging provider callback");

        let request = self
            .http_client
            .post(self.endpoint(&self.config.callback_exchange_path))
            .json(artifact);
        let body: IssuedResponse = Self::read_json(op, self.send(op, request).await?).await?;

        let credential = self.issue(body.credential, body.expires_in_seconds, body.renewal_token);
        let user = self.resolve_user(op, body.user, &credential).await?;

        info!(user_id = %user.id, provider = %artifact.provider, "Provider callback exchanged");
        Ok(Exchanged { user, credential })
    }

    async fn renew(&self, renewal_token: Option<String>) -> Result<Exchanged, ExchangeError> {
        let op = Operation::Renew;
        debug!(has_renewal_token = renewal_token.is_some(), "Renewing credential");

        let request = self
            .http_client
            .post(self.endpoint("refresh"))
            .json(&RefreshRequest {
                renewal_token: renewal_token.clone(),
            });
        let body: RefreshResponse = Self::read_json(op, self.send(op, request).await?).await?;

        // Cookie-based servers never echo a token; keep the one we sent
        let credential = self.issue(
            body.access_credential,
            body.expires_in_seconds,
            body.renewal_token.or(renewal_token),
        );
        let user = self.resolve_user(op, body.user, &credential).await?;

        info!(
            user_id = %user.id,
            expires_at = %credential.expires_at(),
            "Credential renewed"
        );
        Ok(Exchanged { user, credential })
    }

    async fn login(
        &self,
        provider_id: &str,
        credentials: &LoginCredentials,
    ) -> Result<Exchanged, ExchangeError> {
        let op = Operation::Login;
        debug!(provider_id = %provider_id, "Logging in");

        let request = self
            .http_client
            .post(self.endpoint("login"))
            .json(&LoginRequest {
                provider_id,
                credentials,
            });
        let body: IssuedResponse = Self::read_json(op, self.send(op, request).await?).await?;

        let credential = self.issue(body.credential, body.expires_in_seconds, body.renewal_token);
        let user = self.resolve_user(op, body.user, &credential).await?;

        info!(user_id = %user.id, "Login successful");
        Ok(Exchanged { user, credential })
    }

    async fn fetch_profile(&self, credential: &Credential) -> Result<User, ExchangeError> {
        let op = Operation::Profile;
        let request = self
            .http_client
            .get(self.endpoint("me"))
            .header("Authorization", credential.bearer_header());
        let body: ProfileResponse = Self::read_json(op, self.send(op, request).await?).await?;

        debug!(user_id = %body.user.id, "Fetched profile");
        Ok(body.user.into())
    }

    async fn logout(&self, credential: Option<&Credential>) -> Result<(), ExchangeError> {
        let op = Operation::Logout;
        let mut request = self.http_client.post(self.endpoint("logout"));
        if let Some(credential) = credential {
            request = request.header("Authorization", credential.bearer_header());
        }

        self.send(op, request).await?;
        debug!("Server acknowledged logout");
        Ok(())
    }
}
