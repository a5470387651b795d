//! Contracts for turning an external proof of identity into a credential.
//!
//! Every operation is a single network attempt. Callers that want a retry must
//! start a fresh flow, since replaying a one-time artifact burns it.

use crate::auth_fsm::User;
use crate::credential_store::Credential;
use crate::error::ExchangeError;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

/// A user together with a freshly issued credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchanged {
    pub user: User,
    pub credential: Credential,
}

/// One-time authorization artifact delivered by an identity-provider redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallbackArtifact {
    pub provider: String,
    pub params: BTreeMap<String, String>,
}

impl CallbackArtifact {
    pub fn new(provider: impl Into<String>, params: BTreeMap<String, String>) -> Self {
        Self {
            provider: provider.into(),
            params,
        }
    }

    /// Read the artifact from the redirect URL the provider sent the user to.
    ///
    /// The provider comes from a `provider` query parameter, falling back to the
    /// last path segment. A redirect carrying `error` is rejected here, without
    /// a network call.
    pub fn from_redirect_url(url: &Url) -> Result<Self, ExchangeError> {
        let mut params: BTreeMap<String, String> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        if let Some(error) = params.get("error") {
            let detail = params
                .get("error_description")
                .map(|d| format!("{error}: {d}"))
                .unwrap_or_else(|| error.clone());
            return Err(ExchangeError::ExchangeFailed(format!(
                "provider returned an error: {detail}"
            )));
        }

        if params.get("code").map_or(true, |c| c.is_empty()) {
            return Err(ExchangeError::ExchangeFailed(
                "redirect carries no authorization code".to_string(),
            ));
        }

        let provider = params.remove("provider").or_else(|| {
            url.path_segments()
                .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
                .map(str::to_string)
        });

        let provider = provider.ok_or_else(|| {
            ExchangeError::ExchangeFailed("cannot tell which provider issued the redirect".into())
        })?;

        Ok(Self { provider, params })
    }

    pub fn code(&self) -> Option<&str> {
        self.params.get("code").map(String::as_str)
    }
}

/// Secret material for a direct username/password exchange.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

impl LoginCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Network side of the session: the endpoints the manager consumes.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Exchange a one-time redirect artifact. A reused artifact fails with
    /// `ExchangeFailed`.
    async fn exchange_callback(
        &self,
        artifact: &CallbackArtifact,
    ) -> Result<Exchanged, ExchangeError>;

    /// Silent renewal. `renewal_token` is sent when one was issued; otherwise
    /// the server relies on its ambient cookie.
    async fn renew(&self, renewal_token: Option<String>) -> Result<Exchanged, ExchangeError>;

    async fn login(
        &self,
        provider_id: &str,
        credentials: &LoginCredentials,
    ) -> Result<Exchanged, ExchangeError>;

    /// Look up the user a credential belongs to.
    async fn fetch_profile(&self, credential: &Credential) -> Result<User, ExchangeError>;

    /// Best-effort server-side logout.
    async fn logout(&self, credential: Option<&Credential>) -> Result<(), ExchangeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_from_redirect() {
        let url = Url::parse("https://app.example.com/auth/callback/github?code=abc&state=xyz")
            .unwrap();
        let artifact = CallbackArtifact::from_redirect_url(&url).unwrap();

        assert_eq!(artifact.provider, "github");
        assert_eq!(artifact.code(), Some("abc"));
        assert_eq!(artifact.params.get("state").map(String::as_str), Some("xyz"));
    }

    #[test]
    fn test_artifact_provider_param_wins() {
        let url = Url::parse("https://app.example.com/callback?provider=google&code=abc").unwrap();
        let artifact = CallbackArtifact::from_redirect_url(&url).unwrap();

        assert_eq!(artifact.provider, "google");
        assert!(!artifact.params.contains_key("provider"));
    }

    #[test]
    fn test_artifact_error_param_is_exchange_failure() {
        let url = Url::parse(
            "https://app.example.com/callback/github?error=access_denied&error_description=User+cancelled",
        )
        .unwrap();

        let err = CallbackArtifact::from_redirect_url(&url).unwrap_err();
        assert_eq!(
            err,
            ExchangeError::ExchangeFailed(
                "provider returned an error: access_denied: User cancelled".to_string()
            )
        );
    }

    #[test]
    fn test_artifact_without_code() {
        let url = Url::parse("https://app.example.com/callback/github?state=xyz").unwrap();
        assert!(matches!(
            CallbackArtifact::from_redirect_url(&url),
            Err(ExchangeError::ExchangeFailed(_))
        ));
    }

    #[test]
    fn test_login_credentials_debug_redacts_password() {
        let creds = LoginCredentials::new("ada", "hunter2");
        let rendered = format!("{:?}", creds);
        assert!(rendered.contains("ada"));
        assert!(!rendered.contains("hunter2"));
    }
}
