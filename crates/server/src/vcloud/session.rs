use crate::model::types::{PARAMETER_API, VcloudParameters};
use crate::vcloud::cache::TokenCache;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use std::time::Duration;
use vcloud_common::prelude::{Error, Result, ValidationError};

/// Header carrying the session token, both on login response and on every
/// authenticated request.
pub const TOKEN_HEADER: &str = "x-vcloud-authorization";

/// Versioned media type accepted by every call.
pub const ACCEPT_VALUE: &str = "application/*+xml;version=5.1";

const LOGIN_RESOURCE: &str = "sessions";

/// An authenticated vCloud session.
///
/// Threaded explicitly through each outbound call; the same value can be used
/// concurrently by several calls.
///
#[derive(Debug, Clone)]
pub struct Session {
    base: String,
    token: SecretString,
    cache_key: String,
}

impl Session {
    /// Absolute URL of an API `resource`, e.g. `vApp/vm-42/screen`.
    ///
    pub fn url(&self, resource: &str) -> String {
        format!("{}{}", self.base, resource.trim_start_matches('/'))
    }

    /// Value of the [`TOKEN_HEADER`] header, flagged as sensitive.
    ///
    pub fn token_header(&self) -> Result<HeaderValue> {
        let mut value = HeaderValue::from_str(self.token.expose_secret())?;
        value.set_sensitive(true);
        Ok(value)
    }
}

/// Returns the API base URL with a trailing slash.
///
pub fn api_base(api: &str) -> String {
    if api.ends_with('/') {
        api.to_owned()
    } else {
        format!("{api}/")
    }
}

/// Returns the login URL of an API base URL.
///
pub fn login_url(api: &str) -> String {
    format!("{}{LOGIN_RESOURCE}", api_base(api))
}

/// Encodes the `{user}@{organization}:{password}` credential in standard
/// base64.
///
pub fn encode_credentials(user: &str, organization: &str, password: &str) -> String {
    STANDARD.encode(format!("{user}@{organization}:{password}"))
}

// -----------------------------------------------------------------------------

/// Negotiates vCloud sessions through the process-wide [`TokenCache`].
///
pub struct Authenticator {
    cache: Arc<TokenCache>,
    retries: u32,
    timeout: Duration,
}

impl Authenticator {
    /// Creates a new authenticator.
    ///
    /// # Arguments
    ///
    /// * `cache`: Shared token cache.
    /// * `retries`: Additional login attempts after a first failure.
    /// * `timeout`: Timeout of a single login request.
    ///
    pub fn new(cache: Arc<TokenCache>, retries: u32, timeout: Duration) -> Self {
        Self {
            cache,
            retries,
            timeout,
        }
    }

    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    /// Returns a session for the given parameters, reusing a cached token when
    /// one exists for the same endpoint and credential.
    ///
    /// # Returns
    ///
    /// The session, or a `vcloud-login` validation error on the API parameter
    /// once every login attempt failed.
    ///
    pub async fn authenticate(&self, client: &Client, parameters: &VcloudParameters) -> Result<Session> {
        let base = api_base(&parameters.api);
        let url = login_url(&parameters.api);
        let credential = encode_credentials(
            &parameters.user,
            &parameters.organization,
            parameters.password.expose_secret(),
        );
        let cache_key = format!("{url}##{credential}");

        let (url, credential) = (url.as_str(), credential.as_str());
        let token = self
            .cache
            .get_or_create(
                &cache_key,
                self.retries,
                move || self.login(client, url, credential),
                || Error::validation(PARAMETER_API, ValidationError::Login),
            )
            .await?;

        Ok(Session {
            base,
            token: token.into(),
            cache_key,
        })
    }

    /// Drops the cached token of a session the remote side rejected.
    ///
    pub fn invalidate(&self, session: &Session) -> bool {
        tracing::debug!(target: "vcloud", "Session rejected, token invalidated");
        self.cache.invalidate(&session.cache_key)
    }

    /// Single login attempt, `None` when no usable token was obtained.
    ///
    async fn login(&self, client: &Client, url: &str, credential: &str) -> Option<String> {
        let mut authorization = HeaderValue::from_str(&format!("Basic {credential}")).ok()?;
        authorization.set_sensitive(true);

        let response = match client
            .post(url)
            .header(AUTHORIZATION, authorization)
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(error) => {
                tracing::warn!(target: "vcloud", %url, %error, "Login request failed");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(target: "vcloud", %url, %status, "Login rejected");
            return None;
        }

        let token = response
            .headers()
            .get(TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_owned);
        if token.is_none() {
            tracing::warn!(target: "vcloud", %url, "Login succeeded without session token");
        }

        token
    }
}
