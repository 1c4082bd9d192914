use crate::config::VcloudEnv;
use crate::model::types::VcloudParameters;
use crate::vcloud::Vcloud;
use crate::vcloud::cache::TokenCache;
use crate::vcloud::session::{ACCEPT_VALUE, Authenticator, Session, TOKEN_HEADER};
use crate::vcloud::types::*;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method, Response, StatusCode};
use std::sync::Arc;
use tokio::sync::OnceCell;
use vcloud_common::prelude::{Error, Result};

/// Concrete implementation of the `Vcloud` trait using `reqwest` crate.
///
/// Holds the shared HTTP client and the session authenticator. A request
/// answered with `401 Unauthorized` invalidates the cached token and is
/// replayed once with a fresh session.
///
pub struct VcloudClient {
    client: OnceCell<Client>,
    authenticator: Authenticator,
    settings: VcloudEnv,
}

/// Body of an outbound request along with its content type.
type Body = (&'static str, String);

impl VcloudClient {
    /// Creates a new vCloud client with its own token cache.
    ///
    pub fn new(settings: VcloudEnv) -> Self {
        let authenticator = Authenticator::new(
            Arc::new(TokenCache::new()),
            settings.auth_retries,
            settings.auth_timeout(),
        );

        Self {
            client: OnceCell::new(),
            authenticator,
            settings,
        }
    }

    /// Lazily initializes and returns a reference to the `reqwest::Client`,
    /// built with the versioned `Accept` header and the request timeout.
    ///
    async fn get_client(&self) -> Result<&Client> {
        self.client
            .get_or_try_init(|| async {
                let mut headers = HeaderMap::new();
                headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));

                Client::builder()
                    .default_headers(headers)
                    .timeout(self.settings.request_timeout())
                    .danger_accept_invalid_certs(self.settings.accept_invalid_certs)
                    .use_rustls_tls()
                    .build()
                    .map_err(Error::from)
            })
            .await
    }

    /// Performs an authenticated request to the vCloud API.
    ///
    /// # Arguments
    ///
    /// * `parameters`: Endpoint and credentials.
    /// * `method`: HTTP method to use for the request.
    /// * `resource`: API resource, relative to the API base URL.
    /// * `body`: Optional request body and its content type.
    ///
    /// # Returns
    ///
    /// The remote response whatever its status, `None` on transport failure.
    /// Only a failed login is an error.
    ///
    async fn make_request(
        &self,
        parameters: &VcloudParameters,
        method: Method,
        resource: &str,
        body: Option<Body>,
    ) -> Result<Option<Response>> {
        let client = self.get_client().await?;
        let session = self.authenticator.authenticate(client, parameters).await?;

        match self.send(client, &session, method.clone(), resource, body.clone()).await? {
            Some(response) if response.status() == StatusCode::UNAUTHORIZED => {
                self.authenticator.invalidate(&session);
                let session = self.authenticator.authenticate(client, parameters).await?;
                self.send(client, &session, method, resource, body).await
            }
            response => Ok(response),
        }
    }

    async fn send(
        &self,
        client: &Client,
        session: &Session,
        method: Method,
        resource: &str,
        body: Option<Body>,
    ) -> Result<Option<Response>> {
        let url = session.url(resource);
        let mut request = client
            .request(method, &url)
            .header(TOKEN_HEADER, session.token_header()?);
        if let Some((content_type, body)) = body {
            request = request.header(CONTENT_TYPE, content_type).body(body);
        }

        match request.send().await {
            Ok(response) => Ok(Some(response)),
            Err(error) => {
                tracing::warn!(target: "vcloud", %url, %error, "Request failed");
                Ok(None)
            }
        }
    }

    /// Same as [`Self::make_request`], keeping only the body of a successful
    /// response.
    ///
    async fn make_text_request(
        &self,
        parameters: &VcloudParameters,
        method: Method,
        resource: &str,
        body: Option<Body>,
    ) -> Result<Option<String>> {
        Ok(match self.make_request(parameters, method, resource, body).await? {
            Some(response) if response.status().is_success() => response.text().await.ok(),
            Some(response) => {
                tracing::debug!(target: "vcloud", resource, status = %response.status(), "Unexpected status");
                None
            }
            None => None,
        })
    }
}

#[async_trait]
impl Vcloud for VcloudClient {
    async fn find_vms(&self, parameters: &VcloudParameters, query: &VmQuery) -> Result<Vec<VmRecord>> {
        let xml = self
            .make_text_request(parameters, Method::GET, &query.to_resource(), None)
            .await?;
        match xml {
            Some(xml) => parse_vm_records(&xml),
            None => Ok(Vec::new()),
        }
    }

    async fn screen(&self, parameters: &VcloudParameters, vm: &str) -> Result<Vec<u8>> {
        let resource = format!("vApp/vm-{vm}/screen");
        match self.make_request(parameters, Method::GET, &resource, None).await? {
            Some(response) if response.status() == StatusCode::OK => {
                Ok(response.bytes().await.map(Vec::from).unwrap_or_default())
            }
            _ => Ok(Vec::new()),
        }
    }

    async fn power_action(
        &self,
        parameters: &VcloudParameters,
        vm: &str,
        operation: VmOperation,
    ) -> Result<Option<String>> {
        let resource = format!("vApp/vm-{vm}/power/action/{}", operation.action());
        self.make_text_request(parameters, Method::POST, &resource, None)
            .await
    }

    async fn undeploy(
        &self,
        parameters: &VcloudParameters,
        vm: &str,
        operation: VmOperation,
    ) -> Result<Option<String>> {
        let resource = format!("vApp/vm-{vm}/action/undeploy");
        let body = (UNDEPLOY_CONTENT_TYPE, undeploy_payload(operation));
        self.make_text_request(parameters, Method::POST, &resource, Some(body))
            .await
    }

    async fn admin_description(&self, parameters: &VcloudParameters) -> Result<Option<String>> {
        match self.make_text_request(parameters, Method::GET, "admin", None).await? {
            Some(xml) => parse_admin_description(&xml),
            None => Ok(None),
        }
    }

    async fn last_version(&self) -> Result<Option<String>> {
        let client = self.get_client().await?;
        let url = self.settings.last_version_url.as_str();

        // Public page, not a vCloud resource.
        match client.get(url).header(ACCEPT, "*/*").send().await {
            Ok(response) if response.status().is_success() => {
                let page = response.text().await.unwrap_or_default();
                Ok(parse_last_version(&page))
            }
            Ok(response) => {
                tracing::warn!(target: "vcloud", url, status = %response.status(), "Download index unavailable");
                Ok(None)
            }
            Err(error) => {
                tracing::warn!(target: "vcloud", url, %error, "Download index unavailable");
                Ok(None)
            }
        }
    }

    fn clear_sessions(&self) -> usize {
        self.authenticator.cache().clear()
    }
}
