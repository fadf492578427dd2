//! Client session - authenticated access to the upstream APIs
//!
//! A session hands out service clients per lifecycle call. Nothing is
//! cached between calls: the key-management client in particular is
//! rebuilt every time, re-resolving the owning instance's endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use thiserror::Error;
use url::Url;

use crate::api::{
    ApiError, CdToolchainApi, CdToolchainClient, KeyManagementApi, KeyProtectClient,
    ResourceControllerApi, ResourceControllerClient,
};
use crate::api::resource_controller::DEFAULT_RESOURCE_CONTROLLER_ENDPOINT;
use crate::endpoints::{self, EndpointType};

/// Provider-level configuration supplied by the host
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub iam_token: String,
    pub region: String,
    /// Default endpoint visibility when a resource does not request one
    pub endpoint_type: EndpointType,
    /// Pre-configured key-management base URL; a URL containing "private"
    /// switches endpoint selection to the private network
    pub kms_base_url: Option<String>,
    pub resource_controller_endpoint: Option<String>,
    pub toolchain_endpoint: Option<String>,
}

impl SessionConfig {
    pub fn new(iam_token: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            iam_token: iam_token.into(),
            region: region.into(),
            endpoint_type: EndpointType::default(),
            kms_base_url: None,
            resource_controller_endpoint: None,
            toolchain_endpoint: None,
        }
    }

    pub fn with_endpoint_type(mut self, endpoint_type: EndpointType) -> Self {
        self.endpoint_type = endpoint_type;
        self
    }

    pub fn with_kms_base_url(mut self, url: impl Into<String>) -> Self {
        self.kms_base_url = Some(url.into());
        self
    }

    pub fn with_resource_controller_endpoint(mut self, url: impl Into<String>) -> Self {
        self.resource_controller_endpoint = Some(url.into());
        self
    }

    pub fn with_toolchain_endpoint(mut self, url: impl Into<String>) -> Self {
        self.toolchain_endpoint = Some(url.into());
        self
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("error retrieving resource instance {instance_id}: {source}")]
    InstanceLookup {
        instance_id: String,
        #[source]
        source: ApiError,
    },

    #[error(transparent)]
    Endpoint(#[from] endpoints::EndpointError),

    #[error("invalid service endpoint URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Supplies authenticated clients for the upstream services
#[async_trait]
pub trait ClientSession: Send + Sync {
    fn toolchain_api(&self) -> Result<Arc<dyn CdToolchainApi>, SessionError>;

    fn resource_controller_api(&self) -> Result<Arc<dyn ResourceControllerApi>, SessionError>;

    /// Key-management client addressed at the instance's resolved
    /// endpoint, scoped to `key_ring` for key creation when given
    async fn key_management_api(
        &self,
        instance_id: &str,
        endpoint_type: EndpointType,
        key_ring: Option<&str>,
    ) -> Result<Arc<dyn KeyManagementApi>, SessionError>;
}

/// Session backed by the real IBM Cloud endpoints
pub struct IbmSession {
    config: SessionConfig,
    http: HttpClient,
}

impl IbmSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            http: HttpClient::new(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

#[async_trait]
impl ClientSession for IbmSession {
    fn toolchain_api(&self) -> Result<Arc<dyn CdToolchainApi>, SessionError> {
        let endpoint = match &self.config.toolchain_endpoint {
            Some(url) => url.clone(),
            None => CdToolchainClient::default_endpoint(&self.config.region),
        };
        let endpoint = Url::parse(&endpoint)?;
        Ok(Arc::new(CdToolchainClient::new(
            self.http.clone(),
            endpoint,
            self.config.iam_token.clone(),
        )))
    }

    fn resource_controller_api(&self) -> Result<Arc<dyn ResourceControllerApi>, SessionError> {
        let endpoint = self
            .config
            .resource_controller_endpoint
            .as_deref()
            .unwrap_or(DEFAULT_RESOURCE_CONTROLLER_ENDPOINT);
        let endpoint = Url::parse(endpoint)?;
        Ok(Arc::new(ResourceControllerClient::new(
            self.http.clone(),
            endpoint,
            self.config.iam_token.clone(),
        )))
    }

    async fn key_management_api(
        &self,
        instance_id: &str,
        endpoint_type: EndpointType,
        key_ring: Option<&str>,
    ) -> Result<Arc<dyn KeyManagementApi>, SessionError> {
        let controller = self.resource_controller_api()?;
        let instance = controller
            .get_resource_instance(instance_id)
            .await
            .map_err(|source| SessionError::InstanceLookup {
                instance_id: instance_id.to_string(),
                source,
            })?;

        let hint = self.config.kms_base_url.as_deref().unwrap_or("");
        let endpoint = endpoints::kms_endpoint_url(&instance.extensions, endpoint_type, hint)?;

        let mut client = KeyProtectClient::new(
            self.http.clone(),
            endpoint,
            instance_id,
            self.config.iam_token.clone(),
        );
        if let Some(ring) = key_ring {
            client = client.with_key_ring(ring);
        }
        Ok(Arc::new(client))
    }
}
