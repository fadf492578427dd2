//! Resource Controller client
//!
//! Used to resolve a key-management instance record, whose `extensions`
//! blob carries the per-instance service endpoints.

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use url::Url;

use super::error::ApiResult;
use super::kms::check;

pub const DEFAULT_RESOURCE_CONTROLLER_ENDPOINT: &str = "https://resource-controller.cloud.ibm.com";

/// A provisioned service instance record
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceInstance {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub guid: String,
    #[serde(default)]
    pub crn: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub resource_group_id: Option<String>,
    /// Untyped service extensions; `endpoints.{public,private}` carry the
    /// instance's API URLs
    #[serde(default)]
    pub extensions: serde_json::Value,
}

#[async_trait]
pub trait ResourceControllerApi: Send + Sync {
    async fn get_resource_instance(&self, instance_id: &str) -> ApiResult<ResourceInstance>;
}

/// reqwest-backed Resource Controller client
pub struct ResourceControllerClient {
    http: HttpClient,
    endpoint: Url,
    iam_token: String,
}

impl ResourceControllerClient {
    pub fn new(http: HttpClient, endpoint: Url, iam_token: impl Into<String>) -> Self {
        Self {
            http,
            endpoint,
            iam_token: iam_token.into(),
        }
    }
}

#[async_trait]
impl ResourceControllerApi for ResourceControllerClient {
    async fn get_resource_instance(&self, instance_id: &str) -> ApiResult<ResourceInstance> {
        let url = format!(
            "{}/v2/resource_instances/{}",
            self.endpoint.as_str().trim_end_matches('/'),
            instance_id
        );
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.iam_token)
            .send()
            .await?;
        let instance = check(response, "resource-controller").await?.json().await?;
        Ok(instance)
    }
}
