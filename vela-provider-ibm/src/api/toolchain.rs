//! CD Toolchain client
//!
//! Fetches a tool integration bound to a toolchain. The caller may bound
//! the single remote call by wrapping the returned future in a timeout.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client as HttpClient;
use serde::Deserialize;
use url::Url;

use super::error::ApiResult;
use super::kms::check;

/// URIs for reaching a tool through the UI or the API
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolReferent {
    #[serde(default)]
    pub ui_href: Option<String>,
    #[serde(default)]
    pub api_href: Option<String>,
}

/// A tool integration aggregate as reported by the toolchain service
#[derive(Debug, Clone, Deserialize)]
pub struct ToolchainTool {
    #[serde(default)]
    pub id: String,
    /// Integration type tag (e.g. "githubconsolidated")
    #[serde(default)]
    pub tool_type_id: String,
    #[serde(default)]
    pub resource_group_id: Option<String>,
    #[serde(default)]
    pub crn: Option<String>,
    #[serde(default)]
    pub toolchain_id: Option<String>,
    #[serde(default)]
    pub toolchain_crn: Option<String>,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub referent: Option<ToolReferent>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Integration-specific parameter block, remapped per tool type
    #[serde(default)]
    pub parameters: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub state: Option<String>,
}

#[async_trait]
pub trait CdToolchainApi: Send + Sync {
    async fn get_tool_by_id(&self, toolchain_id: &str, tool_id: &str) -> ApiResult<ToolchainTool>;
}

/// reqwest-backed CD Toolchain client
pub struct CdToolchainClient {
    http: HttpClient,
    endpoint: Url,
    iam_token: String,
}

impl CdToolchainClient {
    pub fn new(http: HttpClient, endpoint: Url, iam_token: impl Into<String>) -> Self {
        Self {
            http,
            endpoint,
            iam_token: iam_token.into(),
        }
    }

    /// Regional default endpoint for the toolchain API
    pub fn default_endpoint(region: &str) -> String {
        format!("https://api.{}.devops.cloud.ibm.com/toolchain/v2", region)
    }
}

#[async_trait]
impl CdToolchainApi for CdToolchainClient {
    async fn get_tool_by_id(&self, toolchain_id: &str, tool_id: &str) -> ApiResult<ToolchainTool> {
        let url = format!(
            "{}/toolchains/{}/tools/{}",
            self.endpoint.as_str().trim_end_matches('/'),
            toolchain_id,
            tool_id
        );
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.iam_token)
            .send()
            .await?;
        let tool = check(response, "cd-toolchain").await?.json().await?;
        Ok(tool)
    }
}
