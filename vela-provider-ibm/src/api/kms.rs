//! Key Protect / HPCS key-management client
//!
//! Speaks the key collection wire format: requests and responses wrap
//! keys in a `{metadata, resources}` envelope. The client is addressed
//! at a fully resolved `/api/v2/keys` endpoint (see `endpoints`).

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;

use super::error::{ApiError, ApiResult};

/// Lifecycle state code reported for destroyed keys
pub const KEY_STATE_DELETED: i32 = 5;

const KEY_COLLECTION_TYPE: &str = "application/vnd.ibm.kms.key+json";

/// A managed key as reported by the key-management service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Key {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub crn: String,
    /// Numeric lifecycle state (5 = deleted)
    #[serde(default)]
    pub state: i32,
    /// True for standard keys (the material can leave the service)
    #[serde(default)]
    pub extractable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    #[serde(rename = "encryptedNonce", default, skip_serializing_if = "Option::is_none")]
    pub encrypted_nonce: Option<String>,
    #[serde(rename = "iv", default, skip_serializing_if = "Option::is_none")]
    pub iv: Option<String>,
    #[serde(rename = "keyRingID", default)]
    pub key_ring_id: String,
    #[serde(rename = "expirationDate", default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct KeysResponse {
    #[serde(default)]
    resources: Vec<Key>,
}

/// Key-management operations consumed by the kms_key resource
#[async_trait]
pub trait KeyManagementApi: Send + Sync {
    async fn create_root_key(
        &self,
        name: &str,
        expiration: Option<DateTime<Utc>>,
    ) -> ApiResult<Key>;

    async fn create_standard_key(
        &self,
        name: &str,
        expiration: Option<DateTime<Utc>>,
    ) -> ApiResult<Key>;

    /// Import externally generated root key material, optionally wrapped
    /// with an encrypted nonce and initialization vector
    async fn create_imported_root_key(
        &self,
        name: &str,
        expiration: Option<DateTime<Utc>>,
        payload: &str,
        encrypted_nonce: &str,
        iv: &str,
    ) -> ApiResult<Key>;

    async fn create_imported_standard_key(
        &self,
        name: &str,
        expiration: Option<DateTime<Utc>>,
        payload: &str,
    ) -> ApiResult<Key>;

    async fn get_key(&self, key_id: &str) -> ApiResult<Key>;

    /// Delete a key, asking the service to return the deleted
    /// representation. `force` bypasses safety holds such as dual
    /// authorization.
    async fn delete_key(&self, key_id: &str, force: bool) -> ApiResult<Option<Key>>;

    /// The resolved `/api/v2/keys` endpoint this client is addressed at
    fn endpoint(&self) -> &Url;
}

/// reqwest-backed Key Protect client
pub struct KeyProtectClient {
    http: HttpClient,
    endpoint: Url,
    instance_id: String,
    iam_token: String,
    key_ring: Option<String>,
}

impl KeyProtectClient {
    pub fn new(
        http: HttpClient,
        endpoint: Url,
        instance_id: impl Into<String>,
        iam_token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            endpoint,
            instance_id: instance_id.into(),
            iam_token: iam_token.into(),
            key_ring: None,
        }
    }

    /// Target a specific key ring for key creation
    pub fn with_key_ring(mut self, key_ring: impl Into<String>) -> Self {
        self.key_ring = Some(key_ring.into());
        self
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let builder = builder
            .bearer_auth(&self.iam_token)
            .header("bluemix-instance", &self.instance_id);
        match &self.key_ring {
            Some(ring) => builder.header("x-kms-key-ring", ring),
            None => builder,
        }
    }

    async fn create(
        &self,
        name: &str,
        expiration: Option<DateTime<Utc>>,
        extractable: bool,
        payload: Option<&str>,
        encrypted_nonce: Option<&str>,
        iv: Option<&str>,
    ) -> ApiResult<Key> {
        let mut resource = serde_json::Map::new();
        resource.insert("type".to_string(), json!(KEY_COLLECTION_TYPE));
        resource.insert("name".to_string(), json!(name));
        resource.insert("extractable".to_string(), json!(extractable));
        if let Some(expiration) = expiration {
            resource.insert(
                "expirationDate".to_string(),
                json!(expiration.to_rfc3339_opts(SecondsFormat::Secs, true)),
            );
        }
        if let Some(payload) = payload {
            resource.insert("payload".to_string(), json!(payload));
        }
        if let Some(nonce) = encrypted_nonce
            && !nonce.is_empty()
        {
            resource.insert("encryptedNonce".to_string(), json!(nonce));
        }
        if let Some(iv) = iv
            && !iv.is_empty()
        {
            resource.insert("iv".to_string(), json!(iv));
        }

        let body = json!({
            "metadata": {
                "collectionType": KEY_COLLECTION_TYPE,
                "collectionTotal": 1,
            },
            "resources": [resource],
        });

        let response = self
            .request(self.http.post(self.endpoint.clone()))
            .json(&body)
            .send()
            .await?;
        let keys: KeysResponse = check(response, "key-protect").await?.json().await?;
        keys.resources
            .into_iter()
            .next()
            .ok_or(ApiError::EmptyResponse("key-protect"))
    }
}

#[async_trait]
impl KeyManagementApi for KeyProtectClient {
    async fn create_root_key(
        &self,
        name: &str,
        expiration: Option<DateTime<Utc>>,
    ) -> ApiResult<Key> {
        self.create(name, expiration, false, None, None, None).await
    }

    async fn create_standard_key(
        &self,
        name: &str,
        expiration: Option<DateTime<Utc>>,
    ) -> ApiResult<Key> {
        self.create(name, expiration, true, None, None, None).await
    }

    async fn create_imported_root_key(
        &self,
        name: &str,
        expiration: Option<DateTime<Utc>>,
        payload: &str,
        encrypted_nonce: &str,
        iv: &str,
    ) -> ApiResult<Key> {
        self.create(
            name,
            expiration,
            false,
            Some(payload),
            Some(encrypted_nonce),
            Some(iv),
        )
        .await
    }

    async fn create_imported_standard_key(
        &self,
        name: &str,
        expiration: Option<DateTime<Utc>>,
        payload: &str,
    ) -> ApiResult<Key> {
        self.create(name, expiration, true, Some(payload), None, None)
            .await
    }

    async fn get_key(&self, key_id: &str) -> ApiResult<Key> {
        let url = format!("{}/{}", self.endpoint, key_id);
        let response = self.request(self.http.get(&url)).send().await?;
        let keys: KeysResponse = check(response, "key-protect").await?.json().await?;
        keys.resources
            .into_iter()
            .next()
            .ok_or(ApiError::EmptyResponse("key-protect"))
    }

    async fn delete_key(&self, key_id: &str, force: bool) -> ApiResult<Option<Key>> {
        let url = format!("{}/{}", self.endpoint, key_id);
        let mut builder = self
            .request(self.http.delete(&url))
            .header("Prefer", "return=representation");
        if force {
            builder = builder.query(&[("force", "true")]);
        }
        let response = builder.send().await?;
        let response = check(response, "key-protect").await?;

        // The deleted representation is optional; 204 carries no body
        let body = response.text().await?;
        if body.is_empty() {
            return Ok(None);
        }
        let keys: KeysResponse = serde_json::from_str(&body)?;
        Ok(keys.resources.into_iter().next())
    }

    fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

/// Map non-success responses to a Service error carrying the raw body
pub(crate) async fn check(
    response: reqwest::Response,
    service: &'static str,
) -> ApiResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::debug!(service, status = status.as_u16(), %body, "request failed");
    Err(ApiError::Service {
        service,
        status: status.as_u16(),
        body,
    })
}
