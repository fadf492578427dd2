//! Shared test doubles for the lifecycle tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use url::Url;

use crate::api::{
    ApiError, ApiResult, CdToolchainApi, Key, KeyManagementApi, ResourceControllerApi,
    ResourceInstance, ToolchainTool,
};
use crate::endpoints::EndpointType;
use crate::session::{ClientSession, SessionError};

pub(crate) const TEST_INSTANCE_ID: &str = "INSTANCEID";

fn not_found(service: &'static str) -> ApiError {
    ApiError::Service {
        service,
        status: 404,
        body: r#"{"message":"not found"}"#.to_string(),
    }
}

/// Stateful key-management double recording which calls were made
pub(crate) struct MockKeyManagement {
    endpoint: Url,
    next_id: AtomicUsize,
    pub(crate) keys: Mutex<HashMap<String, Key>>,
    pub(crate) calls: Mutex<Vec<String>>,
    /// When set, get_key fails with this status
    pub(crate) fail_get_with: Mutex<Option<u16>>,
}

impl MockKeyManagement {
    pub(crate) fn new() -> Self {
        Self::with_endpoint("https://us-south.kms.cloud.ibm.com/api/v2/keys")
    }

    pub(crate) fn with_endpoint(endpoint: &str) -> Self {
        Self {
            endpoint: Url::parse(endpoint).unwrap(),
            next_id: AtomicUsize::new(1),
            keys: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            fail_get_with: Mutex::new(None),
        }
    }

    pub(crate) fn insert(&self, key: Key) {
        self.keys.lock().unwrap().insert(key.id.clone(), key);
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn make_key(
        &self,
        name: &str,
        expiration: Option<DateTime<Utc>>,
        extractable: bool,
        payload: Option<&str>,
        encrypted_nonce: Option<&str>,
        iv: Option<&str>,
    ) -> Key {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let id = format!("key-{}", n);
        let key = Key {
            id: id.clone(),
            name: name.to_string(),
            crn: format!(
                "crn:v1:bluemix:public:kms:us-south:a/xyz:{}:key:{}",
                TEST_INSTANCE_ID, id
            ),
            state: 1,
            extractable,
            payload: payload.map(String::from),
            encrypted_nonce: encrypted_nonce.map(String::from),
            iv: iv.map(String::from),
            key_ring_id: "default".to_string(),
            expiration,
        };
        self.insert(key.clone());
        key
    }
}

#[async_trait]
impl KeyManagementApi for MockKeyManagement {
    async fn create_root_key(
        &self,
        name: &str,
        expiration: Option<DateTime<Utc>>,
    ) -> ApiResult<Key> {
        self.calls.lock().unwrap().push("create_root_key".to_string());
        Ok(self.make_key(name, expiration, false, None, None, None))
    }

    async fn create_standard_key(
        &self,
        name: &str,
        expiration: Option<DateTime<Utc>>,
    ) -> ApiResult<Key> {
        self.calls
            .lock()
            .unwrap()
            .push("create_standard_key".to_string());
        Ok(self.make_key(name, expiration, true, None, None, None))
    }

    async fn create_imported_root_key(
        &self,
        name: &str,
        expiration: Option<DateTime<Utc>>,
        payload: &str,
        encrypted_nonce: &str,
        iv: &str,
    ) -> ApiResult<Key> {
        self.calls
            .lock()
            .unwrap()
            .push("create_imported_root_key".to_string());
        Ok(self.make_key(
            name,
            expiration,
            false,
            Some(payload),
            Some(encrypted_nonce),
            Some(iv),
        ))
    }

    async fn create_imported_standard_key(
        &self,
        name: &str,
        expiration: Option<DateTime<Utc>>,
        payload: &str,
    ) -> ApiResult<Key> {
        self.calls
            .lock()
            .unwrap()
            .push("create_imported_standard_key".to_string());
        Ok(self.make_key(name, expiration, true, Some(payload), None, None))
    }

    async fn get_key(&self, key_id: &str) -> ApiResult<Key> {
        self.calls.lock().unwrap().push(format!("get_key:{}", key_id));
        if let Some(status) = *self.fail_get_with.lock().unwrap() {
            return Err(ApiError::Service {
                service: "key-protect",
                status,
                body: "{}".to_string(),
            });
        }
        self.keys
            .lock()
            .unwrap()
            .get(key_id)
            .cloned()
            .ok_or_else(|| not_found("key-protect"))
    }

    async fn delete_key(&self, key_id: &str, force: bool) -> ApiResult<Option<Key>> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("delete_key:force={}", force));
        Ok(self.keys.lock().unwrap().remove(key_id))
    }

    fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

/// Toolchain double returning a canned tool
pub(crate) struct MockToolchain {
    pub(crate) tool: Mutex<Option<ToolchainTool>>,
}

impl MockToolchain {
    pub(crate) fn new(tool: ToolchainTool) -> Self {
        Self {
            tool: Mutex::new(Some(tool)),
        }
    }
}

#[async_trait]
impl CdToolchainApi for MockToolchain {
    async fn get_tool_by_id(&self, _toolchain_id: &str, _tool_id: &str) -> ApiResult<ToolchainTool> {
        self.tool
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| not_found("cd-toolchain"))
    }
}

struct MockResourceController;

#[async_trait]
impl ResourceControllerApi for MockResourceController {
    async fn get_resource_instance(&self, _instance_id: &str) -> ApiResult<ResourceInstance> {
        Err(not_found("resource-controller"))
    }
}

/// Session double handing out the mocks
#[derive(Default)]
pub(crate) struct MockSession {
    pub(crate) kms: Option<Arc<MockKeyManagement>>,
    pub(crate) toolchain: Option<Arc<MockToolchain>>,
    pub(crate) last_key_ring: Mutex<Option<String>>,
    pub(crate) last_endpoint_type: Mutex<Option<EndpointType>>,
}

impl MockSession {
    pub(crate) fn with_kms(kms: Arc<MockKeyManagement>) -> Self {
        Self {
            kms: Some(kms),
            ..Self::default()
        }
    }

    pub(crate) fn with_toolchain(toolchain: Arc<MockToolchain>) -> Self {
        Self {
            toolchain: Some(toolchain),
            ..Self::default()
        }
    }
}

#[async_trait]
impl ClientSession for MockSession {
    fn toolchain_api(&self) -> Result<Arc<dyn CdToolchainApi>, SessionError> {
        let api = self.toolchain.clone().expect("no toolchain mock configured");
        Ok(api)
    }

    fn resource_controller_api(&self) -> Result<Arc<dyn ResourceControllerApi>, SessionError> {
        Ok(Arc::new(MockResourceController))
    }

    async fn key_management_api(
        &self,
        _instance_id: &str,
        endpoint_type: EndpointType,
        key_ring: Option<&str>,
    ) -> Result<Arc<dyn KeyManagementApi>, SessionError> {
        *self.last_endpoint_type.lock().unwrap() = Some(endpoint_type);
        *self.last_key_ring.lock().unwrap() = key_ring.map(String::from);
        let api = self.kms.clone().expect("no kms mock configured");
        Ok(api)
    }
}
