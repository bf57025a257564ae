/// Console API data models
use serde::{Deserialize, Serialize};

/// Standard response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub message: Option<String>,
}

/// Error body returned on non-2xx responses
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Cluster discovered by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    pub name: String,
    pub context: String,
    pub status: String,
}

impl Cluster {
    pub fn is_online(&self) -> bool {
        self.status.eq_ignore_ascii_case("online")
    }
}

#[derive(Debug, Serialize)]
pub struct SwitchContextRequest<'a> {
    pub context: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SwitchContextResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

/// Namespace within a cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    pub name: String,
    pub cluster: String,
    #[serde(default, rename = "hpaCount")]
    pub hpa_count: Option<u32>,
    #[serde(default, rename = "isSystem")]
    pub is_system: Option<bool>,
}

/// HorizontalPodAutoscaler as listed by the console API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hpa {
    pub name: String,
    pub namespace: String,
    pub cluster: String,
    pub min_replicas: Option<i32>,
    pub max_replicas: i32,
    pub current_replicas: i32,
    #[serde(default)]
    pub target_cpu: Option<i32>,
    #[serde(default)]
    pub target_memory: Option<i32>,
    #[serde(default)]
    pub target_cpu_request: Option<String>,
    #[serde(default)]
    pub target_cpu_limit: Option<String>,
    #[serde(default)]
    pub target_memory_request: Option<String>,
    #[serde(default)]
    pub target_memory_limit: Option<String>,
}

/// Cluster node pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePool {
    pub name: String,
    pub cluster: String,
    pub count: i32,
    #[serde(default)]
    pub min_count: Option<i32>,
    #[serde(default)]
    pub max_count: Option<i32>,
    pub vm_size: String,
    #[serde(default)]
    pub autoscaling_enabled: bool,
    #[serde(default)]
    pub status: String,
}
