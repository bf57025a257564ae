/// Full validation of an HPA edit before it is submitted
use serde::{Deserialize, Serialize};

use super::limits::{validate_replicas, validate_target_percentage};
use super::quantity::{parse_cpu_millicores, parse_memory_bytes, validate_cpu, validate_memory};
use super::ValidationResult;

/// Editable HPA fields; `None` and blank quantities are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HpaUpdate {
    pub min_replicas: Option<i32>,
    pub max_replicas: Option<i32>,
    pub target_cpu: Option<i32>,
    pub target_memory: Option<i32>,
    pub cpu_request: Option<String>,
    pub memory_request: Option<String>,
    pub cpu_limit: Option<String>,
    pub memory_limit: Option<String>,
}

/// Quantity field that is present and not blank
fn provided(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Validate an HPA update, merging every sub-check into one ordered result
pub fn validate_hpa_update(data: &HpaUpdate) -> ValidationResult {
    let mut result = ValidationResult::new();

    result.merge(validate_replicas(data.min_replicas, data.max_replicas, None));

    if let Some(target) = data.target_cpu {
        if let Some(err) = validate_target_percentage(target, "target_cpu") {
            result.push(err);
        }
    }
    if let Some(target) = data.target_memory {
        if let Some(err) = validate_target_percentage(target, "target_memory") {
            result.push(err);
        }
    }

    let cpu_request = provided(&data.cpu_request);
    let memory_request = provided(&data.memory_request);
    let cpu_limit = provided(&data.cpu_limit);
    let memory_limit = provided(&data.memory_limit);

    let mut cpu_request_ok = true;
    let mut memory_request_ok = true;
    let mut cpu_limit_ok = true;
    let mut memory_limit_ok = true;

    if let Some(value) = cpu_request {
        if let Some(err) = validate_cpu(value) {
            result.push(err.with_field("cpu_request"));
            cpu_request_ok = false;
        }
    }
    if let Some(value) = memory_request {
        if let Some(err) = validate_memory(value) {
            result.push(err.with_field("memory_request"));
            memory_request_ok = false;
        }
    }
    if let Some(value) = cpu_limit {
        if let Some(err) = validate_cpu(value) {
            result.push(err.with_field("cpu_limit"));
            cpu_limit_ok = false;
        }
    }
    if let Some(value) = memory_limit {
        if let Some(err) = validate_memory(value) {
            result.push(err.with_field("memory_limit"));
            memory_limit_ok = false;
        }
    }

    // Cross-field checks only run once both sides are individually valid
    if let (Some(request), Some(limit)) = (cpu_request, cpu_limit) {
        if cpu_request_ok && cpu_limit_ok {
            if let (Some(req), Some(lim)) = (parse_cpu_millicores(request), parse_cpu_millicores(limit)) {
                if req > lim {
                    result.add_error(
                        "cpu_request",
                        request,
                        "CPU request cannot be greater than CPU limit",
                    );
                }
            }
        }
    }
    if let (Some(request), Some(limit)) = (memory_request, memory_limit) {
        if memory_request_ok && memory_limit_ok {
            if let (Some(req), Some(lim)) = (parse_memory_bytes(request), parse_memory_bytes(limit)) {
                if req > lim {
                    result.add_error(
                        "memory_request",
                        request,
                        "Memory request cannot be greater than memory limit",
                    );
                }
            }
        }
    }

    result
}
