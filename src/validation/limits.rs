/// Range checks for utilization targets, replica counts and node pool sizes
use super::{ValidationError, ValidationResult};

pub const MAX_MIN_REPLICAS: i32 = 100;
pub const MAX_REPLICAS: i32 = 1000;
pub const MAX_NODE_COUNT: i32 = 100;

/// Utilization target must be within 1..=100 percent
pub fn validate_target_percentage(value: i32, field_name: &str) -> Option<ValidationError> {
    if !(1..=100).contains(&value) {
        return Some(ValidationError::new(
            field_name,
            value.to_string(),
            "Value must be between 1 and 100 (%)",
        ));
    }
    None
}

/// Validate HPA replica bounds; every violated constraint is reported
pub fn validate_replicas(min: Option<i32>, max: Option<i32>, current: Option<i32>) -> ValidationResult {
    let mut result = ValidationResult::new();

    if let Some(min) = min {
        if min < 1 {
            result.add_error("min_replicas", min.to_string(), "Minimum must be >= 1");
        }
        if min > MAX_MIN_REPLICAS {
            result.add_error(
                "min_replicas",
                min.to_string(),
                "Minimum too high (recommended max: 100)",
            );
        }
    }

    if let Some(max) = max {
        if max < 1 {
            result.add_error("max_replicas", max.to_string(), "Maximum must be >= 1");
        }
        if max > MAX_REPLICAS {
            result.add_error(
                "max_replicas",
                max.to_string(),
                "Maximum too high (recommended max: 1000)",
            );
        }
    }

    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            result.add_error(
                "min_replicas",
                min.to_string(),
                "Minimum cannot be greater than maximum",
            );
        }
    }

    if let Some(current) = current {
        if current < 0 {
            result.add_error("replicas", current.to_string(), "Replicas cannot be negative");
        }
        if current > MAX_REPLICAS {
            result.add_error(
                "replicas",
                current.to_string(),
                "Replicas too high (recommended max: 1000)",
            );
        }
    }

    result
}

/// Validate node pool sizing; every violated constraint is reported
pub fn validate_node_pool(
    node_count: Option<i32>,
    min_count: Option<i32>,
    max_count: Option<i32>,
) -> ValidationResult {
    let mut result = ValidationResult::new();

    if let Some(count) = node_count {
        if count < 0 {
            result.add_error("node_count", count.to_string(), "Node count cannot be negative");
        }
        if count > MAX_NODE_COUNT {
            result.add_error(
                "node_count",
                count.to_string(),
                "Node count too high (recommended max: 100)",
            );
        }
    }

    if let Some(min) = min_count {
        if min < 0 {
            result.add_error("min_count", min.to_string(), "Min count cannot be negative");
        }
        if min > MAX_NODE_COUNT {
            result.add_error(
                "min_count",
                min.to_string(),
                "Min count too high (recommended max: 100)",
            );
        }
    }

    if let Some(max) = max_count {
        if max < 1 {
            result.add_error("max_count", max.to_string(), "Max count must be >= 1");
        }
        if max > MAX_NODE_COUNT {
            result.add_error(
                "max_count",
                max.to_string(),
                "Max count too high (recommended max: 100)",
            );
        }
    }

    if let (Some(min), Some(max)) = (min_count, max_count) {
        if min > max {
            result.add_error(
                "min_count",
                min.to_string(),
                "Min count cannot be greater than max count",
            );
        }
    }

    result
}
