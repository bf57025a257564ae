/// Kubernetes CPU and memory quantity validation
use regex::Regex;
use std::sync::LazyLock;

use super::ValidationError;

/// Upper bound for CPU, in cores
pub const MAX_CPU_CORES: f64 = 128.0;

/// Upper bound for CPU, in millicores
pub const MAX_CPU_MILLICORES: f64 = 128_000.0;

/// 1Ti
pub const MAX_MEMORY_BYTES: u128 = 1 << 40;

/// 64Mi
pub const MIN_MEMORY_BYTES: u128 = 64 << 20;

/// "100m", "0.5", "1", "2.5", ".5"
static CPU_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+\.?[0-9]*|\.[0-9]+)m?$").unwrap());

/// "128Mi", "1Gi", "512M"; the unit is mandatory
static MEMORY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)(Mi|Gi|M|G|Ki|K|Ti|T|Pi|P|Ei|E)$").unwrap());

/// Byte multiplier for a memory unit suffix.
///
/// Both suffix families are 1024-based: `M` is treated exactly like `Mi`.
fn unit_multiplier(unit: &str) -> u128 {
    let exponent = match unit {
        "Ki" | "K" => 1,
        "Mi" | "M" => 2,
        "Gi" | "G" => 3,
        "Ti" | "T" => 4,
        "Pi" | "P" => 5,
        "Ei" | "E" => 6,
        _ => 0,
    };
    1024u128.pow(exponent)
}

/// Parse a CPU quantity into millicores
///
/// Returns `None` when the input does not match the CPU grammar.
pub fn parse_cpu_millicores(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if !CPU_REGEX.is_match(trimmed) {
        return None;
    }

    match trimmed.strip_suffix('m') {
        Some(milli) => milli.parse::<f64>().ok(),
        None => trimmed.parse::<f64>().ok().map(|cores| cores * 1000.0),
    }
}

/// Parse a memory quantity into bytes
///
/// Returns `None` when the input does not match the memory grammar or the
/// byte count does not fit in a `u128`.
pub fn parse_memory_bytes(value: &str) -> Option<u128> {
    let caps = MEMORY_REGEX.captures(value.trim())?;
    let magnitude: u128 = caps[1].parse().ok()?;
    magnitude.checked_mul(unit_multiplier(&caps[2]))
}

/// Validate a CPU quantity; blank input is accepted
pub fn validate_cpu(value: &str) -> Option<ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if !CPU_REGEX.is_match(trimmed) {
        return Some(ValidationError::new(
            "cpu",
            value,
            "Invalid format. Use: 100m (millicores), 0.5, 1 or 2 (cores)",
        ));
    }

    let (number, millicores) = match trimmed.strip_suffix('m') {
        Some(number) => (number, true),
        None => (trimmed, false),
    };

    let num = match number.parse::<f64>() {
        Ok(num) if num > 0.0 => num,
        _ => return Some(ValidationError::new("cpu", value, "Value must be positive")),
    };

    if millicores && num > MAX_CPU_MILLICORES {
        return Some(ValidationError::new(
            "cpu",
            value,
            "Value too high (max: 128 cores or 128000m)",
        ));
    }
    if !millicores && num > MAX_CPU_CORES {
        return Some(ValidationError::new(
            "cpu",
            value,
            "Value too high (max: 128 cores)",
        ));
    }

    None
}

/// Validate a memory quantity; blank input is accepted
pub fn validate_memory(value: &str) -> Option<ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    let Some(caps) = MEMORY_REGEX.captures(trimmed) else {
        return Some(ValidationError::new(
            "memory",
            value,
            "Invalid format. Use: 128Mi, 1Gi, 512Mi, 2Gi (Kubernetes format)",
        ));
    };

    let too_high = || ValidationError::new("memory", value, "Value too high (max: 1Ti)");

    // All digits, so a parse failure can only mean the magnitude overflowed
    let magnitude: u128 = match caps[1].parse() {
        Ok(magnitude) => magnitude,
        Err(_) => return Some(too_high()),
    };

    if magnitude == 0 {
        return Some(ValidationError::new(
            "memory",
            value,
            "Value must be positive",
        ));
    }

    let bytes = match magnitude.checked_mul(unit_multiplier(&caps[2])) {
        Some(bytes) => bytes,
        None => return Some(too_high()),
    };

    if bytes > MAX_MEMORY_BYTES {
        return Some(too_high());
    }

    if bytes < MIN_MEMORY_BYTES {
        return Some(ValidationError::new(
            "memory",
            value,
            "Value too low (min: 64Mi)",
        ));
    }

    None
}
