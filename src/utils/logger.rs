//! Structured logging helpers
//!
//! Thin wrappers over the `log` facade that keep operation logs greppable:
//! every line carries the operation name and `key=value` context.

use log::Level;

pub fn log_start(operation: &str) {
    log::debug!("▶ {} started", operation);
}

pub fn log_complete(operation: &str, duration_ms: u128) {
    log::debug!("✓ {} completed in {}ms", operation, duration_ms);
}

pub fn log_failed(operation: &str, error: &str) {
    log::warn!("✗ {} failed: {}", operation, error);
}

/// Log a message with `key=value` context pairs appended
pub fn log_with_context(level: Level, message: &str, context: &[(&str, &str)]) {
    log::log!(level, "{}{}", message, format_context(context));
}

/// Log a model lifecycle step (download, extraction, selection, ...)
pub fn log_model_operation(operation: &str, model_id: &str, status: &str, details: Option<&str>) {
    match details {
        Some(details) => log::info!(
            "[MODEL] {} model={} status={} {}",
            operation,
            model_id,
            status,
            details
        ),
        None => log::info!("[MODEL] {} model={} status={}", operation, model_id, status),
    }
}

fn format_context(context: &[(&str, &str)]) -> String {
    if context.is_empty() {
        return String::new();
    }
    let pairs: Vec<String> = context.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    format!(" | {}", pairs.join(" "))
}
