//! Environment variable helpers for configuration overrides.
//!
//! ```
//! use modchain_types::env_utils::{env_list, env_var_or};
//!
//! let threads: usize = env_var_or("MODCHAIN_DOC_THREADS", 4);
//! assert_eq!(threads, 4);
//! assert!(env_list("MODCHAIN_DOC_UNSET_LIST").is_empty());
//! ```

use std::str::FromStr;

/// Parse a variable into any `FromStr` type; `None` when unset or unparsable.
pub fn env_var<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Parse a variable, falling back to `default` when unset or unparsable.
pub fn env_var_or<T: FromStr>(key: &str, default: T) -> T {
    env_var(key).unwrap_or(default)
}

/// Read a boolean flag (`1`, `true`, `yes`, `on`, case-insensitive).
///
/// Returns `None` when the variable is unset so callers can keep their own
/// default.
pub fn env_flag(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

/// Split a comma-separated variable into trimmed, non-empty entries.
pub fn env_list(key: &str) -> Vec<String> {
    std::env::var(key)
        .ok()
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
