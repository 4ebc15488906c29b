use std::{num::ParseIntError, time::Duration};

use crate::config::DEFAULT_REQUEST_TIMEOUT;

/// Per-request timeout, in seconds.
pub const REQUEST_TIMEOUT_ENV_VAR: &str = "SMX_REQUEST_TIMEOUT_SECS";
/// Optional whole-run budget, in seconds.
pub const RUN_BUDGET_ENV_VAR: &str = "SMX_RUN_BUDGET_SECS";

/// Same as optional_secs but panics on error.
pub fn get_optional_secs(env_var_name: &str) -> Option<Duration> {
    optional_secs(env_var_name).unwrap_or_else(|e| panic!("{} must be a valid number: {}", env_var_name, e))
}

/// Retrieves the value of the environment variable as whole seconds. Unset or empty means `None`.
pub fn optional_secs(env_var_name: &str) -> Result<Option<Duration>, ParseIntError> {
    parse_secs(std::env::var(env_var_name).ok().as_deref())
}

fn parse_secs(value: Option<&str>) -> Result<Option<Duration>, ParseIntError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => Ok(Some(Duration::from_secs(v.parse::<u64>()?))),
        None => Ok(None),
    }
}

/// Request timeout from SMX_REQUEST_TIMEOUT_SECS, defaulting to 10 seconds. Panics on a bad value.
pub fn get_request_timeout() -> Duration {
    get_optional_secs(REQUEST_TIMEOUT_ENV_VAR).unwrap_or(DEFAULT_REQUEST_TIMEOUT)
}

/// Run budget from SMX_RUN_BUDGET_SECS, if set. Panics on a bad value.
pub fn get_run_budget() -> Option<Duration> {
    get_optional_secs(RUN_BUDGET_ENV_VAR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_secs() {
        assert_eq!(parse_secs(None).unwrap(), None);
        assert_eq!(parse_secs(Some(" ")).unwrap(), None);
        assert_eq!(parse_secs(Some(" 15 ")).unwrap(), Some(Duration::from_secs(15)));
        assert!(parse_secs(Some("ten")).is_err());
        assert!(parse_secs(Some("-1")).is_err());
    }
}
