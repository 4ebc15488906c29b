use std::env::VarError;
use std::num::ParseIntError;

use crate::config::DEFAULT_CONCURRENCY;

/// Environment variable holding the maximum number of concurrent sitemap fetches.
pub const ENV_VAR: &str = "SMX_MAX_CONCURRENCY";

/// Same as max_concurrency but falls back to the default on a missing variable and panics on a bad one.
pub fn get_max_concurrency(override_default: Option<usize>) -> usize {
    match max_concurrency() {
        Ok(v) => v,
        Err(MaxConcurrencyError::MissingEnvVar(_)) => override_default.unwrap_or(DEFAULT_CONCURRENCY),
        Err(e) => panic!("{}", e),
    }
}

/// Retrieves the value of the environment variable as a usize for max concurrency.
pub fn max_concurrency() -> Result<usize, MaxConcurrencyError> {
    parse_max_concurrency(&std::env::var(ENV_VAR)?)
}

fn parse_max_concurrency(value: &str) -> Result<usize, MaxConcurrencyError> {
    match value.trim().parse::<usize>()? {
        0 => Err(MaxConcurrencyError::NonPositive),
        v => Ok(v),
    }
}

#[derive(Debug)]
pub enum MaxConcurrencyError {
    ParseIntError(ParseIntError),
    NonPositive,
    MissingEnvVar(VarError),
}

impl std::error::Error for MaxConcurrencyError {}

impl From<ParseIntError> for MaxConcurrencyError {
    fn from(error: ParseIntError) -> Self {
        Self::ParseIntError(error)
    }
}

impl From<VarError> for MaxConcurrencyError {
    fn from(error: VarError) -> Self {
        Self::MissingEnvVar(error)
    }
}

impl std::fmt::Display for MaxConcurrencyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            Self::ParseIntError(e) => write!(f, "{} must be a valid positive number: {}", ENV_VAR, e),
            Self::NonPositive => write!(f, "{} must be a positive number", ENV_VAR),
            Self::MissingEnvVar(e) => write!(f, "Environment variable {} is missing: {}", ENV_VAR, e),
        }
    }
}
