pub mod durations;
pub mod hostname;
pub mod logging;
pub mod max_concurrency;
