pub mod orchestrator;
pub mod output;
pub mod rate_limiter;
