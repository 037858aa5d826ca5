pub mod provider;
pub mod queue;
pub mod rate_limit;
pub mod repositories;
