pub mod job_queue;
pub mod provider;
pub mod rate_limit;
