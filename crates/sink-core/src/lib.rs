pub mod buffer;
pub mod delivery;
pub mod error;
pub mod jobs;
pub mod metrics;
pub mod provision;
pub mod retry;
pub mod schema;
pub mod sink;
