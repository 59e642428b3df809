pub mod client;
pub mod error;
pub mod types;

pub use client::{ApiClient, QueueApi};
pub use error::ApiError;
pub use types::{CreateVideoRequest, Job, JobStatus};
