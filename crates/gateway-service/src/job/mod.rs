//! Job lifecycle orchestration.

pub mod forwarder;
pub mod intake;
pub mod service;
pub mod views;

pub use forwarder::{ForwardOutcome, Forwarder};
pub use intake::UploadPolicy;
pub use service::{INTAKE_PROGRESS, IntakeReceipt, JobService};
pub use views::{ActiveJobs, JobCounts, JobListing, JobStats};
