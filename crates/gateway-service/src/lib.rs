//! # gateway-service
//!
//! Job lifecycle orchestration for the imaging gateway: upload intake and
//! validation, the background hand-off to the processing service, status
//! reconciliation, cancellation, retry, listing, and statistics.
//!
//! Services follow constructor injection: the job store and the processing
//! client are passed in as shared handles at construction time.

pub mod context;
pub mod job;

pub use context::RequestContext;
pub use job::{ForwardOutcome, IntakeReceipt, JobService, UploadPolicy};
