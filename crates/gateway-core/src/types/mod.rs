//! Shared value types.

pub mod processing;

pub use processing::{
    RemoteActiveJobs, RemoteFailedJobs, RemoteJobStatus, SubmitReceipt, Submission, UploadFile,
};
