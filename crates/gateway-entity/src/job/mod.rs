//! Job tracking entities.

pub mod model;
pub mod status;

pub use model::JobRecord;
pub use status::JobStatus;
