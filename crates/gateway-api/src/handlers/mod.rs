//! Route handlers organized by domain.

pub mod dicom;
pub mod health;
pub mod jobs;
