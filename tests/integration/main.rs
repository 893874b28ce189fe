//! HTTP-level tests driving the full router with an in-memory store and a
//! stubbed processing service.

mod helpers;

mod dicom_test;
mod health_test;
mod jobs_test;
