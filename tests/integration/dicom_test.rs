//! Upload intake, polling, results, and cancellation over HTTP.

use std::sync::atomic::Ordering;

use chrono::{Duration, Utc};
use http::StatusCode;
use serde_json::json;

use crate::helpers::{ALICE, BOB, TestApp};

#[tokio::test]
async fn test_upload_accepts_files_and_forwards_them() {
    let app = TestApp::new().await;
    let token = app.token(ALICE);

    let response = app
        .upload(
            &[
                ("a.dcm", b"DICM-a".as_slice()),
                ("b.dcm", b"DICM-b".as_slice()),
                ("c.DCM", b"DICM-c".as_slice()),
            ],
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.body["status"], "processing");
    assert_eq!(response.body["fileCount"], 3);
    assert_eq!(response.body["estimatedTime"], "90s");
    assert_eq!(response.body["progress"], 10);
    assert_eq!(
        response.body["message"],
        "DICOM files uploaded successfully. Processing started."
    );
    let job_id = response.body["jobId"].as_str().unwrap().to_string();

    app.wait_for_forwards().await;

    let seen = app.upstream.submissions.lock().unwrap().clone();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].job_id, job_id);
    assert_eq!(seen[0].file_names, vec!["a.dcm", "b.dcm", "c.DCM"]);
    assert_eq!(seen[0].bearer_token.as_deref(), Some(token.as_str()));

    let status = app
        .request("GET", &format!("/api/dicom/job/{job_id}/status"), None, Some(&token))
        .await;
    assert_eq!(status.status, StatusCode::OK);
    assert_eq!(status.body["jobId"], job_id.as_str());
    assert_eq!(status.body["status"], "processing");
    assert_eq!(status.body["progress"], 20);
    assert_eq!(status.body["fileNames"], json!(["a.dcm", "b.dcm", "c.DCM"]));
}

#[tokio::test]
async fn test_upload_requires_authentication() {
    let app = TestApp::new().await;

    let response = app.upload(&[("a.dcm", b"DICM".as_slice())], None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["code"], "AUTH_REQUIRED");
    assert!(app.state.store.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let app = TestApp::new().await;
    let stale = app.token_at(ALICE, Utc::now() - Duration::hours(48));

    let response = app.request("GET", "/api/jobs", None, Some(&stale)).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["code"], "TOKEN_EXPIRED");
}

#[tokio::test]
async fn test_upload_rejects_too_many_files() {
    let app = TestApp::new().await;
    let names: Vec<String> = (0..11).map(|i| format!("scan-{i}.dcm")).collect();
    let files: Vec<(&str, &[u8])> = names
        .iter()
        .map(|n| (n.as_str(), b"DICM".as_slice()))
        .collect();

    let response = app.upload(&files, Some(&app.token(ALICE))).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Too many files");
    assert_eq!(response.body["code"], "VALIDATION_ERROR");
    assert!(app.state.store.list_all().await.unwrap().is_empty());
    assert!(app.upstream.submissions.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_rejects_wrong_extension() {
    let app = TestApp::new().await;

    let response = app
        .upload(
            &[("scan.dcm", b"DICM".as_slice()), ("notes.txt", b"hello".as_slice())],
            Some(&app.token(ALICE)),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Invalid file type");
    assert!(app.state.store.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_without_files_is_rejected() {
    let app = TestApp::new().await;

    let response = app.upload(&[], Some(&app.token(ALICE))).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "No files uploaded");
}

#[tokio::test]
async fn test_failed_forward_marks_job_failed() {
    let app = TestApp::new().await;
    app.upstream.fail_submit.store(true, Ordering::SeqCst);

    let job_id = app.upload_as(ALICE, 2).await;
    let response = app
        .request(
            "GET",
            &format!("/api/dicom/job/{job_id}/status"),
            None,
            Some(&app.token(ALICE)),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "failed");
    assert_eq!(response.body["error"], "Failed to process files");
}

#[tokio::test]
async fn test_status_of_another_users_job_is_forbidden() {
    let app = TestApp::new().await;
    let job_id = app.upload_as(ALICE, 1).await;

    let response = app
        .request(
            "GET",
            &format!("/api/dicom/job/{job_id}/status"),
            None,
            Some(&app.token(BOB)),
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["error"], "Access denied");
}

#[tokio::test]
async fn test_status_of_unknown_job_is_not_found() {
    let app = TestApp::new().await;

    let response = app
        .request(
            "GET",
            "/api/dicom/job/does-not-exist/status",
            None,
            Some(&app.token(ALICE)),
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["message"], "No job found with ID does-not-exist");
}

#[tokio::test]
async fn test_results_before_completion_are_refused() {
    let app = TestApp::new().await;
    let job_id = app.upload_as(ALICE, 1).await;

    let response = app
        .request(
            "GET",
            &format!("/api/dicom/job/{job_id}/results"),
            None,
            Some(&app.token(ALICE)),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Job not completed");
    assert_eq!(
        response.body["message"],
        "Job status is processing. Results are not yet available."
    );
}

#[tokio::test]
async fn test_polling_picks_up_completion_and_results() {
    let app = TestApp::new().await;
    let token = app.token(ALICE);
    let job_id = app.upload_as(ALICE, 1).await;

    app.upstream.report("completed", 100.0);
    app.upstream.set_results(json!({"segmentation": "ok"}));

    let status = app
        .request("GET", &format!("/api/dicom/job/{job_id}/status"), None, Some(&token))
        .await;
    assert_eq!(status.status, StatusCode::OK);
    assert_eq!(status.body["status"], "completed");
    assert_eq!(status.body["progress"], 100);
    assert_eq!(status.body["result"], json!({"segmentation": "ok"}));

    let results = app
        .request("GET", &format!("/api/dicom/job/{job_id}/results"), None, Some(&token))
        .await;
    assert_eq!(results.status, StatusCode::OK);
    assert_eq!(results.body, json!({"segmentation": "ok"}));
}

#[tokio::test]
async fn test_cancel_is_idempotent() {
    let app = TestApp::new().await;
    let token = app.token(ALICE);
    let job_id = app.upload_as(ALICE, 1).await;
    let path = format!("/api/dicom/job/{job_id}");

    let first = app.request("DELETE", &path, None, Some(&token)).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["status"], "cancelled");
    assert_eq!(first.body["message"], "Job cancelled successfully");

    let second = app.request("DELETE", &path, None, Some(&token)).await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.body["status"], "cancelled");

    let cancelled = app.upstream.cancelled.lock().unwrap().clone();
    assert_eq!(cancelled, vec![format!("ml-{job_id}")]);
}
