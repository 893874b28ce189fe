//! Job listing, statistics, and administration endpoints.

use std::sync::atomic::Ordering;

use http::StatusCode;

use crate::helpers::{ADMIN, ALICE, BOB, TestApp};

#[tokio::test]
async fn test_list_returns_only_own_jobs_newest_first() {
    let app = TestApp::new().await;
    let first = app.upload_as(ALICE, 1).await;
    let second = app.upload_as(ALICE, 2).await;
    app.upload_as(BOB, 1).await;

    let response = app
        .request("GET", "/api/jobs", None, Some(&app.token(ALICE)))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["count"], 2);
    assert_eq!(response.body["total"], 2);
    let jobs = response.body["jobs"].as_array().unwrap();
    assert_eq!(jobs[0]["jobId"], second.as_str());
    assert_eq!(jobs[1]["jobId"], first.as_str());
    assert!(jobs.iter().all(|job| job["userId"] == ALICE));
}

#[tokio::test]
async fn test_get_job_returns_full_record() {
    let app = TestApp::new().await;
    let job_id = app.upload_as(ALICE, 1).await;

    let response = app
        .request("GET", &format!("/api/jobs/{job_id}"), None, Some(&app.token(ALICE)))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["userId"], ALICE);
    assert_eq!(response.body["mlJobId"], format!("ml-{job_id}"));
    assert_eq!(response.body["fileCount"], 1);
}

#[tokio::test]
async fn test_active_jobs_require_admin() {
    let app = TestApp::new().await;
    app.upload_as(ALICE, 1).await;

    let denied = app
        .request("GET", "/api/jobs/active", None, Some(&app.token(ALICE)))
        .await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);

    let allowed = app
        .request("GET", "/api/jobs/active", None, Some(&app.token(ADMIN)))
        .await;
    assert_eq!(allowed.status, StatusCode::OK);
    // one local processing job plus the stub's remote-only entry
    assert_eq!(allowed.body["count"], 2);
    assert_eq!(allowed.body["activeJobs"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_stats_scope_depends_on_role() {
    let app = TestApp::new().await;
    app.upload_as(ALICE, 1).await;
    app.upload_as(BOB, 1).await;

    let own = app
        .request("GET", "/api/jobs/stats", None, Some(&app.token(ALICE)))
        .await;
    assert_eq!(own.status, StatusCode::OK);
    assert_eq!(own.body["stats"]["total"], 1);
    assert_eq!(own.body["stats"]["processing"], 1);
    assert!(own.body["mlService"].is_null());

    let all = app
        .request("GET", "/api/jobs/stats", None, Some(&app.token(ADMIN)))
        .await;
    assert_eq!(all.status, StatusCode::OK);
    assert_eq!(all.body["stats"]["total"], 2);
    assert_eq!(all.body["mlService"]["jobs_processed"], 42);
}

#[tokio::test]
async fn test_retry_only_from_failed() {
    let app = TestApp::new().await;
    let token = app.token(ALICE);
    let running = app.upload_as(ALICE, 1).await;

    let refused = app
        .request("POST", &format!("/api/jobs/{running}/retry"), None, Some(&token))
        .await;
    assert_eq!(refused.status, StatusCode::BAD_REQUEST);
    assert_eq!(refused.body["code"], "INVALID_STATE");

    app.upstream.fail_submit.store(true, Ordering::SeqCst);
    let failed = app.upload_as(ALICE, 1).await;

    let retried = app
        .request("POST", &format!("/api/jobs/{failed}/retry"), None, Some(&token))
        .await;
    assert_eq!(retried.status, StatusCode::OK);
    assert_eq!(retried.body["message"], "Job retry initiated");
    assert_eq!(retried.body["status"], "pending");

    let record = app.state.store.get(&failed).await.unwrap().unwrap();
    assert!(record.error.is_none());
    assert_eq!(record.progress, 0);
}

#[tokio::test]
async fn test_completed_job_cannot_be_cancelled() {
    let app = TestApp::new().await;
    let token = app.token(ALICE);
    let job_id = app.upload_as(ALICE, 1).await;

    app.upstream.report("completed", 100.0);
    app.upstream.set_results(serde_json::json!({"done": true}));
    let status = app
        .request("GET", &format!("/api/dicom/job/{job_id}/status"), None, Some(&token))
        .await;
    assert_eq!(status.body["status"], "completed");

    let response = app
        .request("DELETE", &format!("/api/jobs/{job_id}"), None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Job cannot be cancelled");
}

#[tokio::test]
async fn test_other_user_cannot_cancel() {
    let app = TestApp::new().await;
    let job_id = app.upload_as(ALICE, 1).await;

    let response = app
        .request("DELETE", &format!("/api/jobs/{job_id}"), None, Some(&app.token(BOB)))
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    let record = app.state.store.get(&job_id).await.unwrap().unwrap();
    assert_eq!(record.status.as_str(), "processing");
}

#[tokio::test]
async fn test_unknown_roles_authenticate_without_admin_rights() {
    let app = TestApp::new().await;

    let nurse = app.token_for_role("nina", "Nurse");
    let listing = app.request("GET", "/api/jobs", None, Some(&nurse)).await;
    assert_eq!(listing.status, StatusCode::OK);
    assert_eq!(listing.body["count"], 0);

    let blank = app.token_for_role("nobody", "");
    let listing = app.request("GET", "/api/jobs", None, Some(&blank)).await;
    assert_eq!(listing.status, StatusCode::OK);

    for alias in ["admin", "it-admin", "IT_ADMIN"] {
        let token = app.token_for_role("mallory", alias);
        let denied = app.request("GET", "/api/jobs/active", None, Some(&token)).await;
        assert_eq!(denied.status, StatusCode::FORBIDDEN, "{alias}");
        assert_eq!(denied.body["userRole"], alias);
    }
}
