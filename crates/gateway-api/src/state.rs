//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use gateway_auth::Authenticator;
use gateway_cache::JobStore;
use gateway_core::config::AppConfig;
use gateway_core::traits::processing::ProcessingClient;
use gateway_service::JobService;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are cheap to clone across tasks.
#[derive(Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,

    // ── Infrastructure ───────────────────────────────────────
    /// Job record store
    pub store: JobStore,
    /// Processing service client
    pub upstream: Arc<dyn ProcessingClient>,

    // ── Auth ─────────────────────────────────────────────────
    /// Bearer token verification and role checks
    pub authenticator: Arc<Authenticator>,

    // ── Services ─────────────────────────────────────────────
    /// Job lifecycle service
    pub jobs: Arc<JobService>,

    /// Process start, for uptime reporting
    pub started_at: Instant,
}

impl AppState {
    /// Wire the job service on top of the given collaborators.
    pub fn new(
        config: Arc<AppConfig>,
        store: JobStore,
        upstream: Arc<dyn ProcessingClient>,
        authenticator: Arc<Authenticator>,
    ) -> Self {
        let jobs = Arc::new(JobService::new(
            store.clone(),
            Arc::clone(&upstream),
            &config,
        ));
        Self {
            config,
            store,
            upstream,
            authenticator,
            jobs,
            started_at: Instant::now(),
        }
    }

    /// Seconds since the state was built.
    pub fn uptime_seconds(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("store", &self.store.provider_name())
            .field("jobs", &self.jobs)
            .finish_non_exhaustive()
    }
}
