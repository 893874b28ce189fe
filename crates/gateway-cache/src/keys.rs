//! Key builders for every entry the gateway stores.
//!
//! Backend-level prefixes (such as the Redis `key_prefix`) are applied by
//! the provider, not here.

/// Prefix shared by all job record keys.
pub const JOB_PREFIX: &str = "job:";

/// Set of every tracked job id.
pub const ALL_JOBS: &str = "jobs:all";

/// Key of a job record.
pub fn job(job_id: &str) -> String {
    format!("{JOB_PREFIX}{job_id}")
}

/// Job id encoded in a record key, if `key` is one.
pub fn job_id_from_key(key: &str) -> Option<&str> {
    key.strip_prefix(JOB_PREFIX).filter(|id| !id.is_empty())
}

/// Set of job ids uploaded by one user.
pub fn owner_jobs(owner_id: &str) -> String {
    format!("jobs:owner:{owner_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_key() {
        assert_eq!(job("abc"), "job:abc");
        assert_eq!(job_id_from_key("job:abc"), Some("abc"));
        assert_eq!(job_id_from_key("jobs:all"), None);
        assert_eq!(job_id_from_key("job:"), None);
    }

    #[test]
    fn test_index_keys_do_not_collide_with_records() {
        assert!(!ALL_JOBS.starts_with(JOB_PREFIX));
        assert!(!owner_jobs("u1").starts_with(JOB_PREFIX));
    }
}
