//! Test data builders for creating test entities

use chrono::{DateTime, Utc};
use balancer_core::models::{Job, JobStatus, Target};

/// Builder for creating test Target entities
pub struct TargetBuilder {
    target: Target,
}

impl TargetBuilder {
    pub fn new() -> Self {
        Self {
            target: Target {
                id: 1,
                name: "vps-1".to_string(),
                url: "http://127.0.0.1:9".to_string(),
                healthy: true,
                last_checked: None,
            },
        }
    }

    /// Sets the id and derives a matching default name.
    pub fn with_id(mut self, id: i64) -> Self {
        self.target.id = id;
        self.target.name = format!("vps-{id}");
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.target.name = name.to_string();
        self
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.target.url = url.to_string();
        self
    }

    pub fn healthy(mut self) -> Self {
        self.target.healthy = true;
        self
    }

    pub fn unhealthy(mut self) -> Self {
        self.target.healthy = false;
        self
    }

    pub fn with_last_checked(mut self, last_checked: DateTime<Utc>) -> Self {
        self.target.last_checked = Some(last_checked);
        self
    }

    pub fn build(self) -> Target {
        self.target
    }
}

impl Default for TargetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating test Job entities
pub struct JobBuilder {
    job: Job,
}

impl JobBuilder {
    pub fn new() -> Self {
        Self {
            job: Job::new(
                1,
                "product_page",
                serde_json::json!({"url": "https://example.com/item/1"}),
            ),
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.job.id = id;
        self
    }

    pub fn with_job_type(mut self, job_type: &str) -> Self {
        self.job.job_type = job_type.to_string();
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.job.payload = payload;
        self
    }

    /// Marks the job as running on the given target.
    pub fn running_on(mut self, target_id: i64) -> Self {
        self.job.status = JobStatus::Running;
        self.job.target_id = Some(target_id);
        self.job.started_at = Some(Utc::now());
        self
    }

    pub fn with_status(mut self, status: JobStatus) -> Self {
        self.job.status = status;
        self
    }

    pub fn build(self) -> Job {
        self.job
    }
}

impl Default for JobBuilder {
    fn default() -> Self {
        Self::new()
    }
}
