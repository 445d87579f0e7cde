//! In-memory mock implementations of the registry trait
//!
//! Every write is recorded so tests can assert on side effects, and each
//! write path can be switched to fail to exercise error handling.

use async_trait::async_trait;
use chrono::Utc;
use balancer_core::errors::{BalancerError, BalancerResult};
use balancer_core::models::{Job, JobStatus, Target, TargetLoad};
use balancer_core::traits::TargetRegistry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// A recorded `set_job_status` call
#[derive(Debug, Clone, PartialEq)]
pub struct StatusWrite {
    pub job_id: i64,
    pub status: JobStatus,
    pub target_id: Option<i64>,
}

/// A recorded `set_job_result` call
#[derive(Debug, Clone, PartialEq)]
pub struct ResultWrite {
    pub job_id: i64,
    pub result: Option<Vec<u8>>,
    pub error_message: String,
}

#[derive(Debug, Default)]
struct RegistryState {
    targets: HashMap<i64, Target>,
    jobs: HashMap<i64, Job>,
    health_writes: Vec<(i64, bool)>,
    status_writes: Vec<StatusWrite>,
    result_writes: Vec<ResultWrite>,
}

/// Mock implementation of TargetRegistry for testing
#[derive(Debug, Clone, Default)]
pub struct MockTargetRegistry {
    state: Arc<Mutex<RegistryState>>,
    fail_reads: Arc<AtomicBool>,
    fail_health_writes: Arc<AtomicBool>,
    fail_status_writes: Arc<AtomicBool>,
    fail_result_writes: Arc<AtomicBool>,
}

impl MockTargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_targets(targets: Vec<Target>) -> Self {
        let registry = Self::new();
        for target in targets {
            registry.insert_target(target);
        }
        registry
    }

    pub fn insert_target(&self, target: Target) {
        self.state
            .lock()
            .unwrap()
            .targets
            .insert(target.id, target);
    }

    pub fn insert_job(&self, job: Job) {
        self.state.lock().unwrap().jobs.insert(job.id, job);
    }

    pub fn target(&self, id: i64) -> Option<Target> {
        self.state.lock().unwrap().targets.get(&id).cloned()
    }

    pub fn job(&self, id: i64) -> Option<Job> {
        self.state.lock().unwrap().jobs.get(&id).cloned()
    }

    pub fn health_writes(&self) -> Vec<(i64, bool)> {
        self.state.lock().unwrap().health_writes.clone()
    }

    pub fn status_writes(&self) -> Vec<StatusWrite> {
        self.state.lock().unwrap().status_writes.clone()
    }

    pub fn result_writes(&self) -> Vec<ResultWrite> {
        self.state.lock().unwrap().result_writes.clone()
    }

    /// Total number of job-row mutations, successful or not
    pub fn job_write_count(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.status_writes.len() + state.result_writes.len()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_health_writes(&self, fail: bool) {
        self.fail_health_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_status_writes(&self, fail: bool) {
        self.fail_status_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_result_writes(&self, fail: bool) {
        self.fail_result_writes.store(fail, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool, operation: &str) -> BalancerResult<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(BalancerError::database_error(format!(
                "mock store failure: {operation}"
            )));
        }
        Ok(())
    }

    fn loads(state: &RegistryState) -> Vec<TargetLoad> {
        let mut loads: Vec<TargetLoad> = state
            .targets
            .values()
            .map(|target| {
                let running_count = state
                    .jobs
                    .values()
                    .filter(|job| {
                        job.status == JobStatus::Running && job.target_id == Some(target.id)
                    })
                    .count() as i64;
                TargetLoad::new(target.clone(), running_count)
            })
            .collect();
        loads.sort_by_key(|load| load.id());
        loads
    }
}

#[async_trait]
impl TargetRegistry for MockTargetRegistry {
    async fn list_targets_with_load(&self) -> BalancerResult<Vec<TargetLoad>> {
        Self::check(&self.fail_reads, "list_targets_with_load")?;
        let state = self.state.lock().unwrap();
        Ok(Self::loads(&state))
    }

    async fn list_healthy_targets_with_load(&self) -> BalancerResult<Vec<TargetLoad>> {
        Self::check(&self.fail_reads, "list_healthy_targets_with_load")?;
        let state = self.state.lock().unwrap();
        let mut loads: Vec<TargetLoad> = Self::loads(&state)
            .into_iter()
            .filter(TargetLoad::is_healthy)
            .collect();
        loads.sort_by_key(|load| (load.running_count, load.id()));
        Ok(loads)
    }

    async fn get_target(&self, id: i64) -> BalancerResult<Target> {
        Self::check(&self.fail_reads, "get_target")?;
        self.target(id)
            .ok_or_else(|| BalancerError::target_not_found(id))
    }

    async fn set_target_health(&self, id: i64, healthy: bool) -> BalancerResult<()> {
        let mut state = self.state.lock().unwrap();
        state.health_writes.push((id, healthy));
        Self::check(&self.fail_health_writes, "set_target_health")?;

        if let Some(target) = state.targets.get_mut(&id) {
            target.healthy = healthy;
            target.last_checked = Some(Utc::now());
        }
        Ok(())
    }

    async fn set_job_status(
        &self,
        id: i64,
        status: JobStatus,
        target_id: Option<i64>,
    ) -> BalancerResult<()> {
        let mut state = self.state.lock().unwrap();
        state.status_writes.push(StatusWrite {
            job_id: id,
            status,
            target_id,
        });
        Self::check(&self.fail_status_writes, "set_job_status")?;

        if let Some(job) = state.jobs.get_mut(&id) {
            job.status = status;
            match status {
                JobStatus::Running => {
                    job.target_id = target_id;
                    job.started_at = Some(Utc::now());
                }
                JobStatus::Completed | JobStatus::Failed => {
                    job.completed_at = Some(Utc::now());
                }
                JobStatus::Pending => {}
            }
        }
        Ok(())
    }

    async fn set_job_result(
        &self,
        id: i64,
        result: Option<Vec<u8>>,
        error_message: &str,
    ) -> BalancerResult<()> {
        let mut state = self.state.lock().unwrap();
        state.result_writes.push(ResultWrite {
            job_id: id,
            result: result.clone(),
            error_message: error_message.to_string(),
        });
        Self::check(&self.fail_result_writes, "set_job_result")?;

        if let Some(job) = state.jobs.get_mut(&id) {
            job.completed_at = Some(Utc::now());
            if error_message.is_empty() {
                job.status = JobStatus::Completed;
                job.result = result;
                job.error_message = None;
            } else {
                job.status = JobStatus::Failed;
                job.result = None;
                job.error_message = Some(error_message.to_string());
            }
        }
        Ok(())
    }

    async fn get_job(&self, id: i64) -> BalancerResult<Job> {
        Self::check(&self.fail_reads, "get_job")?;
        self.job(id).ok_or_else(|| BalancerError::job_not_found(id))
    }
}
