use crate::error::SinkError;
use std::sync::Arc;
use tokio::{
    sync::{Mutex, Semaphore},
    task::JoinHandle,
};
use tracing::{error, info};
use warehouse::{client::LoadJob, error::WarehouseError};

/// Awaits submitted load jobs on a bounded pool, off the ingestion path.
/// `drain_all` is the only point where load-job failures become
/// synchronously observable; skipping it before shutdown silently drops
/// delivery failures.
pub struct JobTracker {
    permits: Arc<Semaphore>,
    handles: Mutex<Vec<JoinHandle<Result<String, WarehouseError>>>>,
}

impl JobTracker {
    pub fn new(threads: usize) -> Self {
        JobTracker {
            permits: Arc::new(Semaphore::new(threads.max(1))),
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Hands a submitted job to the pool. When every slot is taken this call
    /// waits for one to free, bounding outstanding asynchronous work.
    pub async fn submit(&self, job: Box<dyn LoadJob>) -> Result<(), SinkError> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| SinkError::Join(e.to_string()))?;

        let job_id = job.id().to_string();
        let handle = tokio::spawn(async move {
            let _permit = permit;
            match job.wait().await {
                Ok(()) => {
                    info!(job_id = %job_id, "Load job completed");
                    Ok(job_id)
                }
                Err(e) => {
                    error!(job_id = %job_id, error = %e, "Load job failed");
                    Err(e)
                }
            }
        });

        self.handles.lock().await.push(handle);
        Ok(())
    }

    /// Jobs submitted and not yet awaited through `drain_all`.
    pub async fn outstanding(&self) -> usize {
        self.handles.lock().await.len()
    }

    /// Awaits every outstanding job and surfaces the first failure.
    pub async fn drain_all(&self) -> Result<(), SinkError> {
        let handles: Vec<_> = {
            let mut guard = self.handles.lock().await;
            guard.drain(..).collect()
        };

        let mut first_failure: Option<SinkError> = None;
        for handle in handles {
            let outcome = match handle.await {
                Ok(Ok(_)) => None,
                Ok(Err(e)) => Some(SinkError::LoadJob(e)),
                Err(e) => Some(SinkError::Join(e.to_string())),
            };
            if first_failure.is_none() {
                first_failure = outcome;
            }
        }

        match first_failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::{sync::Notify, time::timeout};

    struct TestJob {
        id: String,
        fail: bool,
        gate: Option<Arc<Notify>>,
    }

    impl TestJob {
        fn ok(id: &str) -> Box<Self> {
            Box::new(TestJob {
                id: id.to_string(),
                fail: false,
                gate: None,
            })
        }

        fn failing(id: &str) -> Box<Self> {
            Box::new(TestJob {
                id: id.to_string(),
                fail: true,
                gate: None,
            })
        }

        fn gated(id: &str, gate: Arc<Notify>) -> Box<Self> {
            Box::new(TestJob {
                id: id.to_string(),
                fail: false,
                gate: Some(gate),
            })
        }
    }

    #[async_trait]
    impl LoadJob for TestJob {
        fn id(&self) -> &str {
            &self.id
        }

        async fn wait(self: Box<Self>) -> Result<(), WarehouseError> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.fail {
                Err(WarehouseError::LoadJob {
                    job_id: self.id,
                    reason: "simulated failure".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn drain_all_returns_ok_when_every_job_succeeds() {
        let tracker = JobTracker::new(2);
        tracker.submit(TestJob::ok("job-1")).await.expect("submit");
        tracker.submit(TestJob::ok("job-2")).await.expect("submit");

        tracker.drain_all().await.expect("all jobs succeed");
        assert_eq!(tracker.outstanding().await, 0);
    }

    #[tokio::test]
    async fn drain_all_surfaces_the_first_failure() {
        let tracker = JobTracker::new(2);
        tracker.submit(TestJob::failing("job-1")).await.expect("submit");
        tracker.submit(TestJob::ok("job-2")).await.expect("submit");

        let err = tracker.drain_all().await.expect_err("job-1 failed");
        assert!(matches!(err, SinkError::LoadJob(_)));
    }

    #[tokio::test]
    async fn saturated_pool_blocks_submission_until_a_slot_frees() {
        let tracker = JobTracker::new(1);
        let gate = Arc::new(Notify::new());

        tracker
            .submit(TestJob::gated("job-1", gate.clone()))
            .await
            .expect("submit");

        // The only slot is held by job-1; a second submit must wait.
        let blocked = timeout(Duration::from_millis(50), tracker.submit(TestJob::ok("job-2"))).await;
        assert!(blocked.is_err(), "submit should block while saturated");

        gate.notify_one();
        tracker.submit(TestJob::ok("job-2")).await.expect("submit");
        tracker.drain_all().await.expect("all jobs succeed");
    }
}
