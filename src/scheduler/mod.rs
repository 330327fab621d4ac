//! Periodic runs: identification daily, the drop sweep weekly by default.

mod job;

use std::sync::Arc;

use chrono::Local;
use log::{error, info};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::conf::ScheduleConfig;
use crate::core::SweepError;
use crate::service::PartitionService;

pub use job::CronJob;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Task {
    Identify,
    Drop,
}

pub struct Scheduler {
    service: Arc<PartitionService>,
    identify: CronJob,
    drop: CronJob,
}

impl Scheduler {
    pub fn new(service: Arc<PartitionService>, config: &ScheduleConfig) -> Result<Self, SweepError> {
        Ok(Self {
            service,
            identify: CronJob::parse("identify", &config.identify)?,
            drop: CronJob::parse("drop", &config.drop)?,
        })
    }

    /// Starts one loop per job. The loops exit once `shutdown` turns true.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        vec![
            tokio::spawn(run_loop(
                Arc::clone(&self.service),
                self.identify,
                Task::Identify,
                shutdown.clone(),
            )),
            tokio::spawn(run_loop(self.service, self.drop, Task::Drop, shutdown)),
        ]
    }
}

async fn run_loop(
    service: Arc<PartitionService>,
    job: CronJob,
    task: Task,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let now = Local::now();
        let Some(delay) = job.delay_from(now) else {
            info!("job '{}' has no upcoming runs, stopping", job.name());
            return;
        };
        if let Some(next) = job.next_after(now) {
            info!("job '{}' next runs at {}", job.name(), next.format("%Y-%m-%d %H:%M:%S"));
        }

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    info!("job '{}' stopped", job.name());
                    return;
                }
                continue;
            }
        }

        run_task(&service, task).await;
    }
}

/// Runs one scheduled task. Failures are logged and never stop the loop.
async fn run_task(service: &PartitionService, task: Task) {
    match task {
        Task::Identify => {
            info!("starting scheduled partition identification");
            match service.identify_tables().await {
                Ok(count) => info!("identified {count} tables"),
                Err(e) => {
                    error!("error during scheduled table identification: {e}");
                    return;
                }
            }
            match service.identify_empty_partitions().await {
                Ok(count) => info!("identified {count} empty partitions"),
                Err(e) => error!("error during scheduled partition identification: {e}"),
            }
        }
        Task::Drop => {
            info!("starting scheduled partition cleanup");
            match service.drop_empty_partitions().await {
                Ok(report) => info!("dropped {} empty partitions", report.dropped()),
                Err(e) => error!("error during scheduled partition cleanup: {e}"),
            }
        }
    }
}
