//! Bounded worker pool for account workflows.
//!
//! A fixed number of tokio tasks consume account jobs from a shared queue
//! and push finished records to a results channel. Once a workflow starts it
//! runs to completion; there is no mid-flight cancellation.

use std::sync::Arc;

use log::{debug, error};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::client::MeroshareApi;
use crate::models::{Account, ApplicationRecord};
use crate::workflow::ApplicationWorkflow;

/// One unit of work: an account plus the record it will drive to a terminal
/// state.
pub struct AccountJob {
    pub account: Account,
    pub record: ApplicationRecord,
}

pub struct WorkerPool {
    result_receiver: mpsc::Receiver<ApplicationRecord>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `worker_count` workers over the given jobs. The job queue is
    /// closed immediately, so workers exit once it drains.
    pub fn spawn(api: Arc<dyn MeroshareApi>, jobs: Vec<AccountJob>, worker_count: usize) -> Self {
        let capacity = jobs.len().max(1);
        let (job_sender, job_receiver) = mpsc::channel::<AccountJob>(capacity);
        let (result_sender, result_receiver) = mpsc::channel::<ApplicationRecord>(capacity);

        for job in jobs {
            // Capacity equals the job count, so this never blocks.
            if job_sender.try_send(job).is_err() {
                error!("Job queue refused a job; this is a bug");
            }
        }
        drop(job_sender);

        let job_receiver = Arc::new(Mutex::new(job_receiver));
        let worker_count = worker_count.max(1);
        let mut workers = Vec::with_capacity(worker_count);

        for worker_id in 0..worker_count {
            let job_rx = Arc::clone(&job_receiver);
            let result_tx = result_sender.clone();
            let worker_api = Arc::clone(&api);

            workers.push(tokio::spawn(async move {
                run_worker(worker_id, job_rx, result_tx, worker_api).await;
            }));
        }

        debug!("Started {} workers", worker_count);

        Self {
            result_receiver,
            workers,
        }
    }

    /// Next finished record in completion order; `None` once all workers are
    /// done and the channel has drained.
    pub async fn next_result(&mut self) -> Option<ApplicationRecord> {
        self.result_receiver.recv().await
    }

    /// Waits for every worker task to finish.
    pub async fn wait(self) {
        for (i, worker) in self.workers.into_iter().enumerate() {
            if let Err(e) = worker.await {
                error!("Worker {} panicked: {}", i, e);
            } else {
                debug!("Worker {} finished", i);
            }
        }
    }
}

async fn run_worker(
    worker_id: usize,
    job_receiver: Arc<Mutex<mpsc::Receiver<AccountJob>>>,
    result_sender: mpsc::Sender<ApplicationRecord>,
    api: Arc<dyn MeroshareApi>,
) {
    debug!("Worker {} started", worker_id);
    let workflow = ApplicationWorkflow::new(api);

    loop {
        // Hold the lock only while pulling the next job, never across the
        // workflow itself.
        let job = { job_receiver.lock().await.recv().await };
        let Some(job) = job else {
            debug!("Worker {} job queue drained", worker_id);
            break;
        };

        debug!("Worker {} processing {}", worker_id, job.account.username);
        let record = workflow.run(&job.account, job.record).await;

        if result_sender.send(record).await.is_err() {
            error!("Worker {} failed to send result", worker_id);
            break;
        }
    }

    debug!("Worker {} stopped", worker_id);
}
