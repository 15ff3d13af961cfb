//! Bulk orchestration of account workflows.
//!
//! Schedules one workflow per account across a bounded worker pool, paces
//! result collection to respect upstream rate limits, and offers a
//! sequential retry pass over failed records.

pub mod pool;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};

use crate::client::MeroshareApi;
use crate::config::Settings;
use crate::error::Result;
use crate::models::{Account, ApplicationRecord, RunReport};
use crate::workflow::ApplicationWorkflow;
use pool::{AccountJob, WorkerPool};

/// Per-completion progress notifications emitted by the orchestrator.
pub trait ProgressReporter: Send + Sync {
    /// Called as each workflow completes, in completion order.
    fn completed(&self, index: usize, total: usize, record: &ApplicationRecord);

    /// Called before a failed record is re-run.
    fn retrying(&self, record: &ApplicationRecord, max_attempts: u32);
}

/// No-op reporter for unit tests.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn completed(&self, _index: usize, _total: usize, _record: &ApplicationRecord) {}
    fn retrying(&self, _record: &ApplicationRecord, _max_attempts: u32) {}
}

pub struct BulkOrchestrator {
    api: Arc<dyn MeroshareApi>,
    max_concurrency: usize,
    rate_limit_delay: Duration,
    max_retry_attempts: u32,
    retry_delay: Duration,
}

impl BulkOrchestrator {
    pub fn new(api: Arc<dyn MeroshareApi>, settings: &Settings) -> Self {
        Self {
            api,
            max_concurrency: settings.max_concurrency.max(1),
            rate_limit_delay: settings.rate_limit_delay,
            max_retry_attempts: settings.max_retry_attempts,
            retry_delay: settings.retry_delay,
        }
    }

    /// Runs the application workflow for every account under the concurrency
    /// cap and returns the aggregate report, records in completion order.
    ///
    /// Fails fast on invalid inputs (non-positive offering id or kitta
    /// amount) before any network activity.
    pub async fn run(
        &self,
        accounts: &[Account],
        company_share_id: u32,
        kitta_amount: u32,
        progress: &dyn ProgressReporter,
    ) -> Result<RunReport> {
        let mut report = RunReport::new();
        let total = accounts.len();

        if total == 0 {
            report.mark_completed();
            return Ok(report);
        }

        // Construct every record up front so validation failures reject the
        // run before any work is scheduled.
        let mut jobs = Vec::with_capacity(total);
        let mut outstanding: HashMap<u32, ApplicationRecord> = HashMap::with_capacity(total);
        for account in accounts {
            let record = ApplicationRecord::new(
                account.client_id,
                account.username.clone(),
                company_share_id,
                kitta_amount,
            )?;
            outstanding.insert(account.client_id, record.clone());
            jobs.push(AccountJob {
                account: account.clone(),
                record,
            });
        }

        info!(
            "Starting bulk IPO application for {} accounts (company {}, kitta {}, concurrency {})",
            total, company_share_id, kitta_amount, self.max_concurrency
        );

        let worker_count = self.max_concurrency.min(total);
        let mut pool = WorkerPool::spawn(Arc::clone(&self.api), jobs, worker_count);

        let mut received = 0;
        while let Some(record) = pool.next_result().await {
            received += 1;
            outstanding.remove(&record.client_id);
            progress.completed(received, total, &record);
            report.add_application(record);

            // Pacing is observed here by the collector, not by the worker
            // already pulling the next job, so parallelism stays at the cap.
            if received < total && !self.rate_limit_delay.is_zero() {
                tokio::time::sleep(self.rate_limit_delay).await;
            }
        }
        pool.wait().await;

        // A workflow never escapes its own boundary, so this only fires if a
        // worker task died outright. The batch still accounts for every
        // input record.
        if !outstanding.is_empty() {
            warn!(
                "{} workflow(s) produced no result; recording them as failed",
                outstanding.len()
            );
            for (_, mut record) in outstanding {
                record.mark_failed("Worker terminated unexpectedly");
                record.increment_attempts();
                report.add_application(record);
            }
        }

        report.mark_completed();
        Ok(report)
    }

    /// Re-runs failed records whose attempt counter is below the ceiling.
    ///
    /// Retries go sequentially with a fixed delay between them; failures at
    /// this stage are usually rate-limit or expired-auth fallout, and a
    /// tight burst would make that worse. Records whose account cannot be
    /// resolved from `accounts_by_id` are skipped with a diagnostic.
    /// Returns the number of records re-run.
    pub async fn retry_failed(
        &self,
        report: &mut RunReport,
        accounts_by_id: &HashMap<u32, Account>,
        progress: &dyn ProgressReporter,
    ) -> usize {
        let retryable: Vec<usize> = report
            .applications
            .iter()
            .enumerate()
            .filter(|(_, app)| app.is_failed() && app.attempts < self.max_retry_attempts)
            .map(|(i, _)| i)
            .collect();

        if retryable.is_empty() {
            info!("No applications to retry");
            return 0;
        }

        info!("Retrying {} failed application(s)", retryable.len());
        let workflow = ApplicationWorkflow::new(Arc::clone(&self.api));
        let mut retried = 0;

        for (position, index) in retryable.iter().copied().enumerate() {
            let Some(account) = accounts_by_id.get(&report.applications[index].client_id) else {
                warn!(
                    "Cannot retry {}: no account retained for client id {}",
                    report.applications[index].user_name, report.applications[index].client_id
                );
                continue;
            };

            let mut record = report.applications[index].clone();
            progress.retrying(&record, self.max_retry_attempts);
            record.mark_retrying();

            report.applications[index] = workflow.run(account, record).await;
            retried += 1;

            if position + 1 < retryable.len() && !self.retry_delay.is_zero() {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        report.mark_completed();
        retried
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::MockApi;
    use crate::models::ApplicationStatus;
    use std::collections::HashSet;
    use std::sync::atomic::Ordering;

    fn accounts(names: &[&str]) -> Vec<Account> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                Account::new(
                    (i + 1) as u32 * 100,
                    name.to_string(),
                    "pw".to_string(),
                    "crn".to_string(),
                    1234,
                )
                .unwrap()
            })
            .collect()
    }

    fn fast_settings() -> Settings {
        Settings {
            max_concurrency: 2,
            rate_limit_delay: Duration::ZERO,
            retry_delay: Duration::ZERO,
            ..Settings::default()
        }
    }

    fn account_map(accounts: &[Account]) -> HashMap<u32, Account> {
        accounts
            .iter()
            .map(|a| (a.client_id, a.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_run_produces_one_record_per_account() {
        let api = Arc::new(MockApi::ok());
        let orchestrator = BulkOrchestrator::new(api, &fast_settings());
        let accounts = accounts(&["a", "b", "c", "d"]);

        let report = orchestrator
            .run(&accounts, 42, 10, &NoopProgress)
            .await
            .unwrap();

        assert_eq!(report.total_accounts(), 4);
        let ids: HashSet<u32> = report.applications.iter().map(|r| r.client_id).collect();
        assert_eq!(ids.len(), 4, "no duplicates, no drops");
        assert_eq!(report.successful(), 4);
        assert!(report.completed_at >= report.started_at);
    }

    #[tokio::test]
    async fn test_concurrency_never_exceeds_cap() {
        let mut mock = MockApi::ok();
        mock.step_delay = Duration::from_millis(10);
        let api = Arc::new(mock);
        let orchestrator = BulkOrchestrator::new(api.clone(), &fast_settings());
        let accounts = accounts(&["a", "b", "c"]);

        let report = orchestrator
            .run(&accounts, 42, 10, &NoopProgress)
            .await
            .unwrap();

        assert_eq!(report.total_accounts(), 3);
        assert!(api.max_in_flight.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_empty_account_list() {
        let api = Arc::new(MockApi::ok());
        let orchestrator = BulkOrchestrator::new(api, &fast_settings());

        let report = orchestrator.run(&[], 42, 10, &NoopProgress).await.unwrap();

        assert_eq!(report.total_accounts(), 0);
        assert_eq!(report.success_rate(), 0.0);
    }

    #[tokio::test]
    async fn test_invalid_kitta_rejected_before_any_call() {
        let api = Arc::new(MockApi::ok());
        let orchestrator = BulkOrchestrator::new(api.clone(), &fast_settings());
        let accounts = accounts(&["a"]);

        let result = orchestrator.run(&accounts, 42, 0, &NoopProgress).await;

        assert!(result.is_err());
        assert_eq!(api.calls_matching("auth"), 0);
    }

    #[tokio::test]
    async fn test_one_failure_does_not_abort_batch() {
        let mut mock = MockApi::ok();
        mock.fail_auth.insert("b".to_string());
        let api = Arc::new(mock);
        let orchestrator = BulkOrchestrator::new(api, &fast_settings());
        let accounts = accounts(&["a", "b", "c"]);

        let report = orchestrator
            .run(&accounts, 42, 10, &NoopProgress)
            .await
            .unwrap();

        assert_eq!(report.total_accounts(), 3);
        assert_eq!(report.successful(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(
            report.error_summary().get("Authentication failed"),
            Some(&1)
        );
    }

    #[tokio::test]
    async fn test_retry_reruns_only_eligible_failures() {
        let mut mock = MockApi::ok();
        mock.fail_apply.insert("b".to_string());
        let api = Arc::new(mock);
        let orchestrator = BulkOrchestrator::new(api.clone(), &fast_settings());
        let accounts = accounts(&["a", "b"]);

        let mut report = orchestrator
            .run(&accounts, 42, 10, &NoopProgress)
            .await
            .unwrap();
        assert_eq!(report.failed(), 1);

        // The upstream recovers before the retry pass.
        let recovered = BulkOrchestrator::new(Arc::new(MockApi::ok()), &fast_settings());
        let retried = recovered
            .retry_failed(&mut report, &account_map(&accounts), &NoopProgress)
            .await;

        assert_eq!(retried, 1);
        assert_eq!(report.failed(), 0);
        assert_eq!(report.successful(), 2);
        let retried_record = report
            .applications
            .iter()
            .find(|r| r.user_name == "b")
            .unwrap();
        assert_eq!(retried_record.attempts, 2);
    }

    #[tokio::test]
    async fn test_retry_skips_records_at_attempt_ceiling() {
        let api = Arc::new(MockApi::ok());
        let settings = Settings {
            max_retry_attempts: 2,
            ..fast_settings()
        };
        let orchestrator = BulkOrchestrator::new(api.clone(), &settings);

        let mut report = RunReport::new();
        let mut exhausted = ApplicationRecord::new(100, "a".to_string(), 42, 10).unwrap();
        exhausted.mark_failed("boom");
        exhausted.increment_attempts();
        exhausted.increment_attempts();
        report.add_application(exhausted);

        let accounts = accounts(&["a"]);
        let retried = orchestrator
            .retry_failed(&mut report, &account_map(&accounts), &NoopProgress)
            .await;

        assert_eq!(retried, 0);
        assert_eq!(report.applications[0].attempts, 2);
        assert!(report.applications[0].is_failed());
        assert_eq!(api.calls_matching("auth"), 0);
    }

    #[tokio::test]
    async fn test_retry_skips_unresolvable_account() {
        let mut mock = MockApi::ok();
        mock.fail_apply.insert("a".to_string());
        let api = Arc::new(mock);
        let orchestrator = BulkOrchestrator::new(api.clone(), &fast_settings());
        let accounts = accounts(&["a"]);

        let mut report = orchestrator
            .run(&accounts, 42, 10, &NoopProgress)
            .await
            .unwrap();
        assert_eq!(report.failed(), 1);

        let retried = orchestrator
            .retry_failed(&mut report, &HashMap::new(), &NoopProgress)
            .await;

        assert_eq!(retried, 0);
        assert!(report.applications[0].is_failed());
        assert_eq!(report.applications[0].attempts, 1);
    }

    #[tokio::test]
    async fn test_retry_does_not_touch_successes() {
        let api = Arc::new(MockApi::ok());
        let orchestrator = BulkOrchestrator::new(api.clone(), &fast_settings());
        let accounts = accounts(&["a"]);

        let mut report = orchestrator
            .run(&accounts, 42, 10, &NoopProgress)
            .await
            .unwrap();
        let attempts_before = report.applications[0].attempts;

        let retried = orchestrator
            .retry_failed(&mut report, &account_map(&accounts), &NoopProgress)
            .await;

        assert_eq!(retried, 0);
        assert_eq!(report.applications[0].attempts, attempts_before);
    }
}
