//! End-to-end bulk run against an in-memory service implementation.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use serde_json::{json, Value};
use std::sync::Arc;

use bulkshare::client::types::{
    Bank, BankDetail, BankDetails, BoidDetails, CustomerCode, EntityRef, Offering, OneOrMany,
    PersonalDetails, SubmissionPayload,
};
use bulkshare::orchestrator::NoopProgress;
use bulkshare::{
    report, Account, ApplicationStatus, BulkOrchestrator, MeroshareApi, RunReport, Settings,
};

/// Service stub: rejects authentication for blocked usernames, accepts
/// everything else, and records every submitted payload.
#[derive(Default)]
struct StubService {
    blocked: HashSet<String>,
    submissions: Mutex<Vec<SubmissionPayload>>,
}

#[async_trait::async_trait]
impl MeroshareApi for StubService {
    async fn authenticate(&self, account: &Account) -> Option<String> {
        if self.blocked.contains(&account.username) {
            return None;
        }
        Some(format!("token-{}", account.username))
    }

    async fn personal_details(&self, token: &str) -> Option<PersonalDetails> {
        Some(PersonalDetails {
            demat: format!("demat-{}", token),
            boid: format!("boid-{}", token),
            name: None,
        })
    }

    async fn boid_details(&self, token: &str, _demat: &str) -> Option<BoidDetails> {
        Some(BoidDetails {
            bank_code: "NIBL".to_string(),
            boid: format!("linked-{}", token),
        })
    }

    async fn bank_details(&self, _token: &str, _bank_code: &str) -> Option<BankDetails> {
        Some(BankDetails {
            bank: OneOrMany::Single(EntityRef { id: 11 }),
            branch: OneOrMany::Single(EntityRef { id: 22 }),
            account_number: "00123456789".to_string(),
            account_type_id: Some(1),
        })
    }

    async fn bank_list(&self, _token: &str) -> Option<Vec<Bank>> {
        Some(Vec::new())
    }

    async fn bank_detail(&self, _token: &str, _bank_id: u64) -> Option<BankDetail> {
        None
    }

    async fn customer_code(&self, _token: &str, _bank_id: u64) -> Option<CustomerCode> {
        Some(CustomerCode { id: 99 })
    }

    async fn applicable_issues(&self, _token: &str) -> Option<Vec<Offering>> {
        Some(Vec::new())
    }

    async fn apply_share(&self, _token: &str, payload: &SubmissionPayload) -> Option<Value> {
        self.submissions.lock().unwrap().push(payload.clone());
        Some(json!({"status": "CREATED"}))
    }
}

fn test_accounts() -> Vec<Account> {
    vec![
        Account::new(100, "alice".into(), "pw".into(), "crn-a".into(), 1111).unwrap(),
        Account::new(200, "bob".into(), "pw".into(), "crn-b".into(), 2222).unwrap(),
        Account::new(300, "carol".into(), "pw".into(), "crn-c".into(), 3333).unwrap(),
    ]
}

fn fast_settings() -> Settings {
    Settings {
        max_concurrency: 2,
        rate_limit_delay: std::time::Duration::ZERO,
        retry_delay: std::time::Duration::ZERO,
        ..Settings::default()
    }
}

#[tokio::test]
async fn bulk_run_applies_for_every_account() {
    let service = Arc::new(StubService::default());
    let orchestrator = BulkOrchestrator::new(service.clone(), &fast_settings());

    let report = orchestrator
        .run(&test_accounts(), 42, 10, &NoopProgress)
        .await
        .unwrap();

    assert_eq!(report.total_accounts(), 3);
    assert_eq!(report.successful(), 3);
    assert_eq!(report.success_rate(), 100.0);

    let submissions = service.submissions.lock().unwrap();
    assert_eq!(submissions.len(), 3);
    for payload in submissions.iter() {
        assert_eq!(payload.company_share_id, 42);
        assert_eq!(payload.applied_kitta, 10);
        assert_eq!(payload.customer_id, 99);
    }
}

#[tokio::test]
async fn failed_account_is_isolated_and_retryable() {
    let mut service = StubService::default();
    service.blocked.insert("bob".to_string());
    let orchestrator = BulkOrchestrator::new(Arc::new(service), &fast_settings());

    let accounts = test_accounts();
    let mut report = orchestrator
        .run(&accounts, 42, 10, &NoopProgress)
        .await
        .unwrap();

    assert_eq!(report.successful(), 2);
    assert_eq!(report.failed(), 1);

    let failed = report
        .applications
        .iter()
        .find(|r| r.status == ApplicationStatus::Failed)
        .unwrap();
    assert_eq!(failed.user_name, "bob");
    assert_eq!(failed.error_message, "Authentication failed");
    assert_eq!(failed.attempts, 1);

    // Upstream recovers; retry pass flips the failure to success.
    let recovered = BulkOrchestrator::new(Arc::new(StubService::default()), &fast_settings());
    let accounts_by_id: HashMap<u32, Account> = accounts
        .iter()
        .map(|a| (a.client_id, a.clone()))
        .collect();
    let retried = recovered
        .retry_failed(&mut report, &accounts_by_id, &NoopProgress)
        .await;

    assert_eq!(retried, 1);
    assert_eq!(report.failed(), 0);
    assert_eq!(report.successful(), 3);
    let bob = report
        .applications
        .iter()
        .find(|r| r.user_name == "bob")
        .unwrap();
    assert_eq!(bob.attempts, 2);
}

#[tokio::test]
async fn snapshot_round_trips_through_results_file() {
    let service = Arc::new(StubService::default());
    let orchestrator = BulkOrchestrator::new(service, &fast_settings());

    let run_report: RunReport = orchestrator
        .run(&test_accounts(), 42, 10, &NoopProgress)
        .await
        .unwrap();

    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("ipo_results.json");
    report::save_snapshot(&run_report, &path).unwrap();

    let snapshot = report::load_snapshot(&path).unwrap();
    assert_eq!(snapshot.statistics, run_report.statistics());
    assert_eq!(snapshot.applications.len(), 3);
}
