//! Configurable in-memory [`MeroshareApi`] used by unit tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use serde_json::{json, Value};

use crate::client::types::{
    Bank, BankDetail, BankDetails, BoidDetails, CustomerCode, EntityRef, Offering, OneOrMany,
    PersonalDetails, SubmissionPayload,
};
use crate::client::MeroshareApi;
use crate::models::Account;

#[derive(Default)]
pub struct MockApi {
    /// Usernames whose authentication is rejected.
    pub fail_auth: HashSet<String>,
    /// Usernames whose personal-detail fetch comes up empty.
    pub fail_personal: HashSet<String>,
    /// Usernames whose BOID-detail fetch comes up empty.
    pub fail_boid: HashSet<String>,
    /// Usernames whose submission is rejected.
    pub fail_apply: HashSet<String>,
    /// When set, the bank-code lookup returns nothing and the fallback path
    /// through the bank list is exercised.
    pub bank_details_absent: bool,
    /// Bank list served on the fallback path.
    pub banks: Vec<Bank>,
    /// When set, the by-id bank detail fetch fails.
    pub fail_bank_detail: bool,
    /// When set, the customer-code lookup fails.
    pub fail_customer_code: bool,
    /// Artificial latency per workflow-step call, for concurrency tests.
    pub step_delay: Duration,

    /// Operation log, `"op:token"` per call.
    pub calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl MockApi {
    pub fn ok() -> Self {
        Self::default()
    }

    fn record(&self, op: &str, token: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{}:{}", op, token));
    }

    pub fn calls_matching(&self, op: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|entry| entry.split(':').next() == Some(op))
            .count()
    }

    async fn enter_step(&self) {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if !self.step_delay.is_zero() {
            tokio::time::sleep(self.step_delay).await;
        }
    }

    fn leave_step(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    fn username_of(token: &str) -> &str {
        token.strip_prefix("token-").unwrap_or(token)
    }
}

#[async_trait::async_trait]
impl MeroshareApi for MockApi {
    async fn authenticate(&self, account: &Account) -> Option<String> {
        self.enter_step().await;
        self.record("auth", &account.username);
        self.leave_step();
        if self.fail_auth.contains(&account.username) {
            return None;
        }
        Some(format!("token-{}", account.username))
    }

    async fn personal_details(&self, token: &str) -> Option<PersonalDetails> {
        self.enter_step().await;
        self.record("personal", token);
        self.leave_step();
        if self.fail_personal.contains(Self::username_of(token)) {
            return None;
        }
        Some(PersonalDetails {
            demat: format!("demat-{}", Self::username_of(token)),
            boid: format!("boid-{}", Self::username_of(token)),
            name: None,
        })
    }

    async fn boid_details(&self, token: &str, _demat: &str) -> Option<BoidDetails> {
        self.enter_step().await;
        self.record("boid", token);
        self.leave_step();
        if self.fail_boid.contains(Self::username_of(token)) {
            return None;
        }
        Some(BoidDetails {
            bank_code: "NIBL".to_string(),
            boid: format!("linked-{}", Self::username_of(token)),
        })
    }

    async fn bank_details(&self, token: &str, _bank_code: &str) -> Option<BankDetails> {
        self.enter_step().await;
        self.record("bank_details", token);
        self.leave_step();
        if self.bank_details_absent {
            return None;
        }
        Some(BankDetails {
            bank: OneOrMany::Single(EntityRef { id: 11 }),
            branch: OneOrMany::Many(vec![EntityRef { id: 22 }]),
            account_number: "00123456789".to_string(),
            account_type_id: Some(1),
        })
    }

    async fn bank_list(&self, token: &str) -> Option<Vec<Bank>> {
        self.enter_step().await;
        self.record("bank_list", token);
        self.leave_step();
        Some(self.banks.clone())
    }

    async fn bank_detail(&self, token: &str, bank_id: u64) -> Option<BankDetail> {
        self.enter_step().await;
        self.record("bank_detail", token);
        self.leave_step();
        if self.fail_bank_detail {
            return None;
        }
        Some(BankDetail {
            id: 77,
            bank_id: Some(bank_id),
            account_branch_id: 33,
            account_number: "00987654321".to_string(),
            account_type_id: None,
        })
    }

    async fn customer_code(&self, token: &str, _bank_id: u64) -> Option<CustomerCode> {
        self.enter_step().await;
        self.record("customer_code", token);
        self.leave_step();
        if self.fail_customer_code {
            return None;
        }
        Some(CustomerCode { id: 99 })
    }

    async fn applicable_issues(&self, token: &str) -> Option<Vec<Offering>> {
        self.record("issues", token);
        Some(vec![Offering {
            company_share_id: 42,
            company_name: "Sample Hydropower Ltd.".to_string(),
            share_type_name: Some("IPO".to_string()),
            issue_manager: None,
            min_unit: Some(10),
            max_unit: Some(100),
            issue_open_date: None,
            issue_close_date: None,
        }])
    }

    async fn apply_share(&self, token: &str, _payload: &SubmissionPayload) -> Option<Value> {
        self.enter_step().await;
        self.record("apply", token);
        self.leave_step();
        if self.fail_apply.contains(Self::username_of(token)) {
            return None;
        }
        Some(json!({"status": "CREATED"}))
    }
}
