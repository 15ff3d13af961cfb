#[cfg(test)]
pub(crate) mod mock;
pub mod service;
pub mod types;

pub use service::MeroshareClient;
pub use types::{
    Bank, BankDetail, BankDetails, BoidDetails, CustomerCode, Offering, OneOrMany,
    PersonalDetails, SubmissionPayload,
};

use serde_json::Value;

use crate::models::Account;

/// Remote operations against the MeroShare backend, one method per endpoint.
///
/// Every method except [`authenticate`](MeroshareApi::authenticate) takes a
/// session token. Expected failures (rejected auth, non-2xx statuses,
/// transport errors) surface as `None`; implementations log the cause and
/// never panic or return errors for them.
#[async_trait::async_trait]
pub trait MeroshareApi: Send + Sync {
    /// Authenticates an account and returns its session token.
    async fn authenticate(&self, account: &Account) -> Option<String>;

    async fn personal_details(&self, token: &str) -> Option<PersonalDetails>;

    async fn boid_details(&self, token: &str, demat: &str) -> Option<BoidDetails>;

    async fn bank_details(&self, token: &str, bank_code: &str) -> Option<BankDetails>;

    async fn bank_list(&self, token: &str) -> Option<Vec<Bank>>;

    async fn bank_detail(&self, token: &str, bank_id: u64) -> Option<BankDetail>;

    /// Customer code tied to a bank relationship, required before submission.
    async fn customer_code(&self, token: &str, bank_id: u64) -> Option<CustomerCode>;

    async fn applicable_issues(&self, token: &str) -> Option<Vec<Offering>>;

    /// Submits an assembled application. A present value means the upstream
    /// accepted it (HTTP 200/201, or 409 for an already-applied account).
    async fn apply_share(&self, token: &str, payload: &SubmissionPayload) -> Option<Value>;
}
