//! Multi-step application workflow for a single account.
//!
//! Authenticate, collect personal/linkage/bank details, assemble the
//! submission payload, submit. Every step short-circuits into a Failed
//! record with a specific cause; nothing escapes the workflow boundary.

use std::sync::Arc;

use log::{error, info, warn};

use crate::client::types::{BankDetails, BoidDetails, PersonalDetails, SubmissionPayload};
use crate::client::MeroshareApi;
use crate::models::{Account, ApplicationRecord};

pub struct ApplicationWorkflow {
    api: Arc<dyn MeroshareApi>,
}

impl ApplicationWorkflow {
    pub fn new(api: Arc<dyn MeroshareApi>) -> Self {
        Self { api }
    }

    /// Drives the full step sequence for one account, consuming the record
    /// in Pending or Retrying state and returning it in a terminal state.
    /// The attempt counter is incremented exactly once, on exit.
    pub async fn run(&self, account: &Account, mut record: ApplicationRecord) -> ApplicationRecord {
        match self.execute(account, &record).await {
            Ok(()) => {
                info!("Successfully applied IPO for {}", account.username);
                record.mark_success();
            }
            Err(cause) => {
                warn!("Application failed for {}: {}", account.username, cause);
                record.mark_failed(cause);
            }
        }
        record.increment_attempts();
        record
    }

    async fn execute(&self, account: &Account, record: &ApplicationRecord) -> Result<(), String> {
        let Some(token) = self.api.authenticate(account).await else {
            return Err("Authentication failed".to_string());
        };

        let Some(personal) = self.api.personal_details(&token).await else {
            return Err("Failed to get personal details".to_string());
        };

        let Some(linkage) = self.api.boid_details(&token, &personal.demat).await else {
            return Err("Failed to get client BOID details".to_string());
        };

        let bank_details = self.api.bank_details(&token, &linkage.bank_code).await;

        let payload = self
            .assemble_payload(&token, account, &personal, &linkage, bank_details, record)
            .await?;

        if self.api.apply_share(&token, &payload).await.is_none() {
            return Err("IPO application failed".to_string());
        }

        Ok(())
    }

    /// Builds the submission payload. With known bank details the customer
    /// code is resolved through a secondary lookup; otherwise the first bank
    /// from the bank list stands in.
    async fn assemble_payload(
        &self,
        token: &str,
        account: &Account,
        personal: &PersonalDetails,
        linkage: &BoidDetails,
        bank_details: Option<BankDetails>,
        record: &ApplicationRecord,
    ) -> Result<SubmissionPayload, String> {
        match bank_details {
            Some(details) => {
                let Some(bank) = details.bank.into_first() else {
                    error!("Unexpected bank info shape for {}", account.username);
                    return Err("Failed to prepare application data".to_string());
                };
                let Some(branch) = details.branch.into_first() else {
                    error!("Unexpected branch info shape for {}", account.username);
                    return Err("Failed to prepare application data".to_string());
                };
                let Some(customer) = self.api.customer_code(token, bank.id).await else {
                    return Err("Failed to get customer code".to_string());
                };

                Ok(SubmissionPayload {
                    account_branch_id: branch.id,
                    account_number: details.account_number,
                    account_type_id: details.account_type_id.unwrap_or(1),
                    applied_kitta: record.kitta_amount,
                    bank_id: bank.id,
                    boid: personal.boid.clone(),
                    company_share_id: record.company_share_id,
                    crn_number: account.crn.clone(),
                    customer_id: customer.id,
                    demat: linkage.boid.clone(),
                    transaction_pin: account.pin,
                })
            }
            None => {
                let banks = self.api.bank_list(token).await.unwrap_or_default();
                let Some(first) = banks.first() else {
                    return Err("No banks found".to_string());
                };
                let Some(bank) = self.api.bank_detail(token, first.id).await else {
                    return Err("Failed to get bank details".to_string());
                };

                Ok(SubmissionPayload {
                    account_branch_id: bank.account_branch_id,
                    account_number: bank.account_number,
                    account_type_id: bank.account_type_id.unwrap_or(1),
                    applied_kitta: record.kitta_amount,
                    // The detail response does not always carry its own bank
                    // id; the list entry's id fills the gap.
                    bank_id: bank.bank_id.unwrap_or(first.id),
                    boid: personal.boid.clone(),
                    company_share_id: record.company_share_id,
                    crn_number: account.crn.clone(),
                    customer_id: bank.id,
                    demat: linkage.boid.clone(),
                    transaction_pin: account.pin,
                })
            }
        }
    }
}
