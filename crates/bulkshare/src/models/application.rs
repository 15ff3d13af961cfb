use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::AccountError;

/// Lifecycle status of one application record.
///
/// Transitions only move forward: Pending -> Success | Failed,
/// Failed -> Retrying, Retrying -> Success | Failed. Success is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Success,
    Failed,
    Retrying,
}

/// Tracks one account's application against one offering.
///
/// Owned exclusively by a single workflow invocation while in flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub client_id: u32,
    pub user_name: String,
    pub company_share_id: u32,
    #[serde(default)]
    pub company_name: String,
    pub kitta_amount: u32,
    pub status: ApplicationStatus,
    #[serde(default)]
    pub error_message: String,
    pub attempts: u32,
    pub last_attempt: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl ApplicationRecord {
    pub fn new(
        client_id: u32,
        user_name: String,
        company_share_id: u32,
        kitta_amount: u32,
    ) -> Result<Self, AccountError> {
        if client_id == 0 {
            return Err(AccountError::InvalidField(
                "client_id must be a positive integer".to_string(),
            ));
        }
        if user_name.is_empty() {
            return Err(AccountError::InvalidField(
                "user_name must be a non-empty string".to_string(),
            ));
        }
        if company_share_id == 0 {
            return Err(AccountError::InvalidField(
                "company_share_id must be a positive integer".to_string(),
            ));
        }
        if kitta_amount == 0 {
            return Err(AccountError::InvalidField(
                "kitta_amount must be a positive integer".to_string(),
            ));
        }

        Ok(Self {
            client_id,
            user_name,
            company_share_id,
            company_name: String::new(),
            kitta_amount,
            status: ApplicationStatus::Pending,
            error_message: String::new(),
            attempts: 0,
            last_attempt: None,
            created_at: Utc::now(),
        })
    }

    pub fn mark_success(&mut self) {
        if !self.is_active() {
            warn!(
                "Ignoring success transition for {} in terminal status {:?}",
                self.user_name, self.status
            );
            return;
        }
        self.status = ApplicationStatus::Success;
        self.error_message.clear();
        self.last_attempt = Some(Utc::now());
    }

    pub fn mark_failed(&mut self, error_message: impl Into<String>) {
        if !self.is_active() {
            warn!(
                "Ignoring failure transition for {} in terminal status {:?}",
                self.user_name, self.status
            );
            return;
        }
        self.status = ApplicationStatus::Failed;
        self.error_message = error_message.into();
        self.last_attempt = Some(Utc::now());
    }

    /// Flips a failed record back into flight for a retry. Only valid from
    /// Failed. The attempt counter is bumped by the workflow invocation
    /// itself, exactly once per run.
    pub fn mark_retrying(&mut self) {
        if self.status != ApplicationStatus::Failed {
            warn!(
                "Ignoring retry transition for {} in status {:?}",
                self.user_name, self.status
            );
            return;
        }
        self.status = ApplicationStatus::Retrying;
        self.last_attempt = Some(Utc::now());
    }

    pub fn increment_attempts(&mut self) {
        self.attempts += 1;
        self.last_attempt = Some(Utc::now());
    }

    /// True while the record can still receive a success/failure outcome.
    fn is_active(&self) -> bool {
        matches!(
            self.status,
            ApplicationStatus::Pending | ApplicationStatus::Retrying
        )
    }

    pub fn is_successful(&self) -> bool {
        self.status == ApplicationStatus::Success
    }

    pub fn is_failed(&self) -> bool {
        self.status == ApplicationStatus::Failed
    }

    pub fn is_pending(&self) -> bool {
        self.status == ApplicationStatus::Pending
    }
}
