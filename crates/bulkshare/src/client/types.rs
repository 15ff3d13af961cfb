//! Wire shapes for the MeroShare backend.
//!
//! The upstream service is inconsistent about returning a single object or a
//! one-element list for the same logical entity; [`OneOrMany`] captures that
//! at the deserialization boundary so the rest of the crate only ever sees a
//! single object.

use serde::{Deserialize, Serialize};

/// A response value the upstream serves either bare or wrapped in a list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Single(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// Normalizes to a single value: the bare object, or the first list
    /// element. `None` for an empty list.
    pub fn into_first(self) -> Option<T> {
        match self {
            OneOrMany::Single(value) => Some(value),
            OneOrMany::Many(values) => values.into_iter().next(),
        }
    }
}

/// Own-detail response. Only the fields the workflow needs are modelled.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalDetails {
    pub demat: String,
    pub boid: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Demat-linkage detail response, keyed by the demat number.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoidDetails {
    pub bank_code: String,
    pub boid: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntityRef {
    pub id: u64,
}

/// Bank-request detail looked up by bank code. `bank` and `branch` arrive as
/// either a single object or a one-element list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankDetails {
    pub bank: OneOrMany<EntityRef>,
    pub branch: OneOrMany<EntityRef>,
    pub account_number: String,
    #[serde(default)]
    pub account_type_id: Option<u32>,
}

/// One entry of the bank list.
#[derive(Debug, Clone, Deserialize)]
pub struct Bank {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
}

/// Full bank detail fetched by bank id, used on the fallback path when the
/// bank-code lookup comes up empty.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankDetail {
    /// Customer identifier for the bank relationship.
    pub id: u64,
    #[serde(default)]
    pub bank_id: Option<u64>,
    pub account_branch_id: u64,
    pub account_number: String,
    #[serde(default)]
    pub account_type_id: Option<u32>,
}

/// Customer code tied to a bank relationship, required before submission.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomerCode {
    pub id: u64,
}

/// Applicable-issue list wrapper; offerings live under `object`.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueList {
    #[serde(default)]
    pub object: Vec<Offering>,
}

/// One applicable offering descriptor.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offering {
    pub company_share_id: u32,
    pub company_name: String,
    #[serde(default)]
    pub share_type_name: Option<String>,
    #[serde(default)]
    pub issue_manager: Option<String>,
    #[serde(default)]
    pub min_unit: Option<u32>,
    #[serde(default)]
    pub max_unit: Option<u32>,
    #[serde(default)]
    pub issue_open_date: Option<String>,
    #[serde(default)]
    pub issue_close_date: Option<String>,
}

/// Application payload submitted to the apply endpoint. The session token
/// travels out-of-band in the Authorization header.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub account_branch_id: u64,
    pub account_number: String,
    pub account_type_id: u32,
    pub applied_kitta: u32,
    pub bank_id: u64,
    pub boid: String,
    pub company_share_id: u32,
    pub crn_number: String,
    pub customer_id: u64,
    pub demat: String,
    #[serde(rename = "transactionPIN")]
    pub transaction_pin: u32,
}
