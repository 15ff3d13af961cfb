//! Applicable-offering discovery and selection helpers.

use std::sync::Arc;

use log::{error, warn};

use crate::client::types::Offering;
use crate::client::MeroshareApi;
use crate::models::Account;

pub struct OfferingService {
    api: Arc<dyn MeroshareApi>,
}

impl OfferingService {
    pub fn new(api: Arc<dyn MeroshareApi>) -> Self {
        Self { api }
    }

    /// Fetches the offerings the given account may apply to. Applicable
    /// issues are account-independent in practice, so the caller usually
    /// passes the first loaded account.
    pub async fn available_offerings(&self, account: &Account) -> Vec<Offering> {
        let Some(token) = self.api.authenticate(account).await else {
            error!("Failed to authenticate user {}", account.username);
            return Vec::new();
        };

        self.api.applicable_issues(&token).await.unwrap_or_default()
    }

    /// Checks a requested kitta amount against the offering's unit bounds.
    /// Missing bounds are treated as unconstrained.
    pub fn validate_kitta(&self, offering: &Offering, kitta_amount: u32) -> bool {
        if let Some(min) = offering.min_unit {
            if kitta_amount < min {
                warn!("Kitta amount {} below minimum {}", kitta_amount, min);
                return false;
            }
        }
        if let Some(max) = offering.max_unit {
            if kitta_amount > max {
                warn!("Kitta amount {} above maximum {}", kitta_amount, max);
                return false;
            }
        }
        true
    }
}

/// One display line per offering for the selection menu.
pub fn format_offering(offering: &Offering) -> String {
    format!(
        "{} [{}] (id {}, units {}-{})",
        offering.company_name,
        offering.share_type_name.as_deref().unwrap_or("Unknown"),
        offering.company_share_id,
        offering
            .min_unit
            .map(|u| u.to_string())
            .unwrap_or_else(|| "?".to_string()),
        offering
            .max_unit
            .map(|u| u.to_string())
            .unwrap_or_else(|| "?".to_string()),
    )
}
