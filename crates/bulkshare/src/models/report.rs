use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::application::{ApplicationRecord, ApplicationStatus};

/// Aggregate outcome of one bulk run.
///
/// Records are appended in completion order, which need not match the input
/// order. All statistics are derived on demand, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub applications: Vec<ApplicationRecord>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

/// Derived statistics block for a [`RunReport`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    pub total_accounts: usize,
    pub successful: usize,
    pub failed: usize,
    pub pending: usize,
    pub success_rate: f64,
    pub duration_seconds: f64,
    pub error_summary: BTreeMap<String, usize>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

/// Serializable snapshot written to the results file: the statistics block
/// plus every per-account record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSnapshot {
    pub statistics: RunStatistics,
    pub applications: Vec<ApplicationRecord>,
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

impl RunReport {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            applications: Vec::new(),
            started_at: now,
            completed_at: now,
        }
    }

    pub fn add_application(&mut self, application: ApplicationRecord) {
        self.applications.push(application);
    }

    pub fn mark_completed(&mut self) {
        self.completed_at = Utc::now();
    }

    pub fn total_accounts(&self) -> usize {
        self.applications.len()
    }

    pub fn successful(&self) -> usize {
        self.count_by_status(ApplicationStatus::Success)
    }

    pub fn failed(&self) -> usize {
        self.count_by_status(ApplicationStatus::Failed)
    }

    pub fn pending(&self) -> usize {
        self.count_by_status(ApplicationStatus::Pending)
    }

    fn count_by_status(&self, status: ApplicationStatus) -> usize {
        self.applications
            .iter()
            .filter(|app| app.status == status)
            .count()
    }

    /// Success rate as a percentage, rounded to 2 decimals. Exactly 0.0 for
    /// an empty report.
    pub fn success_rate(&self) -> f64 {
        if self.applications.is_empty() {
            return 0.0;
        }
        let rate = 100.0 * self.successful() as f64 / self.total_accounts() as f64;
        (rate * 100.0).round() / 100.0
    }

    pub fn duration_seconds(&self) -> f64 {
        let millis = (self.completed_at - self.started_at).num_milliseconds();
        millis as f64 / 1000.0
    }

    pub fn failed_applications(&self) -> impl Iterator<Item = &ApplicationRecord> {
        self.applications.iter().filter(|app| app.is_failed())
    }

    /// Failures grouped by the text before the first ':' of their error
    /// message. Messages without a colon form their own group; empty
    /// messages group under "Unknown".
    pub fn error_summary(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for app in self.failed_applications() {
            let key = if app.error_message.is_empty() {
                "Unknown".to_string()
            } else {
                app.error_message
                    .split(':')
                    .next()
                    .unwrap_or("Unknown")
                    .to_string()
            };
            *counts.entry(key).or_insert(0) += 1;
        }
        counts
    }

    pub fn statistics(&self) -> RunStatistics {
        RunStatistics {
            total_accounts: self.total_accounts(),
            successful: self.successful(),
            failed: self.failed(),
            pending: self.pending(),
            success_rate: self.success_rate(),
            duration_seconds: (self.duration_seconds() * 100.0).round() / 100.0,
            error_summary: self.error_summary(),
            started_at: self.started_at,
            completed_at: self.completed_at,
        }
    }

    pub fn to_snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            statistics: self.statistics(),
            applications: self.applications.clone(),
        }
    }
}
