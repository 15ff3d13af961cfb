pub mod accounts;
pub mod client;
pub mod config;
pub mod error;
pub mod lookup;
pub mod models;
pub mod offerings;
pub mod orchestrator;
pub mod report;
pub mod workflow;

pub use accounts::load_accounts;
pub use client::{MeroshareApi, MeroshareClient, SubmissionPayload};
pub use config::Settings;
pub use error::{
    AccountError, BulkshareError, ClientError, ConfigError, LookupError, ReportError, Result,
};
pub use models::{Account, ApplicationRecord, ApplicationStatus, RunReport, RunSnapshot};
pub use orchestrator::{BulkOrchestrator, NoopProgress, ProgressReporter};
pub use workflow::ApplicationWorkflow;
