pub mod account;
pub mod application;
pub mod report;

pub use account::Account;
pub use application::{ApplicationRecord, ApplicationStatus};
pub use report::{RunReport, RunSnapshot, RunStatistics};
