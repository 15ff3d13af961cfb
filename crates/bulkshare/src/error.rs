use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BulkshareError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Account error: {0}")]
    Account(#[from] AccountError),

    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {variable}: {reason}")]
    InvalidEnvValue { variable: String, reason: String },

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

#[derive(Error, Debug)]
pub enum AccountError {
    #[error("Accounts file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read accounts file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid account field: {0}")]
    InvalidField(String),

    #[error("Invalid account line: expected 5 comma-separated fields, got {0}")]
    MalformedLine(usize),
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write results file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Capitals file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read capitals file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse capitals JSON: {0}")]
    ParseJson(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BulkshareError>;
