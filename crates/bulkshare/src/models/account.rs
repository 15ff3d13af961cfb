use serde::Serialize;

use crate::error::AccountError;

/// A single MeroShare account, immutable once parsed.
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub client_id: u32,
    pub username: String,
    /// Never serialized into snapshots or logs.
    #[serde(skip_serializing)]
    pub password: String,
    pub crn: String,
    pub pin: u32,
}

impl Account {
    pub fn new(
        client_id: u32,
        username: String,
        password: String,
        crn: String,
        pin: u32,
    ) -> Result<Self, AccountError> {
        if client_id == 0 {
            return Err(AccountError::InvalidField(
                "client_id must be a positive integer".to_string(),
            ));
        }
        if username.is_empty() {
            return Err(AccountError::InvalidField(
                "username must be a non-empty string".to_string(),
            ));
        }
        if password.is_empty() {
            return Err(AccountError::InvalidField(
                "password must be a non-empty string".to_string(),
            ));
        }
        if crn.is_empty() {
            return Err(AccountError::InvalidField(
                "crn must be a non-empty string".to_string(),
            ));
        }
        if pin == 0 {
            return Err(AccountError::InvalidField(
                "pin must be a positive integer".to_string(),
            ));
        }

        Ok(Self {
            client_id,
            username,
            password,
            crn,
            pin,
        })
    }

    /// Parses an account from a `client_id,username,password,crn,pin` line.
    pub fn from_csv_line(line: &str) -> Result<Self, AccountError> {
        let parts: Vec<&str> = line.split(',').map(str::trim).collect();
        if parts.len() < 5 {
            return Err(AccountError::MalformedLine(parts.len()));
        }

        let client_id = parts[0]
            .parse::<u32>()
            .map_err(|e| AccountError::InvalidField(format!("client_id: {}", e)))?;
        let pin = parts[4]
            .parse::<u32>()
            .map_err(|e| AccountError::InvalidField(format!("pin: {}", e)))?;

        Self::new(
            client_id,
            parts[1].to_string(),
            parts[2].to_string(),
            parts[3].to_string(),
            pin,
        )
    }

    pub fn display_name(&self) -> String {
        format!("{} ({})", self.username, self.client_id)
    }
}
