//! Account list loading.
//!
//! The file is line-oriented: `client_id,username,password,crn,pin` per
//! line. Blank lines and `#` comments are skipped; malformed lines are
//! logged and skipped without failing the whole file. A missing file is
//! fatal.

use std::path::Path;

use log::{info, warn};

use crate::error::AccountError;
use crate::models::Account;

pub fn load_accounts(path: &Path) -> Result<Vec<Account>, AccountError> {
    if !path.exists() {
        return Err(AccountError::FileNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path).map_err(|e| AccountError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut accounts = Vec::new();
    for (line_num, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match Account::from_csv_line(line) {
            Ok(account) => accounts.push(account),
            Err(e) => {
                warn!("Skipping invalid line {}: {}", line_num + 1, e);
            }
        }
    }

    info!("Successfully loaded {} accounts", accounts.len());
    Ok(accounts)
}

/// Summary of a loaded account list, for display before a run.
pub fn account_summary(accounts: &[Account]) -> String {
    let usernames: Vec<&str> = accounts.iter().map(|a| a.username.as_str()).collect();
    format!("{} account(s): {}", accounts.len(), usernames.join(", "))
}
