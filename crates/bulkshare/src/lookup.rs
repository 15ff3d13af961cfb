//! Capital (broker) lookup.
//!
//! Pure, stateless helper mapping free-text capital names to the numeric ids
//! used as `client_id` in the accounts file. Backed by a JSON file of
//! `{ id, name, code }` records.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::LookupError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capital {
    pub id: u32,
    pub name: String,
    pub code: String,
}

#[derive(Debug)]
pub struct CapitalLookup {
    capitals: Vec<Capital>,
}

impl CapitalLookup {
    pub fn load(path: &Path) -> Result<Self, LookupError> {
        if !path.exists() {
            return Err(LookupError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|e| LookupError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        let capitals = serde_json::from_str(&content)?;
        Ok(Self { capitals })
    }

    pub fn from_capitals(capitals: Vec<Capital>) -> Self {
        Self { capitals }
    }

    pub fn all(&self) -> &[Capital] {
        &self.capitals
    }

    /// Case-insensitive name search, exact or substring.
    pub fn search_by_name(&self, term: &str, exact: bool) -> Vec<&Capital> {
        let term = term.trim().to_lowercase();
        self.capitals
            .iter()
            .filter(|capital| {
                let name = capital.name.to_lowercase();
                if exact {
                    name == term
                } else {
                    name.contains(&term)
                }
            })
            .collect()
    }

    pub fn search_by_code(&self, code: &str) -> Option<&Capital> {
        let code = code.trim();
        self.capitals.iter().find(|capital| capital.code == code)
    }

    pub fn search_by_id(&self, id: u32) -> Option<&Capital> {
        self.capitals.iter().find(|capital| capital.id == id)
    }

    /// Fuzzy name search via normalized Levenshtein similarity, best match
    /// first.
    pub fn fuzzy_search(&self, term: &str, threshold: f64) -> Vec<(&Capital, f64)> {
        let term = term.trim().to_lowercase();
        let mut results: Vec<(&Capital, f64)> = self
            .capitals
            .iter()
            .filter_map(|capital| {
                let similarity =
                    strsim::normalized_levenshtein(&term, &capital.name.to_lowercase());
                (similarity >= threshold).then_some((capital, similarity))
            })
            .collect();
        results.sort_by(|a, b| b.1.total_cmp(&a.1));
        results
    }

    /// Search cascade: 5-digit code, exact name, substring name, then fuzzy
    /// as a last resort.
    pub fn search(&self, term: &str) -> Vec<&Capital> {
        let term = term.trim();

        if term.len() == 5 && term.chars().all(|c| c.is_ascii_digit()) {
            if let Some(capital) = self.search_by_code(term) {
                return vec![capital];
            }
        }

        let exact = self.search_by_name(term, true);
        if !exact.is_empty() {
            return exact;
        }

        let partial = self.search_by_name(term, false);
        if !partial.is_empty() {
            return partial;
        }

        self.fuzzy_search(term, 0.4)
            .into_iter()
            .map(|(capital, _)| capital)
            .collect()
    }
}

pub fn format_capital(capital: &Capital) -> String {
    format!(
        "{} (id {}, code {})",
        capital.name, capital.id, capital.code
    )
}
