//! HTTP client for the MeroShare backend.
//!
//! Every call is stateless: the shared `reqwest::Client` only carries
//! connection pooling and timeouts, while tokens and headers are per request,
//! so one instance is safe to share across all concurrent workflows.

use log::{debug, error, warn};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::client::types::{
    Bank, BankDetail, BankDetails, BoidDetails, CustomerCode, IssueList, Offering, OneOrMany,
    PersonalDetails, SubmissionPayload,
};
use crate::client::MeroshareApi;
use crate::config::Settings;
use crate::error::ClientError;
use crate::models::Account;

mod endpoints {
    pub const AUTH: &str = "/meroShare/auth/";
    pub const OWN_DETAIL: &str = "/meroShare/ownDetail/";
    pub const BANK_LIST: &str = "/meroShare/bank/";
    pub const APPLICABLE_ISSUES: &str = "/meroShare/companyShare/applicableIssue/";
    pub const APPLY_SHARE: &str = "/meroShare/applicantForm/share/apply/";

    pub fn my_detail(demat: &str) -> String {
        format!("/meroShareView/myDetail/{}", demat)
    }

    pub fn bank_request(bank_code: &str) -> String {
        format!("/bankRequest/{}/", bank_code)
    }

    pub fn bank_detail(bank_id: u64) -> String {
        format!("/meroShare/bank/{}/", bank_id)
    }
}

pub struct MeroshareClient {
    http: reqwest::Client,
    base_url: String,
}

impl MeroshareClient {
    pub fn new(settings: &Settings) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(ClientError::Build)?;

        Ok(Self {
            http,
            base_url: settings.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Performs an authenticated request and parses the body on an accepted
    /// status. Expected failures (non-2xx, timeouts, unparseable bodies) are
    /// logged and collapse to `None`; nothing is raised past this boundary.
    async fn request_json<T, B>(
        &self,
        method: Method,
        endpoint: &str,
        token: &str,
        body: Option<&B>,
    ) -> Option<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let mut request = self
            .http
            .request(method, self.url(endpoint))
            .header("Accept", "application/json")
            .header("Content-Type", "application/json")
            .header("Authorization", token);

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                error!("Network error calling {}: {}", endpoint, e);
                return None;
            }
        };

        let status = response.status();
        if !is_accepted_status(status) {
            let message = extract_error_message(status, response.text().await.ok());
            warn!("API request to {} failed: {}", endpoint, message);
            return None;
        }

        match response.json::<T>().await {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Unexpected response shape from {}: {}", endpoint, e);
                None
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str, token: &str) -> Option<T> {
        self.request_json::<T, Value>(Method::GET, endpoint, token, None)
            .await
    }

    async fn post_json<T, B>(&self, endpoint: &str, token: &str, body: &B) -> Option<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request_json(Method::POST, endpoint, token, Some(body))
            .await
    }
}

/// 2xx plus 409: the apply endpoint answers 409 when the account has already
/// applied, which is a terminal success for the record.
fn is_accepted_status(status: StatusCode) -> bool {
    status.is_success() || status == StatusCode::CONFLICT
}

/// Pulls a human-readable message out of an upstream error body, which may be
/// an object, a list of objects, or not JSON at all.
fn extract_error_message(status: StatusCode, body: Option<String>) -> String {
    let fallback = format!("HTTP {}", status.as_u16());
    let Some(body) = body else {
        return fallback;
    };
    let Ok(value) = serde_json::from_str::<Value>(&body) else {
        return fallback;
    };

    let message = match &value {
        Value::Object(map) => map.get("message"),
        Value::Array(items) => items.first().and_then(|item| item.get("message")),
        _ => None,
    };

    message
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or(fallback)
}

/// Filter payload the applicable-issue endpoint expects.
fn applicable_issue_filter() -> Value {
    json!({
        "filterFieldParams": [
            {"key": "companyIssue.companyISIN.script", "alias": "Scrip"},
            {"key": "companyIssue.companyISIN.company.name", "alias": "Company Name"},
            {"key": "companyIssue.assignedToClient.name", "value": "", "alias": "Issue Manager"}
        ],
        "page": 1,
        "size": 10,
        "searchRoleViewConstants": "VIEW_APPLICABLE_SHARE",
        "filterDateParams": [
            {"key": "minIssueOpenDate", "condition": "", "alias": "", "value": ""},
            {"key": "maxIssueCloseDate", "condition": "", "alias": "", "value": ""}
        ]
    })
}

#[async_trait::async_trait]
impl MeroshareApi for MeroshareClient {
    async fn authenticate(&self, account: &Account) -> Option<String> {
        let payload = json!({
            "clientId": account.client_id,
            "username": account.username,
            "password": account.password,
        });

        let response = match self
            .http
            .post(self.url(endpoints::AUTH))
            .header("Accept", "application/json")
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!("Network error during authentication: {}", e);
                return None;
            }
        };

        if response.status() == StatusCode::OK {
            let token = response
                .headers()
                .get("Authorization")
                .and_then(|v| v.to_str().ok())
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty());
            if let Some(token) = token {
                debug!("Successfully authenticated {}", account.username);
                return Some(token);
            }
        }

        error!("Authentication failed for {}", account.username);
        None
    }

    async fn personal_details(&self, token: &str) -> Option<PersonalDetails> {
        self.get_json(endpoints::OWN_DETAIL, token).await
    }

    async fn boid_details(&self, token: &str, demat: &str) -> Option<BoidDetails> {
        self.get_json(&endpoints::my_detail(demat), token).await
    }

    async fn bank_details(&self, token: &str, bank_code: &str) -> Option<BankDetails> {
        self.get_json(&endpoints::bank_request(bank_code), token)
            .await
    }

    async fn bank_list(&self, token: &str) -> Option<Vec<Bank>> {
        self.get_json(endpoints::BANK_LIST, token).await
    }

    async fn bank_detail(&self, token: &str, bank_id: u64) -> Option<BankDetail> {
        self.get_json::<OneOrMany<BankDetail>>(&endpoints::bank_detail(bank_id), token)
            .await?
            .into_first()
    }

    async fn customer_code(&self, token: &str, bank_id: u64) -> Option<CustomerCode> {
        self.get_json::<OneOrMany<CustomerCode>>(&endpoints::bank_detail(bank_id), token)
            .await?
            .into_first()
    }

    async fn applicable_issues(&self, token: &str) -> Option<Vec<Offering>> {
        let list: IssueList = self
            .post_json(
                endpoints::APPLICABLE_ISSUES,
                token,
                &applicable_issue_filter(),
            )
            .await?;
        Some(list.object)
    }

    async fn apply_share(&self, token: &str, payload: &SubmissionPayload) -> Option<Value> {
        self.post_json(endpoints::APPLY_SHARE, token, payload).await
    }
}
