//! Expenses API client
//!
//! The expenses API is the external ledger: it keeps a mirror user per
//! account and records that user's expenses.
//!
//! Endpoints:
//! - POST /auth (200)
//! - POST /user/register (201, `{id}` as number or string)
//! - POST /budget/v1/revenue/create/{external_id}/ (200)
//! - GET /budget/v1/revenue/list/{external_id}/ (200)
//! - GET /budget/v1/revenue/list-categories/ (200)

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use reqwest::blocking::{Client, Response};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use url::Url;

use super::http;
use crate::domain::result::{Collaborator, Error as DomainError, Result as DomainResult};
use crate::domain::{ExpenseCategory, ExpenseRecord, NewExpense};
use crate::ports::LedgerProvider;

const SERVICE_NAME: &str = "expenses API";

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct RegisterResponse {
    #[serde(deserialize_with = "deserialize_id")]
    id: String,
}

/// Expense payload as the ledger expects it
#[derive(Debug, Serialize)]
struct CreateExpenseRequest<'a> {
    name: &'a str,
    amount: f64,
    expiration_date: String,
    paid: bool,
    payment_date: String,
    category: &'a str,
}

/// Deserialize ID that can be number or string
fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value: JsonValue = Deserialize::deserialize(deserializer)?;
    match value {
        JsonValue::Number(n) => Ok(n.to_string()),
        JsonValue::String(s) => Ok(s),
        _ => Err(D::Error::custom("expected number or string for id")),
    }
}

/// Expenses API client
#[derive(Debug)]
pub struct ExpensesApiClient {
    client: Client,
    base_url: String,
    email: String,
    password: String,
    timeout_secs: u64,
}

impl ExpensesApiClient {
    /// Create a client authenticating with the given service credentials
    pub fn new(base_url: &str, email: &str, password: &str, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            client: http::build_client(timeout_secs)?,
            base_url: http::normalize_base_url(base_url)?,
            email: email.to_string(),
            password: password.to_string(),
            timeout_secs,
        })
    }

    pub fn auth(&self) -> Result<()> {
        let url = format!("{}/auth", self.base_url);
        let response = self.post(&url, &Credentials {
            email: &self.email,
            password: &self.password,
        })?;
        self.check_response_status(&response, 200)
    }

    /// Register a mirror user and return the ledger's id for it
    pub fn register(&self, email: &str, password: &str) -> Result<String> {
        let url = format!("{}/user/register", self.base_url);
        let response = self.post(&url, &Credentials { email, password })?;
        self.check_response_status(&response, 201)?;

        let data: RegisterResponse = response
            .json()
            .context("Failed to parse expenses API register response")?;
        Ok(data.id)
    }

    pub fn create_expense(&self, external_id: &str, expense: &NewExpense) -> Result<JsonValue> {
        let url = self.revenue_url("create", external_id)?;
        let today = Local::now().format("%Y-%m-%d").to_string();
        let amount = expense
            .amount
            .to_f64()
            .context("Expense amount out of range")?;
        let body = CreateExpenseRequest {
            name: &expense.reason,
            amount,
            expiration_date: today.clone(),
            paid: true,
            payment_date: today,
            category: &expense.category,
        };

        let response = self.post(&url, &body)?;
        self.check_response_status(&response, 200)?;
        response
            .json()
            .context("Failed to parse expenses API create response")
    }

    pub fn list_expenses(&self, external_id: &str) -> Result<Vec<JsonValue>> {
        let url = self.revenue_url("list", external_id)?;
        let response = self.get(&url)?;
        self.check_response_status(&response, 200)?;

        let data: JsonValue = response
            .json()
            .context("Failed to parse expenses API list response")?;
        Ok(into_list(data))
    }

    pub fn list_expense_categories(&self) -> Result<Vec<ExpenseCategory>> {
        let url = format!("{}/budget/v1/revenue/list-categories/", self.base_url);
        let response = self.get(&url)?;
        self.check_response_status(&response, 200)?;

        let data: JsonValue = response
            .json()
            .context("Failed to parse expenses API categories response")?;
        into_list(data)
            .into_iter()
            .map(|v| serde_json::from_value(normalize_category(v)).map_err(anyhow::Error::from))
            .collect()
    }

    /// `/budget/v1/revenue/{action}/{external_id}/`, with the id escaped as a
    /// single path segment
    fn revenue_url(&self, action: &str, external_id: &str) -> Result<String> {
        let mut url = Url::parse(&self.base_url).context("Invalid expenses API URL")?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("Expenses API URL cannot carry a path"))?
            .pop_if_empty()
            .extend(["budget", "v1", "revenue", action, external_id, ""]);
        Ok(url.to_string())
    }

    fn post<B: Serialize>(&self, url: &str, body: &B) -> Result<Response> {
        self.client
            .post(url)
            .json(body)
            .send()
            .map_err(|e| http::map_request_error(SERVICE_NAME, self.timeout_secs, e))
    }

    fn get(&self, url: &str) -> Result<Response> {
        self.client
            .get(url)
            .send()
            .map_err(|e| http::map_request_error(SERVICE_NAME, self.timeout_secs, e))
    }

    fn check_response_status(&self, response: &Response, expected: u16) -> Result<()> {
        match response.status().as_u16() {
            s if s == expected => Ok(()),
            401 | 403 => anyhow::bail!("Expenses API rejected the service credentials"),
            404 => anyhow::bail!("Expenses API resource not found"),
            status => anyhow::bail!("Expenses API error: HTTP {}", status),
        }
    }
}

/// Lists come back either bare or wrapped in `{results: [...]}`
fn into_list(data: JsonValue) -> Vec<JsonValue> {
    match data {
        JsonValue::Array(items) => items,
        JsonValue::Object(mut map) => match map.remove("results") {
            Some(JsonValue::Array(items)) => items,
            _ => vec![JsonValue::Object(map)],
        },
        JsonValue::Null => Vec::new(),
        other => vec![other],
    }
}

/// Category ids may be numeric
fn normalize_category(mut value: JsonValue) -> JsonValue {
    if let Some(id) = value.get("id").and_then(|v| v.as_i64()) {
        value["id"] = JsonValue::String(id.to_string());
    }
    value
}

fn upstream(e: anyhow::Error) -> DomainError {
    DomainError::upstream(Collaborator::Ledger, e.to_string())
}

impl LedgerProvider for ExpensesApiClient {
    fn name(&self) -> &str {
        "expenses-api"
    }

    fn auth(&self) -> DomainResult<()> {
        ExpensesApiClient::auth(self).map_err(upstream)
    }

    fn register(&self, login: &str, password: &str) -> DomainResult<String> {
        ExpensesApiClient::register(self, login, password).map_err(upstream)
    }

    fn create_expense(&self, external_id: &str, expense: &NewExpense) -> DomainResult<ExpenseRecord> {
        ExpensesApiClient::create_expense(self, external_id, expense).map_err(upstream)
    }

    fn list_expenses(&self, external_id: &str) -> DomainResult<Vec<ExpenseRecord>> {
        ExpensesApiClient::list_expenses(self, external_id).map_err(upstream)
    }

    fn list_expense_categories(&self) -> DomainResult<Vec<ExpenseCategory>> {
        ExpensesApiClient::list_expense_categories(self).map_err(upstream)
    }
}
