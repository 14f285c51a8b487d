use crate::config::StoreConfig;
use crate::filter::Filter;
use crate::store::{StoreError, StoreResult, TicketStore};
use crate::ticket::{Mutations, Ticket};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    issues: Vec<Ticket>,
}

/// Jira REST (v3) implementation of [`TicketStore`], using basic auth with
/// an API token.
#[derive(Debug, Clone)]
pub struct JiraClient {
    http: Client,
    base_url: String,
    user: String,
    token: String,
}

impl JiraClient {
    pub fn new(store: &StoreConfig, token: impl Into<String>) -> StoreResult<Self> {
        let http = Client::builder()
            .user_agent(concat!("relsync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: store.base_url.trim_end_matches('/').to_string(),
            user: store.user.clone(),
            token: token.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn send(&self, req: RequestBuilder) -> StoreResult<Response> {
        let resp = req
            .basic_auth(&self.user, Some(&self.token))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp)
    }
}

/// Wrap plain text in the store's rich-text document format.
fn comment_document(text: &str) -> Value {
    json!({
        "body": {
            "type": "doc",
            "version": 1,
            "content": [{
                "type": "paragraph",
                "content": [{ "type": "text", "text": text }]
            }]
        }
    })
}

impl TicketStore for JiraClient {
    fn query(&self, fields: &[&str], filter: &Filter) -> StoreResult<Vec<Ticket>> {
        let jql = filter.to_string();
        debug!(%jql, "searching tickets");
        let resp = self.send(
            self.http
                .get(self.url("search"))
                .query(&[("fields", fields.join(",")), ("jql", jql)]),
        )?;
        let body: Value = resp
            .json()
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        if tracing::enabled!(tracing::Level::DEBUG) {
            let pretty = serde_json::to_string_pretty(&body).unwrap_or_default();
            debug!(response = %pretty, "search response");
        }
        let parsed: SearchResponse =
            serde_json::from_value(body).map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(parsed.issues)
    }

    fn update_fields(&self, key: &str, mutations: &Mutations) -> StoreResult<()> {
        self.send(self.http.put(self.url(&format!("issue/{key}"))).json(mutations))?;
        Ok(())
    }

    fn add_comment(&self, key: &str, text: &str) -> StoreResult<()> {
        self.send(
            self.http
                .post(self.url(&format!("issue/{key}/comment")))
                .json(&comment_document(text)),
        )?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
