//! # HTTP-backed Agent Store
//!
//! `GET <url>` returns a JSON object keyed by agent id; `POST <url>` stores
//! one record. Both requests carry optional HTTP basic auth.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::{json, Map, Value};
use shared_types::{Agent, AgentId, AgentKeys};
use tracing::{info, warn};

use crate::error::AgentStoreError;
use crate::ports::outbound::AgentStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpAgentStore {
    client: Client,
    url: String,
    auth: Option<BasicAuth>,
}

impl HttpAgentStore {
    pub fn new(url: impl Into<String>, auth: Option<BasicAuth>) -> Result<Self, AgentStoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(3))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
            auth,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Some(auth) => request.basic_auth(&auth.username, auth.password.as_ref()),
            None => request,
        }
    }

    async fn check(response: Response) -> Result<Response, AgentStoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), "agent store rejected request");
        Err(AgentStoreError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

/// Records keyed by agent id may omit their own `id`.
fn parse_records(records: Map<String, Value>) -> Result<Vec<Agent>, AgentStoreError> {
    records
        .into_iter()
        .map(|(key, mut value)| {
            if let Value::Object(fields) = &mut value {
                fields
                    .entry("id")
                    .or_insert_with(|| Value::String(key.clone()));
            }
            serde_json::from_value(value).map_err(|e| AgentStoreError::InvalidRecord {
                name: key,
                reason: e.to_string(),
            })
        })
        .collect()
}

#[async_trait]
impl AgentStore for HttpAgentStore {
    async fn load_all(&self) -> Result<Vec<Agent>, AgentStoreError> {
        let response = self.authorize(self.client.get(&self.url)).send().await?;
        let records: Map<String, Value> = Self::check(response).await?.json().await?;
        let agents = parse_records(records)?;
        info!(url = %self.url, agents = agents.len(), "loaded agent records");
        Ok(agents)
    }

    async fn load(&self, id: &AgentId) -> Result<Option<Agent>, AgentStoreError> {
        Ok(self.load_all().await?.into_iter().find(|a| &a.id == id))
    }

    async fn save_keys(&self, id: &AgentId, keys: &AgentKeys) -> Result<(), AgentStoreError> {
        let body = json!({ "id": id, "vsms_keys": keys });
        let response = self
            .authorize(self.client.post(&self.url))
            .json(&body)
            .send()
            .await?;
        Self::check(response).await?;
        info!(agent_id = %id, url = %self.url, "stored agent keys");
        Ok(())
    }
}
