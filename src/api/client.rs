//! HTTP implementation of the compliance gateway
//!
//! One `reqwest` client with explicit, bounded timeouts. Every endpoint is a
//! POST of a `{"request_data": …}` envelope; replies arrive wrapped in a
//! `{"reply": …}` envelope which is unwrapped here so the typed accessors
//! only deal with payload shapes.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::gateway::ComplianceGateway;
use super::models::{
    ControlDetail, ControlSummary, CreateControlPayload, CreateRulePayload,
    CreateStandardPayload, Registry, Standard,
};
use crate::error::{Error, Result};

const API_PATH: &str = "public_api/v1/compliance";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Authenticated client for the Cortex compliance endpoints.
#[derive(Clone)]
pub struct CortexClient {
    base_url: String,
    http_client: reqwest::Client,
    api_key: String,
    api_key_id: String,
}

impl CortexClient {
    pub fn new(fqdn: &str, api_key: String, api_key_id: String) -> anyhow::Result<Self> {
        let base_url = if fqdn.starts_with("https://") {
            format!("{}/{}", fqdn.trim_end_matches('/'), API_PATH)
        } else {
            format!("https://{}/{}", fqdn.trim_end_matches('/'), API_PATH)
        };

        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(2)
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!("cortex-compliance-cloner/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url,
            http_client,
            api_key,
            api_key_id,
        })
    }

    /// POST `request_data` to one endpoint and unwrap the `reply` envelope.
    async fn post<B>(&self, endpoint: &str, request_data: &B) -> Result<Value>
    where
        B: serde::Serialize + Sync + ?Sized,
    {
        let url = format!("{}/{}", self.base_url, endpoint);
        let correlation_id = uuid::Uuid::new_v4();
        debug!("POST {url} [correlation {correlation_id}]");

        let response = self
            .http_client
            .post(&url)
            .header("x-xdr-auth-id", &self.api_key_id)
            .header(reqwest::header::AUTHORIZATION, &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .header("x-correlation-id", correlation_id.to_string())
            .json(&json!({ "request_data": request_data }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("{endpoint} returned HTTP {status} [correlation {correlation_id}]");
            return Err(Error::from_status(status.as_u16(), body));
        }

        let body: Value = response.json().await?;
        debug!("{endpoint} OK [correlation {correlation_id}]");
        Ok(body.get("reply").cloned().unwrap_or(body))
    }

    fn decode<T: DeserializeOwned>(endpoint: &str, value: Value) -> Result<T> {
        serde_json::from_value(value).map_err(|e| Error::Validation {
            status: 200,
            body: format!("unexpected reply shape from {endpoint}: {e}"),
        })
    }

    /// Standards replies use either a `standards` or a `data` key.
    fn standards_from_reply(reply: Value) -> Result<Vec<Standard>> {
        let list = reply
            .get("standards")
            .filter(|v| !v.is_null())
            .or_else(|| reply.get("data"))
            .cloned()
            .unwrap_or_else(|| json!([]));
        Self::decode("get_standards", list)
    }
}

#[async_trait]
impl ComplianceGateway for CortexClient {
    async fn get_registry(&self) -> Result<Registry> {
        let reply = self
            .post("get_control_categories_and_subcategories", &json!({}))
            .await?;
        let data = reply.get("data").cloned().unwrap_or(reply);
        let categories: BTreeMap<String, Vec<String>> =
            Self::decode("get_control_categories_and_subcategories", data)?;
        Ok(Registry::new(categories))
    }

    async fn search_standards(&self, name: &str) -> Result<Vec<Standard>> {
        let reply = self
            .post(
                "get_standards",
                &json!({
                    "filters": [{"field": "name", "operator": "eq", "value": name}]
                }),
            )
            .await?;
        Self::standards_from_reply(reply)
    }

    async fn list_standards(&self, search_from: usize, search_to: usize) -> Result<Vec<Standard>> {
        let reply = self
            .post(
                "get_standards",
                &json!({"search_from": search_from, "search_to": search_to}),
            )
            .await?;
        Self::standards_from_reply(reply)
    }

    async fn get_standard(&self, id: &str) -> Result<Option<Standard>> {
        let reply = self
            .post(
                "get_standards",
                &json!({
                    "filters": [{"field": "id", "operator": "eq", "value": id}]
                }),
            )
            .await?;
        Ok(Self::standards_from_reply(reply)?.into_iter().next())
    }

    async fn create_standard(&self, payload: &CreateStandardPayload) -> Result<Option<String>> {
        let reply = self
            .post("add_standard", payload)
            .await?;
        let id = reply
            .get("standard_id")
            .or_else(|| reply.get("id"))
            .and_then(Value::as_str)
            .map(str::to_owned);
        Ok(id)
    }

    async fn edit_standard(&self, id: &str, controls_ids: &[String]) -> Result<()> {
        self.post(
            "edit_standard",
            &json!({"id": id, "controls_ids": controls_ids}),
        )
        .await
        .map(|_| ())
    }

    async fn get_control(&self, id: &str) -> Result<Option<ControlDetail>> {
        let reply = self.post("get_control", &json!({"id": id})).await?;
        // The reply nests a single control inside a one-element array.
        let controls = reply
            .get("control")
            .cloned()
            .unwrap_or_else(|| json!([]));
        let controls: Vec<ControlDetail> = Self::decode("get_control", controls)?;
        Ok(controls.into_iter().next())
    }

    async fn find_controls_by_name(&self, name: &str) -> Result<Vec<ControlSummary>> {
        let reply = self
            .post(
                "get_controls",
                &json!({
                    "filters": [{"field": "name", "operator": "eq", "value": name}]
                }),
            )
            .await?;
        let controls = reply
            .get("controls")
            .cloned()
            .unwrap_or_else(|| json!([]));
        Self::decode("get_controls", controls)
    }

    async fn create_control(&self, payload: &CreateControlPayload) -> Result<Option<String>> {
        let reply = self
            .post("add_control", payload)
            .await?;
        let id = reply
            .get("control_id")
            .and_then(Value::as_str)
            .map(str::to_owned);
        Ok(id)
    }

    async fn add_rules_to_control(
        &self,
        control_id: &str,
        rules: &[CreateRulePayload],
    ) -> Result<()> {
        self.post(
            "add_rules_to_control",
            &json!({"control_id": control_id, "rules": rules}),
        )
        .await
        .map(|_| ())
    }
}
