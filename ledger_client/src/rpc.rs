use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use crate::error::{LedgerClientError, Result};
use crate::record::{LedgerRecord, RecordSource};

const RPC_TIMEOUT: Duration = Duration::from_secs(10);

/// JSON-RPC 1.0 client for the ledger node's record lookup API.
///
/// Lookups are single-shot: a transport failure or an RPC-level error aborts
/// the current operation without retry.
pub struct RpcClient {
    endpoint: String,
    user: String,
    password: String,
    http_client: reqwest::Client,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<serde_json::Value>,
}

impl RpcClient {
    pub fn new(endpoint: &str, user: &str, password: &str) -> Result<Arc<Self>> {
        let http_client = reqwest::Client::builder().timeout(RPC_TIMEOUT).build()?;
        Ok(Arc::new(Self {
            endpoint: endpoint.to_string(),
            user: user.to_string(),
            password: password.to_string(),
            http_client,
        }))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: serde_json::Value) -> Result<T> {
        let request = json!({
            "jsonrpc": "1.0",
            "method": method,
            "params": params,
            "id": "1",
        });

        let response = self
            .http_client
            .post(&self.endpoint)
            .basic_auth(&self.user, Some(&self.password))
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let body: RpcResponse<T> = response.json().await?;
        if let Some(error) = body.error {
            if !error.is_null() {
                return Err(LedgerClientError::Rpc(error.to_string()));
            }
        }
        body.result.ok_or_else(|| LedgerClientError::Rpc("empty result".to_string()))
    }
}

#[async_trait::async_trait]
impl RecordSource for RpcClient {
    async fn fetch_record(&self, id: &str) -> Result<LedgerRecord> {
        debug!(record_id = %id, "fetching ledger record");
        self.call("getrawtransaction", json!([id, 1])).await.map_err(|err| match err {
            // The node reports unknown identifiers through the RPC error
            // field; surface those as a lookup miss.
            LedgerClientError::Rpc(message) => LedgerClientError::RecordNotFound {
                id: id.to_string(),
                message,
            },
            other => other,
        })
    }
}
