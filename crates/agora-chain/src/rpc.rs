//! Direct read-only JSON-RPC access, bypassing the wallet's provider.
//!
//! Used only by the initialization liveness probe to distinguish "contract
//! not deployed" from "wallet provider is unhealthy".

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use agora_shared::Address;
use agora_wallet::ProviderError;

/// A read-only `eth_call` capability against a public endpoint.
#[async_trait]
pub trait ReadOnlyProbe: Send + Sync {
    async fn eth_call(&self, to: &Address, calldata: &[u8]) -> Result<Vec<u8>, ProviderError>;
}

/// JSON-RPC over HTTP against a known public node for the target chain.
pub struct RpcEndpoint {
    url: String,
    client: reqwest::Client,
}

impl RpcEndpoint {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ReadOnlyProbe for RpcEndpoint {
    async fn eth_call(&self, to: &Address, calldata: &[u8]) -> Result<Vec<u8>, ProviderError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_call",
            "params": [
                { "to": to.to_hex(), "data": format!("0x{}", hex::encode(calldata)) },
                "latest",
            ],
        });

        debug!(url = %self.url, to = %to, "fallback eth_call");

        let response: Value = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Rpc(format!("fallback endpoint unreachable: {e}")))?
            .json()
            .await
            .map_err(|e| ProviderError::Rpc(format!("fallback response not JSON: {e}")))?;

        if let Some(err) = response.get("error") {
            let code = err.get("code").and_then(Value::as_i64).unwrap_or(0);
            let message = err.get("message").and_then(Value::as_str).unwrap_or("");
            return Err(ProviderError::from_rpc(code, message));
        }

        let result = response
            .get("result")
            .and_then(Value::as_str)
            .ok_or_else(|| ProviderError::Rpc("fallback response missing result".to_string()))?;

        hex::decode(result.strip_prefix("0x").unwrap_or(result))
            .map_err(|e| ProviderError::Rpc(format!("fallback result not hex: {e}")))
    }
}
