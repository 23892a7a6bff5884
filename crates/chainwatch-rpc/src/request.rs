//! JSON-RPC 2.0 envelopes for the handful of `eth_*` calls the exporter makes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

const VERSION: &str = "2.0";

/// Outgoing call. Ids are numeric and allocated by the client.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: String,
    pub params: Vec<Value>,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            jsonrpc: VERSION,
            id,
            method: method.into(),
            params,
        }
    }
}

/// Error object returned by the node.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node returned {}: {}", self.code, self.message)
    }
}

/// Incoming reply. The id is kept as raw JSON since nodes echo it back in
/// whatever form they like.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn ok(id: u64, result: Value) -> Self {
        Self {
            id: Value::from(id),
            result: Some(result),
            error: None,
        }
    }

    /// The node's error wins over any result. An absent result is `null`,
    /// which is how nodes report unknown transactions.
    pub fn into_result(self) -> Result<Value, JsonRpcError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_wire_shape() {
        let req = JsonRpcRequest::new(7, "eth_getTransactionByHash", vec![json!("0xabc")]);
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"jsonrpc": "2.0", "id": 7, "method": "eth_getTransactionByHash", "params": ["0xabc"]})
        );
    }

    #[test]
    fn node_error_is_surfaced() {
        let raw = r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32005,"message":"query returned more than 10000 results"}}"#;
        let resp: JsonRpcResponse = serde_json::from_str(raw).unwrap();
        let err = resp.into_result().unwrap_err();
        assert_eq!(err.code, -32005);
        assert!(err.to_string().contains("more than 10000"));
    }

    #[test]
    fn missing_or_null_result_is_null() {
        for raw in [r#"{"jsonrpc":"2.0","id":"a","result":null}"#, r#"{"jsonrpc":"2.0","id":3}"#] {
            let resp: JsonRpcResponse = serde_json::from_str(raw).unwrap();
            assert_eq!(resp.into_result().unwrap(), Value::Null);
        }
    }
}
