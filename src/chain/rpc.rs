use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::tile::U256;

/// A JSON-RPC 2.0 endpoint.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Send one call and return its `result`.
    async fn request(&self, method: &str, params: Value) -> Result<Value>;

    /// Sleep between receipt polls.  The default returns immediately, which
    /// is what in-process transports want.
    async fn pause(&self, _ms: u32) {}
}

// ── Envelope ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: &'a Value,
}

impl<'a> RpcRequest<'a> {
    pub fn new(id: u64, method: &'a str, params: &'a Value) -> Self {
        Self { jsonrpc: "2.0", id, method, params }
    }
}

#[derive(Debug, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

impl From<RpcErrorObject> for Error {
    /// Nodes put revert payloads in `data`; keep them in the message.
    fn from(e: RpcErrorObject) -> Self {
        let message = match e.data {
            Some(Value::Null) | None => e.message,
            Some(Value::String(data)) => format!("{} ({data})", e.message),
            Some(data) => format!("{} ({data})", e.message),
        };
        Error::Rpc { code: e.code, message }
    }
}

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

impl RpcResponse {
    /// `result`, or the error object mapped to [`Error::Rpc`].  A missing
    /// `result` is JSON `null` (e.g. an unmined receipt).
    pub fn into_result(self) -> Result<Value> {
        if let Some(e) = self.error {
            debug!("rpc error {}: {}", e.code, e.message);
            return Err(e.into());
        }
        Ok(self.result.unwrap_or(Value::Null))
    }
}

// ── Value helpers ────────────────────────────────────────────────────────────

/// Read a hex quantity (`"0x1a"`) out of a JSON value.
pub fn quantity(v: &Value) -> Result<U256> {
    let s = v
        .as_str()
        .ok_or_else(|| Error::Decode(format!("expected hex quantity, got {v}")))?;
    U256::from_hex_str(s)
}

/// Read a string field out of a JSON object.
pub fn str_field<'a>(v: &'a Value, key: &str) -> Option<&'a str> {
    v.get(key).and_then(Value::as_str)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_serializes_as_jsonrpc2() {
        let params = json!(["0x1", false]);
        let v = serde_json::to_value(RpcRequest::new(7, "eth_getBlockByNumber", &params)).unwrap();
        assert_eq!(v, json!({"jsonrpc": "2.0", "id": 7, "method": "eth_getBlockByNumber", "params": ["0x1", false]}));
    }

    #[test]
    fn error_object_maps_to_rpc_error() {
        let r: RpcResponse =
            serde_json::from_value(json!({"jsonrpc": "2.0", "id": 1, "error": {"code": -32000, "message": "execution reverted"}}))
                .unwrap();
        match r.into_result() {
            Err(Error::Rpc { code, message }) => {
                assert_eq!(code, -32000);
                assert_eq!(message, "execution reverted");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn revert_data_is_kept_in_message() {
        let r: RpcResponse = serde_json::from_value(json!({
            "jsonrpc": "2.0", "id": 1,
            "error": {"code": 3, "message": "execution reverted", "data": "0x08c379a0"}
        }))
        .unwrap();
        assert_eq!(r.into_result().unwrap_err().to_string(), "rpc error 3: execution reverted (0x08c379a0)");
    }

    #[test]
    fn missing_result_is_null() {
        let r: RpcResponse = serde_json::from_value(json!({"jsonrpc": "2.0", "id": 1})).unwrap();
        assert_eq!(r.into_result().unwrap(), Value::Null);
    }

    #[test]
    fn quantity_parses_hex() {
        assert_eq!(quantity(&json!("0x3b9aca00")).unwrap(), U256::from_u64(1_000_000_000));
        assert!(quantity(&json!(12)).is_err());
    }
}
