use std::cell::Cell;

use gloo_net::http::Request;
use js_sys::Promise;
use serde_json::Value;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;

use crate::chain::rpc::{RpcRequest, RpcResponse, Transport};
use crate::error::{Error, Result};

/// JSON-RPC over `fetch`.
pub struct HttpTransport {
    url: String,
    next_id: Cell<u64>,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), next_id: Cell::new(1) }
    }
}

impl Transport for HttpTransport {
    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        log::debug!("rpc #{id} {method}");

        let resp = Request::post(&self.url)
            .json(&RpcRequest::new(id, method, &params))
            .map_err(|e| Error::Transport(e.to_string()))?
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;
        if !resp.ok() {
            return Err(Error::Transport(format!("{} answered HTTP {}", self.url, resp.status())));
        }
        let body: RpcResponse = resp.json().await.map_err(|e| Error::Transport(e.to_string()))?;
        body.into_result()
    }

    async fn pause(&self, ms: u32) {
        sleep(ms).await;
    }
}

/// Resolve after `ms` milliseconds on the browser timer queue.
pub async fn sleep(ms: u32) {
    let promise = Promise::new(&mut |resolve, _reject| {
        let scheduled = web_sys::window().map(|w| {
            w.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms.min(i32::MAX as u32) as i32)
        });
        if !matches!(scheduled, Some(Ok(_))) {
            let _ = resolve.call0(&JsValue::NULL);
        }
    });
    let _ = JsFuture::from(promise).await;
}
