use js_sys::{Function, Promise, Reflect, JSON};
use serde_json::{json, Value};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use crate::chain::Wallet;
use crate::error::{Error, Result};

/// The injected `window.ethereum` provider.
pub struct Eip1193Wallet {
    provider: JsValue,
}

impl Eip1193Wallet {
    /// `None` when the page has no injected provider.
    pub fn detect() -> Option<Self> {
        let window = web_sys::window()?;
        let provider = Reflect::get(&window, &JsValue::from_str("ethereum")).ok()?;
        if provider.is_undefined() || provider.is_null() {
            return None;
        }
        Some(Self { provider })
    }
}

fn js_error(e: JsValue) -> Error {
    let message = Reflect::get(&e, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .or_else(|| e.as_string())
        .unwrap_or_else(|| format!("{e:?}"));
    Error::Wallet(message)
}

/// Round-trip a JS value through JSON text into `serde_json`.
fn to_json(v: &JsValue) -> Result<Value> {
    if v.is_undefined() || v.is_null() {
        return Ok(Value::Null);
    }
    let text: String = JSON::stringify(v).map_err(js_error)?.into();
    Ok(serde_json::from_str(&text)?)
}

impl Wallet for Eip1193Wallet {
    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let args = JSON::parse(&json!({ "method": method, "params": params }).to_string()).map_err(js_error)?;
        let request: Function = Reflect::get(&self.provider, &JsValue::from_str("request"))
            .map_err(js_error)?
            .dyn_into()
            .map_err(|_| Error::Wallet("provider has no request()".into()))?;
        let promise: Promise = request
            .call1(&self.provider, &args)
            .map_err(js_error)?
            .dyn_into()
            .map_err(|_| Error::Wallet(format!("{method} did not return a promise")))?;
        let result = JsFuture::from(promise).await.map_err(js_error)?;
        to_json(&result)
    }
}
