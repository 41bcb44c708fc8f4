use log::{info, warn};
use serde_json::{json, Value};

use crate::config::ChainConfig;
use crate::error::{Error, Result};

/// An EIP-1193 provider: one `request` entry point that signs on our behalf.
#[allow(async_fn_in_trait)]
pub trait Wallet {
    async fn request(&self, method: &str, params: Value) -> Result<Value>;
}

/// Make the wallet use the configured network, registering it when the
/// wallet does not know it yet.
pub async fn ensure_chain<W: Wallet>(wallet: &W, config: &ChainConfig) -> Result<()> {
    let switch = wallet
        .request("wallet_switchEthereumChain", json!([{ "chainId": config.chain_id }]))
        .await;
    if let Err(e) = switch {
        warn!("switching to {} failed ({e}), adding the network", config.chain_name);
        wallet.request("wallet_addEthereumChain", add_chain_params(config)).await?;
    }
    Ok(())
}

/// EIP-3085 parameters for `wallet_addEthereumChain`.
pub fn add_chain_params(config: &ChainConfig) -> Value {
    json!([{
        "chainId": config.chain_id,
        "chainName": config.chain_name,
        "nativeCurrency": {
            "name": config.native_currency.name,
            "symbol": config.native_currency.symbol,
            "decimals": config.native_currency.decimals,
        },
        "rpcUrls": [config.rpc_url],
        "blockExplorerUrls": [config.explorer_url],
    }])
}

/// Switch network, then unlock accounts.  The first account signs.
pub async fn connect<W: Wallet>(wallet: &W, config: &ChainConfig) -> Result<String> {
    ensure_chain(wallet, config).await?;
    let accounts = wallet.request("eth_requestAccounts", json!([])).await?;
    let address = accounts
        .as_array()
        .and_then(|a| a.first())
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Wallet("no accounts unlocked".into()))?
        .to_string();
    info!("wallet connected as {address}");
    Ok(address)
}
