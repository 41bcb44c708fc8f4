use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::renderer::BuildingLayout;
use crate::tile::SchemaVersion;

// ── NativeCurrency ───────────────────────────────────────────────────────────

/// Currency metadata handed to the wallet when the network must be added.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl Default for NativeCurrency {
    fn default() -> Self {
        Self { name: "CPH".into(), symbol: "CPH".into(), decimals: 18 }
    }
}

// ── ChainConfig ──────────────────────────────────────────────────────────────

/// Network, contract and transaction parameters.
///
/// Every field has a default matching the deployed Cypherium contract, so a
/// partial JSON document only needs to name what it overrides.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChainConfig {
    pub rpc_url: String,
    /// `0x`-prefixed hex chain id, as EIP-3085 expects it.
    pub chain_id: String,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub explorer_url: String,
    pub contract: String,
    /// Used when `PLACE_FEE()` cannot be read.  Decimal wei.
    pub place_fee_wei: String,
    /// Used when `UPGRADE_FEE()` cannot be read.  Decimal wei.
    pub upgrade_fee_wei: String,
    /// Used when the wallet cannot quote `eth_gasPrice`.
    pub gas_price_gwei: u64,
    pub place_gas_limit: u64,
    pub upgrade_gas_limit: u64,
    pub receipt_poll_attempts: u32,
    pub receipt_poll_interval_ms: u32,
    pub schema: SchemaVersion,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://pubnodes.cypherium.io/rpc".into(),
            chain_id: "0x3f26".into(),
            chain_name: "Cypherium".into(),
            native_currency: NativeCurrency::default(),
            explorer_url: "https://cypherium.tryethernal.com".into(),
            contract: "0x413E4D388A3a8d9fA86F52294b524941f8657e22".into(),
            place_fee_wei: "1000000000000000".into(),
            upgrade_fee_wei: "500000000000000".into(),
            gas_price_gwei: 1,
            place_gas_limit: 300_000,
            upgrade_gas_limit: 300_000,
            receipt_poll_attempts: 60,
            receipt_poll_interval_ms: 2_000,
            schema: SchemaVersion::V2,
        }
    }
}

impl ChainConfig {
    /// Chain id as a number, if `chain_id` is well-formed hex.
    pub fn chain_id_number(&self) -> Option<u64> {
        u64::from_str_radix(self.chain_id.strip_prefix("0x")?, 16).ok()
    }
}

// ── ViewConfig ───────────────────────────────────────────────────────────────

/// Canvas and initial view.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewConfig {
    /// Backing-store edge length of the square canvas, in pixels.
    pub canvas_px: u32,
    pub x0: i32,
    pub y0: i32,
    pub size: u32,
    pub layout: BuildingLayout,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self { canvas_px: 512, x0: 0, y0: 0, size: 16, layout: BuildingLayout::Anchor }
    }
}

// ── Config ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub chain: ChainConfig,
    pub view: ViewConfig,
}

impl Config {
    /// Parse a config document.  A `chainId` that is not a hex quantity is
    /// refused here, since the wallet could never switch to it.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(s)?;
        if config.chain.chain_id_number().is_none() {
            return Err(Error::InvalidArgument(format!("chainId {:?} is not a hex quantity", config.chain.chain_id)));
        }
        Ok(config)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_deployment() {
        let c = ChainConfig::default();
        assert_eq!(c.chain_id_number(), Some(16166));
        assert_eq!(c.place_gas_limit, 300_000);
        assert_eq!(c.native_currency.decimals, 18);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let c = Config::from_json_str(r#"{"chain": {"schema": "v1"}, "view": {"size": 8}}"#).unwrap();
        assert_eq!(c.chain.schema, SchemaVersion::V1);
        assert_eq!(c.chain.rpc_url, ChainConfig::default().rpc_url);
        assert_eq!(c.view.size, 8);
        assert_eq!(c.view.canvas_px, 512);
    }

    #[test]
    fn empty_document_is_default() {
        assert_eq!(Config::from_json_str("{}").unwrap(), Config::default());
    }

    #[test]
    fn chain_id_must_be_hex() {
        let c = Config::from_json_str(r#"{"chain": {"chainId": "0x1"}}"#).unwrap();
        assert_eq!(c.chain.chain_id_number(), Some(1));
        for bad in [r#""16166""#, r#""0xzz""#, r#""""#] {
            let doc = format!(r#"{{"chain": {{"chainId": {bad}}}}}"#);
            assert!(matches!(Config::from_json_str(&doc), Err(Error::InvalidArgument(_))), "{bad}");
        }
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(Config::from_json_str("{").is_err());
    }
}
