use std::cell::RefCell;

use log::{debug, info, warn};
use serde_json::json;

use super::abi::{from_hex, to_hex, Abi};
use super::rpc::{quantity, str_field, Transport};
use super::wallet::{self, Wallet};
use super::{ChainGateway, PendingTx, Receipt};
use crate::config::ChainConfig;
use crate::error::{Error, Result};
use crate::tile::{format_address, SchemaVersion, TileInfo, U256};

const GWEI: u64 = 1_000_000_000;

/// The city contract reached through a read node and a signing wallet.
pub struct CityContract<T, W> {
    transport: T,
    wallet: Option<W>,
    abi: Abi,
    config: ChainConfig,
    signer: RefCell<Option<String>>,
}

impl<T: Transport, W: Wallet> CityContract<T, W> {
    /// `wallet` is `None` when no provider is injected; reads still work.
    pub fn new(transport: T, wallet: Option<W>, abi: Abi, config: ChainConfig) -> Self {
        Self { transport, wallet, abi, config, signer: RefCell::new(None) }
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn signer(&self) -> Option<String> {
        self.signer.borrow().clone()
    }

    /// `eth_call` at `latest`; returns the decoded output words.
    async fn call(&self, function: &str, args: &[i64]) -> Result<Vec<U256>> {
        let f = self.abi.function(function)?;
        let data = f.encode_call(args)?;
        debug!("eth_call {}{args:?}", f.name);
        let params = json!([{ "to": self.config.contract, "data": to_hex(&data) }, "latest"]);
        let result = self.transport.request("eth_call", params).await?;
        let bytes = from_hex(
            result
                .as_str()
                .ok_or_else(|| Error::Decode(format!("eth_call returned {result}")))?,
        )?;
        f.decode_output(&bytes)
    }

    /// On-chain fee getter, or the configured default when it cannot be read.
    async fn fee(&self, getter: &str, default_wei: &str) -> Result<U256> {
        match self.call(getter, &[]).await {
            Ok(words) if !words.is_empty() => Ok(words[0]),
            Ok(_) => {
                warn!("{getter}() returned nothing, using default fee");
                U256::from_dec_str(default_wei)
            }
            Err(e) => {
                warn!("{getter}() failed ({e}), using default fee");
                U256::from_dec_str(default_wei)
            }
        }
    }

    /// The wallet's legacy gas price, falling back to the configured gwei.
    async fn gas_price(&self, wallet: &W) -> U256 {
        let quoted = match wallet.request("eth_gasPrice", json!([])).await {
            Ok(v) => quantity(&v),
            Err(e) => Err(e),
        };
        quoted.unwrap_or_else(|e| {
            warn!("eth_gasPrice failed ({e}), using {} gwei", self.config.gas_price_gwei);
            U256::from_u64(self.config.gas_price_gwei.saturating_mul(GWEI))
        })
    }

    /// Sign and broadcast a contract call carrying `fee` wei.
    async fn send(&self, function: &str, args: &[i64], fee: U256, gas_limit: u64) -> Result<PendingTx> {
        let wallet = self.wallet.as_ref().ok_or(Error::WalletUnavailable)?;
        let from = self.signer().ok_or(Error::WalletNotConnected)?;
        let f = self.abi.function(function)?;
        if !fee.is_zero() && !f.is_payable() {
            return Err(Error::Abi(format!("{function} is not payable, cannot attach {fee} wei")));
        }
        let data = f.encode_call(args)?;
        let gas_price = self.gas_price(wallet).await;

        let tx = json!({
            "from": from,
            "to": self.config.contract,
            "data": to_hex(&data),
            "value": fee.to_quantity(),
            "gas": U256::from_u64(gas_limit).to_quantity(),
            "gasPrice": gas_price.to_quantity(),
        });
        let hash = wallet.request("eth_sendTransaction", json!([tx])).await?;
        let hash = hash
            .as_str()
            .ok_or_else(|| Error::Wallet(format!("eth_sendTransaction returned {hash}")))?
            .to_string();
        info!("{function}{args:?} sent: {hash}");
        Ok(PendingTx { hash })
    }

    fn tile_from_words(&self, w: &[U256]) -> Result<TileInfo> {
        if w.len() < 5 {
            return Err(Error::Decode(format!("getTile returned {} words", w.len())));
        }
        if w[0].is_zero() {
            return Ok(TileInfo::EMPTY);
        }
        let mut info = TileInfo {
            exists: true,
            founder: Some(format_address(&w[1])),
            kind: w[2].bits(0, 8) as u8,
            level: w[3].bits(0, 8) as u8,
            updated_at: w[4].bits(0, 32) as u32,
            ..TileInfo::EMPTY
        };
        if self.config.schema == SchemaVersion::V2 && w.len() >= 9 {
            info.is_anchor = !w[5].is_zero();
            info.anchor_x = w[6].bits(0, 8) as u8;
            info.anchor_y = w[7].bits(0, 8) as u8;
            info.part = w[8].bits(0, 2) as u8;
        }
        Ok(info)
    }
}

impl<T: Transport, W: Wallet> ChainGateway for CityContract<T, W> {
    async fn get_tile_batch(&self, x0: i32, y0: i32, size: u32) -> Result<Vec<U256>> {
        let tiles = self.call("getChunk", &[x0 as i64, y0 as i64, size as i64]).await?;
        let expected = (size * size) as usize;
        if tiles.len() != expected {
            return Err(Error::ChunkLength { expected, actual: tiles.len() });
        }
        Ok(tiles)
    }

    async fn get_tile(&self, x: i32, y: i32) -> Result<TileInfo> {
        let words = self.call("getTile", &[x as i64, y as i64]).await?;
        self.tile_from_words(&words)
    }

    async fn connect_wallet(&self) -> Result<String> {
        let wallet = self.wallet.as_ref().ok_or(Error::WalletUnavailable)?;
        let address = wallet::connect(wallet, &self.config).await?;
        *self.signer.borrow_mut() = Some(address.clone());
        Ok(address)
    }

    async fn submit_place(&self, x: i32, y: i32, kind: u8) -> Result<PendingTx> {
        if self.signer().is_none() {
            return Err(Error::WalletNotConnected);
        }
        let fee = self.fee("PLACE_FEE", &self.config.place_fee_wei).await?;
        self.send("place", &[x as i64, y as i64, kind as i64], fee, self.config.place_gas_limit)
            .await
    }

    async fn submit_upgrade(&self, x: i32, y: i32) -> Result<PendingTx> {
        if self.signer().is_none() {
            return Err(Error::WalletNotConnected);
        }
        let fee = self.fee("UPGRADE_FEE", &self.config.upgrade_fee_wei).await?;
        self.send("upgrade", &[x as i64, y as i64], fee, self.config.upgrade_gas_limit)
            .await
    }

    async fn wait_for_receipt(&self, tx: &PendingTx) -> Result<Receipt> {
        let attempts = self.config.receipt_poll_attempts;
        for attempt in 0..attempts {
            let r = self
                .transport
                .request("eth_getTransactionReceipt", json!([tx.hash]))
                .await?;
            if r.is_null() {
                debug!("receipt for {} not ready (attempt {})", tx.hash, attempt + 1);
                self.transport.pause(self.config.receipt_poll_interval_ms).await;
                continue;
            }
            let status = str_field(&r, "status").map(U256::from_hex_str).transpose()?;
            if status.is_some_and(|s| s.is_zero()) {
                return Err(Error::Confirmation(format!("{} reverted", tx.hash)));
            }
            let block_number = r
                .get("blockNumber")
                .filter(|v| !v.is_null())
                .map(quantity)
                .transpose()?
                .and_then(|n| n.to_u64());
            info!("{} confirmed in block {block_number:?}", tx.hash);
            return Ok(Receipt { hash: tx.hash.clone(), block_number });
        }
        Err(Error::Confirmation(format!("no receipt for {} after {attempts} polls", tx.hash)))
    }
}

