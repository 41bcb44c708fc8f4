//! Everything that talks to the ledger.
//!
//! [`ChainGateway`] is the seam the application drives.  [`CityContract`]
//! implements it over a JSON-RPC [`Transport`] and an EIP-1193 [`Wallet`];
//! [`MemoryGateway`] implements it over a local tile map for the CLI and
//! tests.

pub mod abi;
pub mod contract;
pub mod memory;
pub mod rpc;
pub mod wallet;

pub use abi::{Abi, AbiFunction};
pub use contract::CityContract;
pub use memory::{ChunkSnapshot, MemoryGateway, Submission};
pub use rpc::Transport;
pub use wallet::Wallet;

use crate::error::Result;
use crate::tile::{TileInfo, U256};

/// A submitted, not yet confirmed transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingTx {
    pub hash: String,
}

/// Outcome of a mined transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub hash: String,
    pub block_number: Option<u64>,
}

/// Read and write access to the city contract.
///
/// Single-threaded: futures are not `Send`, and implementations
/// keep interior state behind `Cell`/`RefCell`.
#[allow(async_fn_in_trait)]
pub trait ChainGateway {
    /// `size × size` packed tiles starting at `(x0, y0)`, row-major.
    async fn get_tile_batch(&self, x0: i32, y0: i32, size: u32) -> Result<Vec<U256>>;

    async fn get_tile(&self, x: i32, y: i32) -> Result<TileInfo>;

    /// Switch the wallet to the configured network and unlock an account.
    /// Returns the signer address.
    async fn connect_wallet(&self) -> Result<String>;

    async fn submit_place(&self, x: i32, y: i32, kind: u8) -> Result<PendingTx>;

    async fn submit_upgrade(&self, x: i32, y: i32) -> Result<PendingTx>;

    /// Wait until `tx` is mined.  A revert or a timeout is an error; the
    /// transaction is never resubmitted.
    async fn wait_for_receipt(&self, tx: &PendingTx) -> Result<Receipt>;
}
