//! In-process ledger: a sparse tile map that answers the same calls as the
//! deployed contract.  Backs the native renderer (loaded from a snapshot
//! file) and the application tests.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::{ChainGateway, PendingTx, Receipt};
use crate::error::{Error, Result};
use crate::tile::{decode, SchemaVersion, TileInfo, TileKind, U256};
use crate::view::ViewRect;

// ── ChunkSnapshot ────────────────────────────────────────────────────────────

/// A saved `getChunk` answer.  Tiles are `0x` hex or decimal strings, since
/// JSON numbers cannot hold 256 bits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSnapshot {
    pub x0: i32,
    pub y0: i32,
    pub size: u32,
    pub tiles: Vec<String>,
}

impl ChunkSnapshot {
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn rect(&self) -> ViewRect {
        ViewRect::new(self.x0, self.y0, self.size)
    }

    pub fn parse_tiles(&self) -> Result<Vec<U256>> {
        let tiles: Vec<U256> = self.tiles.iter().map(|t| t.parse::<U256>()).collect::<Result<_>>()?;
        let expected = self.rect().tile_count();
        if tiles.len() != expected {
            return Err(Error::ChunkLength { expected, actual: tiles.len() });
        }
        Ok(tiles)
    }
}

// ── MemoryGateway ────────────────────────────────────────────────────────────

/// A write accepted by [`MemoryGateway`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Submission {
    Place { x: i32, y: i32, kind: u8 },
    Upgrade { x: i32, y: i32 },
}

pub struct MemoryGateway {
    schema: SchemaVersion,
    tiles: RefCell<HashMap<IVec2, U256>>,
    account: String,
    connected: Cell<bool>,
    fail_reads: Cell<bool>,
    wait_error: RefCell<Option<String>>,
    batch_reads: Cell<usize>,
    tile_reads: Cell<usize>,
    submissions: RefCell<Vec<Submission>>,
    clock: Cell<u32>,
}

impl MemoryGateway {
    pub fn new(schema: SchemaVersion) -> Self {
        Self {
            schema,
            tiles: RefCell::new(HashMap::new()),
            account: format!("0x{}", "c1".repeat(20)),
            connected: Cell::new(false),
            fail_reads: Cell::new(false),
            wait_error: RefCell::new(None),
            batch_reads: Cell::new(0),
            tile_reads: Cell::new(0),
            submissions: RefCell::new(Vec::new()),
            clock: Cell::new(1),
        }
    }

    /// Seed the map with a snapshot's tiles.
    pub fn from_snapshot(snapshot: &ChunkSnapshot, schema: SchemaVersion) -> Result<Self> {
        let gw = Self::new(schema);
        let rect = ViewRect::checked(snapshot.x0, snapshot.y0, snapshot.size)?;
        for (i, v) in snapshot.parse_tiles()?.into_iter().enumerate() {
            let (dx, dy) = (i as u32 % rect.size, i as u32 / rect.size);
            if let Some(p) = rect.cell(dx, dy) {
                gw.set(p, v);
            }
        }
        Ok(gw)
    }

    pub fn set(&self, p: IVec2, packed: U256) {
        let mut tiles = self.tiles.borrow_mut();
        if packed.is_zero() {
            tiles.remove(&p);
        } else {
            tiles.insert(p, packed);
        }
    }

    pub fn get(&self, p: IVec2) -> U256 {
        self.tiles.borrow().get(&p).copied().unwrap_or(U256::ZERO)
    }

    /// Make every read fail with a transport error.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.set(fail);
    }

    /// Make the next receipt waits fail with `msg`, or succeed with `None`.
    pub fn set_wait_error(&self, msg: Option<&str>) {
        *self.wait_error.borrow_mut() = msg.map(str::to_string);
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn batch_reads(&self) -> usize {
        self.batch_reads.get()
    }

    pub fn tile_reads(&self) -> usize {
        self.tile_reads.get()
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions.borrow().clone()
    }

    fn check_reads(&self) -> Result<()> {
        if self.fail_reads.get() {
            return Err(Error::Transport("node unreachable".into()));
        }
        Ok(())
    }

    fn record(&self, s: Submission) -> PendingTx {
        let mut subs = self.submissions.borrow_mut();
        subs.push(s);
        PendingTx { hash: format!("0x{:064x}", subs.len()) }
    }

    fn tick(&self) -> u32 {
        let t = self.clock.get();
        self.clock.set(t + 1);
        t
    }

    /// Cells covered by the structure at `p`, anchor first.
    fn footprint_cells(&self, p: IVec2) -> Vec<(IVec2, TileInfo)> {
        let info = decode(&self.get(p), self.schema);
        if !info.tile_kind().is_building() || self.schema == SchemaVersion::V1 {
            return vec![(p, info)];
        }
        let (bx, by) = ((info.part & 1) as i32, (info.part >> 1) as i32);
        (0..4)
            .filter_map(|part| {
                let x = p.x.checked_sub(bx)?.checked_add(part & 1)?;
                let y = p.y.checked_sub(by)?.checked_add(part >> 1)?;
                Some(IVec2::new(x, y))
            })
            .map(|c| (c, decode(&self.get(c), self.schema)))
            .filter(|(_, i)| i.exists)
            .collect()
    }
}

impl ChainGateway for MemoryGateway {
    async fn get_tile_batch(&self, x0: i32, y0: i32, size: u32) -> Result<Vec<U256>> {
        self.check_reads()?;
        let rect = ViewRect::checked(x0, y0, size)?;
        self.batch_reads.set(self.batch_reads.get() + 1);
        Ok((0..size)
            .flat_map(|dy| (0..size).filter_map(move |dx| rect.cell(dx, dy)))
            .map(|p| self.get(p))
            .collect())
    }

    async fn get_tile(&self, x: i32, y: i32) -> Result<TileInfo> {
        self.tile_reads.set(self.tile_reads.get() + 1);
        self.check_reads()?;
        Ok(decode(&self.get(IVec2::new(x, y)), self.schema))
    }

    async fn connect_wallet(&self) -> Result<String> {
        self.connected.set(true);
        Ok(self.account.clone())
    }

    /// Occupies the kind's footprint at level 1, anchored at `(x, y)`.
    async fn submit_place(&self, x: i32, y: i32, kind: u8) -> Result<PendingTx> {
        if !self.connected.get() {
            return Err(Error::WalletNotConnected);
        }
        let k = TileKind::from_u8(kind);
        let cells = if k.is_building() { 4 } else { 1 };
        let rect = ViewRect::checked(x, y, if k.is_building() { 2 } else { 1 })?;
        for part in 0..cells {
            let p = IVec2::new(x + (part & 1), y + (part >> 1));
            if decode(&self.get(p), self.schema).exists {
                return Err(Error::Rpc { code: 3, message: "execution reverted: occupied".into() });
            }
        }
        let now = self.tick();
        for part in 0..cells {
            let info = TileInfo {
                exists: true,
                founder: Some(self.account.clone()),
                kind,
                level: 1,
                updated_at: now,
                is_anchor: part == 0,
                anchor_x: x as u8,
                anchor_y: y as u8,
                part: part as u8,
            };
            self.set(rect.origin + IVec2::new(part & 1, part >> 1), info.pack(self.schema)?);
        }
        Ok(self.record(Submission::Place { x, y, kind }))
    }

    /// Raises every cell of the structure at `(x, y)` one level.
    async fn submit_upgrade(&self, x: i32, y: i32) -> Result<PendingTx> {
        if !self.connected.get() {
            return Err(Error::WalletNotConnected);
        }
        let cells = self.footprint_cells(IVec2::new(x, y));
        if !cells.iter().any(|(_, i)| i.exists) {
            return Err(Error::Rpc { code: 3, message: "execution reverted: empty".into() });
        }
        let now = self.tick();
        for (p, mut info) in cells {
            info.level = info.level.saturating_add(1);
            info.updated_at = now;
            self.set(p, info.pack(self.schema)?);
        }
        Ok(self.record(Submission::Upgrade { x, y }))
    }

    async fn wait_for_receipt(&self, tx: &PendingTx) -> Result<Receipt> {
        match self.wait_error.borrow().as_ref() {
            Some(msg) => Err(Error::Confirmation(msg.clone())),
            None => Ok(Receipt { hash: tx.hash.clone(), block_number: Some(self.clock.get() as u64) }),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
