// ── Packed tile layout ───────────────────────────────────────────────────────
//
// One ledger slot per grid cell, low bits first:
//
//   [  0,160)  founder address
//   [160,168)  kind
//   [168,176)  level
//   [176,208)  updatedAt (unix seconds, u32)
//   ── V2 only ──
//   [208]      isAnchor
//   [209,217)  anchorX
//   [217,225)  anchorY
//   [225,227)  part (quadrant of the 2×2 footprint)
//
// A slot of exactly zero means nothing has been placed there.  Every field is
// masked to its own width so stray high bits are ignored.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use super::kind::TileKind;
use super::u256::U256;
use crate::error::{Error, Result};

pub const FOUNDER_BITS: u32 = 160;
pub const KIND_SHIFT: u32 = 160;
pub const LEVEL_SHIFT: u32 = 168;
pub const UPDATED_AT_SHIFT: u32 = 176;
pub const ANCHOR_FLAG_SHIFT: u32 = 208;
pub const ANCHOR_X_SHIFT: u32 = 209;
pub const ANCHOR_Y_SHIFT: u32 = 217;
pub const PART_SHIFT: u32 = 225;

/// Which packing the contract uses.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVersion {
    /// founder/kind/level/updatedAt only.
    V1,
    /// V1 plus anchor flag, anchor coordinates and footprint part.
    #[default]
    V2,
}

/// One decoded grid cell.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TileInfo {
    pub exists: bool,
    /// `0x` + 40 lowercase hex digits; `None` for an empty cell.
    pub founder: Option<String>,
    pub kind: u8,
    pub level: u8,
    pub updated_at: u32,
    pub is_anchor: bool,
    pub anchor_x: u8,
    pub anchor_y: u8,
    pub part: u8,
}

impl TileInfo {
    /// The "nothing placed here" sentinel.
    pub const EMPTY: TileInfo = TileInfo {
        exists: false,
        founder: None,
        kind: 0,
        level: 0,
        updated_at: 0,
        is_anchor: false,
        anchor_x: 0,
        anchor_y: 0,
        part: 0,
    };

    pub fn tile_kind(&self) -> TileKind {
        TileKind::from_u8(self.kind)
    }

    /// Multi-line text shown in the selection panel.
    pub fn detail_text(&self, schema: SchemaVersion) -> String {
        if !self.exists {
            return "empty".to_string();
        }
        let mut s = format!(
            "kind={}\nlevel={}\nfounder={}\nupdatedAt={}",
            self.kind,
            self.level,
            self.founder.as_deref().unwrap_or("0x0"),
            self.updated_at,
        );
        if schema == SchemaVersion::V2 {
            let _ = write!(
                s,
                "\nisAnchor={}\nanchor=({},{})\npart={}",
                self.is_anchor, self.anchor_x, self.anchor_y, self.part
            );
        }
        s
    }

    /// Inverse of [`decode`]: pack the record back into a ledger slot.
    ///
    /// Fails only when the founder string is not a valid hex address.
    pub fn pack(&self, schema: SchemaVersion) -> Result<U256> {
        if !self.exists {
            return Ok(U256::ZERO);
        }
        let founder = match self.founder.as_deref() {
            Some(f) => U256::from_hex_str(f)?,
            None => U256::ZERO,
        };
        if founder.bit_len() > FOUNDER_BITS {
            return Err(Error::InvalidArgument(format!("founder wider than 160 bits: {founder:#x}")));
        }
        let mut v = founder
            .with_bits(KIND_SHIFT, 8, self.kind as u64)
            .with_bits(LEVEL_SHIFT, 8, self.level as u64)
            .with_bits(UPDATED_AT_SHIFT, 32, self.updated_at as u64);
        if schema == SchemaVersion::V2 {
            v = v
                .with_bits(ANCHOR_FLAG_SHIFT, 1, self.is_anchor as u64)
                .with_bits(ANCHOR_X_SHIFT, 8, self.anchor_x as u64)
                .with_bits(ANCHOR_Y_SHIFT, 8, self.anchor_y as u64)
                .with_bits(PART_SHIFT, 2, self.part as u64);
        }
        Ok(v)
    }
}

/// Format the low 160 bits of `v` as a checksum-free lowercase address.
pub fn format_address(v: &U256) -> String {
    format!("0x{:040x}", v.low_bits(FOUNDER_BITS))
}

/// Unpack one ledger slot.  Pure and total: every input decodes.
pub fn decode(u: &U256, schema: SchemaVersion) -> TileInfo {
    if u.is_zero() {
        return TileInfo::EMPTY;
    }

    let mut info = TileInfo {
        exists: true,
        founder: Some(format_address(u)),
        kind: u.bits(KIND_SHIFT, 8) as u8,
        level: u.bits(LEVEL_SHIFT, 8) as u8,
        updated_at: u.bits(UPDATED_AT_SHIFT, 32) as u32,
        ..TileInfo::EMPTY
    };

    if schema == SchemaVersion::V2 {
        info.is_anchor = u.bit(ANCHOR_FLAG_SHIFT);
        info.anchor_x = u.bits(ANCHOR_X_SHIFT, 8) as u8;
        info.anchor_y = u.bits(ANCHOR_Y_SHIFT, 8) as u8;
        info.part = u.bits(PART_SHIFT, 2) as u8;
    }
    info
}

// ── Tests ──────────────────────────────────────────────────────────────────────
