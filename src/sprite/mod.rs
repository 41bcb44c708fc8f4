//! Procedural pixel-art sprites for tile kinds, memoized per key.
//!
//! Art is built from declarative recipes (see [`art`]) into a [`GlyphGrid`],
//! then blitted through the shared palette into an `RgbaImage`.  The cache
//! is the only state; clearing it and regenerating yields identical pixels.

pub mod art;
pub mod grid;
pub mod palette;

use std::collections::HashMap;

use image::RgbaImage;
use log::debug;

pub use art::{BUILDING_SIZE, TILE_SIZE};
pub use grid::{GlyphGrid, Primitive};

use crate::tile::{clamp_level, TileKind};

// ── Quadrant ─────────────────────────────────────────────────────────────────

/// One 16×16 quarter of a 32×32 building, numbered like the on-chain `part`
/// field.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Quadrant {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Quadrant {
    /// Maps the 2-bit `part` field; only the low two bits are used.
    pub fn from_part(part: u8) -> Self {
        match part & 0b11 {
            0 => Quadrant::TopLeft,
            1 => Quadrant::TopRight,
            2 => Quadrant::BottomLeft,
            _ => Quadrant::BottomRight,
        }
    }

    /// Top-left pixel of this quadrant inside the 32×32 raster.
    pub fn origin(self) -> (i32, i32) {
        let h = TILE_SIZE as i32;
        match self {
            Quadrant::TopLeft => (0, 0),
            Quadrant::TopRight => (h, 0),
            Quadrant::BottomLeft => (0, h),
            Quadrant::BottomRight => (h, h),
        }
    }
}

// ── SpriteKey ────────────────────────────────────────────────────────────────

/// Cache key.  Levels are clamped before keying, so levels above the top
/// tier share one entry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SpriteKey {
    /// 16×16 single-cell art.
    Tile { kind: TileKind, level: u8 },
    /// 32×32 two-by-two art.
    Building { kind: TileKind, level: u8 },
    /// 16×16 crop of a building.
    Quadrant { kind: TileKind, level: u8, quadrant: Quadrant },
}

impl SpriteKey {
    pub fn tile(kind: TileKind, level: u8) -> Self {
        SpriteKey::Tile { kind, level: clamp_level(level) }
    }

    pub fn building(kind: TileKind, level: u8) -> Self {
        SpriteKey::Building { kind, level: clamp_level(level) }
    }

    pub fn quadrant(kind: TileKind, level: u8, quadrant: Quadrant) -> Self {
        SpriteKey::Quadrant { kind, level: clamp_level(level), quadrant }
    }

    /// The glyph grid for this key, without touching any cache.
    pub fn glyphs(&self) -> GlyphGrid {
        match *self {
            SpriteKey::Tile { kind, level } => art::tile_recipe(kind).render(level),
            SpriteKey::Building { kind, level } => art::building_recipe(kind).render(level),
            SpriteKey::Quadrant { kind, level, quadrant } => {
                let (x, y) = quadrant.origin();
                art::building_recipe(kind).render(level).crop(x, y, TILE_SIZE)
            }
        }
    }
}

/// Names of the detail overlays switched on for `kind` at `level`.
pub fn active_overlays(kind: TileKind, level: u8) -> Vec<&'static str> {
    let recipe = if kind.is_building() { art::building_recipe(kind) } else { art::tile_recipe(kind) };
    recipe.active(clamp_level(level)).map(|o| o.name).collect()
}

// ── SpriteCache ──────────────────────────────────────────────────────────────

/// Memoized rasters, one per [`SpriteKey`], for the lifetime of the cache.
#[derive(Default)]
pub struct SpriteCache {
    sprites: HashMap<SpriteKey, RgbaImage>,
}

impl SpriteCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, key: SpriteKey) -> &RgbaImage {
        self.sprites.entry(key).or_insert_with(|| {
            debug!("sprite cache miss: {key:?}");
            key.glyphs().to_image()
        })
    }

    /// 16×16 art for a single-cell kind.
    pub fn sprite16(&mut self, kind: TileKind, level: u8) -> &RgbaImage {
        self.get(SpriteKey::tile(kind, level))
    }

    /// 32×32 art for a two-by-two building.
    pub fn sprite32(&mut self, kind: TileKind, level: u8) -> &RgbaImage {
        self.get(SpriteKey::building(kind, level))
    }

    pub fn quadrant(&mut self, kind: TileKind, level: u8, quadrant: Quadrant) -> &RgbaImage {
        self.get(SpriteKey::quadrant(kind, level, quadrant))
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    pub fn clear(&mut self) {
        self.sprites.clear();
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
