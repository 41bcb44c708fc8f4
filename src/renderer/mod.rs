//! Software canvas: the map is composed into one `RgbaImage` from a list of
//! [`DrawOp`]s, in pass order, and handed to whatever presents it (a browser
//! canvas or a PNG file).

pub mod utils;

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::sprite::{Quadrant, SpriteCache};
use crate::tile::TileKind;

// ── Palette ─────────────────────────────────────────────────────────────────
pub const GROUND: Rgba<u8> = Rgba([0xEA, 0xF6, 0xEA, 0xFF]);
/// Grid lines darken the ground by this much (out of 255).
pub const GRID_LINE_ALPHA: u8 = 20;
pub const SELECTION: Rgba<u8> = Rgba([0x00, 0x00, 0x00, 0xFF]);
pub const SELECTION_WIDTH: u32 = 2;

/// How two-by-two buildings are placed on the grid.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildingLayout {
    /// Draw the whole 32×32 sprite once, from the anchor cell.
    #[default]
    Anchor,
    /// Every building cell draws its own 16×16 `part` quadrant.
    Quadrants,
}

// ── DrawOp ───────────────────────────────────────────────────────────────────

/// One step of a frame, in view-relative cell coordinates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DrawOp {
    /// Flat ground with a faint grid line.
    Ground { dx: u32, dy: u32 },
    /// 16×16 sprite scaled into one cell.
    Tile { dx: u32, dy: u32, kind: TileKind, level: u8 },
    /// 32×32 sprite scaled over the 2×2 block whose top-left is `(dx, dy)`.
    Building { dx: u32, dy: u32, kind: TileKind, level: u8 },
    /// 32×32 sprite shrunk into a single cell (no footprint information).
    BuildingCell { dx: u32, dy: u32, kind: TileKind, level: u8 },
    /// One quadrant of a building scaled into one cell.
    Quadrant { dx: u32, dy: u32, kind: TileKind, level: u8, quadrant: Quadrant },
    /// Selection outline, always last.
    Selection { dx: u32, dy: u32 },
}

// ── Raster helpers ───────────────────────────────────────────────────────────

/// Reset every pixel to fully transparent.
pub fn clear(canvas: &mut RgbaImage) {
    for p in canvas.pixels_mut() {
        *p = Rgba([0, 0, 0, 0]);
    }
}

/// Visit every canvas pixel of the rectangle, clipped.
fn for_each_in(canvas: &RgbaImage, x: u32, y: u32, w: u32, h: u32, mut f: impl FnMut(u32, u32)) {
    let x1 = x.saturating_add(w).min(canvas.width());
    let y1 = y.saturating_add(h).min(canvas.height());
    for py in y..y1 {
        for px in x..x1 {
            f(px, py);
        }
    }
}

pub fn fill_rect(canvas: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, color: Rgba<u8>) {
    let mut hits = Vec::new();
    for_each_in(canvas, x, y, w, h, |px, py| hits.push((px, py)));
    for (px, py) in hits {
        canvas.put_pixel(px, py, color);
    }
}

/// Axis-aligned outline `thickness` pixels wide, drawn inside the rect.
pub fn stroke_rect(canvas: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, thickness: u32, color: Rgba<u8>) {
    if w == 0 || h == 0 {
        return;
    }
    let t = thickness.min(w / 2).min(h / 2).max(1);
    fill_rect(canvas, x, y, w, t, color);
    fill_rect(canvas, x, y + h - t, w, t, color);
    fill_rect(canvas, x, y, t, h, color);
    fill_rect(canvas, x + w - t, y, t, h, color);
}

/// Darken a one-pixel rectangle outline by `alpha` / 255 toward black.
fn darken_outline(canvas: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, alpha: u8) {
    if w == 0 || h == 0 {
        return;
    }
    let keep = 255 - alpha as u32;
    let mut edge = Vec::new();
    for_each_in(canvas, x, y, w, h, |px, py| {
        if px == x || py == y || px == x + w - 1 || py == y + h - 1 {
            edge.push((px, py));
        }
    });
    for (px, py) in edge {
        let p = canvas.get_pixel_mut(px, py);
        for c in &mut p.0[..3] {
            *c = (*c as u32 * keep / 255) as u8;
        }
    }
}

/// Nearest-neighbour scale `sprite` onto `w × h` pixels at `(x, y)`.
/// Transparent sprite pixels leave the canvas untouched.
pub fn blit_scaled(canvas: &mut RgbaImage, sprite: &RgbaImage, x: u32, y: u32, w: u32, h: u32) {
    if w == 0 || h == 0 {
        return;
    }
    let (sw, sh) = sprite.dimensions();
    let x1 = x.saturating_add(w).min(canvas.width());
    let y1 = y.saturating_add(h).min(canvas.height());
    for py in y..y1 {
        let sy = ((py - y) as u64 * sh as u64 / h as u64) as u32;
        for px in x..x1 {
            let sx = ((px - x) as u64 * sw as u64 / w as u64) as u32;
            let src = sprite.get_pixel(sx, sy);
            if src.0[3] != 0 {
                canvas.put_pixel(px, py, *src);
            }
        }
    }
}

/// Execute `ops` in order with a cell pitch of `tile_px` pixels.
pub fn draw_frame(canvas: &mut RgbaImage, ops: &[DrawOp], tile_px: u32, sprites: &mut SpriteCache) {
    clear(canvas);
    if tile_px == 0 {
        return;
    }
    let t = tile_px;
    for op in ops {
        match *op {
            DrawOp::Ground { dx, dy } => {
                fill_rect(canvas, dx * t, dy * t, t, t, GROUND);
                darken_outline(canvas, dx * t, dy * t, t, t, GRID_LINE_ALPHA);
            }
            DrawOp::Tile { dx, dy, kind, level } => {
                let sprite = sprites.sprite16(kind, level);
                blit_scaled(canvas, sprite, dx * t, dy * t, t, t);
            }
            DrawOp::Building { dx, dy, kind, level } => {
                let sprite = sprites.sprite32(kind, level);
                blit_scaled(canvas, sprite, dx * t, dy * t, t * 2, t * 2);
            }
            DrawOp::BuildingCell { dx, dy, kind, level } => {
                let sprite = sprites.sprite32(kind, level);
                blit_scaled(canvas, sprite, dx * t, dy * t, t, t);
            }
            DrawOp::Quadrant { dx, dy, kind, level, quadrant } => {
                let sprite = sprites.quadrant(kind, level, quadrant);
                blit_scaled(canvas, sprite, dx * t, dy * t, t, t);
            }
            DrawOp::Selection { dx, dy } => {
                stroke_rect(canvas, dx * t, dy * t, t, t, SELECTION_WIDTH, SELECTION);
            }
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
