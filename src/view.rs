//! Visible rectangle, selection, and the cached tile array, plus the frame
//! planner that turns them into [`DrawOp`]s.

use glam::IVec2;

use crate::error::{Error, Result};
use crate::renderer::utils::cell_at;
use crate::renderer::{BuildingLayout, DrawOp};
use crate::sprite::Quadrant;
use crate::tile::{decode, Footprint, SchemaVersion, TileInfo, TileKind, U256};

/// Largest edge length a single chunk read may cover.
pub const MAX_VIEW_SIZE: u32 = 32;

/// Accept a user-entered view size.
///
/// Input arrives as a float so that `NaN`, infinities and fractions can be
/// rejected instead of silently truncated.
pub fn validate_size(size: f64) -> Result<u32> {
    if !size.is_finite() || size.fract() != 0.0 || size < 1.0 || size > MAX_VIEW_SIZE as f64 {
        return Err(Error::InvalidViewSize(size));
    }
    Ok(size as u32)
}

// ── ViewRect ─────────────────────────────────────────────────────────────────

/// Square window onto the grid, `size` cells on a side.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ViewRect {
    pub origin: IVec2,
    pub size: u32,
}

impl ViewRect {
    pub fn new(x0: i32, y0: i32, size: u32) -> Self {
        Self { origin: IVec2::new(x0, y0), size }
    }

    /// Like [`ViewRect::new`], but refuses a rect whose far edge lies past
    /// `i32::MAX`, so every cell has an absolute coordinate.
    pub fn checked(x0: i32, y0: i32, size: u32) -> Result<Self> {
        let rect = Self::new(x0, y0, size);
        let last = size.saturating_sub(1);
        if rect.cell(last, last).is_none() {
            return Err(Error::InvalidArgument(format!("{size}x{size} view at ({x0},{y0}) leaves the grid")));
        }
        Ok(rect)
    }

    /// Absolute coordinate of the view-relative cell `(dx, dy)`.
    pub fn cell(&self, dx: u32, dy: u32) -> Option<IVec2> {
        let x = self.origin.x.checked_add_unsigned(dx)?;
        let y = self.origin.y.checked_add_unsigned(dy)?;
        Some(IVec2::new(x, y))
    }

    /// View-relative offset of `p`, if it lies inside.
    pub fn offset_of(&self, p: IVec2) -> Option<(u32, u32)> {
        let dx = i64::from(p.x) - i64::from(self.origin.x);
        let dy = i64::from(p.y) - i64::from(self.origin.y);
        let s = i64::from(self.size);
        if dx < 0 || dy < 0 || dx >= s || dy >= s {
            return None;
        }
        Some((dx as u32, dy as u32))
    }

    pub fn contains(&self, p: IVec2) -> bool {
        self.offset_of(p).is_some()
    }

    /// Row-major index of `p` into the tile array.
    pub fn index_of(&self, p: IVec2) -> Option<usize> {
        self.offset_of(p).map(|(dx, dy)| (dy * self.size + dx) as usize)
    }

    pub fn tile_count(&self) -> usize {
        (self.size * self.size) as usize
    }
}

// ── SelectionDetail ──────────────────────────────────────────────────────────

/// What the detail panel shows for the selected tile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectionDetail {
    Tile(TileInfo),
    /// The out-of-view lookup failed.
    ReadError(String),
}

impl Default for SelectionDetail {
    fn default() -> Self {
        SelectionDetail::Tile(TileInfo::EMPTY)
    }
}

impl SelectionDetail {
    pub fn text(&self, schema: SchemaVersion) -> String {
        match self {
            SelectionDetail::Tile(info) => info.detail_text(schema),
            SelectionDetail::ReadError(msg) => format!("read error: {msg}"),
        }
    }
}

// ── GridView ─────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct GridView {
    rect: ViewRect,
    selection: IVec2,
    tiles: Vec<U256>,
    schema: SchemaVersion,
    layout: BuildingLayout,
}

impl GridView {
    /// An all-empty view; the selection starts at the origin.
    pub fn new(rect: ViewRect, schema: SchemaVersion, layout: BuildingLayout) -> Self {
        Self {
            rect,
            selection: rect.origin,
            tiles: vec![U256::ZERO; rect.tile_count()],
            schema,
            layout,
        }
    }

    pub fn rect(&self) -> ViewRect {
        self.rect
    }

    pub fn selection(&self) -> IVec2 {
        self.selection
    }

    pub fn tiles(&self) -> &[U256] {
        &self.tiles
    }

    pub fn schema(&self) -> SchemaVersion {
        self.schema
    }

    pub fn layout(&self) -> BuildingLayout {
        self.layout
    }

    /// Swap in a freshly fetched chunk.
    ///
    /// Nothing changes when `tiles` does not cover `rect` exactly.  The
    /// selection survives only if asked to and still inside `rect`.
    pub fn commit_load(&mut self, rect: ViewRect, tiles: Vec<U256>, keep_selection: bool) -> Result<()> {
        if tiles.len() != rect.tile_count() {
            return Err(Error::ChunkLength { expected: rect.tile_count(), actual: tiles.len() });
        }
        if !(keep_selection && rect.contains(self.selection)) {
            self.selection = rect.origin;
        }
        self.rect = rect;
        self.tiles = tiles;
        Ok(())
    }

    pub fn select(&mut self, p: IVec2) {
        self.selection = p;
    }

    /// Select the cell under canvas pixel `(px, py)`.  Pixels that map past
    /// the edge of the grid leave the selection alone.
    pub fn select_pixel(&mut self, px: f64, py: f64, canvas_width: u32) -> Option<IVec2> {
        let (dx, dy) = cell_at(px, py, canvas_width, self.rect.size)?;
        let o = self.rect.origin;
        let p = IVec2::new(o.x.checked_add(dx)?, o.y.checked_add(dy)?);
        self.selection = p;
        Some(p)
    }

    /// Decoded tile at absolute `p`, when it is cached.
    pub fn tile_at(&self, p: IVec2) -> Option<TileInfo> {
        self.rect.index_of(p).map(|i| decode(&self.tiles[i], self.schema))
    }

    /// Draw list for the current state, in pass order: ground, single-cell
    /// sprites, buildings, selection.
    pub fn plan_frame(&self) -> Vec<DrawOp> {
        let s = self.rect.size;
        let cells: Vec<(u32, u32, TileInfo)> = (0..s)
            .flat_map(|dy| (0..s).map(move |dx| (dx, dy)))
            .zip(&self.tiles)
            .map(|((dx, dy), raw)| (dx, dy, decode(raw, self.schema)))
            .collect();

        let mut ops = Vec::with_capacity(cells.len() * 2 + 1);
        ops.extend(cells.iter().map(|&(dx, dy, _)| DrawOp::Ground { dx, dy }));

        for (dx, dy, info) in &cells {
            let kind = info.tile_kind();
            if info.exists && kind != TileKind::Empty && kind.footprint() == Footprint::Single {
                ops.push(DrawOp::Tile { dx: *dx, dy: *dy, kind, level: info.level });
            }
        }

        for &(dx, dy, ref info) in &cells {
            let kind = info.tile_kind();
            if !info.exists || !kind.is_building() {
                continue;
            }
            let level = info.level;
            match (self.schema, self.layout) {
                (SchemaVersion::V1, _) => ops.push(DrawOp::BuildingCell { dx, dy, kind, level }),
                (SchemaVersion::V2, BuildingLayout::Quadrants) => {
                    let quadrant = Quadrant::from_part(info.part);
                    ops.push(DrawOp::Quadrant { dx, dy, kind, level, quadrant });
                }
                (SchemaVersion::V2, BuildingLayout::Anchor) => {
                    // The 2×2 block would spill past the view edge.
                    if !info.is_anchor || dx + 1 >= s || dy + 1 >= s {
                        continue;
                    }
                    ops.push(DrawOp::Building { dx, dy, kind, level });
                }
            }
        }

        if let Some((dx, dy)) = self.rect.offset_of(self.selection) {
            ops.push(DrawOp::Selection { dx, dy });
        }
        ops
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn packed(kind: u8, level: u8, anchor: bool, part: u8) -> U256 {
        TileInfo {
            exists: true,
            founder: Some(format!("0x{}", "11".repeat(20))),
            kind,
            level,
            updated_at: 1,
            is_anchor: anchor,
            part,
            ..TileInfo::EMPTY
        }
        .pack(SchemaVersion::V2)
        .unwrap()
    }

    fn view(size: u32, layout: BuildingLayout) -> GridView {
        GridView::new(ViewRect::new(0, 0, size), SchemaVersion::V2, layout)
    }

    #[test]
    fn size_validation() {
        assert_eq!(validate_size(1.0).unwrap(), 1);
        assert_eq!(validate_size(32.0).unwrap(), 32);
        for bad in [0.0, -3.0, 33.0, 2.5, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(validate_size(bad), Err(Error::InvalidViewSize(_))), "{bad}");
        }
    }

    #[test]
    fn rect_index_is_row_major() {
        let r = ViewRect::new(10, 20, 4);
        assert_eq!(r.index_of(IVec2::new(10, 20)), Some(0));
        assert_eq!(r.index_of(IVec2::new(13, 21)), Some(7));
        assert_eq!(r.index_of(IVec2::new(14, 20)), None);
        assert_eq!(r.index_of(IVec2::new(9, 20)), None);
    }

    #[test]
    fn commit_rejects_wrong_length() {
        let mut v = view(2, BuildingLayout::Anchor);
        let err = v.commit_load(ViewRect::new(0, 0, 3), vec![U256::ZERO; 4], false).unwrap_err();
        assert!(matches!(err, Error::ChunkLength { expected: 9, actual: 4 }));
        assert_eq!(v.rect().size, 2);
    }

    #[test]
    fn selection_kept_only_when_inside() {
        let mut v = view(4, BuildingLayout::Anchor);
        v.select(IVec2::new(3, 3));
        v.commit_load(ViewRect::new(2, 2, 4), vec![U256::ZERO; 16], true).unwrap();
        assert_eq!(v.selection(), IVec2::new(3, 3));
        v.commit_load(ViewRect::new(8, 8, 4), vec![U256::ZERO; 16], true).unwrap();
        assert_eq!(v.selection(), IVec2::new(8, 8));
        v.select(IVec2::new(9, 9));
        v.commit_load(ViewRect::new(8, 8, 4), vec![U256::ZERO; 16], false).unwrap();
        assert_eq!(v.selection(), IVec2::new(8, 8));
    }

    #[test]
    fn click_selects_cell_relative_to_origin() {
        let mut v = GridView::new(ViewRect::new(5, 7, 16), SchemaVersion::V2, BuildingLayout::Anchor);
        assert_eq!(v.select_pixel(40.0, 70.0, 512), Some(IVec2::new(6, 9)));
        assert_eq!(v.selection(), IVec2::new(6, 9));
    }

    #[test]
    fn rect_at_grid_edge_does_not_overflow() {
        let far = ViewRect::new(i32::MAX - 1, i32::MIN, 4);
        assert_eq!(far.offset_of(IVec2::new(i32::MIN, 0)), None);
        assert_eq!(far.offset_of(IVec2::new(i32::MAX, i32::MIN + 3)), Some((1, 3)));
        assert_eq!(ViewRect::new(i32::MIN, 0, 2).index_of(IVec2::new(i32::MAX, 0)), None);
        assert_eq!(far.cell(1, 0), Some(IVec2::new(i32::MAX, i32::MIN)));
        assert_eq!(far.cell(2, 0), None);
    }

    #[test]
    fn checked_rect_must_stay_on_grid() {
        assert!(matches!(ViewRect::checked(i32::MAX - 1, 0, 4), Err(Error::InvalidArgument(_))));
        assert!(matches!(ViewRect::checked(0, i32::MAX, 2), Err(Error::InvalidArgument(_))));
        assert_eq!(ViewRect::checked(i32::MAX - 3, i32::MIN, 4).unwrap(), ViewRect::new(i32::MAX - 3, i32::MIN, 4));
    }

    #[test]
    fn click_past_grid_edge_keeps_selection() {
        let mut v = GridView::new(ViewRect::new(i32::MAX - 1, 0, 4), SchemaVersion::V2, BuildingLayout::Anchor);
        assert_eq!(v.select_pixel(10.0, 10.0, 512), Some(IVec2::new(i32::MAX - 1, 0)));
        assert_eq!(v.select_pixel(500.0, 10.0, 512), None);
        assert_eq!(v.selection(), IVec2::new(i32::MAX - 1, 0));
    }

    #[test]
    fn empty_view_draws_ground_and_selection() {
        let v = view(2, BuildingLayout::Anchor);
        let ops = v.plan_frame();
        assert_eq!(ops.len(), 5);
        assert!(ops[..4].iter().all(|op| matches!(op, DrawOp::Ground { .. })));
        assert_eq!(ops[4], DrawOp::Selection { dx: 0, dy: 0 });
    }

    #[test]
    fn building_drawn_once_from_anchor() {
        let mut v = view(3, BuildingLayout::Anchor);
        let mut tiles = vec![U256::ZERO; 9];
        tiles[0] = packed(1, 2, true, 0);
        tiles[1] = packed(1, 2, false, 1);
        tiles[3] = packed(1, 2, false, 2);
        tiles[4] = packed(1, 2, false, 3);
        tiles[8] = packed(5, 1, false, 0);
        v.commit_load(ViewRect::new(0, 0, 3), tiles, false).unwrap();

        let ops = v.plan_frame();
        let buildings: Vec<_> = ops.iter().filter(|op| matches!(op, DrawOp::Building { .. })).collect();
        assert_eq!(buildings, [&DrawOp::Building { dx: 0, dy: 0, kind: TileKind::House, level: 2 }]);
        let road = ops.iter().position(|op| matches!(op, DrawOp::Tile { kind: TileKind::Road, .. }));
        let house = ops.iter().position(|op| matches!(op, DrawOp::Building { .. }));
        assert!(road < house);
        assert!(matches!(ops.last(), Some(DrawOp::Selection { .. })));
    }

    #[test]
    fn anchor_on_last_row_or_column_is_skipped() {
        let mut v = view(2, BuildingLayout::Anchor);
        let mut tiles = vec![U256::ZERO; 4];
        tiles[1] = packed(2, 0, true, 0);
        tiles[2] = packed(3, 0, true, 0);
        v.commit_load(ViewRect::new(0, 0, 2), tiles, false).unwrap();
        assert!(!v.plan_frame().iter().any(|op| matches!(op, DrawOp::Building { .. })));
    }

    #[test]
    fn quadrant_layout_draws_every_part() {
        let mut v = view(2, BuildingLayout::Quadrants);
        let tiles = (0..4).map(|p| packed(4, 1, p == 0, p)).collect();
        v.commit_load(ViewRect::new(0, 0, 2), tiles, false).unwrap();
        let quads: Vec<_> = v
            .plan_frame()
            .into_iter()
            .filter_map(|op| match op {
                DrawOp::Quadrant { quadrant, .. } => Some(quadrant),
                _ => None,
            })
            .collect();
        assert_eq!(quads, [Quadrant::TopLeft, Quadrant::TopRight, Quadrant::BottomLeft, Quadrant::BottomRight]);
    }

    #[test]
    fn v1_draws_buildings_per_cell() {
        let mut v = GridView::new(ViewRect::new(0, 0, 2), SchemaVersion::V1, BuildingLayout::Anchor);
        let mut tiles = vec![U256::ZERO; 4];
        tiles[3] = packed(6, 4, false, 0);
        v.commit_load(ViewRect::new(0, 0, 2), tiles, false).unwrap();
        assert!(v.plan_frame().contains(&DrawOp::BuildingCell { dx: 1, dy: 1, kind: TileKind::Monument, level: 4 }));
    }

    #[test]
    fn selection_outside_view_not_outlined() {
        let mut v = view(2, BuildingLayout::Anchor);
        v.select(IVec2::new(5, 5));
        assert!(!v.plan_frame().iter().any(|op| matches!(op, DrawOp::Selection { .. })));
        assert_eq!(v.tile_at(IVec2::new(5, 5)), None);
    }

    #[test]
    fn detail_text_for_read_error() {
        let d = SelectionDetail::ReadError("boom".into());
        assert_eq!(d.text(SchemaVersion::V2), "read error: boom");
        assert_eq!(SelectionDetail::default().text(SchemaVersion::V2), "empty");
    }
}
