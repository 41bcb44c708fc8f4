use image::RgbaImage;

use super::palette::{self, OUTLINE, TRANSPARENT};

// ── Primitive ────────────────────────────────────────────────────────────────

/// One declarative drawing step on a [`GlyphGrid`].
///
/// Coordinates are signed so recipes can overhang the edges; everything is
/// clipped to the grid.  Line endpoints are inclusive, rectangles are
/// `w × h` starting at `(x, y)`.
#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
    /// Paint every cell.
    Fill(u8),
    Rect { x: i32, y: i32, w: i32, h: i32, glyph: u8 },
    /// Filled rectangle with a one-pixel shadow on the right and bottom edge.
    ShadeBox { x: i32, y: i32, w: i32, h: i32, fill: u8, shadow: u8 },
    /// One-pixel outline in the outline glyph.
    OutlineBox { x: i32, y: i32, w: i32, h: i32 },
    HLine { x0: i32, x1: i32, y: i32, glyph: u8 },
    VLine { x: i32, y0: i32, y1: i32, glyph: u8 },
    Pixel { x: i32, y: i32, glyph: u8 },
    /// Gable roof: two columns wide at `apex`/`apex + 1` on row `top`,
    /// widening by one column per side each row down to `bottom`.
    /// Edges are outlined, the interior is `fill`.
    Roof { apex: i32, top: i32, bottom: i32, fill: u8 },
    /// Filled ellipse; cells on the boundary use `edge`.
    Ellipse { cx: i32, cy: i32, rx: i32, ry: i32, fill: u8, edge: u8 },
    /// Two-glyph checkerboard.
    Checker { x: i32, y: i32, w: i32, h: i32, a: u8, b: u8 },
    /// Sparse deterministic speckle, one cell in every `step`.
    Speckle { x: i32, y: i32, w: i32, h: i32, glyph: u8, step: i32 },
    /// Small literal pattern; `.` cells are skipped.
    Stamp { x: i32, y: i32, rows: &'static [&'static str] },
}

impl Primitive {
    pub const fn rect(x: i32, y: i32, w: i32, h: i32, glyph: u8) -> Self {
        Primitive::Rect { x, y, w, h, glyph }
    }
    pub const fn shade(x: i32, y: i32, w: i32, h: i32, fill: u8, shadow: u8) -> Self {
        Primitive::ShadeBox { x, y, w, h, fill, shadow }
    }
    pub const fn outline(x: i32, y: i32, w: i32, h: i32) -> Self {
        Primitive::OutlineBox { x, y, w, h }
    }
    pub const fn hline(x0: i32, x1: i32, y: i32, glyph: u8) -> Self {
        Primitive::HLine { x0, x1, y, glyph }
    }
    pub const fn vline(x: i32, y0: i32, y1: i32, glyph: u8) -> Self {
        Primitive::VLine { x, y0, y1, glyph }
    }
    pub const fn pixel(x: i32, y: i32, glyph: u8) -> Self {
        Primitive::Pixel { x, y, glyph }
    }
    pub const fn roof(apex: i32, top: i32, bottom: i32, fill: u8) -> Self {
        Primitive::Roof { apex, top, bottom, fill }
    }
    pub const fn ellipse(cx: i32, cy: i32, rx: i32, ry: i32, fill: u8, edge: u8) -> Self {
        Primitive::Ellipse { cx, cy, rx, ry, fill, edge }
    }
    pub const fn checker(x: i32, y: i32, w: i32, h: i32, a: u8, b: u8) -> Self {
        Primitive::Checker { x, y, w, h, a, b }
    }
    pub const fn speckle(x: i32, y: i32, w: i32, h: i32, glyph: u8, step: i32) -> Self {
        Primitive::Speckle { x, y, w, h, glyph, step }
    }
    pub const fn stamp(x: i32, y: i32, rows: &'static [&'static str]) -> Self {
        Primitive::Stamp { x, y, rows }
    }
}

// ── GlyphGrid ────────────────────────────────────────────────────────────────

/// Square character raster; each cell is one palette glyph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlyphGrid {
    size: u32,
    cells: Vec<u8>,
}

impl GlyphGrid {
    /// A fully transparent `size × size` grid.
    pub fn new(size: u32) -> Self {
        Self { size, cells: vec![TRANSPARENT; (size * size) as usize] }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Glyph at `(x, y)`; transparent outside the grid.
    pub fn get(&self, x: i32, y: i32) -> u8 {
        self.index(x, y).map_or(TRANSPARENT, |i| self.cells[i])
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let s = self.size as i32;
        if x < 0 || y < 0 || x >= s || y >= s {
            return None;
        }
        Some((y * s + x) as usize)
    }

    /// Write one cell; silently clipped.
    pub fn put(&mut self, x: i32, y: i32, glyph: u8) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = glyph;
        }
    }

    fn fill_rect(&mut self, x0: i32, y0: i32, w: i32, h: i32, glyph: u8) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                self.put(x, y, glyph);
            }
        }
    }

    fn hline(&mut self, x0: i32, x1: i32, y: i32, glyph: u8) {
        for x in x0..=x1 {
            self.put(x, y, glyph);
        }
    }

    fn vline(&mut self, x: i32, y0: i32, y1: i32, glyph: u8) {
        for y in y0..=y1 {
            self.put(x, y, glyph);
        }
    }

    pub fn apply(&mut self, prim: &Primitive) {
        match *prim {
            Primitive::Fill(glyph) => self.cells.fill(glyph),
            Primitive::Rect { x, y, w, h, glyph } => self.fill_rect(x, y, w, h, glyph),
            Primitive::ShadeBox { x, y, w, h, fill, shadow } => {
                self.fill_rect(x, y, w, h, fill);
                self.vline(x + w - 1, y, y + h - 1, shadow);
                self.hline(x, x + w - 1, y + h - 1, shadow);
            }
            Primitive::OutlineBox { x, y, w, h } => {
                self.hline(x, x + w - 1, y, OUTLINE);
                self.hline(x, x + w - 1, y + h - 1, OUTLINE);
                self.vline(x, y, y + h - 1, OUTLINE);
                self.vline(x + w - 1, y, y + h - 1, OUTLINE);
            }
            Primitive::HLine { x0, x1, y, glyph } => self.hline(x0, x1, y, glyph),
            Primitive::VLine { x, y0, y1, glyph } => self.vline(x, y0, y1, glyph),
            Primitive::Pixel { x, y, glyph } => self.put(x, y, glyph),
            Primitive::Roof { apex, top, bottom, fill } => {
                for (i, y) in (top..=bottom).enumerate() {
                    let i = i as i32;
                    let (left, right) = (apex - i, apex + 1 + i);
                    self.hline(left + 1, right - 1, y, fill);
                    self.put(left, y, OUTLINE);
                    self.put(right, y, OUTLINE);
                }
            }
            Primitive::Ellipse { cx, cy, rx, ry, fill, edge } => {
                let (rx, ry) = (rx.max(1), ry.max(1));
                let inside = |x: i32, y: i32| {
                    let (dx, dy) = ((x - cx) as i64, (y - cy) as i64);
                    let (rx, ry) = (rx as i64, ry as i64);
                    dx * dx * ry * ry + dy * dy * rx * rx <= rx * rx * ry * ry
                };
                for y in cy - ry..=cy + ry {
                    for x in cx - rx..=cx + rx {
                        if !inside(x, y) {
                            continue;
                        }
                        let boundary = !inside(x - 1, y)
                            || !inside(x + 1, y)
                            || !inside(x, y - 1)
                            || !inside(x, y + 1);
                        self.put(x, y, if boundary { edge } else { fill });
                    }
                }
            }
            Primitive::Checker { x, y, w, h, a, b } => {
                for py in y..y + h {
                    for px in x..x + w {
                        self.put(px, py, if (px + py).rem_euclid(2) == 0 { a } else { b });
                    }
                }
            }
            Primitive::Speckle { x, y, w, h, glyph, step } => {
                let step = step.max(1);
                for py in y..y + h {
                    for px in x..x + w {
                        if (px * 7 + py * 3).rem_euclid(step) == 0 {
                            self.put(px, py, glyph);
                        }
                    }
                }
            }
            Primitive::Stamp { x, y, rows } => {
                for (dy, row) in rows.iter().enumerate() {
                    for (dx, glyph) in row.bytes().enumerate() {
                        if glyph != TRANSPARENT {
                            self.put(x + dx as i32, y + dy as i32, glyph);
                        }
                    }
                }
            }
        }
    }

    pub fn apply_all<'a>(&mut self, prims: impl IntoIterator<Item = &'a Primitive>) {
        for p in prims {
            self.apply(p);
        }
    }

    /// `size × size` sub-grid starting at `(x0, y0)`.
    pub fn crop(&self, x0: i32, y0: i32, size: u32) -> GlyphGrid {
        let mut out = GlyphGrid::new(size);
        for y in 0..size as i32 {
            for x in 0..size as i32 {
                out.put(x, y, self.get(x0 + x, y0 + y));
            }
        }
        out
    }

    /// Row strings, handy for debugging and snapshot tests.
    pub fn rows(&self) -> Vec<String> {
        self.cells
            .chunks(self.size as usize)
            .map(|r| String::from_utf8_lossy(r).into_owned())
            .collect()
    }

    /// Number of cells that will actually be painted.
    pub fn painted(&self) -> usize {
        self.cells.iter().filter(|&&g| palette::color(g).is_some()).count()
    }

    /// Blit through the palette into an RGBA buffer; unpainted cells stay
    /// fully transparent.
    pub fn to_image(&self) -> RgbaImage {
        let mut img = RgbaImage::new(self.size, self.size);
        for (i, &glyph) in self.cells.iter().enumerate() {
            if let Some(c) = palette::color(glyph) {
                let i = i as u32;
                img.put_pixel(i % self.size, i / self.size, c);
            }
        }
        img
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_grid_is_transparent() {
        let g = GlyphGrid::new(4);
        assert_eq!(g.painted(), 0);
        assert_eq!(g.rows(), vec!["....", "....", "....", "...."]);
    }

    #[test]
    fn put_clips_outside() {
        let mut g = GlyphGrid::new(2);
        g.put(-1, 0, b'G');
        g.put(2, 0, b'G');
        g.put(0, 5, b'G');
        assert_eq!(g.painted(), 0);
    }

    #[test]
    fn outline_box_draws_border_only() {
        let mut g = GlyphGrid::new(4);
        g.apply(&Primitive::outline(0, 0, 4, 4));
        assert_eq!(g.rows(), vec!["0000", "0..0", "0..0", "0000"]);
    }

    #[test]
    fn shade_box_shadows_right_and_bottom() {
        let mut g = GlyphGrid::new(3);
        g.apply(&Primitive::shade(0, 0, 3, 3, b'W', b'w'));
        assert_eq!(g.rows(), vec!["WWw", "WWw", "www"]);
    }

    #[test]
    fn roof_widens_downwards() {
        let mut g = GlyphGrid::new(6);
        g.apply(&Primitive::roof(2, 0, 2, b'R'));
        assert_eq!(g.rows()[0], "..00..");
        assert_eq!(g.rows()[1], ".0RR0.");
        assert_eq!(g.rows()[2], "0RRRR0");
    }

    #[test]
    fn ellipse_has_edge_ring() {
        let mut g = GlyphGrid::new(9);
        g.apply(&Primitive::ellipse(4, 4, 3, 3, b'P', b'p'));
        assert_eq!(g.get(4, 4), b'P');
        assert_eq!(g.get(4, 1), b'p');
        assert_eq!(g.get(0, 0), TRANSPARENT);
    }

    #[test]
    fn stamp_skips_dots() {
        let mut g = GlyphGrid::new(3);
        g.apply(&Primitive::Fill(b'G'));
        g.apply(&Primitive::stamp(0, 0, &["X.X"]));
        assert_eq!(g.rows()[0], "XGX");
    }

    #[test]
    fn crop_extracts_quadrant() {
        let mut g = GlyphGrid::new(4);
        g.apply(&Primitive::rect(2, 2, 2, 2, b'B'));
        let q = g.crop(2, 2, 2);
        assert_eq!(q.rows(), vec!["BB", "BB"]);
        assert_eq!(g.crop(0, 0, 2).painted(), 0);
    }

    #[test]
    fn to_image_maps_glyphs_through_palette() {
        let mut g = GlyphGrid::new(2);
        g.put(1, 0, b'0');
        let img = g.to_image();
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 0]);
        assert_eq!(img.get_pixel(1, 0).0, [0x1B, 0x1B, 0x1B, 0xFF]);
    }
}
