// ── Sprite recipes ───────────────────────────────────────────────────────────
//
// Each kind is a base list of primitives plus level-gated overlays.  Overlays
// are listed in ascending `min_level`, only ever paint opaque glyphs, and never
// repaint a cell an earlier overlay drew, so a higher level is always the lower
// level with more detail on top.

use super::grid::{GlyphGrid, Primitive as P};
use crate::tile::TileKind;

pub const TILE_SIZE: u32 = 16;
pub const BUILDING_SIZE: u32 = 32;

/// Detail layer that switches on at `min_level`.
#[derive(Clone, Debug)]
pub struct Overlay {
    pub min_level: u8,
    pub name: &'static str,
    pub prims: Vec<P>,
}

/// Declarative description of one sprite.
#[derive(Clone, Debug)]
pub struct Recipe {
    pub size: u32,
    pub base: Vec<P>,
    pub overlays: Vec<Overlay>,
}

impl Recipe {
    fn new(size: u32, base: Vec<P>) -> Self {
        Self { size, base, overlays: Vec::new() }
    }

    fn overlay(mut self, min_level: u8, name: &'static str, prims: Vec<P>) -> Self {
        debug_assert!(self.overlays.last().is_none_or(|o| o.min_level <= min_level));
        self.overlays.push(Overlay { min_level, name, prims });
        self
    }

    /// Overlays switched on at `level`, in application order.
    pub fn active(&self, level: u8) -> impl Iterator<Item = &Overlay> {
        self.overlays.iter().filter(move |o| level >= o.min_level)
    }

    pub fn render(&self, level: u8) -> GlyphGrid {
        let mut grid = GlyphGrid::new(self.size);
        grid.apply_all(&self.base);
        for overlay in self.active(level) {
            grid.apply_all(&overlay.prims);
        }
        grid
    }
}

// ── 16×16 ────────────────────────────────────────────────────────────────────

/// Single-cell art.  Only roads have their own; everything else is grass.
pub fn tile_recipe(kind: TileKind) -> Recipe {
    match kind {
        TileKind::Road => Recipe::new(TILE_SIZE, vec![P::checker(0, 0, 16, 16, b'S', b's')])
            .overlay(2, "center seam", vec![P::vline(8, 0, 15, b's')])
            .overlay(3, "lane marks", (0..16).step_by(2).map(|y| P::pixel(7, y, b'S')).collect())
            // Curbs and crossing stripes stop short of the lane columns 7 and 8.
            .overlay(
                4,
                "curbs",
                [0, 15].into_iter().flat_map(|y| [P::hline(0, 6, y, b'0'), P::hline(9, 15, y, b'0')]).collect(),
            )
            .overlay(5, "crossing", [2, 5, 10, 13].into_iter().map(|x| P::rect(x, 7, 2, 2, b'W')).collect()),
        _ => Recipe::new(
            TILE_SIZE,
            vec![P::Fill(b'G'), P::speckle(0, 0, 16, 16, b'g', 5)],
        ),
    }
}

// ── 32×32 ────────────────────────────────────────────────────────────────────

/// Two-by-two building art.
pub fn building_recipe(kind: TileKind) -> Recipe {
    match kind {
        TileKind::House => house(),
        TileKind::Farm => farm(),
        TileKind::Workshop => workshop(),
        TileKind::Park => park(),
        TileKind::Monument => monument(),
        TileKind::HighRiseCommercial => high_rise(),
        TileKind::Residential => residential(),
        TileKind::LuxuryHouseWithPool => luxury_house(),
        TileKind::LargePark => large_park(),
        TileKind::AmusementPark => amusement_park(),
        TileKind::Empty => Recipe::new(BUILDING_SIZE, Vec::new()),
        TileKind::Road | TileKind::Unknown(_) => placeholder(),
    }
}

const QUESTION_MARK: &[&str] = &[
    ".KKKK.",
    "KK..KK",
    "....KK",
    "...KK.",
    "..KK..",
    "......",
    "..KK..",
];

fn placeholder() -> Recipe {
    Recipe::new(
        BUILDING_SIZE,
        vec![P::outline(9, 8, 14, 16), P::stamp(13, 12, QUESTION_MARK)],
    )
}

fn house() -> Recipe {
    Recipe::new(
        BUILDING_SIZE,
        vec![
            P::roof(15, 1, 13, b'R'),
            P::hline(4, 27, 14, b'0'),
            P::shade(6, 15, 20, 8, b'W', b'w'),
            P::vline(5, 15, 23, b'0'),
            P::vline(26, 15, 23, b'0'),
            P::hline(5, 26, 23, b'0'),
            P::rect(8, 17, 2, 2, b'B'),
            P::rect(22, 17, 2, 2, b'B'),
            P::rect(14, 18, 4, 5, b'T'),
            P::rect(15, 19, 2, 4, b'd'),
            P::ellipse(16, 27, 7, 2, b'D', b'd'),
        ],
    )
    .overlay(2, "lit windows", vec![P::rect(8, 20, 3, 2, b'B'), P::rect(21, 20, 3, 2, b'B')])
    .overlay(3, "porch", vec![P::rect(12, 24, 8, 3, b'T'), P::outline(12, 24, 8, 3)])
    .overlay(4, "chimney", vec![P::rect(22, 4, 3, 7, b's'), P::outline(22, 4, 3, 7), P::pixel(23, 3, b'r')])
    .overlay(5, "dormer", vec![P::rect(14, 8, 4, 3, b'B'), P::outline(13, 7, 6, 5), P::hline(6, 25, 16, b'w')])
}

fn farm() -> Recipe {
    let mut base = vec![P::rect(4, 2, 24, 13, b'T'), P::rect(5, 3, 22, 11, b'G')];
    for x in (6..26).step_by(4) {
        base.push(P::rect(x, 4, 3, 9, b'Y'));
        base.push(P::vline(x + 1, 4, 12, b'D'));
    }
    base.extend([
        P::roof(15, 15, 19, b'R'),
        P::shade(11, 20, 10, 9, b'R', b'r'),
        P::outline(10, 20, 12, 10),
        P::rect(12, 22, 2, 1, b'B'),
        P::rect(18, 22, 2, 1, b'B'),
        P::rect(14, 24, 4, 5, b'T'),
        P::vline(15, 25, 28, b'd'),
    ]);
    Recipe::new(BUILDING_SIZE, base)
        .overlay(2, "ripe wheat", vec![P::checker(6, 4, 20, 1, b'Y', b'y'), P::checker(6, 12, 20, 1, b'Y', b'y')])
        .overlay(3, "gate", vec![P::rect(14, 14, 4, 1, b'D')])
        .overlay(4, "silo", vec![P::rect(26, 18, 4, 10, b'S'), P::outline(26, 17, 4, 12), P::pixel(27, 16, b's')])
        .overlay(5, "market stall", vec![P::rect(2, 21, 7, 4, b'X'), P::outline(2, 21, 7, 4), P::hline(3, 7, 22, b'x')])
}

fn workshop() -> Recipe {
    Recipe::new(
        BUILDING_SIZE,
        vec![
            P::ellipse(16, 25, 13, 5, b'D', b'd'),
            P::rect(15, 1, 4, 6, b's'),
            P::outline(14, 1, 6, 7),
            P::shade(11, 8, 12, 10, b'S', b's'),
            P::outline(10, 7, 14, 12),
            P::rect(13, 10, 2, 2, b'B'),
            P::rect(19, 10, 2, 2, b'B'),
            P::hline(13, 20, 15, b'X'),
            P::shade(13, 22, 8, 6, b'S', b's'),
            P::outline(12, 21, 10, 8),
            P::rect(15, 24, 4, 1, b'B'),
        ],
    )
    .overlay(2, "crates", vec![P::rect(4, 23, 3, 3, b'T'), P::outline(4, 23, 3, 3), P::rect(24, 24, 3, 3, b'T')])
    .overlay(3, "gear sign", vec![P::stamp(15, 12, &["X.X.", ".XX.", "X..X"])])
    .overlay(4, "second chimney", vec![P::rect(21, 3, 2, 4, b's'), P::outline(20, 2, 4, 5)])
    .overlay(5, "loading dock", vec![P::rect(23, 19, 6, 3, b'K'), P::outline(23, 18, 6, 4)])
}

fn park() -> Recipe {
    Recipe::new(
        BUILDING_SIZE,
        vec![
            P::ellipse(16, 8, 12, 6, b'G', b'g'),
            P::ellipse(16, 20, 7, 4, b'b', b'B'),
            P::ellipse(8, 28, 3, 2, b'G', b'g'),
            P::ellipse(24, 28, 3, 2, b'G', b'g'),
            P::pixel(8, 28, b'T'),
            P::pixel(24, 28, b'T'),
        ],
    )
    .overlay(
        2,
        "flowers",
        [(8, 6), (12, 10), (19, 4), (23, 9), (15, 7)].into_iter().map(|(x, y)| P::pixel(x, y, b'M')).collect(),
    )
    .overlay(3, "bench", vec![P::rect(13, 13, 6, 1, b'T'), P::pixel(13, 14, b't'), P::pixel(18, 14, b't')])
    .overlay(4, "fountain", vec![P::ellipse(16, 20, 2, 1, b'L', b'l'), P::pixel(16, 18, b'L')])
    .overlay(
        5,
        "lamp posts",
        vec![P::vline(4, 22, 26, b'K'), P::pixel(4, 21, b'X'), P::vline(28, 22, 26, b'K'), P::pixel(28, 21, b'X')],
    )
}

fn monument() -> Recipe {
    Recipe::new(
        BUILDING_SIZE,
        vec![
            P::outline(4, 25, 24, 5),
            P::rect(5, 26, 22, 3, b'S'),
            P::shade(9, 19, 14, 6, b'S', b's'),
            P::outline(8, 18, 16, 8),
            P::roof(15, 0, 2, b's'),
            P::shade(13, 4, 6, 14, b'S', b's'),
            P::outline(12, 3, 8, 16),
        ],
    )
    .overlay(2, "gilded tip", vec![P::pixel(15, 0, b'X'), P::pixel(16, 0, b'X')])
    .overlay(3, "inscription", vec![P::hline(14, 17, 10, b'0'), P::hline(14, 17, 12, b'0')])
    .overlay(4, "flower beds", vec![P::rect(1, 30, 6, 2, b'G'), P::rect(25, 30, 6, 2, b'G'), P::pixel(3, 30, b'M'), P::pixel(27, 30, b'M')])
    .overlay(
        5,
        "banners",
        vec![P::vline(5, 10, 24, b'T'), P::rect(6, 10, 3, 4, b'R'), P::vline(26, 10, 24, b'T'), P::rect(23, 10, 3, 4, b'R')],
    )
}

fn high_rise() -> Recipe {
    let mut base = vec![P::outline(12, 1, 12, 30), P::rect(13, 2, 10, 28, b'C')];
    for x in 14..22 {
        base.push(P::vline(x, 3, 24, if x % 2 == 0 { b'L' } else { b'l' }));
    }
    base.extend([P::rect(14, 26, 8, 3, b'W'), P::rect(17, 27, 2, 3, b'd')]);
    Recipe::new(BUILDING_SIZE, base)
        .overlay(2, "lobby light", vec![P::hline(13, 22, 25, b'X')])
        .overlay(3, "rooftop sign", vec![P::rect(13, 2, 10, 1, b'X')])
        .overlay(4, "central spine", vec![P::vline(17, 3, 24, b'c'), P::vline(18, 3, 24, b'c')])
        .overlay(5, "crown", vec![P::rect(14, 0, 8, 1, b'X'), P::pixel(17, 0, b'x'), P::pixel(18, 0, b'x')])
}

fn residential() -> Recipe {
    let mut base = vec![P::outline(12, 1, 12, 29), P::rect(13, 2, 10, 27, b'W')];
    for y in (3..24).step_by(2) {
        base.push(P::rect(14, y, 2, 1, b'B'));
        base.push(P::rect(20, y, 2, 1, b'B'));
    }
    base.extend([P::rect(16, 25, 4, 4, b'T'), P::rect(17, 26, 2, 3, b'd'), P::hline(12, 23, 30, b'D')]);
    Recipe::new(BUILDING_SIZE, base)
        .overlay(2, "floor bands", vec![P::hline(13, 22, 12, b'w'), P::hline(13, 22, 20, b'w')])
        .overlay(
            3,
            "balconies",
            (4..22).step_by(4).flat_map(|y| [P::rect(10, y, 2, 1, b'T'), P::rect(24, y, 2, 1, b'T')]).collect(),
        )
        .overlay(4, "entrance canopy", vec![P::rect(14, 24, 8, 1, b'r')])
        .overlay(5, "sidewalk", vec![P::rect(4, 31, 24, 1, b'D')])
}

fn luxury_house() -> Recipe {
    let mut base = vec![
        P::hline(10, 25, 1, b'0'),
        P::rect(10, 2, 16, 4, b'R'),
        P::hline(9, 26, 6, b'0'),
        P::outline(9, 6, 18, 9),
        P::rect(10, 7, 16, 7, b'W'),
    ];
    for x in (11..24).step_by(4) {
        base.push(P::rect(x, 8, 2, 1, b'B'));
    }
    base.extend([
        P::rect(14, 10, 8, 3, b'T'),
        P::rect(15, 11, 2, 2, b'd'),
        P::rect(19, 11, 2, 2, b'd'),
        P::rect(9, 15, 18, 2, b'D'),
        P::outline(11, 17, 12, 8),
        P::rect(12, 18, 10, 6, b'P'),
        P::rect(13, 19, 8, 4, b'p'),
        P::rect(15, 20, 4, 2, b'P'),
        P::ellipse(16, 28, 5, 2, b'G', b'g'),
    ]);
    Recipe::new(BUILDING_SIZE, base)
        .overlay(2, "deck planks", vec![P::hline(11, 22, 25, b'T')])
        .overlay(
            3,
            "pool lights",
            [(10, 19), (23, 19), (10, 22), (23, 22)].into_iter().map(|(x, y)| P::pixel(x, y, b'X')).collect(),
        )
        .overlay(4, "west wing", vec![P::outline(2, 7, 8, 8), P::shade(3, 8, 6, 6, b'W', b'w'), P::rect(4, 9, 3, 2, b'B')])
        .overlay(5, "east wing", vec![P::outline(26, 7, 6, 8), P::shade(27, 8, 4, 6, b'W', b'w'), P::rect(28, 9, 2, 2, b'B')])
}

fn large_park() -> Recipe {
    Recipe::new(
        BUILDING_SIZE,
        vec![
            P::ellipse(16, 5, 12, 4, b'G', b'g'),
            P::ellipse(16, 16, 8, 5, b'b', b'B'),
            P::rect(15, 22, 2, 5, b'D'),
            P::ellipse(7, 24, 3, 2, b'G', b'g'),
            P::ellipse(25, 24, 3, 2, b'G', b'g'),
            P::pixel(7, 26, b'T'),
            P::pixel(25, 26, b'T'),
        ],
    )
    .overlay(2, "gazebo", vec![P::rect(14, 2, 4, 2, b'T'), P::outline(13, 1, 6, 4)])
    .overlay(3, "statue", vec![P::stamp(14, 5, &["0SS0", "0SS0", "0000"])])
    .overlay(4, "flower beds", vec![P::rect(3, 28, 6, 2, b'M'), P::rect(23, 28, 6, 2, b'M')])
    .overlay(5, "bandstand", vec![P::rect(12, 27, 8, 3, b'T'), P::outline(12, 27, 8, 3)])
}

fn amusement_park() -> Recipe {
    Recipe::new(
        BUILDING_SIZE,
        vec![
            P::outline(12, 1, 12, 10),
            P::rect(13, 2, 10, 8, b'M'),
            P::rect(14, 3, 8, 6, b'm'),
            P::outline(15, 4, 6, 4),
            P::rect(16, 5, 4, 2, b'X'),
            P::ellipse(16, 19, 6, 5, b'L', b's'),
            P::hline(11, 21, 19, b's'),
            P::vline(16, 15, 23, b's'),
            P::ellipse(16, 28, 4, 2, b'D', b'd'),
        ],
    )
    .overlay(2, "marquee lights", (13..=22).step_by(2).map(|x| P::pixel(x, 1, b'X')).collect())
    .overlay(3, "hub", vec![P::rect(15, 18, 3, 3, b'l'), P::pixel(16, 19, b'X')])
    .overlay(
        4,
        "gondolas",
        [(16, 14), (16, 24), (10, 19), (22, 19)].into_iter().map(|(x, y)| P::pixel(x, y, b'M')).collect(),
    )
    .overlay(
        5,
        "light strings",
        vec![P::hline(5, 10, 27, b'X'), P::hline(22, 27, 27, b'X'), P::hline(5, 10, 28, b'x'), P::hline(22, 27, 28, b'x')],
    )
}

// ── Tests ──────────────────────────────────────────────────────────────────────
