use image::Rgba;

/// Transparent glyph: leaves the destination pixel untouched.
pub const TRANSPARENT: u8 = b'.';
/// Outline glyph used by `OutlineBox` and roof edges.
pub const OUTLINE: u8 = b'0';

// ── Palette ─────────────────────────────────────────────────────────────────
const PALETTE: &[(u8, [u8; 3])] = &[
    (b'0', [0x1B, 0x1B, 0x1B]), // outline
    (b'G', [0x7F, 0xCB, 0x8A]), // grass
    (b'g', [0x5E, 0xAF, 0x6B]), // dark grass
    (b'D', [0xC9, 0xA2, 0x6A]), // dirt
    (b'd', [0x9B, 0x7B, 0x4C]), // dark dirt
    (b'S', [0xB9, 0xB9, 0xB9]), // stone
    (b's', [0x8F, 0x8F, 0x8F]), // dark stone
    (b'W', [0xE9, 0xE1, 0xD2]), // wall
    (b'w', [0xCF, 0xC4, 0xB2]), // dark wall
    (b'R', [0xC1, 0x5A, 0x52]), // roof
    (b'r', [0x8F, 0x3C, 0x37]), // dark roof
    (b'B', [0x6F, 0xB6, 0xFF]), // window
    (b'b', [0x2D, 0x6F, 0xA7]), // dark window
    (b'T', [0x7A, 0x5A, 0x3A]), // wood
    (b't', [0x5A, 0x42, 0x2B]), // dark wood
    (b'Y', [0xE7, 0xD4, 0x6D]), // wheat
    (b'y', [0xC8, 0xAF, 0x3F]), // dark wheat
    (b'X', [0xD9, 0xA4, 0x41]), // accent
    (b'x', [0x9D, 0x6F, 0x1E]), // dark accent
    (b'C', [0xD0, 0xD3, 0xD6]), // concrete
    (b'c', [0xA9, 0xAD, 0xB2]), // dark concrete
    (b'K', [0x2A, 0x2F, 0x35]), // asphalt
    (b'P', [0x4F, 0xC3, 0xF7]), // pool water
    (b'p', [0x1E, 0x88, 0xC8]), // deep pool
    (b'M', [0xE8, 0x5D, 0x9E]), // amusement accent
    (b'm', [0xB8, 0x3E, 0x77]), // dark amusement
    (b'L', [0xBF, 0xE9, 0xFF]), // light glass
    (b'l', [0x7D, 0xB9, 0xD6]), // dark glass
];

/// Fill colour for `glyph`, or `None` when it should not be painted
/// (`.` and any character outside the table).
pub fn color(glyph: u8) -> Option<Rgba<u8>> {
    PALETTE
        .iter()
        .find(|(g, _)| *g == glyph)
        .map(|(_, [r, g, b])| Rgba([*r, *g, *b, 0xFF]))
}
