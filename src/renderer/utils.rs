// ── Canvas ↔ grid math ────────────────────────────────────────────────────────
//
// A square canvas shows `size × size` cells.  Drawing uses an integer cell
// pitch (`floor(canvas / size)`) so sprites land on whole pixels; hit-testing
// uses the exact fractional pitch so a click maps to the cell it visually
// falls in on a CSS-scaled canvas.

/// On-screen rectangle of the canvas element in client (CSS) pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClientRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Integer pixel pitch of one cell when drawing.
///
/// Returns `0` when `size` is zero.
#[inline]
pub fn tile_px(canvas_width: u32, size: u32) -> u32 {
    if size == 0 { 0 } else { canvas_width / size }
}

/// Map a pointer position in client pixels to canvas backing-store pixels.
///
/// ```text
/// px = (client_x - rect.left) * canvas_width  / rect.width
/// py = (client_y - rect.top)  * canvas_height / rect.height
/// ```
///
/// A zero-sized rect yields the origin.
pub fn client_to_canvas(
    client_x: f64,
    client_y: f64,
    rect: &ClientRect,
    canvas_width: u32,
    canvas_height: u32,
) -> (f64, f64) {
    if rect.width <= 0.0 || rect.height <= 0.0 {
        return (0.0, 0.0);
    }
    let px = (client_x - rect.left) * (canvas_width as f64 / rect.width);
    let py = (client_y - rect.top) * (canvas_height as f64 / rect.height);
    (px, py)
}

/// View-relative cell `(dx, dy)` under canvas pixel `(px, py)`.
///
/// The pitch is `canvas_width / size` without rounding.  Returns `None` when
/// `size` or `canvas_width` is zero.  Positions left of or above the canvas
/// give negative offsets; the caller decides what that selects.
pub fn cell_at(px: f64, py: f64, canvas_width: u32, size: u32) -> Option<(i32, i32)> {
    if size == 0 || canvas_width == 0 {
        return None;
    }
    let pitch = canvas_width as f64 / size as f64;
    Some(((px / pitch).floor() as i32, (py / pitch).floor() as i32))
}

// ── Tests ──────────────────────────────────────────────────────────────────────
