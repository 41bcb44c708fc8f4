use std::cell::RefCell;
use std::rc::Rc;

use glam::IVec2;
use pollster::block_on;

use cyphercity::app::*;
use cyphercity::chain::{ChainGateway, MemoryGateway, Submission};
use cyphercity::config::{Config, ViewConfig};
use cyphercity::renderer::{GROUND, SELECTION};
use cyphercity::tile::{SchemaVersion, TileKind};
use cyphercity::view::ViewRect;

const HOUSE: u8 = 1;
const ROAD: u8 = 5;

/// A 4×4 view at (10,10) on a 512 px canvas, so each cell is 128 px.
fn config() -> Config {
    Config {
        view: ViewConfig { canvas_px: 512, x0: 10, y0: 10, size: 4, ..ViewConfig::default() },
        ..Config::default()
    }
}

/// A town with one house anchored at (11,11), already loaded.
fn town() -> App<MemoryGateway> {
    let gw = MemoryGateway::new(SchemaVersion::V2);
    block_on(gw.connect_wallet()).unwrap();
    block_on(gw.submit_place(11, 11, HOUSE)).unwrap();
    let app = App::new(gw, &config()).unwrap();
    block_on(app.load_view(10, 10, 4.0, false)).unwrap();
    app
}

fn recording(app: App<MemoryGateway>) -> (App<MemoryGateway>, Rc<RefCell<Vec<String>>>) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    (app.with_observer(move |st| sink.borrow_mut().push(st.status.clone())), seen)
}

// ── Loading ──────────────────────────────────────────────────────────────────

#[test]
fn test_load_draws_the_view() {
    let app = town();
    assert_eq!(app.status(), STATUS_LOADED);
    assert_eq!(app.selection(), IVec2::new(10, 10));
    assert_eq!(app.gateway().batch_reads(), 1);

    let st = app.state();
    // selection outline on the origin cell
    assert_eq!(*st.canvas.get_pixel(0, 0), SELECTION);
    // empty cell keeps plain ground inside its grid line
    assert_eq!(*st.canvas.get_pixel(3 * 128 + 64, 64), GROUND);
    // the house covers cells (1,1)..=(2,2)
    let painted = (128..384).flat_map(|y| (128..384).map(move |x| (x, y)));
    assert!(painted.into_iter().any(|(x, y)| *st.canvas.get_pixel(x, y) != GROUND));
}

#[test]
fn test_fresh_view_click_selects_origin() {
    let app = App::new(MemoryGateway::new(SchemaVersion::V2), &Config::default()).unwrap();
    block_on(app.load_view(0, 0, 16.0, false)).unwrap();
    assert_eq!(app.state().view.tiles().len(), 256);
    block_on(app.handle_click(512.0 / 32.0, 512.0 / 32.0));
    assert_eq!(app.selection(), IVec2::new(0, 0));
    assert_eq!(app.detail_text(), "empty");
    assert_eq!(app.gateway().tile_reads(), 0);
}

#[test]
fn test_failed_load_keeps_previous_view() {
    let app = town();
    app.gateway().set_fail_reads(true);
    let result = block_on(app.load_view(0, 0, 2.0, false));
    assert!(app.report(result).is_none());
    assert_eq!(app.status(), "transport: node unreachable");
    assert_eq!(app.state().view.rect(), ViewRect::new(10, 10, 4));
    assert_eq!(app.state().view.tiles().len(), 16);
}

#[test]
fn test_oversized_view_is_rejected() {
    let app = town();
    let err = block_on(app.load_view(10, 10, 33.0, false)).unwrap_err();
    assert_eq!(err.to_string(), "Size must be 1..32");
    assert_eq!(app.gateway().batch_reads(), 1);
}

#[test]
fn test_config_view_must_fit_canvas() {
    let gw = || MemoryGateway::new(SchemaVersion::V2);
    let oversized = Config { view: ViewConfig { size: 100, ..config().view }, ..config() };
    assert_eq!(App::new(gw(), &oversized).err().unwrap().to_string(), "Size must be 1..32");
    let narrow = Config { view: ViewConfig { canvas_px: 3, ..config().view }, ..config() };
    assert!(App::new(gw(), &narrow).is_err());
}

#[test]
fn test_click_at_grid_edge_selects_last_column() {
    let app = App::new(MemoryGateway::new(SchemaVersion::V2), &config()).unwrap();
    block_on(app.load_view(i32::MAX - 3, 10, 4.0, false)).unwrap();
    block_on(app.handle_click(511.0, 0.0));
    assert_eq!(app.selection(), IVec2::new(i32::MAX, 10));
    assert!(block_on(app.load_view(i32::MAX - 2, 10, 4.0, false)).is_err());
    assert_eq!(app.state().view.rect(), ViewRect::new(i32::MAX - 3, 10, 4));
}

// ── Selection ────────────────────────────────────────────────────────────────

#[test]
fn test_click_inside_view_uses_cached_tile() {
    let app = town();
    block_on(app.handle_click(300.0, 150.0));
    assert_eq!(app.selection(), IVec2::new(12, 11));
    assert_eq!(app.selection_label(), "Selected: (12,11)");
    assert_eq!(app.gateway().tile_reads(), 0);
    let detail = app.detail_text();
    assert!(detail.starts_with("kind=1\nlevel=1\n"), "{detail}");
    assert!(detail.ends_with("isAnchor=false\nanchor=(11,11)\npart=1"), "{detail}");
}

#[test]
fn test_click_outside_view_reads_one_tile() {
    let app = town();
    block_on(app.handle_click(600.0, 10.0));
    assert_eq!(app.selection(), IVec2::new(14, 10));
    assert_eq!(app.gateway().tile_reads(), 1);
    assert_eq!(app.detail_text(), "empty");
}

#[test]
fn test_outside_read_error_is_shown_in_detail() {
    let app = town();
    app.gateway().set_fail_reads(true);
    block_on(app.select_tile(40, 40));
    assert_eq!(app.detail_text(), "read error: transport: node unreachable");
    assert_eq!(app.status(), STATUS_LOADED);
}

// ── Writes ───────────────────────────────────────────────────────────────────

#[test]
fn test_place_without_wallet() {
    let app = App::new(MemoryGateway::new(SchemaVersion::V2), &config()).unwrap();
    let result = block_on(app.place_selected(ROAD));
    app.report(result);
    assert_eq!(app.status(), "Connect Wallet first");
    assert!(app.gateway().submissions().is_empty());
}

#[test]
fn test_connect_reports_address() {
    let app = App::new(MemoryGateway::new(SchemaVersion::V2), &config()).unwrap();
    let address = block_on(app.connect_wallet()).unwrap();
    assert_eq!(app.status(), format!("Connected: {address}"));
}

#[test]
fn test_place_reloads_and_keeps_selection() {
    let (app, seen) = recording(town());
    block_on(app.select_tile(13, 13));
    block_on(app.place_selected(ROAD)).unwrap();

    assert_eq!(app.selection(), IVec2::new(13, 13));
    assert_eq!(app.status(), STATUS_LOADED);
    assert_eq!(app.gateway().batch_reads(), 2);
    assert!(app.detail_text().starts_with(&format!("kind={ROAD}\n")));

    let seen = seen.borrow();
    let sending = seen.iter().position(|s| s == STATUS_SENDING_PLACE).unwrap();
    assert!(seen[sending + 1].starts_with("tx: 0x"));
    assert!(!seen.iter().any(|s| s == STATUS_WAIT_WARNING));
}

#[test]
fn test_wait_failure_still_reloads() {
    let (app, seen) = recording(town());
    app.gateway().set_wait_error(Some("timed out"));
    block_on(app.select_tile(11, 11));
    block_on(app.upgrade_selected()).unwrap();

    assert!(seen.borrow().iter().any(|s| s == STATUS_WAIT_WARNING));
    assert_eq!(app.status(), STATUS_LOADED);
    assert_eq!(app.gateway().batch_reads(), 2);
    assert!(app.detail_text().contains("level=2"));
    assert_eq!(
        app.gateway().submissions(),
        vec![Submission::Place { x: 11, y: 11, kind: HOUSE }, Submission::Upgrade { x: 11, y: 11 }]
    );
}

#[test]
fn test_reload_after_tx_uses_current_view() {
    let app = town();
    block_on(app.load_view(8, 8, 2.0, false)).unwrap();
    block_on(app.place_selected(ROAD)).unwrap();
    assert_eq!(app.state().view.rect(), ViewRect::new(8, 8, 2));
    assert_eq!(app.state().view.tile_at(IVec2::new(8, 8)).map(|t| t.tile_kind()), Some(TileKind::Road));
}
