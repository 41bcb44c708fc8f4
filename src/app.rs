//! Application root: owns every piece of mutable state and runs the user
//! actions (load, click, connect, place, upgrade) against a gateway.

use std::cell::{Ref, RefCell};

use glam::IVec2;
use image::RgbaImage;
use log::{info, warn};

use crate::chain::{ChainGateway, PendingTx};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::renderer::draw_frame;
use crate::renderer::utils::tile_px;
use crate::sprite::SpriteCache;
use crate::view::{validate_size, GridView, SelectionDetail, ViewRect};

// ── Status lines ─────────────────────────────────────────────────────────────
pub const STATUS_READY: &str = "Ready.";
pub const STATUS_LOADING: &str = "Loading chunk...";
pub const STATUS_LOADED: &str = "Loaded.";
pub const STATUS_SENDING_PLACE: &str = "Sending place tx...";
pub const STATUS_SENDING_UPGRADE: &str = "Sending upgrade tx...";
pub const STATUS_WAIT_WARNING: &str = "tx sent (wait warning). Refreshing...";

pub struct AppState {
    pub view: GridView,
    pub sprites: SpriteCache,
    pub canvas: RgbaImage,
    pub status: String,
    pub detail: SelectionDetail,
}

impl AppState {
    pub fn selection_label(&self) -> String {
        let s = self.view.selection();
        format!("Selected: ({},{})", s.x, s.y)
    }

    pub fn detail_text(&self) -> String {
        self.detail.text(self.view.schema())
    }
}

/// Called with the state after every visible change.
pub type Observer = Box<dyn Fn(&AppState)>;

/// The user-facing controller.
///
/// Methods take `&self`; state is borrowed only between awaits, so a front
/// end may start a new action while another is still waiting on the chain.
pub struct App<G> {
    gateway: G,
    state: RefCell<AppState>,
    observer: Option<Observer>,
}

impl<G: ChainGateway> App<G> {
    /// Fails when the configured view could not be drawn: a size outside
    /// `1..=32`, a rect past the grid edge, or a canvas narrower than one
    /// pixel per cell.
    pub fn new(gateway: G, config: &Config) -> Result<Self> {
        let v = &config.view;
        let size = validate_size(f64::from(v.size))?;
        check_canvas(v.canvas_px, size)?;
        let view = GridView::new(ViewRect::checked(v.x0, v.y0, size)?, config.chain.schema, v.layout);
        Ok(Self {
            gateway,
            state: RefCell::new(AppState {
                view,
                sprites: SpriteCache::new(),
                canvas: RgbaImage::new(v.canvas_px, v.canvas_px),
                status: STATUS_READY.to_string(),
                detail: SelectionDetail::default(),
            }),
            observer: None,
        })
    }

    /// Get told about status, canvas and detail changes as they happen,
    /// including the intermediate ones of a long action.
    pub fn with_observer(mut self, observer: impl Fn(&AppState) + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    fn notify(&self) {
        if let Some(observer) = &self.observer {
            observer(&self.state.borrow());
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn state(&self) -> Ref<'_, AppState> {
        self.state.borrow()
    }

    pub fn status(&self) -> String {
        self.state.borrow().status.clone()
    }

    pub fn set_status(&self, status: impl Into<String>) {
        self.state.borrow_mut().status = status.into();
        self.notify();
    }

    /// Route a failed action to the status line.
    pub fn report<T>(&self, result: Result<T>) -> Option<T> {
        result
            .map_err(|e| {
                warn!("{e}");
                self.set_status(e.to_string());
            })
            .ok()
    }

    pub fn selection(&self) -> IVec2 {
        self.state.borrow().view.selection()
    }

    pub fn selection_label(&self) -> String {
        self.state.borrow().selection_label()
    }

    pub fn detail_text(&self) -> String {
        self.state.borrow().detail_text()
    }

    // ── Actions ──────────────────────────────────────────────────────────────

    /// Fetch and show a new view.  `size` is raw user input.
    ///
    /// On failure the previous view and tiles stay untouched.
    pub async fn load_view(&self, x0: i32, y0: i32, size: f64, keep_selection: bool) -> Result<()> {
        let size = validate_size(size)?;
        let rect = ViewRect::checked(x0, y0, size)?;
        check_canvas(self.state.borrow().canvas.width(), size)?;
        self.set_status(STATUS_LOADING);
        let tiles = self.gateway.get_tile_batch(x0, y0, size).await?;
        self.state.borrow_mut().view.commit_load(rect, tiles, keep_selection)?;
        info!("loaded {size}x{size} view at ({x0},{y0})");
        self.redraw();
        self.refresh_selection_detail().await;
        self.set_status(STATUS_LOADED);
        Ok(())
    }

    /// Select the cell under a canvas pixel.
    pub async fn handle_click(&self, px: f64, py: f64) {
        {
            let mut st = self.state.borrow_mut();
            let width = st.canvas.width();
            st.view.select_pixel(px, py, width);
        }
        self.redraw();
        self.refresh_selection_detail().await;
    }

    /// Select an absolute tile, as a click on it would.
    pub async fn select_tile(&self, x: i32, y: i32) {
        self.state.borrow_mut().view.select(IVec2::new(x, y));
        self.redraw();
        self.refresh_selection_detail().await;
    }

    pub fn redraw(&self) {
        {
            let mut guard = self.state.borrow_mut();
            let st = &mut *guard;
            let ops = st.view.plan_frame();
            let pitch = tile_px(st.canvas.width(), st.view.rect().size);
            draw_frame(&mut st.canvas, &ops, pitch, &mut st.sprites);
        }
        self.notify();
    }

    /// Describe the selected tile: from the cached chunk when it is in view,
    /// otherwise with one `getTile` read.
    pub async fn refresh_selection_detail(&self) {
        let (sel, cached) = {
            let st = self.state.borrow();
            let sel = st.view.selection();
            (sel, st.view.tile_at(sel))
        };
        let detail = match cached {
            Some(info) => SelectionDetail::Tile(info),
            None => match self.gateway.get_tile(sel.x, sel.y).await {
                Ok(info) => SelectionDetail::Tile(info),
                Err(e) => SelectionDetail::ReadError(e.to_string()),
            },
        };
        self.state.borrow_mut().detail = detail;
        self.notify();
    }

    pub async fn connect_wallet(&self) -> Result<String> {
        let address = self.gateway.connect_wallet().await?;
        self.set_status(format!("Connected: {address}"));
        Ok(address)
    }

    pub async fn place_selected(&self, kind: u8) -> Result<()> {
        let sel = self.selection();
        self.set_status(STATUS_SENDING_PLACE);
        let tx = self.gateway.submit_place(sel.x, sel.y, kind).await?;
        self.settle(tx).await
    }

    pub async fn upgrade_selected(&self) -> Result<()> {
        let sel = self.selection();
        self.set_status(STATUS_SENDING_UPGRADE);
        let tx = self.gateway.submit_upgrade(sel.x, sel.y).await?;
        self.settle(tx).await
    }

    /// Wait for `tx`, then reload the current view keeping the selection.
    /// A failed wait only downgrades to a warning.
    async fn settle(&self, tx: PendingTx) -> Result<()> {
        self.set_status(format!("tx: {}", tx.hash));
        if let Err(e) = self.gateway.wait_for_receipt(&tx).await {
            warn!("waiting for {} failed: {e}", tx.hash);
            self.set_status(STATUS_WAIT_WARNING);
        }
        let rect = self.state.borrow().view.rect();
        self.load_view(rect.origin.x, rect.origin.y, rect.size as f64, true).await
    }
}

fn check_canvas(canvas_px: u32, size: u32) -> Result<()> {
    if canvas_px < size {
        return Err(Error::InvalidArgument(format!("a {canvas_px} px canvas cannot show {size} tiles")));
    }
    Ok(())
}

// ── Form input ───────────────────────────────────────────────────────────────

/// Parse the kind field of the place form.
pub fn kind_from_input(value: f64) -> Result<u8> {
    if !value.is_finite() || value.fract() != 0.0 || !(0.0..=u8::MAX as f64).contains(&value) {
        return Err(Error::InvalidArgument(format!("kind must be 0..255, got {value}")));
    }
    Ok(value as u8)
}

/// Parse a view origin field.
pub fn coord_from_input(name: &str, value: f64) -> Result<i32> {
    if !value.is_finite() || value.fract() != 0.0 || value < i32::MIN as f64 || value > i32::MAX as f64 {
        return Err(Error::InvalidArgument(format!("{name} must be an integer, got {value}")));
    }
    Ok(value as i32)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MemoryGateway;
    use crate::config::ViewConfig;
    use crate::tile::SchemaVersion;
    use pollster::block_on;

    fn app() -> App<MemoryGateway> {
        App::new(MemoryGateway::new(SchemaVersion::V2), &Config::default()).unwrap()
    }

    fn with_view(view: ViewConfig) -> Result<App<MemoryGateway>> {
        App::new(MemoryGateway::new(SchemaVersion::V2), &Config { view, ..Config::default() })
    }

    #[test]
    fn starts_ready() {
        let a = app();
        assert_eq!(a.status(), STATUS_READY);
        assert_eq!(a.detail_text(), "empty");
        assert_eq!(a.selection_label(), "Selected: (0,0)");
    }

    #[test]
    fn invalid_size_leaves_state_alone() {
        let a = app();
        let err = block_on(a.load_view(3, 3, 40.0, false)).unwrap_err();
        assert_eq!(err.to_string(), "Size must be 1..32");
        assert_eq!(a.gateway().batch_reads(), 0);
        assert_eq!(a.state().view.rect(), ViewRect::new(0, 0, 16));
        assert_eq!(a.status(), STATUS_READY);
    }

    #[test]
    fn bad_view_config_is_rejected() {
        for size in [0, 33, 100] {
            let err = with_view(ViewConfig { size, ..ViewConfig::default() }).err().unwrap();
            assert!(matches!(err, Error::InvalidViewSize(_)), "{size}");
        }
        let err = with_view(ViewConfig { canvas_px: 8, size: 16, ..ViewConfig::default() }).err().unwrap();
        assert!(matches!(err, Error::InvalidArgument(_)));
        let err = with_view(ViewConfig { x0: i32::MAX, ..ViewConfig::default() }).err().unwrap();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(with_view(ViewConfig { canvas_px: 16, size: 16, ..ViewConfig::default() }).is_ok());
    }

    #[test]
    fn view_wider_than_canvas_is_not_loaded() {
        let a = with_view(ViewConfig { canvas_px: 8, size: 4, ..ViewConfig::default() }).unwrap();
        let err = block_on(a.load_view(0, 0, 16.0, false)).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(a.gateway().batch_reads(), 0);
        block_on(a.load_view(0, 0, 8.0, false)).unwrap();
        assert_eq!(a.state().view.rect().size, 8);
    }

    #[test]
    fn view_past_grid_edge_is_not_loaded() {
        let a = app();
        let err = block_on(a.load_view(i32::MAX - 3, 0, 8.0, false)).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(a.status(), STATUS_READY);
        block_on(a.load_view(i32::MAX - 3, 0, 4.0, false)).unwrap();
        block_on(a.handle_click(511.0, 0.0));
        assert_eq!(a.selection(), IVec2::new(i32::MAX, 0));
    }

    #[test]
    fn report_writes_status() {
        let a = app();
        assert_eq!(a.report::<()>(Err(Error::WalletNotConnected)), None);
        assert_eq!(a.status(), "Connect Wallet first");
    }

    #[test]
    fn kind_input_validation() {
        assert_eq!(kind_from_input(7.0).unwrap(), 7);
        assert!(kind_from_input(256.0).is_err());
        assert!(kind_from_input(-1.0).is_err());
        assert!(kind_from_input(1.5).is_err());
        assert!(kind_from_input(f64::NAN).is_err());
    }

    #[test]
    fn coord_input_validation() {
        assert_eq!(coord_from_input("x0", -12.0).unwrap(), -12);
        assert!(coord_from_input("x0", 0.5).is_err());
        assert!(coord_from_input("y0", f64::INFINITY).is_err());
    }

    #[test]
    fn observer_sees_status_changes() {
        use std::rc::Rc;

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let a = app().with_observer(move |st| sink.borrow_mut().push(st.status.clone()));
        block_on(a.load_view(0, 0, 2.0, false)).unwrap();
        let seen = seen.borrow();
        assert_eq!(seen.first().map(String::as_str), Some(STATUS_LOADING));
        assert_eq!(seen.last().map(String::as_str), Some(STATUS_LOADED));
    }
}
