//! Browser front end: binds the page's form controls and canvas to an
//! [`App`] backed by the deployed contract.

pub mod logger;
pub mod transport;
pub mod wallet;

use std::future::Future;
use std::rc::Rc;

use gloo_net::http::Request;
use log::{warn, LevelFilter};
use wasm_bindgen::prelude::*;
use wasm_bindgen::{Clamped, JsCast};
use wasm_bindgen_futures::spawn_local;
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlElement, HtmlInputElement, ImageData, MouseEvent};

use crate::app::{coord_from_input, kind_from_input, App, AppState};
use crate::chain::{Abi, CityContract};
use crate::config::{Config, ViewConfig};
use crate::error::Result;
use crate::renderer::utils::{client_to_canvas, ClientRect};
use crate::DEFAULT_ABI;

pub use transport::HttpTransport;
pub use wallet::Eip1193Wallet;

type WebApp = App<CityContract<HttpTransport, Eip1193Wallet>>;

// ── Page bindings ────────────────────────────────────────────────────────────

struct Ui {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    status: HtmlElement,
    sel_pos: HtmlElement,
    sel_info: HtmlElement,
    x0: HtmlInputElement,
    y0: HtmlInputElement,
    size: HtmlInputElement,
    kind: HtmlInputElement,
    connect: HtmlElement,
    load: HtmlElement,
    place: HtmlElement,
    upgrade: HtmlElement,
}

fn element<T: JsCast>(document: &Document, id: &str) -> std::result::Result<T, JsValue> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("missing #{id}")))?
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("#{id} has the wrong element type")))
}

impl Ui {
    fn bind() -> std::result::Result<Self, JsValue> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let canvas: HtmlCanvasElement = element(&document, "map")?;
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        ctx.set_image_smoothing_enabled(false);
        Ok(Self {
            ctx,
            status: element(&document, "status")?,
            sel_pos: element(&document, "selPos")?,
            sel_info: element(&document, "selInfo")?,
            x0: element(&document, "x0")?,
            y0: element(&document, "y0")?,
            size: element(&document, "size")?,
            kind: element(&document, "kind")?,
            connect: element(&document, "connect")?,
            load: element(&document, "load")?,
            place: element(&document, "place")?,
            upgrade: element(&document, "upgrade")?,
            canvas,
        })
    }

    /// Copy the state onto the page.
    fn present(&self, st: &AppState) {
        self.status.set_text_content(Some(&st.status));
        self.sel_pos.set_text_content(Some(&st.selection_label()));
        self.sel_info.set_text_content(Some(&st.detail_text()));

        let (w, h) = st.canvas.dimensions();
        match ImageData::new_with_u8_clamped_array_and_sh(Clamped(st.canvas.as_raw().as_slice()), w, h) {
            Ok(data) => {
                if let Err(e) = self.ctx.put_image_data(&data, 0.0, 0.0) {
                    warn!("putImageData failed: {e:?}");
                }
            }
            Err(e) => warn!("ImageData failed: {e:?}"),
        }
    }

    fn number(input: &HtmlInputElement) -> f64 {
        input.value().trim().parse().unwrap_or(f64::NAN)
    }

    fn client_rect(&self) -> ClientRect {
        let r = self.canvas.get_bounding_client_rect();
        ClientRect { left: r.left(), top: r.top(), width: r.width(), height: r.height() }
    }
}

// ── Actions ──────────────────────────────────────────────────────────────────

/// Run `action` to completion off the event handler, reporting any error on
/// the status line.
fn spawn_action<F, Fut>(app: &Rc<WebApp>, action: F)
where
    F: FnOnce(Rc<WebApp>) -> Fut + 'static,
    Fut: Future<Output = Result<()>> + 'static,
{
    let app = app.clone();
    spawn_local(async move {
        let result = action(app.clone()).await;
        app.report(result);
    });
}

async fn load_from_inputs(ui: &Ui, app: &WebApp, keep_selection: bool) -> Result<()> {
    let x0 = coord_from_input("x0", Ui::number(&ui.x0))?;
    let y0 = coord_from_input("y0", Ui::number(&ui.y0))?;
    app.load_view(x0, y0, Ui::number(&ui.size), keep_selection).await
}

fn on_click(target: &HtmlElement, handler: impl FnMut() + 'static) {
    let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut()>);
    if let Err(e) = target.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref()) {
        warn!("addEventListener failed: {e:?}");
    }
    closure.forget();
}

fn wire(ui: &Rc<Ui>, app: &Rc<WebApp>) {
    {
        let (ui, app) = (ui.clone(), app.clone());
        let closure = Closure::wrap(Box::new(move |event: MouseEvent| {
            let (px, py) = client_to_canvas(
                event.client_x() as f64,
                event.client_y() as f64,
                &ui.client_rect(),
                ui.canvas.width(),
                ui.canvas.height(),
            );
            let app = app.clone();
            spawn_local(async move { app.handle_click(px, py).await });
        }) as Box<dyn FnMut(MouseEvent)>);
        if let Err(e) = ui
            .canvas
            .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())
        {
            warn!("addEventListener failed: {e:?}");
        }
        closure.forget();
    }

    let a = app.clone();
    on_click(&ui.connect, move || spawn_action(&a, |app| async move { app.connect_wallet().await.map(|_| ()) }));

    let (u, a) = (ui.clone(), app.clone());
    on_click(&ui.load, move || {
        let ui = u.clone();
        spawn_action(&a, move |app| async move { load_from_inputs(&ui, &app, false).await });
    });

    let (u, a) = (ui.clone(), app.clone());
    on_click(&ui.place, move || {
        let ui = u.clone();
        spawn_action(&a, move |app| async move {
            let kind = kind_from_input(Ui::number(&ui.kind))?;
            app.place_selected(kind).await
        });
    });

    let a = app.clone();
    on_click(&ui.upgrade, move || spawn_action(&a, |app| async move { app.upgrade_selected().await }));
}

// ── Startup ──────────────────────────────────────────────────────────────────

/// `./abi.json` next to the page, or the bundled interface.
async fn load_abi() -> Abi {
    let fetched = match Request::get("./abi.json").send().await {
        Ok(resp) if resp.ok() => resp.text().await.ok(),
        _ => None,
    };
    if let Some(abi) = fetched.as_deref().and_then(|text| Abi::from_json_str(text).ok()) {
        return abi;
    }
    warn!("abi.json unavailable, using the bundled interface");
    Abi::from_json_str(DEFAULT_ABI).unwrap_or_else(|e| {
        log::error!("bundled ABI is invalid: {e}");
        Abi::default()
    })
}

async fn boot(ui: Rc<Ui>) {
    let abi = load_abi().await;
    let config = Config {
        view: ViewConfig { canvas_px: ui.canvas.width(), ..ViewConfig::default() },
        ..Config::default()
    };
    let contract = CityContract::new(
        HttpTransport::new(config.chain.rpc_url.clone()),
        Eip1193Wallet::detect(),
        abi,
        config.chain.clone(),
    );
    let app = match App::new(contract, &config) {
        Ok(app) => app,
        Err(e) => {
            log::error!("cannot start: {e}");
            ui.status.set_text_content(Some(&e.to_string()));
            return;
        }
    };
    let view = ui.clone();
    let app = Rc::new(app.with_observer(move |st| view.present(st)));
    wire(&ui, &app);
    app.set_status(crate::app::STATUS_READY);

    let result = load_from_inputs(&ui, &app, false).await;
    app.report(result);
}

#[wasm_bindgen(start)]
pub fn start() -> std::result::Result<(), JsValue> {
    logger::init(LevelFilter::Info);
    let ui = Rc::new(Ui::bind()?);
    spawn_local(boot(ui));
    Ok(())
}
