//! Native renderer: draws a saved chunk or a single sprite to PNG without a
//! browser or a node.

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::fs;
    use std::path::PathBuf;
    use std::str::FromStr;

    use anyhow::{bail, Context, Result};
    use clap::{Parser, Subcommand, ValueEnum};
    use image::imageops::{self, FilterType};
    use log::info;
    use pollster::block_on;

    use cyphercity::app::App;
    use cyphercity::chain::{ChunkSnapshot, MemoryGateway};
    use cyphercity::config::Config;
    use cyphercity::renderer::BuildingLayout;
    use cyphercity::sprite::{active_overlays, SpriteCache};
    use cyphercity::tile::{SchemaVersion, TileKind};

    #[derive(Debug, Parser)]
    #[command(author, version, about, long_about = None)]
    struct CliArgs {
        #[command(subcommand)]
        command: Command,
    }

    #[derive(Debug, Subcommand)]
    enum Command {
        /// Render a chunk snapshot `{x0, y0, size, tiles}` to a PNG.
        Render {
            /// Snapshot JSON file.
            snapshot: PathBuf,
            #[arg(short, long, value_name = "PNG", default_value = "city.png")]
            out: PathBuf,
            /// Config JSON overriding the built-in defaults.
            #[arg(long, value_name = "JSON")]
            config: Option<PathBuf>,
            /// Select a tile (absolute X,Y) and print its detail.
            #[arg(long, value_name = "X,Y")]
            select: Option<TileArg>,
            /// Canvas edge length in pixels.
            #[arg(long, value_name = "PIXELS", value_parser = clap::value_parser!(u32).range(1..=8192))]
            canvas: Option<u32>,
            #[arg(long, value_enum)]
            schema: Option<SchemaArg>,
            #[arg(long, value_enum)]
            layout: Option<LayoutArg>,
        },
        /// Dump one sprite to a PNG.
        Sprite {
            /// Kind byte (0..=255).
            kind: u8,
            #[arg(short, long, default_value_t = 1)]
            level: u8,
            /// Integer upscale factor.
            #[arg(long, default_value_t = 8, value_parser = clap::value_parser!(u32).range(1..=64))]
            scale: u32,
            #[arg(short, long, value_name = "PNG", default_value = "sprite.png")]
            out: PathBuf,
        },
    }

    #[derive(Clone, Copy, Debug, ValueEnum)]
    enum SchemaArg {
        V1,
        V2,
    }

    impl From<SchemaArg> for SchemaVersion {
        fn from(s: SchemaArg) -> Self {
            match s {
                SchemaArg::V1 => SchemaVersion::V1,
                SchemaArg::V2 => SchemaVersion::V2,
            }
        }
    }

    #[derive(Clone, Copy, Debug, ValueEnum)]
    enum LayoutArg {
        Anchor,
        Quadrants,
    }

    impl From<LayoutArg> for BuildingLayout {
        fn from(l: LayoutArg) -> Self {
            match l {
                LayoutArg::Anchor => BuildingLayout::Anchor,
                LayoutArg::Quadrants => BuildingLayout::Quadrants,
            }
        }
    }

    /// Absolute tile coordinate parsed from `X,Y`.
    #[derive(Clone, Copy, Debug)]
    struct TileArg {
        x: i32,
        y: i32,
    }

    impl FromStr for TileArg {
        type Err = String;

        fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
            let (x, y) = s.split_once(',').ok_or_else(|| format!("expected X,Y, got {s:?}"))?;
            let parse = |v: &str| v.trim().parse::<i32>().map_err(|e| format!("{v:?}: {e}"));
            Ok(Self { x: parse(x)?, y: parse(y)? })
        }
    }

    fn render(
        snapshot: PathBuf,
        out: PathBuf,
        config: Option<PathBuf>,
        select: Option<TileArg>,
        canvas: Option<u32>,
        schema: Option<SchemaArg>,
        layout: Option<LayoutArg>,
    ) -> Result<()> {
        let mut config = match config {
            Some(path) => {
                let text = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
                Config::from_json_str(&text).with_context(|| format!("parsing {}", path.display()))?
            }
            None => Config::default(),
        };
        if let Some(s) = schema {
            config.chain.schema = s.into();
        }
        if let Some(l) = layout {
            config.view.layout = l.into();
        }
        if let Some(px) = canvas {
            config.view.canvas_px = px;
        }

        let text = fs::read_to_string(&snapshot).with_context(|| format!("reading {}", snapshot.display()))?;
        let snap = ChunkSnapshot::from_json_str(&text).with_context(|| format!("parsing {}", snapshot.display()))?;
        let gateway = MemoryGateway::from_snapshot(&snap, config.chain.schema)?;
        config.view.x0 = snap.x0;
        config.view.y0 = snap.y0;
        config.view.size = snap.size;
        let app = App::new(gateway, &config)?;

        block_on(app.load_view(snap.x0, snap.y0, snap.size as f64, false))?;
        if let Some(t) = select {
            block_on(app.select_tile(t.x, t.y));
        }

        app.state().canvas.save(&out).with_context(|| format!("writing {}", out.display()))?;
        info!("wrote {}", out.display());
        println!("{}", app.selection_label());
        println!("{}", app.detail_text());
        Ok(())
    }

    fn sprite(kind: u8, level: u8, scale: u32, out: PathBuf) -> Result<()> {
        let kind = TileKind::from_u8(kind);
        if kind == TileKind::Empty {
            bail!("kind 0 is empty ground and has no sprite");
        }
        let mut cache = SpriteCache::new();
        let raster = if kind.is_building() { cache.sprite32(kind, level) } else { cache.sprite16(kind, level) };
        let (w, h) = raster.dimensions();
        let scaled = imageops::resize(raster, w * scale, h * scale, FilterType::Nearest);
        scaled.save(&out).with_context(|| format!("writing {}", out.display()))?;
        info!(
            "{} level {level} ({}) -> {}",
            kind.name(),
            active_overlays(kind, level).join(", "),
            out.display()
        );
        Ok(())
    }

    pub fn run() -> Result<()> {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        match CliArgs::parse().command {
            Command::Render { snapshot, out, config, select, canvas, schema, layout } => {
                render(snapshot, out, config, select, canvas, schema, layout)
            }
            Command::Sprite { kind, level, scale, out } => sprite(kind, level, scale, out),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    cli::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {}
