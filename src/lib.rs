pub mod app;
pub mod chain;
pub mod config;
pub mod error;
pub mod renderer;
pub mod sprite;
pub mod tile;
pub mod view;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use error::{Error, Result};

/// Contract interface shipped with the crate, used when none is supplied.
pub const DEFAULT_ABI: &str = include_str!("../resources/city_abi.json");
