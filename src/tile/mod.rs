//! On-chain tile state: the 256-bit slot type, the canonical kind
//! enumeration, and the packed-field codec.

pub mod decode;
pub mod kind;
pub mod u256;

pub use decode::{decode, format_address, SchemaVersion, TileInfo};
pub use kind::{clamp_level, Footprint, TileKind, MAX_LEVEL};
pub use u256::U256;
