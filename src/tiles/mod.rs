//! Tile codec
//!
//! Turns the inflated `MAP ` payload into per-cell tile stacks and back,
//! driven by the static byte <-> tile tables in [`table`].

mod codec;
pub mod table;

pub use codec::{decode_map, encode_map, encode_modifier, MapData, TilePosition};
pub use table::{spec_for_byte, spec_for_name, ExtraArg, Modifier, TileName, TileSpec};
