//! Packed payload compression
//!
//! `PACK` map data and `PRPL` replays share a small byte-oriented LZ77
//! scheme: a two-byte decompressed length, then control bytes. A control
//! byte below 0x80 introduces that many literal bytes; a control byte at or
//! above 0x80 is a back-reference of `control - 0x80` bytes, followed by a
//! one-byte distance into the previous 255 bytes of output.

mod compress;
mod decompress;
mod matcher;

pub use compress::{compress, compress_with_stats};
pub use decompress::decompress;
pub use matcher::{find_longest_match, MatchResult};
