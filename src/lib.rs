//! c2m - reader and writer for C2M level files
//!
//! A C2M file is a list of tagged sections: strings (title, author, hints),
//! options, a map of stacked tiles and an optional recorded solution. The
//! map and the replay may be stored compressed with a small LZ77 variant
//! (255-byte window, 127-byte runs).
//!
//! # Features
//!
//! - Section container reader and writer
//! - Map compression and decompression
//! - Tile stack decoding and encoding, including modifiers and thin-wall packing
//! - Replay input decoding, one input state per 20 Hz tick
//! - Optional async batch loading (`async` feature)
//!
//! # Example - Decoding
//!
//! ```no_run
//! use c2m::decode_level;
//!
//! let data = std::fs::read("level.c2m")?;
//! let level = decode_level(&data)?;
//! println!("{} ({}x{})", level.title, level.size_x, level.size_y);
//!
//! if let Some(replay) = &level.replay {
//!     for (tick, input) in replay.inputs().enumerate() {
//!         println!("{tick}: {:?}", input);
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Example - Encoding
//!
//! ```
//! use c2m::{decode_level, encode_level, Level, Tile};
//!
//! let mut level = Level::new(10, 10);
//! level.title = "Hello".to_string();
//! level.linear_cells[0].push(Tile::new("chip"));
//!
//! let bytes = encode_level(&level)?;
//! let back = decode_level(&bytes)?;
//! assert_eq!(back.chips_required, 1);
//! # Ok::<(), c2m::C2mError>(())
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

// Public modules
pub mod common;
pub mod compression;
pub mod container;
pub mod cursor;
pub mod error;
pub mod level;
pub mod options;
pub mod replay;
pub mod tiles;

// Async modules (only available with async feature)
#[cfg(feature = "async")]
pub mod async_batch;

// Re-export commonly used types
pub use common::{C2mError, CompressionStats, Direction, DirectionSet, Result};
pub use compression::{compress, compress_with_stats, decompress};
pub use container::{
    decode_level, decode_level_with, encode_level, encode_level_with, parse_level_metadata,
    read_level, write_level, Section, SectionReader, SectionTag, SectionWriter,
};
pub use level::{CameraRegion, Cell, GateKind, Level, LevelMetadata, RailroadTrack, Tile};
pub use options::{DecodeOptions, EncodeOptions, UnknownSectionPolicy};
pub use replay::{Action, InputSet, Replay, ReplayInputs};

#[cfg(feature = "async")]
pub use async_batch::AsyncLevelLoader;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reexports() {
        let _ = UnknownSectionPolicy::Preserve;
        let _ = SectionTag::PACK;
        assert_eq!(Direction::default(), Direction::North);
        assert!(compress(b"").is_none());
    }
}
