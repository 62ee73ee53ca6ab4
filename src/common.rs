//! Common types and constants for the C2M level format
//!
//! This module defines the error type, the format constants shared by the
//! container, the packer and the tile codec, and a few small value types
//! (compass directions, direction bitmasks, compression statistics).

use thiserror::Error;

/// Error type for C2M operations
#[derive(Debug, Error)]
pub enum C2mError {
    /// A section's declared length runs past the end of the buffer
    #[error("Section at byte {offset} of type '{tag}' extends {excess} bytes past the end of the file")]
    SectionOverrun {
        /// Offset of the section header
        offset: usize,
        /// Four-character section tag
        tag: String,
        /// Number of bytes missing from the buffer
        excess: usize,
    },

    /// Fewer than eight bytes remain for a section header
    #[error("Truncated section header at byte {offset}")]
    TruncatedSectionHeader {
        /// Offset of the partial header
        offset: usize,
    },

    /// A read went past the end of its buffer
    #[error("Unexpected end of input at byte {offset} (needed {needed} more bytes)")]
    UnexpectedEof {
        /// Offset the read started at
        offset: usize,
        /// Number of bytes the read required
        needed: usize,
    },

    /// A map byte that is not in the tile table
    #[error("Unrecognized tile type 0x{byte:02x} in cell {cell}")]
    UnrecognizedTile {
        /// The offending byte
        byte: u8,
        /// Cell index (row-major) being decoded
        cell: usize,
    },

    /// A map byte that is known but cannot be represented
    #[error("Unsupported tile type 0x{byte:02x}: {reason}")]
    UnsupportedTile {
        /// The offending byte
        byte: u8,
        /// Why the tile cannot be loaded
        reason: &'static str,
    },

    /// A variant-list tile whose modifier does not select a variant
    #[error("Tile type 0x{byte:02x} has no variant for modifier {modifier}")]
    InvalidTileVariant {
        /// Tile byte
        byte: u8,
        /// Modifier value that was applied
        modifier: u32,
    },

    /// Decompressed output disagrees with the declared length
    #[error("Expected to decode {expected} bytes but got {actual} instead")]
    LengthMismatch {
        /// Length from the two-byte header
        expected: usize,
        /// Bytes actually produced
        actual: usize,
    },

    /// A back-reference pointing before the start of the output
    #[error("Invalid back-reference distance {distance} at output position {position}")]
    InvalidBackReference {
        /// Distance byte
        distance: usize,
        /// Output position at the time of the copy
        position: usize,
    },

    /// Integer width other than 1, 2 or 4 bytes
    #[error("Can't read or write {0} bytes as an integer")]
    UnsupportedWidth(usize),

    /// Viewport code in OPTN outside 0..=2
    #[error("Unrecognized viewport size option {0}")]
    UnrecognizedViewport(u8),

    /// LXCM payload that is not a whole number of regions
    #[error("Expected LXCM section to be a multiple of 4 bytes; got {0}")]
    InvalidCameraRegions(usize),

    /// A tile name the encoder has no byte for
    #[error("Tile type '{0}' cannot be encoded")]
    UnencodableTile(String),

    /// A cell whose stack could not be read back in the same shape
    #[error("Cell {cell} cannot be encoded: {reason}")]
    InvalidCellStack {
        /// Cell index (row-major)
        cell: usize,
        /// What is wrong with the stack
        reason: &'static str,
    },

    /// Cell list length differs from width x height
    #[error("Expected {expected} cells but the level has {actual}")]
    CellCountMismatch {
        /// width x height
        expected: usize,
        /// Actual number of cells
        actual: usize,
    },

    /// Dimensions that do not fit in a byte
    #[error("Level dimensions {width}x{height} exceed 255x255")]
    InvalidDimensions {
        /// Level width
        width: usize,
        /// Level height
        height: usize,
    },

    /// A section tag that is not four ASCII characters
    #[error("Section names must be four ASCII characters, not '{0}'")]
    InvalidSectionTag(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for C2M operations
pub type Result<T> = std::result::Result<T, C2mError>;

// Packer constants

/// Furthest a back-reference can reach behind the output position
pub const MAX_DISTANCE: usize = 0xFF;

/// Longest literal run or back-reference in one control byte
pub const MAX_RUN_LENGTH: usize = 0x7F;

/// Control bytes at or above this value are back-references
pub const BACK_REFERENCE_FLAG: u8 = 0x80;

/// Matches must be longer than this to beat a literal run
pub const MIN_MATCH_LENGTH: usize = 3;

/// Size of the decompressed-length header on packed payloads
pub const PACKED_HEADER_SIZE: usize = 2;

// Map constants

/// Marker byte introducing a one-byte modifier
pub const MODIFIER_8: u8 = 0x76;

/// Marker byte introducing a two-byte modifier
pub const MODIFIER_16: u8 = 0x77;

/// Marker byte introducing a four-byte modifier
pub const MODIFIER_32: u8 = 0x78;

/// Composite thin wall / canopy byte
pub const THIN_WALL_CANOPY: u8 = 0x6D;

/// Format version written to new files
pub const DEFAULT_FORMAT_VERSION: &str = "133";

/// A compass direction, in the order the format numbers them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    /// 0
    #[default]
    North = 0,
    /// 1
    East = 1,
    /// 2
    South = 2,
    /// 3
    West = 3,
}

impl Direction {
    /// All four directions in index order
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Direction from the low two bits of a byte
    pub fn from_index(value: u32) -> Self {
        Self::ALL[(value & 0x03) as usize]
    }

    /// Index of this direction (north = 0, clockwise)
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Flag for this direction in arrow and wire masks
    pub fn flag(self) -> DirectionSet {
        match self {
            Direction::North => DirectionSet::NORTH,
            Direction::East => DirectionSet::EAST,
            Direction::South => DirectionSet::SOUTH,
            Direction::West => DirectionSet::WEST,
        }
    }

    /// Lowercase name
    pub fn name(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::East => "east",
            Direction::South => "south",
            Direction::West => "west",
        }
    }
}

bitflags::bitflags! {
    /// A set of directions stored as a 4-bit mask
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DirectionSet: u8 {
        /// North
        const NORTH = 0x01;
        /// East
        const EAST = 0x02;
        /// South
        const SOUTH = 0x04;
        /// West
        const WEST = 0x08;
    }
}

impl Default for DirectionSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl DirectionSet {
    /// Whether `direction` is in the set
    pub fn has(self, direction: Direction) -> bool {
        self.contains(direction.flag())
    }

    /// Iterate the members in index order
    pub fn directions(self) -> impl Iterator<Item = Direction> {
        Direction::ALL.into_iter().filter(move |d| self.has(*d))
    }
}

impl From<Direction> for DirectionSet {
    fn from(direction: Direction) -> Self {
        direction.flag()
    }
}

impl FromIterator<Direction> for DirectionSet {
    fn from_iter<I: IntoIterator<Item = Direction>>(iter: I) -> Self {
        iter.into_iter().map(Direction::flag).collect()
    }
}

/// Statistics for a compression run
#[derive(Debug, Default, Clone)]
pub struct CompressionStats {
    /// Number of literal bytes emitted
    pub literal_count: usize,
    /// Number of back-references emitted
    pub match_count: usize,
    /// Longest back-reference emitted
    pub longest_match: usize,
    /// Input bytes
    pub input_bytes: usize,
    /// Output bytes, header included
    pub output_bytes: usize,
}

impl CompressionStats {
    /// Output size as a percentage of input size
    pub fn ratio(&self) -> f64 {
        if self.input_bytes == 0 {
            return 0.0;
        }
        (self.output_bytes as f64 / self.input_bytes as f64) * 100.0
    }
}
