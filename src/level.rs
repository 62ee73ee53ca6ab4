//! In-memory level record
//!
//! These are the shapes the codec produces and consumes. Behaviour (the
//! game simulation, the editor) lives elsewhere.

use crate::common::{Direction, DirectionSet};
use crate::container::Section;
use crate::replay::Replay;

/// One decoded entry in a cell's stack
///
/// Which of the optional fields are populated depends on the tile type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tile {
    /// Tile type name, e.g. `"floor"` or `"player"`
    pub name: String,
    /// Facing, for actors, directional blocks and logic gates
    pub direction: Option<Direction>,
    /// Wired edges (N=1, E=2, S=4, W=8)
    pub wire_directions: Option<u8>,
    /// Wire tunnel edges, same bit layout as `wire_directions`
    pub wire_tunnel_directions: Option<u8>,
    /// Glyph shown on a letter floor
    pub glyph: Option<char>,
    /// Pushable sides of a directional block
    pub arrows: Option<DirectionSet>,
    /// Track layout of a railroad tile
    pub railroad: Option<RailroadTrack>,
    /// Kind of logic gate
    pub gate: Option<GateKind>,
    /// Hint text attached to a hint tile; `None` falls back to the level hint
    pub hint_text: Option<String>,
}

impl Tile {
    /// Create a tile of the given type with no optional fields
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the facing direction
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }
}

/// Railroad track pieces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RailroadTrack {
    /// Bitmask of the six possible track pieces
    pub tracks: u8,
    /// Bit number (in `tracks`) of the active piece when the tile is a switch
    pub switch: Option<u8>,
    /// Direction the tile was last entered from
    pub entered_direction: Direction,
}

/// Logic gate variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateKind {
    /// Inverter
    Not,
    /// AND gate
    And,
    /// OR gate
    Or,
    /// XOR gate
    Xor,
    /// Latch, clockwise
    LatchCw,
    /// NAND gate
    Nand,
    /// Latch, counter-clockwise
    LatchCcw,
    /// Counter holding a digit
    Counter(u8),
    /// Any other modifier value, kept so it can be written back
    Unknown(u32),
}

/// An ordered stack of tiles, bottom first
pub type Cell = Vec<Tile>;

/// A rectangle the camera is confined to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraRegion {
    /// Left edge, in cells
    pub x: u8,
    /// Top edge, in cells
    pub y: u8,
    /// Width in cells
    pub width: u8,
    /// Height in cells
    pub height: u8,
}

/// A decoded level
#[derive(Debug, Clone, PartialEq)]
pub struct Level {
    /// Format version string from `CC2M`
    pub format_version: Option<String>,
    /// Level title
    pub title: String,
    /// Author's name
    pub author: Option<String>,
    /// Level-wide hint
    pub hint: String,
    /// Author's comment (the part of `NOTE` before the first `[CLUE]` line)
    pub comment: String,
    /// Chips needed to open the socket
    pub chips_required: u32,
    /// Time limit in seconds; 0 means untimed
    pub time_limit: u16,
    /// Viewport size in cells (9 or 10)
    pub viewport_size: u8,
    /// Whether boots behave like the first game
    pub use_cc1_boots: bool,
    /// Blob movement mode
    pub blob_behavior: u8,
    /// Width in cells
    pub size_x: usize,
    /// Height in cells
    pub size_y: usize,
    /// Row-major cells, `size_x * size_y` of them
    pub linear_cells: Vec<Cell>,
    /// Camera regions
    pub camera_regions: Vec<CameraRegion>,
    /// Recorded solution
    pub replay: Option<Replay>,
    /// Sections kept under [`crate::UnknownSectionPolicy::Preserve`]
    pub extra_sections: Vec<Section>,
}

impl Default for Level {
    fn default() -> Self {
        Self {
            format_version: None,
            title: String::new(),
            author: None,
            hint: String::new(),
            comment: String::new(),
            chips_required: 0,
            time_limit: 0,
            viewport_size: 9,
            use_cc1_boots: false,
            blob_behavior: 0,
            size_x: 0,
            size_y: 0,
            linear_cells: Vec::new(),
            camera_regions: Vec::new(),
            replay: None,
            extra_sections: Vec::new(),
        }
    }
}

impl Level {
    /// A level of the given size filled with plain floor
    pub fn new(size_x: usize, size_y: usize) -> Self {
        Self {
            size_x,
            size_y,
            linear_cells: vec![vec![Tile::new("floor")]; size_x * size_y],
            ..Default::default()
        }
    }

    /// Cell index to `(x, y)`, or `None` if the index is outside the grid
    pub fn scalar_to_coords(&self, n: usize) -> Option<(usize, usize)> {
        if n >= self.size_x * self.size_y {
            return None;
        }
        Some((n % self.size_x, n / self.size_x))
    }

    /// `(x, y)` to cell index
    pub fn coords_to_scalar(&self, x: usize, y: usize) -> usize {
        x + y * self.size_x
    }

    /// Cell at `(x, y)`
    pub fn cell(&self, x: usize, y: usize) -> Option<&Cell> {
        if x >= self.size_x || y >= self.size_y {
            return None;
        }
        self.linear_cells.get(self.coords_to_scalar(x, y))
    }

    /// Mutable cell at `(x, y)`
    pub fn cell_mut(&mut self, x: usize, y: usize) -> Option<&mut Cell> {
        if x >= self.size_x || y >= self.size_y {
            return None;
        }
        let n = self.coords_to_scalar(x, y);
        self.linear_cells.get_mut(n)
    }
}

/// Cheap summary read without decoding the map
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelMetadata {
    /// Level title, if the file has a `TITL` section
    pub title: Option<String>,
}
