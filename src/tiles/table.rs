//! Static tile tables
//!
//! `TILE_SPECS` lists every map byte the codec understands. The forward
//! table (byte -> spec) is computed at compile time; the reverse table
//! (name -> byte + modifier) is built once on first use by inverting the
//! forward table and expanding the custom floor/wall variant lists.

use crate::common::{Direction, DirectionSet, MODIFIER_16, MODIFIER_32, MODIFIER_8};
use crate::level::{GateKind, RailroadTrack, Tile};
use std::collections::HashMap;
use std::sync::LazyLock;

/// How a spec names the tile it produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileName {
    /// One tile type
    Single(&'static str),
    /// Four colour variants, chosen by the modifier value
    Variants([&'static str; 4]),
    /// Packed thin walls and canopy, followed by a bitmask byte
    ThinWallCanopy,
    /// Not a tile: introduces a modifier of this many bytes for the next tile
    ModifierMarker(usize),
}

/// Interpretation of the modifier value attached to a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    /// Low nibble is wired edges, high nibble is wire tunnels
    Wire,
    /// Track pieces, optional switch and the entered direction
    Railroad,
    /// Gate kind and facing, or a counter value
    LogicGate,
    /// Glyph drawn on a letter floor
    Letter,
    /// Visual arrow mask of a custom cloner; carries no gameplay and is not kept
    ClonerArrows,
    /// Fixed variant index, only used by reverse entries of variant lists
    Variant(u8),
}

const ARROW_GLYPHS: [char; 4] = ['⬆', '➡', '⬇', '⬅'];
const FIRST_ARROW_CODE: u32 = 28;
const COUNTER_RANGE: std::ops::RangeInclusive<u32> = 0x1E..=0x27;
const LATCH_CCW_CODE: u32 = 16;

impl Modifier {
    /// Apply a raw modifier value to a freshly decoded tile
    pub fn decode(self, tile: &mut Tile, raw: u32) {
        match self {
            Modifier::Wire => {
                let wires = (raw & 0x0F) as u8;
                let tunnels = ((raw & 0xF0) >> 4) as u8;
                tile.wire_directions = (wires != 0).then_some(wires);
                tile.wire_tunnel_directions = (tunnels != 0).then_some(tunnels);
            }
            Modifier::Railroad => {
                tile.railroad = Some(RailroadTrack {
                    tracks: (raw & 0x3F) as u8,
                    switch: (raw & 0x40 != 0).then_some(((raw >> 8) & 0x0F) as u8),
                    entered_direction: Direction::from_index(raw >> 12),
                });
            }
            Modifier::LogicGate => {
                if COUNTER_RANGE.contains(&raw) {
                    // Counters can't be rotated
                    tile.direction = Some(Direction::North);
                    tile.gate = Some(GateKind::Counter((raw - COUNTER_RANGE.start()) as u8));
                } else {
                    tile.direction = Some(Direction::from_index(raw));
                    tile.gate = Some(match raw >> 2 {
                        0 => GateKind::Not,
                        1 => GateKind::And,
                        2 => GateKind::Or,
                        3 => GateKind::Xor,
                        4 => GateKind::LatchCw,
                        5 => GateKind::Nand,
                        LATCH_CCW_CODE => GateKind::LatchCcw,
                        _ => GateKind::Unknown(raw),
                    });
                }
            }
            Modifier::Letter => {
                tile.glyph = Some(match raw {
                    c if !(FIRST_ARROW_CODE..96).contains(&c) => '?',
                    c if c < 32 => ARROW_GLYPHS[(c - FIRST_ARROW_CODE) as usize],
                    c => char::from(c as u8),
                });
            }
            Modifier::ClonerArrows => {
                log::debug!("Ignoring cloner arrow mask 0x{:x}", raw);
            }
            Modifier::Variant(_) => {}
        }
    }

    /// Compute the raw modifier value for a tile; zero means "no modifier"
    pub fn encode(self, tile: &Tile) -> u32 {
        match self {
            Modifier::Wire => {
                let wires = tile.wire_directions.unwrap_or(0) as u32 & 0x0F;
                let tunnels = tile.wire_tunnel_directions.unwrap_or(0) as u32 & 0x0F;
                wires | (tunnels << 4)
            }
            Modifier::Railroad => match tile.railroad {
                Some(track) => {
                    let mut raw = track.tracks as u32 & 0x3F;
                    if let Some(switch) = track.switch {
                        raw |= 0x40 | ((switch as u32 & 0x0F) << 8);
                    }
                    raw | ((track.entered_direction.index() as u32) << 12)
                }
                None => 0,
            },
            Modifier::LogicGate => {
                let direction = tile.direction.unwrap_or_default().index() as u32;
                match tile.gate {
                    Some(GateKind::Counter(memory)) => COUNTER_RANGE.start() + memory as u32,
                    Some(GateKind::Unknown(raw)) => raw,
                    Some(kind) => {
                        let code = match kind {
                            GateKind::And => 1,
                            GateKind::Or => 2,
                            GateKind::Xor => 3,
                            GateKind::LatchCw => 4,
                            GateKind::Nand => 5,
                            GateKind::LatchCcw => LATCH_CCW_CODE,
                            _ => 0,
                        };
                        (code << 2) | direction
                    }
                    None => direction,
                }
            }
            Modifier::Letter => match tile.glyph {
                Some(glyph) => match ARROW_GLYPHS.iter().position(|&g| g == glyph) {
                    Some(index) => FIRST_ARROW_CODE + index as u32,
                    None if (' '..'`').contains(&glyph) => glyph as u32,
                    None => '?' as u32,
                },
                None => 0,
            },
            Modifier::ClonerArrows => 0,
            Modifier::Variant(index) => index as u32,
        }
    }
}

/// A fixed-width field stored after the tile byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtraArg {
    /// Facing direction in the low two bits of one byte
    Direction,
    /// Arrow mask of a directional block, one byte
    Arrows,
}

impl ExtraArg {
    /// Width of the field in bytes
    pub fn width(self) -> usize {
        match self {
            ExtraArg::Direction | ExtraArg::Arrows => 1,
        }
    }

    /// Store a raw field value on the tile
    pub fn decode(self, tile: &mut Tile, raw: u32) {
        match self {
            ExtraArg::Direction => tile.direction = Some(Direction::from_index(raw)),
            ExtraArg::Arrows => tile.arrows = Some(DirectionSet::from_bits_truncate(raw as u8)),
        }
    }

    /// Raw field value for the tile
    pub fn encode(self, tile: &Tile) -> u32 {
        match self {
            ExtraArg::Direction => tile.direction.unwrap_or_default().index() as u32,
            ExtraArg::Arrows => tile.arrows.unwrap_or_default().bits() as u32,
        }
    }
}

/// One entry of the byte -> tile table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileSpec {
    /// Map byte
    pub byte: u8,
    /// What the byte decodes to
    pub name: TileName,
    /// Whether another record for the same cell follows
    pub continues_stack: bool,
    /// Modifier strategy, if the tile accepts one
    pub modifier: Option<Modifier>,
    /// Fields read after the tile byte, in order
    pub extra_args: &'static [ExtraArg],
    /// Set for bytes that are known but cannot be loaded
    pub unsupported: Option<&'static str>,
}

impl TileSpec {
    const fn new(byte: u8, name: &'static str) -> Self {
        Self {
            byte,
            name: TileName::Single(name),
            continues_stack: false,
            modifier: None,
            extra_args: &[],
            unsupported: None,
        }
    }

    const fn named(byte: u8, name: TileName) -> Self {
        let mut spec = Self::new(byte, "");
        spec.name = name;
        spec
    }

    const fn next(mut self) -> Self {
        self.continues_stack = true;
        self
    }

    const fn modifier(mut self, modifier: Modifier) -> Self {
        self.modifier = Some(modifier);
        self
    }

    const fn args(mut self, args: &'static [ExtraArg]) -> Self {
        self.extra_args = args;
        self
    }

    const fn unsupported(mut self, reason: &'static str) -> Self {
        self.unsupported = Some(reason);
        self
    }

    /// Objects and items sit on top of terrain and always continue the stack
    const fn item(byte: u8, name: &'static str) -> Self {
        Self::new(byte, name).next()
    }

    /// Actors carry a facing direction and always continue the stack
    const fn actor(byte: u8, name: &'static str) -> Self {
        Self::new(byte, name).next().args(&[ExtraArg::Direction])
    }

    const fn wired(byte: u8, name: &'static str) -> Self {
        Self::new(byte, name).modifier(Modifier::Wire)
    }
}

/// Every map byte the codec knows about
pub const TILE_SPECS: &[TileSpec] = &[
    TileSpec::wired(0x01, "floor"),
    TileSpec::new(0x02, "wall"),
    TileSpec::new(0x03, "ice"),
    TileSpec::new(0x04, "ice_sw"),
    TileSpec::new(0x05, "ice_nw"),
    TileSpec::new(0x06, "ice_ne"),
    TileSpec::new(0x07, "ice_se"),
    TileSpec::new(0x08, "water"),
    TileSpec::new(0x09, "fire"),
    TileSpec::new(0x0A, "force_floor_n"),
    TileSpec::new(0x0B, "force_floor_e"),
    TileSpec::new(0x0C, "force_floor_s"),
    TileSpec::new(0x0D, "force_floor_w"),
    TileSpec::new(0x0E, "green_wall"),
    TileSpec::new(0x0F, "green_floor"),
    TileSpec::wired(0x10, "teleport_red"),
    TileSpec::wired(0x11, "teleport_blue"),
    TileSpec::new(0x12, "teleport_yellow"),
    TileSpec::new(0x13, "teleport_green"),
    TileSpec::new(0x14, "exit"),
    TileSpec::new(0x15, "slime"),
    TileSpec::actor(0x16, "player"),
    TileSpec::actor(0x17, "dirt_block"),
    TileSpec::actor(0x18, "walker"),
    TileSpec::actor(0x19, "glider"),
    TileSpec::actor(0x1A, "ice_block"),
    TileSpec::item(0x1B, "thinwall_s"),
    TileSpec::item(0x1C, "thinwall_e"),
    TileSpec::item(0x1D, "thinwall_se"),
    TileSpec::new(0x1E, "gravel"),
    TileSpec::new(0x1F, "button_green"),
    TileSpec::new(0x20, "button_blue"),
    TileSpec::actor(0x21, "tank_blue"),
    TileSpec::new(0x22, "door_red"),
    TileSpec::new(0x23, "door_blue"),
    TileSpec::new(0x24, "door_yellow"),
    TileSpec::new(0x25, "door_green"),
    TileSpec::item(0x26, "key_red"),
    TileSpec::item(0x27, "key_blue"),
    TileSpec::item(0x28, "key_yellow"),
    TileSpec::item(0x29, "key_green"),
    TileSpec::item(0x2A, "chip"),
    TileSpec::item(0x2B, "chip_extra"),
    TileSpec::new(0x2C, "socket"),
    TileSpec::new(0x2D, "popwall"),
    TileSpec::new(0x2E, "wall_appearing"),
    TileSpec::new(0x2F, "wall_invisible"),
    TileSpec::new(0x30, "fake_wall"),
    TileSpec::new(0x31, "fake_floor"),
    TileSpec::new(0x32, "dirt"),
    TileSpec::actor(0x33, "bug"),
    TileSpec::actor(0x34, "paramecium"),
    TileSpec::actor(0x35, "ball"),
    TileSpec::actor(0x36, "blob"),
    TileSpec::actor(0x37, "teeth"),
    TileSpec::actor(0x38, "fireball"),
    TileSpec::new(0x39, "button_red"),
    TileSpec::new(0x3A, "button_brown"),
    TileSpec::item(0x3B, "cleats"),
    TileSpec::item(0x3C, "suction_boots"),
    TileSpec::item(0x3D, "fire_boots"),
    TileSpec::item(0x3E, "flippers"),
    TileSpec::new(0x3F, "thief_tools"),
    TileSpec::item(0x40, "bomb"),
    TileSpec::new(0x42, "trap"),
    TileSpec::new(0x43, "cloner"),
    TileSpec::new(0x44, "cloner").modifier(Modifier::ClonerArrows),
    TileSpec::new(0x45, "hint"),
    TileSpec::new(0x46, "force_floor_all"),
    TileSpec::new(0x47, "button_gray"),
    TileSpec::new(0x48, "swivel_sw"),
    TileSpec::new(0x49, "swivel_nw"),
    TileSpec::new(0x4A, "swivel_ne"),
    TileSpec::new(0x4B, "swivel_se"),
    TileSpec::item(0x4C, "stopwatch_bonus"),
    TileSpec::item(0x4D, "stopwatch_toggle"),
    TileSpec::wired(0x4E, "transmogrifier"),
    TileSpec::new(0x4F, "railroad").modifier(Modifier::Railroad),
    TileSpec::wired(0x50, "steel"),
    TileSpec::item(0x51, "dynamite"),
    TileSpec::item(0x52, "helmet"),
    TileSpec::actor(0x56, "player2"),
    TileSpec::actor(0x57, "teeth_timid").unsupported("timid chomper is not implemented"),
    TileSpec::actor(0x58, "explosion").unsupported("explosion animation is not implemented"),
    TileSpec::item(0x59, "hiking_boots"),
    TileSpec::new(0x5A, "no_player2_sign"),
    TileSpec::new(0x5B, "no_player1_sign"),
    TileSpec::new(0x5C, "logic_gate").modifier(Modifier::LogicGate),
    TileSpec::wired(0x5E, "button_pink"),
    TileSpec::new(0x5F, "flame_jet_off"),
    TileSpec::new(0x60, "flame_jet_on"),
    TileSpec::new(0x61, "button_orange"),
    TileSpec::item(0x62, "lightning_bolt"),
    TileSpec::actor(0x63, "tank_yellow"),
    TileSpec::new(0x64, "button_yellow"),
    TileSpec::actor(0x65, "doppelganger1"),
    TileSpec::actor(0x66, "doppelganger2"),
    TileSpec::item(0x68, "bowling_ball"),
    TileSpec::actor(0x69, "rover"),
    TileSpec::item(0x6A, "stopwatch_penalty"),
    TileSpec::named(
        0x6B,
        TileName::Variants([
            "floor_custom_green",
            "floor_custom_pink",
            "floor_custom_yellow",
            "floor_custom_blue",
        ]),
    ),
    TileSpec::named(0x6D, TileName::ThinWallCanopy).next(),
    TileSpec::item(0x6F, "railroad_sign"),
    TileSpec::named(
        0x70,
        TileName::Variants([
            "wall_custom_green",
            "wall_custom_pink",
            "wall_custom_yellow",
            "wall_custom_blue",
        ]),
    ),
    TileSpec::new(0x71, "floor_letter").modifier(Modifier::Letter),
    TileSpec::new(0x72, "purple_floor"),
    TileSpec::new(0x73, "purple_wall"),
    TileSpec::named(MODIFIER_8, TileName::ModifierMarker(1)),
    TileSpec::named(MODIFIER_16, TileName::ModifierMarker(2)),
    TileSpec::named(MODIFIER_32, TileName::ModifierMarker(4)),
    TileSpec::item(0x7A, "score_10"),
    TileSpec::item(0x7B, "score_100"),
    TileSpec::item(0x7C, "score_1000"),
    TileSpec::new(0x7D, "popdown_wall"),
    TileSpec::new(0x7E, "popdown_floor"),
    TileSpec::item(0x7F, "no_sign"),
    TileSpec::item(0x80, "score_2x"),
    TileSpec::item(0x81, "directional_block").args(&[ExtraArg::Direction, ExtraArg::Arrows]),
    TileSpec::actor(0x82, "floor_mimic"),
    TileSpec::item(0x83, "green_bomb"),
    TileSpec::item(0x84, "green_chip"),
    TileSpec::wired(0x87, "button_black"),
    TileSpec::wired(0x88, "light_switch_off"),
    TileSpec::wired(0x89, "light_switch_on"),
    TileSpec::new(0x8A, "thief_keys"),
    TileSpec::actor(0x8B, "ghost"),
    TileSpec::item(0x8C, "foil"),
    TileSpec::new(0x8D, "turtle"),
    TileSpec::item(0x8E, "xray_eye"),
    TileSpec::item(0x8F, "bribe"),
    TileSpec::item(0x90, "speed_boots"),
    TileSpec::item(0x92, "hook"),
];

/// Records produced by the thin wall / canopy byte, in the order they are
/// read (top of the stack first), with their mask bits
pub const THIN_WALL_CANOPY_ORDER: [(u8, &str); 5] = [
    (0x10, "canopy"),
    (0x08, "thinwall_w"),
    (0x04, "thinwall_s"),
    (0x02, "thinwall_e"),
    (0x01, "thinwall_n"),
];

const NO_SPEC: u16 = u16::MAX;

const fn build_forward_table() -> [u16; 256] {
    let mut table = [NO_SPEC; 256];
    let mut i = 0;
    while i < TILE_SPECS.len() {
        table[TILE_SPECS[i].byte as usize] = i as u16;
        i += 1;
    }
    table
}

static FORWARD: [u16; 256] = build_forward_table();

/// Look up the spec for a map byte
pub fn spec_for_byte(byte: u8) -> Option<&'static TileSpec> {
    match FORWARD[byte as usize] {
        NO_SPEC => None,
        index => Some(&TILE_SPECS[index as usize]),
    }
}

/// Reverse table entry: the spec to emit and the modifier to encode with
#[derive(Debug, Clone, Copy)]
pub struct ReverseEntry {
    /// Spec whose byte is emitted
    pub spec: &'static TileSpec,
    /// Modifier used when encoding; for variants this is the fixed index
    pub modifier: Option<Modifier>,
}

static REVERSE: LazyLock<HashMap<&'static str, ReverseEntry>> = LazyLock::new(|| {
    let mut table = HashMap::new();
    for spec in TILE_SPECS {
        match spec.name {
            TileName::Single(name) => {
                // The first byte listed for a name is the canonical one
                table.entry(name).or_insert(ReverseEntry {
                    spec,
                    modifier: spec.modifier,
                });
            }
            TileName::Variants(names) => {
                for (index, name) in names.into_iter().enumerate() {
                    table.entry(name).or_insert(ReverseEntry {
                        spec,
                        modifier: Some(Modifier::Variant(index as u8)),
                    });
                }
            }
            TileName::ThinWallCanopy | TileName::ModifierMarker(_) => {}
        }
    }
    table
});

/// Look up how to encode a tile type
pub fn spec_for_name(name: &str) -> Option<ReverseEntry> {
    REVERSE.get(name).copied()
}

/// Marker byte for a modifier of the given width
pub fn modifier_marker(width: usize) -> Option<u8> {
    match width {
        1 => Some(MODIFIER_8),
        2 => Some(MODIFIER_16),
        4 => Some(MODIFIER_32),
        _ => None,
    }
}

/// Tiles counted towards the level's chip requirement
pub fn is_required_chip(name: &str) -> bool {
    name == "chip"
}

/// Tiles that display a hint
pub fn is_hint(name: &str) -> bool {
    name == "hint"
}

/// Tiles that can only be stored through the thin wall / canopy byte or
/// share it
pub fn is_thin_wall_or_canopy(name: &str) -> bool {
    THIN_WALL_CANOPY_ORDER.iter().any(|&(_, n)| n == name)
}
