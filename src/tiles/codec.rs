//! Cell stack decoding and encoding
//!
//! A map payload is `{width: u8, height: u8}` followed by one variable-length
//! record stack per cell in row-major order. Records are stored top of the
//! stack first; in memory a [`Cell`] is ordered bottom to top.

use super::table::{
    is_hint, is_required_chip, is_thin_wall_or_canopy, modifier_marker, spec_for_byte,
    spec_for_name, TileName, TileSpec, THIN_WALL_CANOPY_ORDER,
};
use crate::common::THIN_WALL_CANOPY;
use crate::cursor::{ByteReader, ByteWriter};
use crate::level::{Cell, Tile};
use crate::{C2mError, Result};

/// Position of a tile inside a decoded map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilePosition {
    /// Row-major cell index
    pub cell: usize,
    /// Index into the cell, bottom = 0
    pub layer: usize,
}

/// A decoded map payload
#[derive(Debug, Clone, Default)]
pub struct MapData {
    /// Width in cells
    pub width: u8,
    /// Height in cells
    pub height: u8,
    /// `width * height` cells, row-major
    pub cells: Vec<Cell>,
    /// Number of required chips found
    pub chips_required: u32,
    /// Hint tiles in reading order
    pub hint_tiles: Vec<TilePosition>,
}

/// Decode an (already inflated) map payload
pub fn decode_map(data: &[u8]) -> Result<MapData> {
    let mut reader = ByteReader::new(data);
    let width = reader.read_u8()?;
    let height = reader.read_u8()?;
    let count = width as usize * height as usize;

    let mut map = MapData {
        width,
        height,
        cells: Vec::with_capacity(count),
        ..Default::default()
    };
    for index in 0..count {
        let cell = decode_cell(&mut reader, index, &mut map)?;
        map.cells.push(cell);
    }

    if !reader.is_empty() {
        log::debug!("{} trailing bytes after map data", reader.remaining());
    }
    Ok(map)
}

fn read_spec(reader: &mut ByteReader<'_>, cell: usize) -> Result<&'static TileSpec> {
    let byte = reader.read_u8()?;
    let spec = spec_for_byte(byte).ok_or(C2mError::UnrecognizedTile { byte, cell })?;
    if let Some(reason) = spec.unsupported {
        return Err(C2mError::UnsupportedTile { byte, reason });
    }
    Ok(spec)
}

/// Decode one cell's stack, counting chips and hint tiles into `map`
fn decode_cell(reader: &mut ByteReader<'_>, index: usize, map: &mut MapData) -> Result<Cell> {
    let mut cell = Cell::new();
    let mut hints = Vec::new();

    loop {
        let mut spec = read_spec(reader, index)?;

        let mut modifier = 0;
        if let TileName::ModifierMarker(width) = spec.name {
            modifier = reader.read_uint(width)?;
            spec = read_spec(reader, index)?;
            if spec.modifier.is_none() && !matches!(spec.name, TileName::Variants(_)) {
                log::warn!(
                    "Got unexpected modifier 0x{:x} for tile 0x{:02x} in cell {}",
                    modifier,
                    spec.byte,
                    index
                );
            }
        }

        let name = match spec.name {
            TileName::Single(name) => name,
            TileName::Variants(names) => *names.get(modifier as usize).ok_or(
                C2mError::InvalidTileVariant {
                    byte: spec.byte,
                    modifier,
                },
            )?,
            TileName::ThinWallCanopy => {
                let mask = reader.read_u8()?;
                for (bit, name) in THIN_WALL_CANOPY_ORDER {
                    if mask & bit != 0 {
                        cell.push(Tile::new(name));
                    }
                }
                // Nothing else applies to these; the stack always goes on
                continue;
            }
            TileName::ModifierMarker(_) => {
                return Err(C2mError::UnsupportedTile {
                    byte: spec.byte,
                    reason: "a modifier cannot apply to another modifier",
                });
            }
        };

        let mut tile = Tile::new(name);
        if let Some(strategy) = spec.modifier {
            strategy.decode(&mut tile, modifier);
        }
        for arg in spec.extra_args {
            let raw = reader.read_uint(arg.width())?;
            arg.decode(&mut tile, raw);
        }

        if is_required_chip(name) {
            map.chips_required += 1;
        }
        if is_hint(name) {
            hints.push(cell.len());
        }
        cell.push(tile);

        if !spec.continues_stack {
            break;
        }
    }

    // Read top-first, stored bottom-first
    cell.reverse();
    let top = cell.len() - 1;
    map.hint_tiles.extend(hints.into_iter().map(|read_index| TilePosition {
        cell: index,
        layer: top - read_index,
    }));
    Ok(cell)
}

/// Encode a map payload (uncompressed)
pub fn encode_map(width: usize, height: usize, cells: &[Cell]) -> Result<Vec<u8>> {
    let (w, h) = match (u8::try_from(width), u8::try_from(height)) {
        (Ok(w), Ok(h)) => (w, h),
        _ => return Err(C2mError::InvalidDimensions { width, height }),
    };
    if cells.len() != width * height {
        return Err(C2mError::CellCountMismatch {
            expected: width * height,
            actual: cells.len(),
        });
    }

    let mut out = ByteWriter::with_capacity(2 + cells.len() * 2);
    out.write_u8(w)?;
    out.write_u8(h)?;
    for (index, cell) in cells.iter().enumerate() {
        encode_cell(&mut out, index, cell)?;
    }
    Ok(out.into_inner())
}

/// Write the smallest modifier prefix that holds `value`; zero writes nothing
pub fn encode_modifier(out: &mut ByteWriter, value: u32) -> Result<()> {
    let width = match value {
        0 => return Ok(()),
        1..=0xFF => 1,
        0x100..=0xFFFF => 2,
        _ => 4,
    };
    let marker = modifier_marker(width).ok_or(C2mError::UnsupportedWidth(width))?;
    out.write_u8(marker)?;
    out.write_uint(width, value)
}

fn encode_cell(out: &mut ByteWriter, index: usize, cell: &Cell) -> Result<()> {
    if cell.is_empty() {
        return Err(C2mError::InvalidCellStack {
            cell: index,
            reason: "cell has no tiles",
        });
    }

    // Top of the stack is written first
    let records: Vec<&Tile> = cell.iter().rev().collect();
    let mut continues = Vec::with_capacity(records.len());
    let mut i = 0;
    while i < records.len() {
        if let Some((mask, taken)) = thin_wall_run(&records[i..]) {
            out.write_u8(THIN_WALL_CANOPY)?;
            out.write_u8(mask)?;
            continues.push(true);
            i += taken;
            continue;
        }

        let tile = records[i];
        let entry =
            spec_for_name(&tile.name).ok_or_else(|| C2mError::UnencodableTile(tile.name.clone()))?;
        let spec = entry.spec;
        if let Some(reason) = spec.unsupported {
            return Err(C2mError::UnsupportedTile {
                byte: spec.byte,
                reason,
            });
        }

        if let Some(strategy) = entry.modifier {
            encode_modifier(out, strategy.encode(tile))?;
        }
        out.write_u8(spec.byte)?;
        for arg in spec.extra_args {
            out.write_uint(arg.width(), arg.encode(tile))?;
        }
        continues.push(spec.continues_stack);
        i += 1;
    }

    let (last, rest) = continues
        .split_last()
        .ok_or(C2mError::InvalidCellStack {
            cell: index,
            reason: "cell has no tiles",
        })?;
    if *last {
        return Err(C2mError::InvalidCellStack {
            cell: index,
            reason: "bottom tile must be terrain",
        });
    }
    if rest.iter().any(|c| !c) {
        return Err(C2mError::InvalidCellStack {
            cell: index,
            reason: "terrain tile above the bottom of the stack",
        });
    }
    Ok(())
}

/// Pack a run of thin walls / canopy starting at `records[0]` into one mask
///
/// A mask decodes in [`THIN_WALL_CANOPY_ORDER`], so the run ends at the
/// first layer that would come back out of place; the rest of the stack is
/// packed by a later run. Returns `None` when the run can be written with
/// ordinary tile bytes, i.e. it holds none of the tiles that only exist in
/// packed form.
fn thin_wall_run(records: &[&Tile]) -> Option<(u8, usize)> {
    let mut mask = 0u8;
    let mut taken = 0;
    let mut next_slot = 0;
    for tile in records {
        let slot = THIN_WALL_CANOPY_ORDER
            .iter()
            .position(|&(_, name)| name == tile.name);
        match slot {
            Some(slot) if slot >= next_slot => {
                mask |= THIN_WALL_CANOPY_ORDER[slot].0;
                next_slot = slot + 1;
                taken += 1;
            }
            _ => break,
        }
    }

    let needs_packing = records[..taken]
        .iter()
        .any(|tile| is_thin_wall_or_canopy(&tile.name) && spec_for_name(&tile.name).is_none());
    needs_packing.then_some((mask, taken))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Direction;

    fn names(cell: &Cell) -> Vec<&str> {
        cell.iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn test_single_floor() {
        let map = decode_map(&[1, 1, 0x01]).unwrap();
        assert_eq!(map.cells.len(), 1);
        assert_eq!(names(&map.cells[0]), vec!["floor"]);
        assert_eq!(map.cells[0][0], Tile::new("floor"));
    }

    #[test]
    fn test_three_record_stack() {
        // player facing east, on a chip, on floor
        let map = decode_map(&[1, 1, 0x16, 0x01, 0x2A, 0x01]).unwrap();
        let cell = &map.cells[0];
        assert_eq!(names(cell), vec!["floor", "chip", "player"]);
        assert_eq!(cell[2].direction, Some(Direction::East));
        assert_eq!(map.chips_required, 1);
    }

    #[test]
    fn test_modifier_applies_to_next_tile() {
        // 16-bit modifier 0x0021 on a floor: wires N + E tunnel bit
        let map = decode_map(&[1, 1, 0x77, 0x21, 0x00, 0x01]).unwrap();
        let floor = &map.cells[0][0];
        assert_eq!(floor.wire_directions, Some(0x01));
        assert_eq!(floor.wire_tunnel_directions, Some(0x02));
    }

    #[test]
    fn test_variant_selection() {
        let map = decode_map(&[2, 1, 0x6B, 0x76, 0x02, 0x70]).unwrap();
        assert_eq!(names(&map.cells[0]), vec!["floor_custom_green"]);
        assert_eq!(names(&map.cells[1]), vec!["wall_custom_yellow"]);

        assert!(matches!(
            decode_map(&[1, 1, 0x76, 0x09, 0x6B]),
            Err(C2mError::InvalidTileVariant {
                byte: 0x6B,
                modifier: 9
            })
        ));
    }

    #[test]
    fn test_thin_wall_canopy_composite() {
        // canopy + north wall, then floor
        let map = decode_map(&[1, 1, 0x6D, 0x11, 0x01]).unwrap();
        assert_eq!(names(&map.cells[0]), vec!["floor", "thinwall_n", "canopy"]);
    }

    #[test]
    fn test_unrecognized_tile() {
        assert!(matches!(
            decode_map(&[2, 1, 0x01, 0x41]),
            Err(C2mError::UnrecognizedTile { byte: 0x41, cell: 1 })
        ));
        assert!(matches!(
            decode_map(&[1, 1, 0x57, 0x00]),
            Err(C2mError::UnsupportedTile { byte: 0x57, .. })
        ));
    }

    #[test]
    fn test_truncated_map() {
        assert!(matches!(
            decode_map(&[2, 2, 0x01, 0x01]),
            Err(C2mError::UnexpectedEof { .. })
        ));
        // Actor missing its direction byte
        assert!(matches!(
            decode_map(&[1, 1, 0x16]),
            Err(C2mError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn test_hint_positions() {
        let map = decode_map(&[2, 1, 0x01, 0x45]).unwrap();
        assert_eq!(map.hint_tiles, vec![TilePosition { cell: 1, layer: 0 }]);
    }

    #[test]
    fn test_modifier_widths() {
        let cases: [(u32, &[u8]); 5] = [
            (0, &[]),
            (1, &[0x76, 0x01]),
            (255, &[0x76, 0xFF]),
            (0x1234, &[0x77, 0x34, 0x12]),
            (0x0001_0000, &[0x78, 0x00, 0x00, 0x01, 0x00]),
        ];
        for (value, expected) in cases {
            let mut out = ByteWriter::new();
            encode_modifier(&mut out, value).unwrap();
            assert_eq!(out.as_slice(), expected, "modifier {value:#x}");
        }
    }

    #[test]
    fn test_encode_stack() {
        let mut player = Tile::new("player");
        player.direction = Some(Direction::West);
        let cell = vec![Tile::new("floor"), Tile::new("chip"), player];
        let bytes = encode_map(1, 1, &[cell]).unwrap();
        assert_eq!(bytes, vec![1, 1, 0x16, 0x03, 0x2A, 0x01]);
    }

    #[test]
    fn test_encode_packs_canopy() {
        let cell = vec![
            Tile::new("floor"),
            Tile::new("thinwall_e"),
            Tile::new("canopy"),
        ];
        let bytes = encode_map(1, 1, &[cell.clone()]).unwrap();
        assert_eq!(bytes, vec![1, 1, 0x6D, 0x12, 0x01]);
        assert_eq!(decode_map(&bytes).unwrap().cells[0], cell);
    }

    #[test]
    fn test_encode_keeps_thin_wall_layer_order() {
        // Canopy below the north wall splits into two masks
        let cell = vec![
            Tile::new("floor"),
            Tile::new("canopy"),
            Tile::new("thinwall_n"),
        ];
        let bytes = encode_map(1, 1, &[cell.clone()]).unwrap();
        assert_eq!(bytes, vec![1, 1, 0x6D, 0x01, 0x6D, 0x10, 0x01]);
        assert_eq!(decode_map(&bytes).unwrap().cells[0], cell);

        // Repeated layers are kept too
        let cell = vec![
            Tile::new("floor"),
            Tile::new("canopy"),
            Tile::new("canopy"),
        ];
        let bytes = encode_map(1, 1, &[cell.clone()]).unwrap();
        assert_eq!(bytes, vec![1, 1, 0x6D, 0x10, 0x6D, 0x10, 0x01]);
        assert_eq!(decode_map(&bytes).unwrap().cells[0], cell);
    }

    #[test]
    fn test_encode_rejects_bad_stacks() {
        assert!(matches!(
            encode_map(1, 1, &[vec![]]),
            Err(C2mError::InvalidCellStack { cell: 0, .. })
        ));
        // Item with nothing underneath
        assert!(matches!(
            encode_map(1, 1, &[vec![Tile::new("chip")]]),
            Err(C2mError::InvalidCellStack { .. })
        ));
        // Two terrain tiles
        assert!(matches!(
            encode_map(1, 1, &[vec![Tile::new("floor"), Tile::new("wall")]]),
            Err(C2mError::InvalidCellStack { .. })
        ));
        assert!(matches!(
            encode_map(1, 1, &[vec![Tile::new("lava")]]),
            Err(C2mError::UnencodableTile(_))
        ));
        assert!(matches!(
            encode_map(2, 2, &[vec![Tile::new("floor")]]),
            Err(C2mError::CellCountMismatch {
                expected: 4,
                actual: 1
            })
        ));
        assert!(matches!(
            encode_map(300, 1, &[]),
            Err(C2mError::InvalidDimensions { .. })
        ));
    }
}
