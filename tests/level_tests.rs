//! Whole-level decoding and encoding tests
//!
//! Fixtures are small hand-assembled files; each one is checked field by
//! field and then pushed through an encode/decode round trip.

use c2m::tiles::{decode_map, encode_map};
use c2m::{
    decode_level, decode_level_with, encode_level, encode_level_with, parse_level_metadata,
    Action, C2mError, CameraRegion, DecodeOptions, Direction, DirectionSet, EncodeOptions,
    GateKind, InputSet, Level, Replay, SectionTag, Tile, UnknownSectionPolicy,
};

/// CC2M "7", TITL "Hex", OPTN (150s, 9x9), 3x1 MAP: player on floor, chip on floor, exit
const SIMPLE_LEVEL: &str = concat!(
    "4343324d020000003700",
    "5449544c0400000048657800",
    "4f50544e03000000960001",
    "4d41502008000000",
    "0301",
    "160101",
    "2a01",
    "14",
    "454e442000000000",
);

/// 6x1 map exercising modifiers, the thin wall byte and extra args
const MODIFIER_MAP: &str = concat!(
    "0601",
    "760501",   // floor, wired north + south
    "76095c",   // OR gate facing east
    "764171",   // letter floor 'A'
    "7743124f", // railroad switch
    "6d1101",   // canopy + north thin wall on floor
    "81020501", // directional block facing south on floor
);

fn names(cell: &[Tile]) -> Vec<&str> {
    cell.iter().map(|t| t.name.as_str()).collect()
}

#[test]
fn test_simple_fixture() -> Result<(), Box<dyn std::error::Error>> {
    let data = hex::decode(SIMPLE_LEVEL)?;
    let level = decode_level(&data)?;

    assert_eq!(level.format_version.as_deref(), Some("7"));
    assert_eq!(level.title, "Hex");
    assert_eq!(level.author, None);
    assert_eq!(level.time_limit, 150);
    assert_eq!(level.viewport_size, 9);
    assert_eq!((level.size_x, level.size_y), (3, 1));
    assert_eq!(level.chips_required, 1);

    assert_eq!(names(&level.linear_cells[0]), vec!["floor", "player"]);
    assert_eq!(level.linear_cells[0][1].direction, Some(Direction::East));
    assert_eq!(names(&level.linear_cells[1]), vec!["floor", "chip"]);
    assert_eq!(names(&level.linear_cells[2]), vec!["exit"]);
    assert!(level.replay.is_none());
    Ok(())
}

#[test]
fn test_simple_fixture_is_byte_exact() -> Result<(), Box<dyn std::error::Error>> {
    let data = hex::decode(SIMPLE_LEVEL)?;
    let level = decode_level(&data)?;
    let encoded = encode_level_with(&level, &EncodeOptions::uncompressed())?;
    assert_eq!(hex::encode(&encoded), SIMPLE_LEVEL);
    Ok(())
}

#[test]
fn test_modifier_map() -> Result<(), Box<dyn std::error::Error>> {
    let data = hex::decode(MODIFIER_MAP)?;
    let map = decode_map(&data)?;
    let cells = &map.cells;

    assert_eq!(cells[0][0].wire_directions, Some(0x05));
    assert_eq!(cells[0][0].wire_tunnel_directions, None);

    assert_eq!(cells[1][0].gate, Some(GateKind::Or));
    assert_eq!(cells[1][0].direction, Some(Direction::East));

    assert_eq!(cells[2][0].glyph, Some('A'));

    let track = cells[3][0].railroad.ok_or("railroad not decoded")?;
    assert_eq!(track.tracks, 0x03);
    assert_eq!(track.switch, Some(2));
    assert_eq!(track.entered_direction, Direction::East);

    assert_eq!(names(&cells[4]), vec!["floor", "thinwall_n", "canopy"]);

    assert_eq!(names(&cells[5]), vec!["floor", "directional_block"]);
    let block = &cells[5][1];
    assert_eq!(block.direction, Some(Direction::South));
    let arrows = block.arrows.ok_or("arrows not decoded")?;
    assert!(arrows.has(Direction::North));
    assert!(arrows.has(Direction::South));
    assert!(!arrows.has(Direction::East));

    // Every record here has an encoder, so the payload comes back unchanged
    let encoded = encode_map(map.width as usize, map.height as usize, &map.cells)?;
    assert_eq!(hex::encode(encoded), MODIFIER_MAP);
    Ok(())
}

#[test]
fn test_round_trip_is_stable() -> Result<(), Box<dyn std::error::Error>> {
    let mut level = Level::new(12, 10);
    level.title = "Round trip".into();
    level.author = Some("Tester".into());
    level.hint = "Level hint".into();
    level.comment = "Made by hand\nover two lines".into();
    level.time_limit = 500;
    level.viewport_size = 10;
    level.use_cc1_boots = true;
    level.blob_behavior = 2;
    level.camera_regions = vec![
        CameraRegion {
            x: 0,
            y: 0,
            width: 10,
            height: 10,
        },
        CameraRegion {
            x: 2,
            y: 0,
            width: 10,
            height: 10,
        },
    ];

    let mut hint = Tile::new("hint");
    hint.hint_text = Some("Tile hint".into());
    level.linear_cells[3] = vec![hint];
    level.linear_cells[4] = vec![Tile::new("hint")];
    level.linear_cells[5].push(Tile::new("player").with_direction(Direction::West));
    level.linear_cells[6].push(Tile::new("chip"));
    level.linear_cells[7].push(Tile::new("chip"));
    level.linear_cells[8] = vec![Tile::new("wall_custom_blue")];
    let mut letter = Tile::new("floor_letter");
    letter.glyph = Some('⬅');
    level.linear_cells[9] = vec![letter];
    let mut gate = Tile::new("logic_gate").with_direction(Direction::South);
    gate.gate = Some(GateKind::Counter(4));
    level.linear_cells[10] = vec![gate];
    let mut steel = Tile::new("steel");
    steel.wire_directions = Some(0x0F);
    steel.wire_tunnel_directions = Some(0x03);
    level.linear_cells[11] = vec![steel];
    level.replay = Some(Replay::new(vec![0, 3, 7, 3, 0x10, 6, 0x08, 0xFF]));

    let first = decode_level(&encode_level(&level)?)?;
    assert_eq!(first.title, level.title);
    assert_eq!(first.author, level.author);
    assert_eq!(first.hint, level.hint);
    assert_eq!(first.comment, level.comment);
    assert_eq!(first.time_limit, 500);
    assert_eq!(first.viewport_size, 10);
    assert!(first.use_cc1_boots);
    assert_eq!(first.blob_behavior, 2);
    assert_eq!(first.camera_regions, level.camera_regions);
    assert_eq!(first.chips_required, 2);
    assert_eq!(first.replay, level.replay);

    assert_eq!(first.linear_cells[3][0].hint_text.as_deref(), Some("Tile hint"));
    assert_eq!(first.linear_cells[4][0].hint_text, None);
    assert_eq!(first.linear_cells[8][0].name, "wall_custom_blue");
    assert_eq!(first.linear_cells[9][0].glyph, Some('⬅'));
    // Counters always face north
    assert_eq!(first.linear_cells[10][0].direction, Some(Direction::North));
    assert_eq!(first.linear_cells[10][0].gate, Some(GateKind::Counter(4)));
    assert_eq!(first.linear_cells[11][0].wire_tunnel_directions, Some(0x03));

    let second = decode_level(&encode_level(&first)?)?;
    assert_eq!(second, first);
    Ok(())
}

#[test]
fn test_note_hints_in_reading_order() -> Result<(), Box<dyn std::error::Error>> {
    let mut level = Level::new(3, 1);
    for (i, text) in ["one", "two", "three"].into_iter().enumerate() {
        let mut hint = Tile::new("hint");
        hint.hint_text = Some(text.to_string());
        level.linear_cells[i] = vec![hint];
    }

    let decoded = decode_level(&encode_level(&level)?)?;
    let texts: Vec<Option<&str>> = decoded
        .linear_cells
        .iter()
        .map(|cell| cell[0].hint_text.as_deref())
        .collect();
    assert_eq!(texts, vec![Some("one"), Some("two"), Some("three")]);
    assert_eq!(decoded.comment, "");
    Ok(())
}

#[test]
fn test_preserve_unknown_sections() -> Result<(), Box<dyn std::error::Error>> {
    let mut data = hex::decode(SIMPLE_LEVEL)?;
    // Splice a KEY section and an unknown one in before END
    let end = data.len() - 8;
    let mut extra = hex::decode("4b4559200200000001024142434401000000ff")?;
    let tail = data.split_off(end);
    data.append(&mut extra);
    data.extend(tail);

    let dropped = decode_level(&data)?;
    assert!(dropped.extra_sections.is_empty());

    let options = DecodeOptions {
        unknown_sections: UnknownSectionPolicy::Preserve,
    };
    let kept = decode_level_with(&data, &options)?;
    assert_eq!(kept.extra_sections.len(), 2);
    assert_eq!(kept.extra_sections[0].tag, SectionTag::KEY);
    assert_eq!(kept.extra_sections[0].payload, vec![1, 2]);
    assert_eq!(kept.extra_sections[1].tag, SectionTag::try_from("ABCD")?);

    let encoded = encode_level_with(&kept, &EncodeOptions::uncompressed())?;
    assert_eq!(encoded, data);

    let stripped = encode_level_with(
        &kept,
        &EncodeOptions {
            write_extra_sections: false,
            ..EncodeOptions::uncompressed()
        },
    )?;
    assert_eq!(hex::encode(stripped), SIMPLE_LEVEL);
    Ok(())
}

#[test]
fn test_replay_through_level() -> Result<(), Box<dyn std::error::Error>> {
    let mut data = hex::decode(SIMPLE_LEVEL)?;
    let end = data.len() - 8;
    let tail = data.split_off(end);
    data.extend(hex::decode("5245504c060000000000000601ff")?);
    data.extend(tail);

    let level = decode_level(&data)?;
    let replay = level.replay.ok_or("replay missing")?;
    let ticks: Vec<InputSet> = replay.inputs().collect();
    assert_eq!(ticks, vec![InputSet::empty(), InputSet::empty()]);
    assert!(!ticks.iter().any(|t| t.holds(Action::Drop)));
    Ok(())
}

#[test]
fn test_metadata_only() -> Result<(), Box<dyn std::error::Error>> {
    let data = hex::decode(SIMPLE_LEVEL)?;
    assert_eq!(parse_level_metadata(&data)?.title.as_deref(), Some("Hex"));
    Ok(())
}

#[test]
fn test_malformed_container() {
    // TITL claims 16 bytes, 4 follow
    let data = hex::decode("5449544c1000000048657800").unwrap();
    match decode_level(&data) {
        Err(C2mError::SectionOverrun { tag, excess, .. }) => {
            assert_eq!(tag, "TITL");
            assert_eq!(excess, 12);
        }
        other => panic!("expected overrun, got {:?}", other),
    }
}

#[test]
fn test_bad_map_records() {
    // Unknown byte
    let err = decode_map(&[1, 1, 0x41]).unwrap_err();
    assert!(matches!(err, C2mError::UnrecognizedTile { byte: 0x41, cell: 0 }));

    // Known but unsupported tile
    let err = decode_map(&[1, 1, 0x57, 0x00, 0x01]).unwrap_err();
    assert!(matches!(err, C2mError::UnsupportedTile { byte: 0x57, .. }));

    // Custom floor with a colour index past the list
    let err = decode_map(&[1, 1, 0x76, 0x07, 0x6B]).unwrap_err();
    assert!(matches!(
        err,
        C2mError::InvalidTileVariant {
            byte: 0x6B,
            modifier: 7
        }
    ));

    // Stack runs off the end of the payload
    assert!(matches!(
        decode_map(&[1, 1, 0x2A]),
        Err(C2mError::UnexpectedEof { .. })
    ));
}

#[test]
fn test_invalid_stacks_rejected_on_encode() {
    // An actor with nothing under it
    let mut level = Level::new(1, 1);
    level.linear_cells[0] = vec![Tile::new("player")];
    assert!(matches!(
        encode_level(&level),
        Err(C2mError::InvalidCellStack { cell: 0, .. })
    ));

    // Two terrain tiles in one cell
    level.linear_cells[0] = vec![Tile::new("floor"), Tile::new("wall")];
    assert!(matches!(
        encode_level(&level),
        Err(C2mError::InvalidCellStack { .. })
    ));

    // A name with no map byte
    level.linear_cells[0] = vec![Tile::new("lava")];
    assert!(matches!(
        encode_level(&level),
        Err(C2mError::UnencodableTile(ref name)) if name == "lava"
    ));

    // Wrong number of cells
    level.linear_cells.push(vec![Tile::new("floor")]);
    assert!(matches!(
        encode_level(&level),
        Err(C2mError::CellCountMismatch {
            expected: 1,
            actual: 2
        })
    ));
}

#[test]
fn test_arrows_default_to_empty() -> Result<(), Box<dyn std::error::Error>> {
    let mut level = Level::new(1, 1);
    level.linear_cells[0].push(Tile::new("directional_block"));
    let decoded = decode_level(&encode_level(&level)?)?;
    let block = &decoded.linear_cells[0][1];
    assert_eq!(block.arrows, Some(DirectionSet::empty()));
    assert_eq!(block.direction, Some(Direction::North));
    Ok(())
}
