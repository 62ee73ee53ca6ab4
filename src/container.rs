//! Section container and whole-level encoding
//!
//! A level file is a flat list of sections, each an 8-byte header
//! (`tag[4]`, `len: u32 LE`) followed by `len` bytes of payload. The list
//! ends at an `END ` section or at the end of the buffer, whichever comes
//! first.

use crate::compression::{compress, decompress};
use crate::cursor::{ByteReader, ByteWriter};
use crate::level::{CameraRegion, Level, LevelMetadata};
use crate::options::{DecodeOptions, EncodeOptions, UnknownSectionPolicy};
use crate::replay::Replay;
use crate::tiles::table::is_hint;
use crate::tiles::{decode_map, encode_map};
use crate::{C2mError, Result};
use byteorder::{ByteOrder, LittleEndian};
use std::fmt;
use std::io::{Read, Write};

/// Size of a section header
pub const SECTION_HEADER_SIZE: usize = 8;

/// Line marker separating the author's comment from per-tile hints in `NOTE`
pub const CLUE_MARKER: &str = "[CLUE]";

const OPTN_TIME_LIMIT: usize = 0;
const OPTN_VIEWPORT: usize = 2;
const OPTN_CC1_BOOTS: usize = 23;
const OPTN_BLOB_BEHAVIOR: usize = 24;
const OPTN_FULL_SIZE: usize = 25;

/// Four-byte section tag
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SectionTag([u8; 4]);

impl SectionTag {
    /// Format version string
    pub const CC2M: SectionTag = SectionTag(*b"CC2M");
    /// Editor lock
    pub const LOCK: SectionTag = SectionTag(*b"LOCK");
    /// Editor version
    pub const VERS: SectionTag = SectionTag(*b"VERS");
    /// Title
    pub const TITL: SectionTag = SectionTag(*b"TITL");
    /// Author
    pub const AUTH: SectionTag = SectionTag(*b"AUTH");
    /// Level-wide hint
    pub const CLUE: SectionTag = SectionTag(*b"CLUE");
    /// Comment and per-tile hints
    pub const NOTE: SectionTag = SectionTag(*b"NOTE");
    /// Level options
    pub const OPTN: SectionTag = SectionTag(*b"OPTN");
    /// Uncompressed map
    pub const MAP: SectionTag = SectionTag(*b"MAP ");
    /// Compressed map
    pub const PACK: SectionTag = SectionTag(*b"PACK");
    /// Encryption key
    pub const KEY: SectionTag = SectionTag(*b"KEY ");
    /// Uncompressed replay
    pub const REPL: SectionTag = SectionTag(*b"REPL");
    /// Compressed replay
    pub const PRPL: SectionTag = SectionTag(*b"PRPL");
    /// Read-only marker
    pub const RDNY: SectionTag = SectionTag(*b"RDNY");
    /// Camera regions
    pub const LXCM: SectionTag = SectionTag(*b"LXCM");
    /// End of file
    pub const END: SectionTag = SectionTag(*b"END ");

    /// Wrap raw tag bytes
    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// Raw tag bytes
    pub const fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl TryFrom<&str> for SectionTag {
    type Error = C2mError;

    fn try_from(value: &str) -> Result<Self> {
        let bytes: [u8; 4] = value
            .as_bytes()
            .try_into()
            .map_err(|_| C2mError::InvalidSectionTag(value.to_string()))?;
        if !bytes.is_ascii() {
            return Err(C2mError::InvalidSectionTag(value.to_string()));
        }
        Ok(Self(bytes))
    }
}

impl fmt::Display for SectionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if b.is_ascii_graphic() || b == b' ' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{:02x}", b)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for SectionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SectionTag(\"{}\")", self)
    }
}

/// An owned section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Section tag
    pub tag: SectionTag,
    /// Raw payload
    pub payload: Vec<u8>,
}

/// A section borrowed from the input buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSection<'a> {
    /// Section tag
    pub tag: SectionTag,
    /// Offset of the section header in the buffer
    pub offset: usize,
    /// Payload bytes
    pub payload: &'a [u8],
}

impl RawSection<'_> {
    /// Copy into an owned [`Section`]
    pub fn to_section(&self) -> Section {
        Section {
            tag: self.tag,
            payload: self.payload.to_vec(),
        }
    }
}

/// Iterator over the sections of a level file
///
/// Stops after `END ` (which is not yielded) or when the buffer is used up.
/// Structural errors are yielded once, after which the iterator is fused.
#[derive(Debug)]
pub struct SectionReader<'a> {
    reader: ByteReader<'a>,
    done: bool,
}

impl<'a> SectionReader<'a> {
    /// Start reading sections from the beginning of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            reader: ByteReader::new(data),
            done: false,
        }
    }

    fn read_section(&mut self) -> Result<Option<RawSection<'a>>> {
        if self.reader.is_empty() {
            return Ok(None);
        }

        let offset = self.reader.position();
        if self.reader.remaining() < SECTION_HEADER_SIZE {
            return Err(C2mError::TruncatedSectionHeader { offset });
        }
        let tag = SectionTag(self.reader.read_array::<4>()?);
        let len = self.reader.read_u32()? as usize;

        if len > self.reader.remaining() {
            return Err(C2mError::SectionOverrun {
                offset,
                tag: tag.to_string(),
                excess: len - self.reader.remaining(),
            });
        }
        if tag == SectionTag::END {
            return Ok(None);
        }

        let payload = self.reader.read_bytes(len)?;
        Ok(Some(RawSection {
            tag,
            offset,
            payload,
        }))
    }
}

impl<'a> Iterator for SectionReader<'a> {
    type Item = Result<RawSection<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_section() {
            Ok(Some(section)) => Some(Ok(section)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Builder for a level file
///
/// Sections are written in the order they are added; `END ` is appended by
/// [`finish`](Self::finish).
#[derive(Debug, Default)]
pub struct SectionWriter {
    out: ByteWriter,
}

impl SectionWriter {
    /// Create an empty file
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a section
    pub fn add_section(&mut self, tag: SectionTag, payload: &[u8]) -> Result<()> {
        if tag == SectionTag::END {
            log::debug!("Ignoring explicit END section");
            return Ok(());
        }
        self.out.write_bytes(tag.as_bytes())?;
        self.out.write_u32(payload.len() as u32)?;
        self.out.write_bytes(payload)
    }

    /// Append a NUL-terminated string section
    pub fn add_string_section(&mut self, tag: SectionTag, value: &str) -> Result<()> {
        let mut payload = encode_string(value);
        payload.push(0);
        self.add_section(tag, &payload)
    }

    /// Append `END ` and return the file bytes
    pub fn finish(mut self) -> Result<Vec<u8>> {
        self.out.write_bytes(SectionTag::END.as_bytes())?;
        self.out.write_u32(0)?;
        Ok(self.out.into_inner())
    }
}

/// Single-byte text, one char per byte
fn decode_string(payload: &[u8]) -> String {
    let payload = payload.strip_suffix(&[0]).unwrap_or(payload);
    let text: String = payload.iter().map(|&b| b as char).collect();
    text.replace("\r\n", "\n")
}

fn encode_string(value: &str) -> Vec<u8> {
    value
        .chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

/// Split a `NOTE` into the comment and the per-tile hints
fn split_note(text: &str) -> (String, Vec<String>) {
    let mut parts: Vec<Vec<&str>> = vec![Vec::new()];
    for line in text.split('\n') {
        if line.contains(CLUE_MARKER) {
            parts.push(Vec::new());
        } else if let Some(part) = parts.last_mut() {
            part.push(line);
        }
    }

    let mut parts = parts.into_iter().map(|lines| lines.join("\n"));
    let comment = parts.next().unwrap_or_default();
    (comment, parts.collect())
}

fn join_note(comment: &str, hints: &[String]) -> String {
    let mut note = comment.to_string();
    for hint in hints {
        note.push('\n');
        note.push_str(CLUE_MARKER);
        note.push('\n');
        note.push_str(hint);
    }
    note
}

/// Read `OPTN`; a short payload leaves the remaining fields at their defaults
fn read_options(payload: &[u8], level: &mut Level) -> Result<()> {
    let Some(time_limit) = payload.get(OPTN_TIME_LIMIT..OPTN_TIME_LIMIT + 2) else {
        return Ok(());
    };
    level.time_limit = LittleEndian::read_u16(time_limit);

    let Some(&viewport) = payload.get(OPTN_VIEWPORT) else {
        return Ok(());
    };
    level.viewport_size = match viewport {
        0 => 10,
        1 => 9,
        // split-screen, treated as a normal 10x10 view
        2 => 10,
        code => return Err(C2mError::UnrecognizedViewport(code)),
    };

    // Solution flags, hash and logic-hiding flag sit between the viewport
    // and the boots flag; none of them are kept.
    let Some(&cc1_boots) = payload.get(OPTN_CC1_BOOTS) else {
        return Ok(());
    };
    level.use_cc1_boots = cc1_boots != 0;

    if let Some(&blob) = payload.get(OPTN_BLOB_BEHAVIOR) {
        level.blob_behavior = blob;
    }
    Ok(())
}

fn write_options(level: &Level) -> Vec<u8> {
    let full = level.use_cc1_boots || level.blob_behavior != 0;
    let mut payload = vec![0u8; if full { OPTN_FULL_SIZE } else { 3 }];
    LittleEndian::write_u16(&mut payload[OPTN_TIME_LIMIT..OPTN_TIME_LIMIT + 2], level.time_limit);
    payload[OPTN_VIEWPORT] = match level.viewport_size {
        9 => 1,
        _ => 0,
    };
    if full {
        payload[OPTN_CC1_BOOTS] = u8::from(level.use_cc1_boots);
        payload[OPTN_BLOB_BEHAVIOR] = level.blob_behavior;
    }
    payload
}

fn read_camera_regions(payload: &[u8]) -> Result<Vec<CameraRegion>> {
    if payload.len() % 4 != 0 {
        return Err(C2mError::InvalidCameraRegions(payload.len()));
    }
    Ok(payload
        .chunks_exact(4)
        .map(|c| CameraRegion {
            x: c[0],
            y: c[1],
            width: c[2],
            height: c[3],
        })
        .collect())
}

fn write_camera_regions(regions: &[CameraRegion]) -> Vec<u8> {
    regions
        .iter()
        .flat_map(|r| [r.x, r.y, r.width, r.height])
        .collect()
}

/// Decode a level file with default options
pub fn decode_level(buf: &[u8]) -> Result<Level> {
    decode_level_with(buf, &DecodeOptions::default())
}

/// Decode a level file
pub fn decode_level_with(buf: &[u8], options: &DecodeOptions) -> Result<Level> {
    let mut level = Level::default();
    let mut hints = Vec::new();
    let mut hint_tiles = Vec::new();

    let keep = |level: &mut Level, section: &RawSection<'_>| {
        if options.unknown_sections == UnknownSectionPolicy::Preserve {
            level.extra_sections.push(section.to_section());
        }
    };

    for section in SectionReader::new(buf) {
        let section = section?;
        log::trace!(
            "Section {} at {} ({} bytes)",
            section.tag,
            section.offset,
            section.payload.len()
        );

        match section.tag {
            SectionTag::CC2M => {
                level.format_version = Some(decode_string(section.payload));
            }
            SectionTag::TITL => level.title = decode_string(section.payload),
            SectionTag::AUTH => level.author = Some(decode_string(section.payload)),
            SectionTag::CLUE => level.hint = decode_string(section.payload),
            SectionTag::NOTE => {
                let (comment, note_hints) = split_note(&decode_string(section.payload));
                level.comment = comment;
                hints = note_hints;
            }
            SectionTag::OPTN => read_options(section.payload, &mut level)?,
            SectionTag::MAP | SectionTag::PACK => {
                let inflated;
                let data = if section.tag == SectionTag::PACK {
                    inflated = decompress(section.payload)?;
                    &inflated[..]
                } else {
                    section.payload
                };
                let map = decode_map(data)?;
                level.size_x = map.width as usize;
                level.size_y = map.height as usize;
                level.linear_cells = map.cells;
                level.chips_required = map.chips_required;
                hint_tiles = map.hint_tiles;
            }
            SectionTag::REPL => level.replay = Some(Replay::new(section.payload.to_vec())),
            SectionTag::PRPL => level.replay = Some(Replay::new(decompress(section.payload)?)),
            SectionTag::LXCM => level.camera_regions = read_camera_regions(section.payload)?,
            SectionTag::LOCK | SectionTag::VERS => {
                log::debug!("{}: {:?}", section.tag, decode_string(section.payload));
                keep(&mut level, &section);
            }
            SectionTag::KEY | SectionTag::RDNY => {
                log::debug!("Skipping {} section", section.tag);
                keep(&mut level, &section);
            }
            tag => {
                log::warn!("Unrecognized section {} at offset {}", tag, section.offset);
                keep(&mut level, &section);
            }
        }
    }

    if hint_tiles.len() != hints.len() {
        log::debug!(
            "{} hint tiles but {} hints in NOTE",
            hint_tiles.len(),
            hints.len()
        );
    }
    for (i, pos) in hint_tiles.iter().enumerate() {
        if let Some(tile) = level
            .linear_cells
            .get_mut(pos.cell)
            .and_then(|cell| cell.get_mut(pos.layer))
        {
            tile.hint_text = hints.get(i).cloned();
        }
    }

    Ok(level)
}

/// Read only the title, without decoding the map
pub fn parse_level_metadata(buf: &[u8]) -> Result<LevelMetadata> {
    for section in SectionReader::new(buf) {
        let section = section?;
        if section.tag == SectionTag::TITL {
            return Ok(LevelMetadata {
                title: Some(decode_string(section.payload)),
            });
        }
    }
    Ok(LevelMetadata::default())
}

/// Encode a level with default options
pub fn encode_level(level: &Level) -> Result<Vec<u8>> {
    encode_level_with(level, &EncodeOptions::default())
}

/// Encode a level
pub fn encode_level_with(level: &Level, options: &EncodeOptions) -> Result<Vec<u8>> {
    let map = encode_map(level.size_x, level.size_y, &level.linear_cells)?;

    let mut file = SectionWriter::new();
    file.add_string_section(
        SectionTag::CC2M,
        level
            .format_version
            .as_deref()
            .unwrap_or(&options.format_version),
    )?;
    if !level.title.is_empty() {
        file.add_string_section(SectionTag::TITL, &level.title)?;
    }
    if let Some(author) = &level.author {
        file.add_string_section(SectionTag::AUTH, author)?;
    }
    if !level.hint.is_empty() {
        file.add_string_section(SectionTag::CLUE, &level.hint)?;
    }
    file.add_section(SectionTag::OPTN, &write_options(level))?;
    if !level.camera_regions.is_empty() {
        file.add_section(SectionTag::LXCM, &write_camera_regions(&level.camera_regions))?;
    }

    // Hints in the same order the decoder attaches them: cells in reading
    // order, each stack from the top down
    let mut hints: Vec<Option<&str>> = level
        .linear_cells
        .iter()
        .flat_map(|cell| cell.iter().rev())
        .filter(|tile| is_hint(&tile.name))
        .map(|tile| tile.hint_text.as_deref())
        .collect();
    // Hint tiles past the end of the list decode without text
    while hints.last() == Some(&None) {
        hints.pop();
    }
    let hints: Vec<String> = hints
        .into_iter()
        .map(|h| h.unwrap_or_default().to_string())
        .collect();
    if !level.comment.is_empty() || !hints.is_empty() {
        file.add_string_section(SectionTag::NOTE, &join_note(&level.comment, &hints))?;
    }

    match options.compress_map.then(|| compress(&map)).flatten() {
        Some(packed) => file.add_section(SectionTag::PACK, &packed)?,
        None => file.add_section(SectionTag::MAP, &map)?,
    }

    if let Some(replay) = &level.replay {
        let bytes = replay.as_bytes();
        match options.compress_replay.then(|| compress(bytes)).flatten() {
            Some(packed) => file.add_section(SectionTag::PRPL, &packed)?,
            None => file.add_section(SectionTag::REPL, bytes)?,
        }
    }

    if options.write_extra_sections {
        for section in &level.extra_sections {
            file.add_section(section.tag, &section.payload)?;
        }
    }

    file.finish()
}

/// Read a whole level from `reader`
pub fn read_level<R: Read>(mut reader: R, options: &DecodeOptions) -> Result<Level> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    decode_level_with(&buf, options)
}

/// Encode `level` and write it to `writer`
pub fn write_level<W: Write>(mut writer: W, level: &Level, options: &EncodeOptions) -> Result<()> {
    let bytes = encode_level_with(level, options)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}
