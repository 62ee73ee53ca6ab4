//! Decoder and encoder configuration

use crate::common::DEFAULT_FORMAT_VERSION;

/// What to do with sections the level record does not model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownSectionPolicy {
    /// Skip them; they are lost when the level is written back
    #[default]
    Drop,
    /// Keep their raw payloads in [`crate::Level::extra_sections`]
    Preserve,
}

/// Options for reading a level
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    /// Handling of `LOCK`, `VERS`, `KEY `, `RDNY` and unrecognized sections
    pub unknown_sections: UnknownSectionPolicy,
}

impl DecodeOptions {
    /// Keep every section the record cannot represent
    pub fn lossless() -> Self {
        Self {
            unknown_sections: UnknownSectionPolicy::Preserve,
        }
    }
}

/// Options for writing a level
#[derive(Debug, Clone)]
pub struct EncodeOptions {
    /// Store the map as `PACK` when compression pays off
    pub compress_map: bool,
    /// Store the replay as `PRPL` when compression pays off
    pub compress_replay: bool,
    /// `CC2M` value used when the level does not carry one
    pub format_version: String,
    /// Write back sections kept in [`crate::Level::extra_sections`]
    pub write_extra_sections: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            compress_map: true,
            compress_replay: true,
            format_version: DEFAULT_FORMAT_VERSION.to_string(),
            write_extra_sections: true,
        }
    }
}

impl EncodeOptions {
    /// Never compress; map and replay are written as `MAP ` and `REPL`
    pub fn uncompressed() -> Self {
        Self {
            compress_map: false,
            compress_replay: false,
            ..Default::default()
        }
    }
}
