//! Greedy single-pass packer

use super::matcher::find_longest_match;
use crate::common::{CompressionStats, BACK_REFERENCE_FLAG, MAX_RUN_LENGTH};
use crate::cursor::ByteWriter;

/// Compress `data`, or return `None` if packing would not make it smaller
///
/// A `None` result means the caller should store the payload raw (`MAP `
/// instead of `PACK`, `REPL` instead of `PRPL`). Inputs longer than 65535
/// bytes cannot be described by the length header and are never packed.
pub fn compress(data: &[u8]) -> Option<Vec<u8>> {
    compress_with_stats(data).map(|(packed, _)| packed)
}

/// Compress `data` and report what the packer emitted
pub fn compress_with_stats(data: &[u8]) -> Option<(Vec<u8>, CompressionStats)> {
    let declared_len = u16::try_from(data.len()).ok()?;

    let mut out = ByteWriter::with_capacity(data.len());
    out.write_u16(declared_len).ok()?;

    let mut stats = CompressionStats {
        input_bytes: data.len(),
        ..Default::default()
    };

    let mut pos = 0;
    let mut pending = 0;
    while pos < data.len() {
        let found = find_longest_match(data, pos);
        let do_copy = found.is_worthwhile();

        // Queue the byte before flushing, so the last byte of the input
        // ends up in the final literal run
        if !do_copy {
            pending += 1;
            pos += 1;
        }

        if pending > 0 && (do_copy || pending == MAX_RUN_LENGTH || pos >= data.len()) {
            out.write_u8(pending as u8).ok()?;
            out.write_bytes(&data[pos - pending..pos]).ok()?;
            stats.literal_count += pending;
            pending = 0;
        }

        if do_copy {
            out.write_u8(BACK_REFERENCE_FLAG + found.length as u8).ok()?;
            out.write_u8(found.distance as u8).ok()?;
            stats.match_count += 1;
            stats.longest_match = stats.longest_match.max(found.length);
            pos += found.length;
        }

        if out.len() > data.len() {
            return None;
        }
    }

    // An empty input still costs the header
    if out.len() > data.len() {
        return None;
    }

    stats.output_bytes = out.len();
    Some((out.into_inner(), stats))
}
