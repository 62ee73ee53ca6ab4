//! Unpacker for `PACK` / `PRPL` payloads

use crate::common::BACK_REFERENCE_FLAG;
use crate::cursor::ByteReader;
use crate::{C2mError, Result};

/// Decompress a packed payload
///
/// The output must come out at exactly the length declared in the header;
/// anything else is reported as [`C2mError::LengthMismatch`].
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut reader = ByteReader::new(data);
    let expected = reader.read_u16()? as usize;
    let mut output = Vec::with_capacity(expected);

    while !reader.is_empty() {
        let control = reader.read_u8()?;
        if control < BACK_REFERENCE_FLAG {
            // Literal run
            output.extend_from_slice(reader.read_bytes(control as usize)?);
        } else {
            let length = (control - BACK_REFERENCE_FLAG) as usize;
            let distance = reader.read_u8()? as usize;
            copy_back_reference(&mut output, length, distance)?;
        }

        if output.len() > expected {
            return Err(C2mError::LengthMismatch {
                expected,
                actual: output.len(),
            });
        }
    }

    if output.len() != expected {
        return Err(C2mError::LengthMismatch {
            expected,
            actual: output.len(),
        });
    }
    Ok(output)
}

/// Append `length` bytes copied from `distance` bytes back
///
/// The source may overlap the bytes being written (distance < length), so
/// this has to go one byte at a time.
fn copy_back_reference(output: &mut Vec<u8>, length: usize, distance: usize) -> Result<()> {
    if length == 0 {
        return Ok(());
    }
    if distance == 0 || distance > output.len() {
        return Err(C2mError::InvalidBackReference {
            distance,
            position: output.len(),
        });
    }

    let start = output.len() - distance;
    output.reserve(length);
    for i in 0..length {
        let byte = output[start + i];
        output.push(byte);
    }
    Ok(())
}
