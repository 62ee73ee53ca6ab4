//! Tests for the map/replay packer
//!
//! These check exact packed bytes for small inputs as well as round trips
//! over larger, level-shaped data.

use c2m::{compress, compress_with_stats, decompress, C2mError};

/// Literal run followed by an overlapping back-reference
#[test]
fn test_known_packing() -> Result<(), Box<dyn std::error::Error>> {
    let data = b"ABCDABCDABCD";
    let packed = compress(data).ok_or("expected data to pack")?;
    assert_eq!(hex::encode(&packed), "0c0004414243448804");

    let unpacked = decompress(&packed)?;
    assert_eq!(&unpacked[..], data);
    Ok(())
}

/// A hand-written packed stream
#[test]
fn test_known_unpacking() -> Result<(), Box<dyn std::error::Error>> {
    // 7 bytes: "ab" then copy 5 at distance 2
    let packed = hex::decode("07000261628502")?;
    assert_eq!(decompress(&packed)?, b"abababa");
    Ok(())
}

#[test]
fn test_repetitive_input_shrinks() -> Result<(), Box<dyn std::error::Error>> {
    let data = vec![0x01u8; 1000];
    let (packed, stats) = compress_with_stats(&data).ok_or("expected data to pack")?;
    assert!(packed.len() < data.len());
    assert!(stats.ratio() < 10.0);
    assert_eq!(decompress(&packed)?, data);
    Ok(())
}

#[test]
fn test_high_entropy_input_not_packed() {
    // xorshift; no repeats worth copying
    let mut state = 0x2545_F491u32;
    let data: Vec<u8> = (0..4096)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 24) as u8
        })
        .collect();
    assert!(compress(&data).is_none());
}

#[test]
fn test_map_shaped_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    // A 32x32 map: floor everywhere, a wall border, a few chips
    let mut data = vec![32u8, 32];
    for y in 0..32 {
        for x in 0..32 {
            if x == 0 || y == 0 || x == 31 || y == 31 {
                data.push(0x02);
            } else if (x + y) % 11 == 0 {
                data.extend_from_slice(&[0x2A, 0x01]);
            } else {
                data.push(0x01);
            }
        }
    }

    let packed = compress(&data).ok_or("expected map to pack")?;
    assert!(packed.len() < data.len() / 2);
    assert_eq!(decompress(&packed)?, data);
    Ok(())
}

#[test]
fn test_long_literal_runs() -> Result<(), Box<dyn std::error::Error>> {
    // 300 bytes with no 4-byte repeats, then a long run to make packing pay
    let mut data: Vec<u8> = (0..300u32).map(|i| (i * 13 % 256) as u8 ^ (i / 256) as u8).collect();
    data.extend(std::iter::repeat(0x55).take(2000));

    let packed = compress(&data).ok_or("expected data to pack")?;
    // No literal run is longer than 127 bytes
    assert_eq!(packed[2], 0x7F);
    assert_eq!(decompress(&packed)?, data);
    Ok(())
}

#[test]
fn test_corrupt_streams() {
    // Declares 10 bytes, produces 3
    assert!(matches!(
        decompress(&[10, 0, 3, 1, 2, 3]),
        Err(C2mError::LengthMismatch {
            expected: 10,
            actual: 3
        })
    ));

    // Copy from before the start of the output
    assert!(matches!(
        decompress(&[8, 0, 1, 0xAA, 0x84, 0x05]),
        Err(C2mError::InvalidBackReference { .. })
    ));

    // Literal run runs off the end
    assert!(matches!(
        decompress(&[4, 0, 4, 1, 2]),
        Err(C2mError::UnexpectedEof { .. })
    ));

    // Missing length header
    assert!(decompress(&[1]).is_err());
}

#[test]
fn test_empty_stream() -> Result<(), Box<dyn std::error::Error>> {
    assert!(decompress(&[0, 0])?.is_empty());
    assert!(compress(&[]).is_none());
    Ok(())
}
