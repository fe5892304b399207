//! Channel-0 LSB codec with a self-describing length prefix
//!
//! Layout, one bit per channel-0 sample in raster order:
//! ```text
//! samples  0..32  payload length, u32 big-endian
//! samples 32..    payload bytes, most significant bit first
//! ```

use image::RgbaImage;

use sealdrop_core::{SealError, SealResult};

/// Bits consumed by the length prefix.
pub const LENGTH_PREFIX_BITS: usize = 32;

/// Total channel-0 samples (= bits) available in a carrier.
pub fn capacity_bits(carrier: &RgbaImage) -> usize {
    (carrier.width() as usize) * (carrier.height() as usize)
}

/// Largest payload, in bytes, a carrier can hold after the length prefix.
pub fn capacity_bytes(carrier: &RgbaImage) -> usize {
    capacity_bits(carrier).saturating_sub(LENGTH_PREFIX_BITS) / 8
}

/// Embed `payload` into the carrier's channel-0 LSBs.
///
/// The capacity check runs before any sample is written: an oversized
/// payload returns [`SealError::Capacity`] and leaves the carrier
/// untouched. The pixel buffer is exclusively owned by this call.
pub fn embed(carrier: &mut RgbaImage, payload: &[u8]) -> SealResult<()> {
    let available = capacity_bits(carrier);
    let needed = LENGTH_PREFIX_BITS + payload.len() * 8;
    if needed > available {
        tracing::debug!(needed, available, "payload does not fit carrier");
        return Err(SealError::Capacity { needed, available });
    }

    let len = payload.len() as u32;
    for i in 0..LENGTH_PREFIX_BITS {
        let bit = ((len >> (31 - i)) & 1) as u8;
        write_bit(carrier, i, bit);
    }

    for (byte_index, byte) in payload.iter().enumerate() {
        for bit_index in 0..8 {
            let bit = (byte >> (7 - bit_index)) & 1;
            write_bit(carrier, LENGTH_PREFIX_BITS + byte_index * 8 + bit_index, bit);
        }
    }

    Ok(())
}

/// Read a payload back out of the carrier's channel-0 LSBs.
///
/// The length prefix is validated against the remaining capacity before
/// any payload sample is read; an out-of-range length is a format error,
/// never an out-of-bounds read.
pub fn extract(carrier: &RgbaImage) -> SealResult<Vec<u8>> {
    let available = capacity_bits(carrier);
    if available < LENGTH_PREFIX_BITS {
        return Err(SealError::Format(
            "carrier too small for a length prefix".into(),
        ));
    }

    let mut len: u32 = 0;
    for i in 0..LENGTH_PREFIX_BITS {
        len = (len << 1) | u32::from(read_bit(carrier, i));
    }
    let len = len as usize;
    if len > (available - LENGTH_PREFIX_BITS) / 8 {
        return Err(SealError::Format(format!(
            "length prefix {len} exceeds carrier capacity"
        )));
    }

    let mut payload = Vec::with_capacity(len);
    for byte_index in 0..len {
        let mut byte = 0u8;
        for bit_index in 0..8 {
            byte = (byte << 1)
                | read_bit(carrier, LENGTH_PREFIX_BITS + byte_index * 8 + bit_index);
        }
        payload.push(byte);
    }
    Ok(payload)
}

fn write_bit(carrier: &mut RgbaImage, sample: usize, bit: u8) {
    let (x, y) = sample_coords(carrier, sample);
    let pixel = carrier.get_pixel_mut(x, y);
    pixel.0[0] = (pixel.0[0] & 0xFE) | bit;
}

fn read_bit(carrier: &RgbaImage, sample: usize) -> u8 {
    let (x, y) = sample_coords(carrier, sample);
    carrier.get_pixel(x, y).0[0] & 1
}

fn sample_coords(carrier: &RgbaImage, sample: usize) -> (u32, u32) {
    let width = carrier.width() as usize;
    ((sample % width) as u32, (sample / width) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use proptest::prelude::*;

    fn test_carrier(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            let v = ((x * 7 + y * 13) % 256) as u8;
            Rgba([v, v.wrapping_add(40), v.wrapping_add(80), 255])
        })
    }

    #[test]
    fn test_embed_extract_roundtrip() {
        let mut carrier = test_carrier(64, 64);
        let payload = b"bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi";
        embed(&mut carrier, payload).unwrap();
        assert_eq!(extract(&carrier).unwrap(), payload);
    }

    #[test]
    fn test_empty_payload_roundtrip() {
        let mut carrier = test_carrier(16, 16);
        embed(&mut carrier, b"").unwrap();
        assert_eq!(extract(&carrier).unwrap(), b"");
    }

    #[test]
    fn test_exact_fit_roundtrip() {
        let mut carrier = test_carrier(64, 64);
        let max = capacity_bytes(&carrier);
        let payload: Vec<u8> = (0..max).map(|i| (i % 251) as u8).collect();
        embed(&mut carrier, &payload).unwrap();
        assert_eq!(extract(&carrier).unwrap(), payload);
    }

    #[test]
    fn test_one_byte_over_capacity() {
        let mut carrier = test_carrier(64, 64);
        let payload = vec![0u8; capacity_bytes(&carrier) + 1];
        let result = embed(&mut carrier, &payload);
        assert!(matches!(result, Err(SealError::Capacity { .. })));
    }

    #[test]
    fn test_oversized_payload_leaves_carrier_untouched() {
        let original = test_carrier(16, 16);
        let mut carrier = original.clone();
        let payload = vec![0u8; capacity_bytes(&carrier) + 100];
        assert!(embed(&mut carrier, &payload).is_err());
        assert_eq!(carrier, original, "failed embed must not modify samples");
    }

    #[test]
    fn test_scenario_400x400_carrier() {
        // 400*400 channel-0 samples: 32 prefix bits + 19_996 payload bytes
        let mut carrier = test_carrier(400, 400);
        assert_eq!(capacity_bits(&carrier), 160_000);
        assert_eq!(capacity_bytes(&carrier), 19_996);

        let locator = vec![b'Q'; 46];
        embed(&mut carrier, &locator).unwrap();
        assert_eq!(extract(&carrier).unwrap(), locator);

        let oversized = vec![0u8; 20_000];
        let result = embed(&mut carrier, &oversized);
        match result {
            Err(SealError::Capacity { needed, available }) => {
                assert_eq!(needed, 32 + 20_000 * 8);
                assert_eq!(available, 160_000);
            }
            other => panic!("expected Capacity error, got {other:?}"),
        }
    }

    #[test]
    fn test_only_channel_zero_modified() {
        let original = test_carrier(32, 32);
        let mut carrier = original.clone();
        embed(&mut carrier, b"hidden bits").unwrap();

        for (orig, modified) in original.pixels().zip(carrier.pixels()) {
            assert_eq!(orig.0[1], modified.0[1]);
            assert_eq!(orig.0[2], modified.0[2]);
            assert_eq!(orig.0[3], modified.0[3]);
            // channel 0 may differ only in its LSB
            assert_eq!(orig.0[0] & 0xFE, modified.0[0] & 0xFE);
        }
    }

    #[test]
    fn test_extract_out_of_range_length() {
        // Forge a length prefix far beyond what the carrier holds
        let mut carrier = test_carrier(10, 10);
        let forged_len: u32 = 10_000;
        for i in 0..LENGTH_PREFIX_BITS {
            let bit = ((forged_len >> (31 - i)) & 1) as u8;
            let pixel = carrier.get_pixel_mut((i % 10) as u32, (i / 10) as u32);
            pixel.0[0] = (pixel.0[0] & 0xFE) | bit;
        }
        let result = extract(&carrier);
        assert!(matches!(result, Err(SealError::Format(_))));
    }

    #[test]
    fn test_extract_carrier_smaller_than_prefix() {
        let carrier = test_carrier(4, 4);
        assert!(matches!(extract(&carrier), Err(SealError::Format(_))));
    }

    #[test]
    fn test_embed_carrier_smaller_than_prefix() {
        let mut carrier = test_carrier(4, 4);
        let result = embed(&mut carrier, b"");
        assert!(matches!(result, Err(SealError::Capacity { .. })));
    }

    proptest! {
        #[test]
        fn prop_roundtrip(payload in proptest::collection::vec(any::<u8>(), 0..=500)) {
            let mut carrier = test_carrier(64, 64);
            embed(&mut carrier, &payload).unwrap();
            prop_assert_eq!(extract(&carrier).unwrap(), payload);
        }
    }
}
