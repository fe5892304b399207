//! Lossless PNG adapter for carrier images
//!
//! The hidden channel only survives bit-exact pixel round-trips, so the
//! carrier is pinned to PNG on both sides. A lossy recompression anywhere
//! in transport corrupts the hidden data by design, not by bug.

use std::io::Cursor;

use image::{ImageFormat, RgbaImage};

use sealdrop_core::{SealError, SealResult};

/// Decode PNG bytes into an RGBA carrier.
pub fn load_carrier(bytes: &[u8]) -> SealResult<RgbaImage> {
    let decoded = image::load_from_memory_with_format(bytes, ImageFormat::Png).map_err(|e| {
        tracing::debug!(error = %e, "carrier decode failed");
        SealError::Format("carrier is not a valid PNG image".into())
    })?;
    Ok(decoded.to_rgba8())
}

/// Encode an RGBA carrier back to PNG bytes.
pub fn save_carrier(carrier: &RgbaImage) -> SealResult<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    carrier.write_to(&mut out, ImageFormat::Png).map_err(|e| {
        tracing::debug!(error = %e, "carrier encode failed");
        SealError::Format("carrier PNG encoding failed".into())
    })?;
    Ok(out.into_inner())
}

/// Embed and extract must agree on carrier geometry before the bit channel
/// lines up; reject mismatches early.
pub fn ensure_dimensions(carrier: &RgbaImage, width: u32, height: u32) -> SealResult<()> {
    if carrier.width() != width || carrier.height() != height {
        return Err(SealError::Format(format!(
            "carrier is {}x{} (expected {width}x{height})",
            carrier.width(),
            carrier.height()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn test_carrier(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            let v = ((x * 31 + y * 17) % 256) as u8;
            Rgba([v, v ^ 0x55, v ^ 0xAA, 255])
        })
    }

    #[test]
    fn test_png_roundtrip_is_lossless() {
        let carrier = test_carrier(50, 40);
        let bytes = save_carrier(&carrier).unwrap();
        let restored = load_carrier(&bytes).unwrap();
        assert_eq!(restored, carrier, "PNG round-trip must be bit-exact");
    }

    #[test]
    fn test_embedded_bits_survive_png() {
        let mut carrier = test_carrier(64, 64);
        crate::codec::embed(&mut carrier, b"locator-through-png").unwrap();

        let bytes = save_carrier(&carrier).unwrap();
        let restored = load_carrier(&bytes).unwrap();
        assert_eq!(crate::codec::extract(&restored).unwrap(), b"locator-through-png");
    }

    #[test]
    fn test_load_rejects_garbage() {
        assert!(matches!(
            load_carrier(b"not a png at all"),
            Err(SealError::Format(_))
        ));
    }

    #[test]
    fn test_ensure_dimensions() {
        let carrier = test_carrier(400, 400);
        assert!(ensure_dimensions(&carrier, 400, 400).is_ok());
        assert!(matches!(
            ensure_dimensions(&carrier, 400, 300),
            Err(SealError::Format(_))
        ));
    }
}
