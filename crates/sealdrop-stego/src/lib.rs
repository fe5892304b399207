//! sealdrop-stego: LSB steganography over RGBA carrier images
//!
//! The bit channel lives in the least-significant bits of channel 0 (red),
//! raster order from sample 0, self-described by a 32-bit big-endian length
//! prefix. Capacity violations are hard errors; the codec never truncates.
//!
//! Carriers only survive lossless image codecs; the PNG adapter in
//! [`carrier`] is the supported transport.

pub mod carrier;
pub mod codec;

pub use carrier::{ensure_dimensions, load_carrier, save_carrier};
pub use codec::{capacity_bits, capacity_bytes, embed, extract, LENGTH_PREFIX_BITS};
