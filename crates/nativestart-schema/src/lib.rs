//! Shared types and wire format for nativestart descriptors.
//!
//! A descriptor is the signed JSON manifest a launcher stub downloads at
//! start-up. It lists every artifact (JVM, libraries, resources, splash
//! screen) together with the checksum of its uncompressed content and the
//! parameters needed to boot the JVM.

pub mod compression;
pub mod hash;
pub mod os;
pub mod types;

// Re-exports
pub use compression::*;
pub use hash::*;
pub use os::*;
pub use types::*;

/// Magic bytes for ZSTD compression (Little Endian: 0xFD2FB528 -> 28 B5 2F FD)
pub const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

/// Magic bytes opening every XZ stream.
pub const XZ_MAGIC: [u8; 6] = [0xFD, b'7', b'z', b'X', b'Z', 0x00];
