//! Content hashing for artifact addressing.
//!
//! Artifacts are named after the MD5 of their selected source bytes, so two
//! resources with identical sources share one artifact and renaming a
//! resource never invalidates it.

use md5::{Digest, Md5};
use std::fmt;

/// A 128-bit content hash (MD5 output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    #[inline]
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Hash a byte slice.
    pub fn of(data: &[u8]) -> Self {
        let mut arr = [0u8; 16];
        arr.copy_from_slice(&Md5::digest(data));
        Self(arr)
    }

    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Lowercase hex, as used in artifact file names.
    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }

    /// Parse the hex form back (e.g. from an artifact file name).
    pub fn from_hex(s: &str) -> Option<Self> {
        let bytes = hex::decode(s).ok()?;
        let arr: [u8; 16] = bytes.try_into().ok()?;
        Some(Self(arr))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
