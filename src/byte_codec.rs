//! The opaque general-purpose byte compressor used by the columnar
//! post-compressed container variant. Treated as a total `compress`/
//! `decompress` pair by the rest of the crate; which concrete algorithm
//! backs it is an implementation detail of this module alone.

use std::io::{Read, Write};

use bytes::Bytes;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use snafu::ResultExt;

use crate::error::{ByteCodecFailureSnafu, Result};

/// A synchronous, total `bytes -> bytes` transform. Kept as a trait (rather
/// than free functions) so a different opaque codec can be substituted
/// without touching the compressor's orchestration logic.
pub trait ByteCodec {
    fn compress(&self, input: &[u8]) -> Result<Bytes>;
    fn decompress(&self, input: &[u8]) -> Result<Bytes>;
}

/// Zlib-backed implementation, the default opaque codec for `SJCB` buffers.
pub struct DeflateByteCodec {
    level: Compression,
}

impl DeflateByteCodec {
    pub fn new() -> Self {
        Self {
            level: Compression::default(),
        }
    }
}

impl Default for DeflateByteCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteCodec for DeflateByteCodec {
    fn compress(&self, input: &[u8]) -> Result<Bytes> {
        let mut encoder = ZlibEncoder::new(Vec::new(), self.level);
        encoder.write_all(input).context(ByteCodecFailureSnafu)?;
        let compressed = encoder.finish().context(ByteCodecFailureSnafu)?;
        Ok(Bytes::from(compressed))
    }

    fn decompress(&self, input: &[u8]) -> Result<Bytes> {
        let mut decoder = ZlibDecoder::new(input);
        let mut out = Vec::new();
        decoder.read_to_end(&mut out).context(ByteCodecFailureSnafu)?;
        Ok(Bytes::from(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_arbitrary_bytes() {
        let codec = DeflateByteCodec::new();
        let input = b"the quick brown fox jumps over the lazy dog".repeat(16);
        let compressed = codec.compress(&input).unwrap();
        assert!(compressed.len() < input.len());
        let decompressed = codec.decompress(&compressed).unwrap();
        assert_eq!(&decompressed[..], &input[..]);
    }

    #[test]
    fn roundtrips_empty_input() {
        let codec = DeflateByteCodec::new();
        let compressed = codec.compress(&[]).unwrap();
        let decompressed = codec.decompress(&compressed).unwrap();
        assert!(decompressed.is_empty());
    }
}
