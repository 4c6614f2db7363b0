use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::utils::error::ChromaResult;

pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// Deflates `data` into a complete zlib stream.
pub fn compress(data: &[u8], level: u32) -> ChromaResult<Vec<u8>> {
    let mut writer = ZlibWriter::new(level);
    writer.write_all(data)?;

    writer.finish()
}

/// Inflates a complete zlib stream.
pub fn decompress(data: &[u8]) -> ChromaResult<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder.read_to_end(&mut decompressed)?;

    Ok(decompressed)
}

/// Incremental zlib compressor.
///
/// Rows are pushed one at a time so the full filtered image never has to
/// exist in memory. Dropping the writer without calling `finish` discards
/// the output.
pub struct ZlibWriter {
    encoder: ZlibEncoder<Vec<u8>>,
}

impl ZlibWriter {
    pub fn new(level: u32) -> Self {
        ZlibWriter {
            encoder: ZlibEncoder::new(Vec::new(), Compression::new(level.min(9))),
        }
    }

    pub fn write_all(&mut self, data: &[u8]) -> ChromaResult<()> {
        self.encoder.write_all(data)?;

        Ok(())
    }

    /// Total uncompressed bytes written so far.
    pub fn total_in(&self) -> u64 {
        self.encoder.total_in()
    }

    pub fn finish(self) -> ChromaResult<Vec<u8>> {
        Ok(self.encoder.finish()?)
    }
}
