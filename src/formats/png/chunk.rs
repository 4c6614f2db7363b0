use std::fmt::Debug;
use std::io::{Read, Write};

use crate::utils::bitreader::BitReader;
use crate::utils::error::{ChromaError, ChromaResult};

pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

// Chunk lengths are limited to 2^31 - 1 bytes
const MAX_CHUNK_LENGTH: u32 = 0x7FFF_FFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PngChunk {
    // Critical chunks
    IHDR, // Image header
    PLTE, // Palette
    IDAT, // Image data
    IEND, // End of image

    // Ancillary chunks
    TRNS, // Transparency
    TEXT, // Text
    ZTXT, // Compressed text
    ITXT, // International text
}

impl PngChunk {
    pub fn from_tag(chunk_type: &[u8; 4]) -> Option<PngChunk> {
        match chunk_type {
            b"IHDR" => Some(PngChunk::IHDR),
            b"PLTE" => Some(PngChunk::PLTE),
            b"IDAT" => Some(PngChunk::IDAT),
            b"IEND" => Some(PngChunk::IEND),
            b"tRNS" => Some(PngChunk::TRNS),
            b"tEXt" => Some(PngChunk::TEXT),
            b"zTXt" => Some(PngChunk::ZTXT),
            b"iTXt" => Some(PngChunk::ITXT),
            _ => None,
        }
    }

    pub fn tag(self) -> [u8; 4] {
        match self {
            PngChunk::IHDR => *b"IHDR",
            PngChunk::PLTE => *b"PLTE",
            PngChunk::IDAT => *b"IDAT",
            PngChunk::IEND => *b"IEND",
            PngChunk::TRNS => *b"tRNS",
            PngChunk::TEXT => *b"tEXt",
            PngChunk::ZTXT => *b"zTXt",
            PngChunk::ITXT => *b"iTXt",
        }
    }
}

/// What to do when a chunk's stored CRC does not match its contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChecksumPolicy {
    /// Fail with `ChromaError::ChecksumMismatch`.
    #[default]
    Verify,
    /// Log a warning and keep going.
    Warn,
    /// Skip the check.
    Ignore,
}

/// A raw container record: length, type tag, payload and CRC-32.
#[derive(Clone, PartialEq, Eq)]
pub struct Chunk {
    length: u32,
    chunk_type: [u8; 4],
    data: Vec<u8>,
    crc: u32,
}

impl Chunk {
    /// Builds a chunk and computes its CRC.
    pub fn new(chunk_type: [u8; 4], data: Vec<u8>) -> Chunk {
        let crc = Chunk::calculate_crc_for(&chunk_type, &data);

        Chunk {
            length: data.len() as u32,
            chunk_type,
            data,
            crc,
        }
    }

    /// Builds a chunk from stored values without recomputing anything.
    pub fn from_parts(length: u32, chunk_type: [u8; 4], data: Vec<u8>, crc: u32) -> Chunk {
        Chunk {
            length,
            chunk_type,
            data,
            crc,
        }
    }

    pub fn read<R: Read>(reader: &mut BitReader<R>) -> ChromaResult<Chunk> {
        let length = reader.read_u32()?;

        if length > MAX_CHUNK_LENGTH {
            return Err(ChromaError::Custom(format!("Chunk length {} exceeds 2^31 - 1", length)));
        }

        let mut chunk_type = [0u8; 4];
        reader.read_exact(&mut chunk_type)?;

        let mut data = vec![0u8; length as usize];
        reader.read_exact(&mut data)?;

        let crc = reader.read_u32()?;

        Ok(Chunk::from_parts(length, chunk_type, data, crc))
    }

    pub fn write<W: Write + ?Sized>(&self, writer: &mut W) -> ChromaResult<()> {
        writer.write_all(&self.length.to_be_bytes())?;
        writer.write_all(&self.chunk_type)?;
        writer.write_all(&self.data)?;
        writer.write_all(&self.crc.to_be_bytes())?;

        Ok(())
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    pub fn chunk_type(&self) -> &[u8; 4] {
        &self.chunk_type
    }

    pub fn type_name(&self) -> String {
        String::from_utf8_lossy(&self.chunk_type).to_string()
    }

    pub fn kind(&self) -> Option<PngChunk> {
        PngChunk::from_tag(&self.chunk_type)
    }

    pub fn is(&self, kind: PngChunk) -> bool {
        self.chunk_type == kind.tag()
    }

    /// Critical chunks have an uppercase first letter.
    pub fn is_critical(&self) -> bool {
        self.chunk_type[0] & 0x20 == 0
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn crc(&self) -> u32 {
        self.crc
    }

    pub fn calculate_crc(&self) -> u32 {
        Chunk::calculate_crc_for(&self.chunk_type, &self.data)
    }

    fn calculate_crc_for(chunk_type: &[u8; 4], data: &[u8]) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(chunk_type);
        hasher.update(data);
        hasher.finalize()
    }

    pub fn verify(&self, policy: ChecksumPolicy) -> ChromaResult<()> {
        if policy == ChecksumPolicy::Ignore {
            return Ok(());
        }

        let calculated = self.calculate_crc();
        if calculated == self.crc {
            return Ok(());
        }

        match policy {
            ChecksumPolicy::Verify => Err(ChromaError::ChecksumMismatch {
                chunk: self.type_name(),
                expected: self.crc,
                calculated,
            }),
            _ => {
                log::warn!(
                    "CRC mismatch for chunk {}: expected 0x{:08x}, calculated 0x{:08x}",
                    self.type_name(),
                    self.crc,
                    calculated
                );
                Ok(())
            }
        }
    }
}

impl Debug for Chunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chunk")
            .field("type", &self.type_name())
            .field("length", &self.length)
            .field("crc", &format_args!("0x{:08x}", self.crc))
            .finish()
    }
}
