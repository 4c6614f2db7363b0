use crate::formats::png::chunk::{Chunk, PngChunk};
use crate::utils::error::{ChromaError, ChromaResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteType {
    /// RGB triples from PLTE.
    Color,
    /// Per-index alpha from tRNS.
    Alpha,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    data: Vec<u8>,
    palette_type: PaletteType,
}

impl Palette {
    pub fn new(palette_type: PaletteType, mut data: Vec<u8>) -> Palette {
        if palette_type == PaletteType::Color && data.len() % 3 != 0 {
            log::warn!("PLTE length {} is not a multiple of 3, truncating", data.len());
            data.truncate(data.len() - data.len() % 3);
        }

        Palette { data, palette_type }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn palette_type(&self) -> PaletteType {
        self.palette_type
    }

    /// Number of indices this palette covers.
    pub fn entries(&self) -> usize {
        match self.palette_type {
            PaletteType::Color => self.data.len() / 3,
            PaletteType::Alpha => self.data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn color(&self, index: usize) -> ChromaResult<[u8; 3]> {
        let start = index * 3;

        match self.data.get(start..start + 3) {
            Some(rgb) if self.palette_type == PaletteType::Color => Ok([rgb[0], rgb[1], rgb[2]]),
            _ => Err(ChromaError::PaletteIndexOutOfRange {
                index,
                len: self.entries(),
            }),
        }
    }

    /// Alpha for `index`; indices past the end of tRNS are opaque.
    pub fn alpha(&self, index: usize) -> u8 {
        match self.palette_type {
            PaletteType::Alpha => self.data.get(index).copied().unwrap_or(255),
            PaletteType::Color => 255,
        }
    }

    pub fn to_chunk(&self) -> Chunk {
        let kind = match self.palette_type {
            PaletteType::Color => PngChunk::PLTE,
            PaletteType::Alpha => PngChunk::TRNS,
        };

        Chunk::new(kind.tag(), self.data.clone())
    }
}

impl TryFrom<&Chunk> for Palette {
    type Error = ChromaError;

    fn try_from(chunk: &Chunk) -> ChromaResult<Self> {
        match chunk.kind() {
            Some(PngChunk::PLTE) => Ok(Palette::new(PaletteType::Color, chunk.data().to_vec())),
            Some(PngChunk::TRNS) => Ok(Palette::new(PaletteType::Alpha, chunk.data().to_vec())),
            _ => Err(ChromaError::Custom(format!(
                "Chunk {} does not hold a palette",
                chunk.type_name()
            ))),
        }
    }
}
