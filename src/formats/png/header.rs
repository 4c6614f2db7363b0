use std::fmt::{self, Display, Formatter};

use crate::formats::png::chunk::{Chunk, PngChunk};
use crate::utils::error::{ChromaError, ChromaResult};
use crate::utils::traits::SafeAccess;

const IHDR_LENGTH: usize = 13;

/// Largest width or height IHDR may declare.
pub const MAX_DIMENSION: u32 = 0x7FFF_FFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorType {
    Greyscale = 0,
    TrueColor = 2,
    Palette = 3,
    GreyscaleAlpha = 4,
    TrueColorAlpha = 6,
}

impl TryFrom<u8> for ColorType {
    type Error = ChromaError;

    fn try_from(value: u8) -> ChromaResult<Self> {
        match value {
            0 => Ok(ColorType::Greyscale),
            2 => Ok(ColorType::TrueColor),
            3 => Ok(ColorType::Palette),
            4 => Ok(ColorType::GreyscaleAlpha),
            6 => Ok(ColorType::TrueColorAlpha),
            n => Err(ChromaError::UnsupportedColorType(n)),
        }
    }
}

impl Display for ColorType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColorType::Greyscale => "Greyscale",
            ColorType::TrueColor => "TrueColor",
            ColorType::Palette => "Palette",
            ColorType::GreyscaleAlpha => "GreyscaleAlpha",
            ColorType::TrueColorAlpha => "TrueColorAlpha",
        };

        write!(f, "{} ({})", name, *self as u8)
    }
}

/// Decoded IHDR contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: ColorType,
    pub compression_method: u8,
    pub filter_method: u8,
    pub interlace_method: u8,
}

impl Header {
    pub fn new(width: u32, height: u32, bit_depth: u8, color_type: ColorType) -> Header {
        Header {
            width,
            height,
            bit_depth,
            color_type,
            compression_method: 0,
            filter_method: 0,
            interlace_method: 0,
        }
    }

    pub fn from_chunk(chunk: &Chunk) -> ChromaResult<Header> {
        if !chunk.is(PngChunk::IHDR) {
            return Err(ChromaError::Custom(format!("Expected IHDR chunk, found {}", chunk.type_name())));
        }

        let data = chunk.data().get_range_safe(0..IHDR_LENGTH)?;

        let mut width = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
        let mut height = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
        let bit_depth = data[8];
        let color_type = ColorType::try_from(data[9])?;
        let compression_method = data[10];
        let filter_method = data[11];
        let interlace_method = data[12];

        if width == 0 || height == 0 {
            log::warn!("Header declares {}x{} image, clamping to at least 1x1", width, height);
            width = width.max(1);
            height = height.max(1);
        }

        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(ChromaError::InvalidDimensions { width, height });
        }

        if !color_type.information().supports(bit_depth) {
            return Err(ChromaError::InvalidBitDepth {
                color_type: color_type as u8,
                bit_depth,
            });
        }

        if compression_method != 0 {
            return Err(ChromaError::UnsupportedFormat(format!(
                "Unknown compression method: {}",
                compression_method
            )));
        }

        if filter_method != 0 {
            return Err(ChromaError::UnsupportedFormat(format!("Unknown filter method: {}", filter_method)));
        }

        if interlace_method != 0 {
            return Err(ChromaError::UnsupportedFormat("Interlaced PNG".to_string()));
        }

        Ok(Header {
            width,
            height,
            bit_depth,
            color_type,
            compression_method,
            filter_method,
            interlace_method,
        })
    }

    pub fn to_chunk(&self) -> Chunk {
        let mut data = Vec::with_capacity(IHDR_LENGTH);
        data.extend_from_slice(&self.width.to_be_bytes());
        data.extend_from_slice(&self.height.to_be_bytes());
        data.push(self.bit_depth);
        data.push(self.color_type as u8);
        data.push(self.compression_method);
        data.push(self.filter_method);
        data.push(self.interlace_method);

        Chunk::new(PngChunk::IHDR.tag(), data)
    }

    pub fn samples_per_row(&self) -> usize {
        self.width as usize * self.color_type.information().scanline_factor as usize
    }

    /// Bytes in one scanline, excluding the filter tag.
    pub fn scanline_length(&self) -> usize {
        let bits = self.width as u64 * self.bit_depth as u64 * self.color_type.information().scanline_factor as u64;

        bits.div_ceil(8) as usize
    }

    /// Filter stride: bytes per complete pixel, rounded down, at least 1.
    pub fn bytes_per_pixel(&self) -> usize {
        let factor = self.color_type.information().scanline_factor as usize;

        (factor * self.bit_depth as usize / 8).max(1)
    }
}
