use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::io;

#[derive(Debug)]
pub enum ChromaError {
    IoError(io::Error),
    UnsupportedFormat(String),
    InvalidSignature,
    InvalidDimensions { width: u32, height: u32 },
    InvalidBitDepth { color_type: u8, bit_depth: u8 },
    UnsupportedColorType(u8),
    UnknownFilterType(u8),
    PaletteIndexOutOfRange { index: usize, len: usize },
    ChecksumMismatch { chunk: String, expected: u32, calculated: u32 },
    MissingChunk(&'static str),
    TruncatedData { expected: usize, actual: usize },
    Custom(String),
}

impl Error for ChromaError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ChromaError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl Display for ChromaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ChromaError::IoError(err) => write!(f, "I/O error: {}", err),
            ChromaError::UnsupportedFormat(format) => write!(f, "Unsupported image format: {}", format),
            ChromaError::InvalidSignature => write!(f, "Invalid PNG signature"),
            ChromaError::InvalidDimensions { width, height } => {
                write!(f, "Invalid image dimensions: {}x{}", width, height)
            }
            ChromaError::InvalidBitDepth { color_type, bit_depth } => {
                write!(f, "Bit depth {} is not allowed for color type {}", bit_depth, color_type)
            }
            ChromaError::UnsupportedColorType(color_type) => write!(f, "Unsupported color type: {}", color_type),
            ChromaError::UnknownFilterType(filter) => write!(f, "Unknown scanline filter type: {}", filter),
            ChromaError::PaletteIndexOutOfRange { index, len } => {
                write!(f, "Palette index {} out of range (palette has {} entries)", index, len)
            }
            ChromaError::ChecksumMismatch { chunk, expected, calculated } => write!(
                f,
                "CRC mismatch for chunk {}: expected 0x{:08x}, calculated 0x{:08x}",
                chunk, expected, calculated
            ),
            ChromaError::MissingChunk(chunk) => write!(f, "Missing required chunk: {}", chunk),
            ChromaError::TruncatedData { expected, actual } => {
                write!(f, "Truncated data: expected {} bytes, got {}", expected, actual)
            }
            ChromaError::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl From<io::Error> for ChromaError {
    fn from(error: io::Error) -> Self {
        ChromaError::IoError(error)
    }
}

// Result type alias for chroma operations
pub type ChromaResult<T> = Result<T, ChromaError>;
