//! PNG codec core: chunk model, color type readers, predictive filters and a
//! small format registry for dispatching by signature or file extension.

mod formats;
mod utils;

pub use utils::bitreader;

pub use formats::png::chunk::{ChecksumPolicy, Chunk, PngChunk, PNG_SIGNATURE};
pub use formats::png::color::{ColorTypeInformation, ScanlineReader};
pub use formats::png::data::Data;
pub use formats::png::filters::{FilterStrategy, FilterType};
pub use formats::png::header::{ColorType, Header};
pub use formats::png::palette::{Palette, PaletteType};
pub use formats::png::property::Property;
pub use formats::png::{DecodeOptions, EncodeOptions, PngDecoder, PngEncoder, PngFormat};
pub use formats::{Format, ImageFormat, Manager, ReadSeek};
pub use utils::error::{ChromaError, ChromaResult};
pub use utils::image::{Image, Rgba};
pub use utils::info::PngInfo;
pub use utils::logger::Logger;
pub use utils::writer::Writer;

pub mod filters {
    pub use crate::formats::png::filters::*;
}

pub mod compression {
    pub use crate::formats::png::compression::*;
}
