pub mod chunk;
pub mod color;
pub mod compression;
pub mod data;
pub mod filters;
pub mod header;
pub mod palette;
pub mod property;

use std::io::{Read, Write};
use std::path::Path;

use crate::formats::{has_extension, Format, ImageFormat};
use crate::utils::bitreader::BitReader;
use crate::utils::error::{ChromaError, ChromaResult};
use crate::utils::image::Image;
use crate::utils::info::PngInfo;

use chunk::{ChecksumPolicy, Chunk, PngChunk, PNG_SIGNATURE};
use data::Data;
use filters::FilterStrategy;
use header::{ColorType, Header};
use palette::Palette;
use property::Property;

pub const DEFAULT_MAX_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    pub checksum: ChecksumPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOptions {
    /// zlib level, 0 to 9.
    pub compression: u32,
    pub filter: FilterStrategy,
    /// Written as tEXt chunks ahead of the image data.
    pub properties: Vec<Property>,
    /// Largest IDAT payload before the data is split into another chunk.
    pub max_chunk_size: usize,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        EncodeOptions {
            compression: compression::DEFAULT_COMPRESSION_LEVEL,
            filter: FilterStrategy::default(),
            properties: Vec::new(),
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
        }
    }
}

pub struct PngDecoder<R: Read> {
    reader: BitReader<R>,
    options: DecodeOptions,
    header: Option<Header>,
    palette: Option<Palette>,
    alpha_palette: Option<Palette>,
    properties: Vec<Property>,
    data: Option<Data>,
    idat_chunks: usize,
}

impl<R: Read> PngDecoder<R> {
    pub fn new(reader: R) -> Self {
        PngDecoder::with_options(reader, DecodeOptions::default())
    }

    pub fn with_options(reader: R, options: DecodeOptions) -> Self {
        Self {
            reader: BitReader::new(reader),
            options,
            header: None,
            palette: None,
            alpha_palette: None,
            properties: Vec::new(),
            data: None,
            idat_chunks: 0,
        }
    }

    pub fn header(&self) -> Option<&Header> {
        self.header.as_ref()
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn width(&self) -> u32 {
        self.header.map_or(0, |h| h.width)
    }

    pub fn height(&self) -> u32 {
        self.header.map_or(0, |h| h.height)
    }

    /// Summary of everything read so far. Only available once IHDR has been seen.
    pub fn get_info(&self) -> ChromaResult<PngInfo> {
        let header = self.header.ok_or(ChromaError::MissingChunk("IHDR"))?;

        Ok(PngInfo {
            width: header.width,
            height: header.height,
            bit_depth: header.bit_depth,
            color_type: header.color_type,
            interlace: header.interlace_method != 0,
            palette_entries: self.palette.as_ref().map(Palette::entries),
            transparency_entries: self.alpha_palette.as_ref().map(Palette::entries),
            properties: self.properties.clone(),
            idat_chunks: self.idat_chunks,
            compressed_size: self.data.as_ref().map_or(0, Data::len),
        })
    }

    fn read_signature(&mut self) -> ChromaResult<()> {
        let mut signature = [0u8; 8];
        self.reader.read_exact(&mut signature)?;

        if signature != PNG_SIGNATURE {
            return Err(ChromaError::InvalidSignature);
        }

        Ok(())
    }

    fn read_plte(&mut self, chunk: &Chunk) -> ChromaResult<()> {
        if self.palette.is_some() {
            log::warn!("Duplicate PLTE chunk, keeping the first one");
            return Ok(());
        }

        self.palette = Some(Palette::try_from(chunk)?);

        Ok(())
    }

    fn read_trns(&mut self, chunk: &Chunk) -> ChromaResult<()> {
        match self.header {
            Some(header) if header.color_type != ColorType::Palette => {
                log::warn!("Ignoring tRNS chunk for color type {}", header.color_type);
            }
            _ => self.alpha_palette = Some(Palette::try_from(chunk)?),
        }

        Ok(())
    }

    fn read_idat(&mut self, chunk: Chunk) {
        self.idat_chunks += 1;
        self.data = Some(Data::combine(self.data.take(), Some(Data::from(chunk))));
    }

    fn read_text(&mut self, chunk: &Chunk) {
        match Property::try_from(chunk) {
            Ok(property) => self.properties.push(property),
            Err(e) => log::warn!("Error reading chunk {}: {}", chunk.type_name(), e),
        }
    }

    fn read_chunks(&mut self) -> ChromaResult<()> {
        loop {
            let chunk = Chunk::read(&mut self.reader)?;
            chunk.verify(self.options.checksum)?;

            log::debug!("Chunk {} ({} bytes)", chunk.type_name(), chunk.length());

            match chunk.kind() {
                Some(PngChunk::IHDR) => {
                    if self.header.is_some() {
                        log::warn!("Duplicate IHDR chunk, keeping the first one");
                    } else {
                        self.header = Some(Header::from_chunk(&chunk)?);
                    }
                }
                Some(PngChunk::PLTE) => self.read_plte(&chunk)?,
                Some(PngChunk::TRNS) => self.read_trns(&chunk)?,
                Some(PngChunk::IDAT) => self.read_idat(chunk),
                Some(PngChunk::TEXT | PngChunk::ZTXT | PngChunk::ITXT) => self.read_text(&chunk),
                Some(PngChunk::IEND) => break,
                None if chunk.is_critical() => {
                    return Err(ChromaError::UnsupportedFormat(format!(
                        "Unknown critical chunk {}",
                        chunk.type_name()
                    )));
                }
                None => {
                    log::warn!("Skipping unknown chunk {}", chunk.type_name());
                }
            }
        }

        Ok(())
    }

    pub fn decode(&mut self) -> ChromaResult<Image> {
        self.read_signature()?;
        self.read_chunks()?;

        let header = self.header.ok_or(ChromaError::MissingChunk("IHDR"))?;
        let data = self.data.as_ref().ok_or(ChromaError::MissingChunk("IDAT"))?;

        // tRNS arriving before IHDR is only known to be misplaced now
        let alpha_palette = match header.color_type {
            ColorType::Palette => self.alpha_palette.as_ref(),
            _ => None,
        };

        data.parse(&header, self.palette.as_ref(), alpha_palette)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PngEncoder {
    options: EncodeOptions,
}

impl PngEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: EncodeOptions) -> Self {
        PngEncoder { options }
    }

    pub fn options(&self) -> &EncodeOptions {
        &self.options
    }

    /// Writes `image` as an 8-bit RGBA PNG.
    pub fn encode<W: Write + ?Sized>(&self, writer: &mut W, image: &Image) -> ChromaResult<()> {
        let data = Data::from_image(image, &self.options)?;
        let header = Header::new(image.width(), image.height(), 8, ColorType::TrueColorAlpha);

        writer.write_all(&PNG_SIGNATURE)?;
        header.to_chunk().write(writer)?;

        for property in &self.options.properties {
            property.to_chunk().write(writer)?;
        }

        let chunks = data.to_chunks(self.options.max_chunk_size);
        log::debug!("Writing {} bytes of image data in {} IDAT chunks", data.len(), chunks.len());

        for chunk in &chunks {
            chunk.write(writer)?;
        }

        Chunk::new(PngChunk::IEND.tag(), Vec::new()).write(writer)?;

        Ok(())
    }
}

/// PNG entry in the format registry.
#[derive(Debug, Clone, Default)]
pub struct PngFormat {
    pub decode_options: DecodeOptions,
    pub encode_options: EncodeOptions,
}

impl PngFormat {
    pub fn new(decode_options: DecodeOptions, encode_options: EncodeOptions) -> Self {
        PngFormat {
            decode_options,
            encode_options,
        }
    }
}

impl Format for PngFormat {
    fn image_format(&self) -> ImageFormat {
        ImageFormat::Png
    }

    fn can_decode_bytes(&self, prefix: &[u8]) -> bool {
        prefix.len() >= PNG_SIGNATURE.len() && prefix[..PNG_SIGNATURE.len()] == PNG_SIGNATURE
    }

    fn can_decode_path(&self, path: &Path) -> bool {
        has_extension(path, "png")
    }

    fn can_encode(&self, path: &Path) -> bool {
        has_extension(path, "png")
    }

    fn decode(&self, stream: &mut dyn Read) -> ChromaResult<Image> {
        PngDecoder::with_options(stream, self.decode_options).decode()
    }

    fn encode(&self, writer: &mut dyn Write, image: &Image) -> ChromaResult<()> {
        PngEncoder::with_options(self.encode_options.clone()).encode(writer, image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::image::Rgba;

    fn encode(image: &Image, options: EncodeOptions) -> ChromaResult<Vec<u8>> {
        let mut bytes = Vec::new();
        PngEncoder::with_options(options).encode(&mut bytes, image)?;

        Ok(bytes)
    }

    #[test]
    fn test_encode_layout() -> Result<(), Box<dyn std::error::Error>> {
        let image = Image::from_pixels(1, 1, vec![Rgba::new(10, 20, 30, 255)])?;
        let bytes = encode(&image, EncodeOptions::default())?;

        assert_eq!(&bytes[..8], &PNG_SIGNATURE);
        assert_eq!(&bytes[12..16], b"IHDR");
        // 8-bit truecolor with alpha
        assert_eq!(&bytes[24..26], &[8, 6]);
        assert_eq!(&bytes[bytes.len() - 12..], &[0, 0, 0, 0, b'I', b'E', b'N', b'D', 0xAE, 0x42, 0x60, 0x82]);

        Ok(())
    }

    #[test]
    fn test_decode_encoded() -> Result<(), Box<dyn std::error::Error>> {
        let pixels = (0..48u32).map(|i| Rgba::new(i as u8, (i * 5) as u8, 200, (i * 3) as u8)).collect();
        let image = Image::from_pixels(8, 6, pixels)?;

        let options = EncodeOptions {
            properties: vec![Property::new("Software", "chroma")],
            max_chunk_size: 16,
            ..EncodeOptions::default()
        };
        let bytes = encode(&image, options)?;

        let mut decoder = PngDecoder::new(&bytes[..]);
        assert_eq!(decoder.decode()?, image);

        let info = decoder.get_info()?;
        assert_eq!((info.width, info.height), (8, 6));
        assert_eq!(info.color_type, ColorType::TrueColorAlpha);
        assert!(info.idat_chunks > 1);
        assert_eq!(decoder.properties(), &[Property::new("Software", "chroma")]);

        Ok(())
    }

    #[test]
    fn test_bad_signature() {
        let mut decoder = PngDecoder::new(&b"GIF89a\0\0\0\0\0\0"[..]);

        assert!(matches!(decoder.decode(), Err(ChromaError::InvalidSignature)));
    }

    #[test]
    fn test_missing_iend_is_fatal() -> Result<(), Box<dyn std::error::Error>> {
        let image = Image::from_pixels(2, 2, vec![Rgba::opaque(1, 2, 3); 4])?;
        let bytes = encode(&image, EncodeOptions::default())?;
        let truncated = &bytes[..bytes.len() - 12];

        assert!(matches!(PngDecoder::new(truncated).decode(), Err(ChromaError::IoError(_))));

        Ok(())
    }

    #[test]
    fn test_info_before_decode() {
        let decoder = PngDecoder::new(&[0u8; 0][..]);

        assert!(matches!(decoder.get_info(), Err(ChromaError::MissingChunk("IHDR"))));
    }

    #[test]
    fn test_format_predicates() {
        let format = PngFormat::default();

        assert!(format.can_decode_bytes(&PNG_SIGNATURE));
        assert!(!format.can_decode_bytes(&PNG_SIGNATURE[..4]));
        assert!(!format.can_decode_bytes(b"BM\0\0\0\0\0\0"));
        assert!(format.can_decode_path(Path::new("image.PNG")));
        assert!(format.can_encode(Path::new("out/image.png")));
        assert!(!format.can_encode(Path::new("image.bmp")));
        assert!(!format.can_encode(Path::new("png")));
    }
}
