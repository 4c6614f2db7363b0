pub mod png;

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::formats::png::PngFormat;
use crate::utils::error::{ChromaError, ChromaResult};
use crate::utils::image::Image;

/// Longest signature any registered or recognised format needs.
const SIGNATURE_LENGTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Png,
    Bmp,
    Gif,
    Jpeg,
    Unknown,
}

impl ImageFormat {
    /// Guesses a format from the first bytes of a file.
    pub fn from_signature(bytes: &[u8]) -> ImageFormat {
        match bytes {
            [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => ImageFormat::Png,
            [b'G', b'I', b'F', b'8', b'7' | b'9', b'a', ..] => ImageFormat::Gif,
            [0xFF, 0xD8, 0xFF, ..] => ImageFormat::Jpeg,
            [b'B', b'M', ..] => ImageFormat::Bmp,
            _ => ImageFormat::Unknown,
        }
    }
}

pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

/// Reads up to `SIGNATURE_LENGTH` bytes and rewinds to where the stream was.
pub fn peek_signature(stream: &mut dyn ReadSeek) -> ChromaResult<Vec<u8>> {
    let start = stream.stream_position()?;

    let mut signature = Vec::with_capacity(SIGNATURE_LENGTH);
    (&mut *stream).take(SIGNATURE_LENGTH as u64).read_to_end(&mut signature)?;
    stream.seek(SeekFrom::Start(start))?;

    Ok(signature)
}

pub(crate) fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}

/// A codec the [`Manager`] can dispatch to.
pub trait Format: Send + Sync {
    fn image_format(&self) -> ImageFormat;

    /// Whether `prefix`, the first bytes of a file, look like this format.
    fn can_decode_bytes(&self, prefix: &[u8]) -> bool;

    fn can_decode_path(&self, path: &Path) -> bool;

    /// Sniffs the stream without consuming it.
    fn can_decode_stream(&self, stream: &mut dyn ReadSeek) -> ChromaResult<bool> {
        Ok(self.can_decode_bytes(&peek_signature(stream)?))
    }

    fn can_encode(&self, path: &Path) -> bool;

    fn decode(&self, stream: &mut dyn Read) -> ChromaResult<Image>;

    fn encode(&self, writer: &mut dyn Write, image: &Image) -> ChromaResult<()>;
}

/// Ordered registry of formats. The first match wins.
pub struct Manager {
    formats: Vec<Box<dyn Format>>,
}

impl Default for Manager {
    fn default() -> Self {
        let mut manager = Manager::empty();
        manager.register(Box::new(PngFormat::default()));

        manager
    }
}

impl Manager {
    pub fn new() -> Self {
        Self::default()
    }

    /// A manager with nothing registered.
    pub fn empty() -> Self {
        Manager { formats: Vec::new() }
    }

    pub fn register(&mut self, format: Box<dyn Format>) {
        self.formats.push(format);
    }

    pub fn formats(&self) -> &[Box<dyn Format>] {
        &self.formats
    }

    pub fn decode(&self, stream: &mut dyn ReadSeek) -> ChromaResult<Image> {
        for format in &self.formats {
            if format.can_decode_stream(stream)? {
                log::debug!("Decoding as {:?}", format.image_format());

                let mut reader = &mut *stream;
                return format.decode(&mut reader);
            }
        }

        let guessed = ImageFormat::from_signature(&peek_signature(stream)?);

        Err(ChromaError::UnsupportedFormat(format!("{:?}", guessed)))
    }

    pub fn open<P: AsRef<Path>>(&self, path: P) -> ChromaResult<Image> {
        let file = File::open(path)?;

        self.decode(&mut BufReader::new(file))
    }

    pub fn encode(&self, writer: &mut dyn Write, image: &Image, image_format: ImageFormat) -> ChromaResult<()> {
        let format = self
            .formats
            .iter()
            .find(|f| f.image_format() == image_format)
            .ok_or_else(|| ChromaError::UnsupportedFormat(format!("No encoder for {:?}", image_format)))?;

        format.encode(writer, image)
    }

    /// Encodes by file extension.
    pub fn save<P: AsRef<Path>>(&self, path: P, image: &Image) -> ChromaResult<()> {
        let path = path.as_ref();
        let format = self
            .formats
            .iter()
            .find(|f| f.can_encode(path))
            .ok_or_else(|| ChromaError::UnsupportedFormat(format!("No encoder for {}", path.display())))?;

        let mut writer = BufWriter::new(File::create(path)?);
        format.encode(&mut writer, image)?;
        writer.flush()?;

        Ok(())
    }
}
