use std::iter::Sum;
use std::ops::{Add, AddAssign};

use crate::formats::png::chunk::{Chunk, PngChunk};
use crate::formats::png::compression::{self, ZlibWriter};
use crate::formats::png::filters::{self, FilterStrategy, FilterType, RowFilter};
use crate::formats::png::header::Header;
use crate::formats::png::palette::Palette;
use crate::formats::png::EncodeOptions;
use crate::utils::error::{ChromaError, ChromaResult};
use crate::utils::image::{Image, Rgba};

// Encoded rows are always RGBA8
const ENCODE_STRIDE: usize = 4;

/// Compressed image payload, the concatenation of every IDAT chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Data {
    image_data: Vec<u8>,
}

impl Data {
    pub fn new(image_data: Vec<u8>) -> Data {
        Data { image_data }
    }

    pub fn image_data(&self) -> &[u8] {
        &self.image_data
    }

    pub fn len(&self) -> usize {
        self.image_data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.image_data.is_empty()
    }

    /// Concatenates two optional payloads; a missing one counts as empty.
    pub fn combine(first: Option<Data>, second: Option<Data>) -> Data {
        first.unwrap_or_default() + second.unwrap_or_default()
    }

    /// Splits the payload into consecutive IDAT chunks of at most `max_chunk_size` bytes.
    pub fn to_chunks(&self, max_chunk_size: usize) -> Vec<Chunk> {
        if self.image_data.is_empty() {
            return vec![Chunk::new(PngChunk::IDAT.tag(), Vec::new())];
        }

        self.image_data
            .chunks(max_chunk_size.max(1))
            .map(|part| Chunk::new(PngChunk::IDAT.tag(), part.to_vec()))
            .collect()
    }

    /// Filters and compresses `image` row by row.
    ///
    /// The decompressed stream is always `height * (1 + 4 * width)` bytes.
    pub fn to_scanlines(image: &Image, strategy: FilterStrategy, level: u32) -> ChromaResult<Vec<u8>> {
        if image.width() == 0 || image.height() == 0 {
            return Err(ChromaError::InvalidDimensions {
                width: image.width(),
                height: image.height(),
            });
        }

        let row_len = image.width() as usize * ENCODE_STRIDE;
        let mut row_filter = RowFilter::new(row_len, ENCODE_STRIDE, strategy);
        let mut writer = ZlibWriter::new(level);

        let mut previous = vec![0u8; row_len];
        let mut current = vec![0u8; row_len];
        let mut filtered = Vec::with_capacity(row_len + 1);

        for y in 0..image.height() {
            for (bytes, pixel) in current.chunks_exact_mut(ENCODE_STRIDE).zip(image.row(y)) {
                bytes.copy_from_slice(&pixel.to_bytes());
            }

            filtered.clear();
            let filter = row_filter.apply(&current, &previous, &mut filtered);
            log::trace!("Row {} filtered with {:?}", y, filter);

            writer.write_all(&filtered)?;
            std::mem::swap(&mut current, &mut previous);
        }

        log::debug!("Filtered {} bytes of scanlines", writer.total_in());

        writer.finish()
    }

    pub fn from_image(image: &Image, options: &EncodeOptions) -> ChromaResult<Data> {
        Ok(Data::new(Data::to_scanlines(image, options.filter, options.compression)?))
    }

    /// Decompresses, defilters and converts the payload into pixels.
    ///
    /// Bytes are defiltered one at a time as they are walked; each finished
    /// scanline is handed to the color type's reader.
    pub fn parse(&self, header: &Header, palette: Option<&Palette>, alpha_palette: Option<&Palette>) -> ChromaResult<Image> {
        let reader = header.color_type.information().create_reader(palette, alpha_palette)?;
        let raw = compression::decompress(&self.image_data)?;

        let width = header.width as usize;
        let height = header.height as usize;
        let line_len = header.scanline_length();
        let stride = header.bytes_per_pixel();

        let too_large = || ChromaError::InvalidDimensions {
            width: header.width,
            height: header.height,
        };
        let expected = line_len
            .checked_add(1)
            .and_then(|row| row.checked_mul(height))
            .ok_or_else(too_large)?;
        let pixel_count = width.checked_mul(height).ok_or_else(too_large)?;

        log::debug!(
            "Decompressed {} -> {} bytes, expecting {} rows of {} bytes",
            self.image_data.len(),
            raw.len(),
            height,
            line_len + 1
        );

        if raw.len() < expected {
            return Err(ChromaError::TruncatedData {
                expected,
                actual: raw.len(),
            });
        }

        let mut pixels = vec![Rgba::default(); pixel_count];
        let mut previous = vec![0u8; line_len];
        let mut current = vec![0u8; line_len];

        // None while waiting for the next row's filter tag
        let mut filter: Option<FilterType> = None;
        let mut column = 0;
        let mut row = 0;

        for &byte in raw.iter().take(expected) {
            let kind = match filter {
                None => {
                    filter = Some(FilterType::try_from(byte)?);
                    column = 0;
                    continue;
                }
                Some(kind) => kind,
            };

            let left = if column >= stride { current[column - stride] } else { 0 };
            let upper_left = if column >= stride { previous[column - stride] } else { 0 };
            current[column] = filters::unfilter_byte(kind, byte, left, previous[column], upper_left);
            column += 1;

            if column == line_len {
                reader.read_scanline(&current, header, &mut pixels[row * width..(row + 1) * width])?;

                std::mem::swap(&mut current, &mut previous);
                filter = None;
                row += 1;
            }
        }

        if row < height {
            return Err(ChromaError::TruncatedData {
                expected,
                actual: raw.len(),
            });
        }

        if raw.len() > expected {
            log::warn!("Ignoring {} trailing bytes after the last scanline", raw.len() - expected);
        }

        Image::from_pixels(header.width, header.height, pixels)
    }
}

impl From<Chunk> for Data {
    fn from(chunk: Chunk) -> Self {
        Data::new(chunk.into_data())
    }
}

impl From<&Chunk> for Data {
    fn from(chunk: &Chunk) -> Self {
        Data::new(chunk.data().to_vec())
    }
}

impl From<Data> for Chunk {
    fn from(data: Data) -> Self {
        Chunk::new(PngChunk::IDAT.tag(), data.image_data)
    }
}

impl Add for Data {
    type Output = Data;

    fn add(mut self, rhs: Data) -> Data {
        self += rhs;
        self
    }
}

impl AddAssign for Data {
    fn add_assign(&mut self, rhs: Data) {
        self.image_data.extend_from_slice(&rhs.image_data);
    }
}

impl Sum for Data {
    fn sum<I: Iterator<Item = Data>>(iter: I) -> Data {
        iter.fold(Data::default(), |acc, data| acc + data)
    }
}
