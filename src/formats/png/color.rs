//! Color type registry and scanline readers.
//!
//! Each color type maps to a static [`ColorTypeInformation`] describing how
//! many samples make up a pixel, which bit depths are legal, and how to build
//! the reader that turns one defiltered scanline into RGBA pixels.

use std::borrow::Cow;

use crate::formats::png::header::{ColorType, Header};
use crate::formats::png::palette::{Palette, PaletteType};
use crate::utils::bitreader::BitReader;
use crate::utils::error::{ChromaError, ChromaResult};
use crate::utils::image::Rgba;
use crate::utils::traits::SafeAccess;

/// Rows at least this wide convert their pixels in parallel.
#[cfg(feature = "rayon")]
pub const PARALLEL_ROW_THRESHOLD: usize = 2048;

type ReaderFactory =
    for<'a> fn(Option<&'a Palette>, Option<&'a Palette>) -> ChromaResult<ScanlineReader<'a>>;

pub struct ColorTypeInformation {
    /// Samples per pixel.
    pub scanline_factor: u8,
    pub bit_depths: &'static [u8],
    factory: ReaderFactory,
}

impl ColorTypeInformation {
    pub fn supports(&self, bit_depth: u8) -> bool {
        self.bit_depths.contains(&bit_depth)
    }

    pub fn create_reader<'a>(
        &self,
        palette: Option<&'a Palette>,
        alpha_palette: Option<&'a Palette>,
    ) -> ChromaResult<ScanlineReader<'a>> {
        (self.factory)(palette, alpha_palette)
    }
}

fn greyscale_reader<'a>(_: Option<&'a Palette>, _: Option<&'a Palette>) -> ChromaResult<ScanlineReader<'a>> {
    Ok(ScanlineReader::Greyscale)
}

fn true_color_reader<'a>(_: Option<&'a Palette>, _: Option<&'a Palette>) -> ChromaResult<ScanlineReader<'a>> {
    Ok(ScanlineReader::TrueColor)
}

fn greyscale_alpha_reader<'a>(_: Option<&'a Palette>, _: Option<&'a Palette>) -> ChromaResult<ScanlineReader<'a>> {
    Ok(ScanlineReader::GreyscaleAlpha)
}

fn true_color_alpha_reader<'a>(_: Option<&'a Palette>, _: Option<&'a Palette>) -> ChromaResult<ScanlineReader<'a>> {
    Ok(ScanlineReader::TrueColorAlpha)
}

fn palette_reader<'a>(
    palette: Option<&'a Palette>,
    alpha_palette: Option<&'a Palette>,
) -> ChromaResult<ScanlineReader<'a>> {
    let colors = palette
        .filter(|p| p.palette_type() == PaletteType::Color)
        .ok_or(ChromaError::MissingChunk("PLTE"))?;
    let alpha = alpha_palette.filter(|p| p.palette_type() == PaletteType::Alpha);

    Ok(ScanlineReader::Palette { colors, alpha })
}

static GREYSCALE: ColorTypeInformation = ColorTypeInformation {
    scanline_factor: 1,
    bit_depths: &[1, 2, 4, 8, 16],
    factory: greyscale_reader,
};

static TRUE_COLOR: ColorTypeInformation = ColorTypeInformation {
    scanline_factor: 3,
    bit_depths: &[8, 16],
    factory: true_color_reader,
};

static PALETTE: ColorTypeInformation = ColorTypeInformation {
    scanline_factor: 1,
    bit_depths: &[1, 2, 4, 8],
    factory: palette_reader,
};

static GREYSCALE_ALPHA: ColorTypeInformation = ColorTypeInformation {
    scanline_factor: 2,
    bit_depths: &[8, 16],
    factory: greyscale_alpha_reader,
};

static TRUE_COLOR_ALPHA: ColorTypeInformation = ColorTypeInformation {
    scanline_factor: 4,
    bit_depths: &[8, 16],
    factory: true_color_alpha_reader,
};

impl ColorType {
    pub fn information(self) -> &'static ColorTypeInformation {
        match self {
            ColorType::Greyscale => &GREYSCALE,
            ColorType::TrueColor => &TRUE_COLOR,
            ColorType::Palette => &PALETTE,
            ColorType::GreyscaleAlpha => &GREYSCALE_ALPHA,
            ColorType::TrueColorAlpha => &TRUE_COLOR_ALPHA,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum ScanlineReader<'a> {
    Greyscale,
    TrueColor,
    Palette {
        colors: &'a Palette,
        alpha: Option<&'a Palette>,
    },
    GreyscaleAlpha,
    TrueColorAlpha,
}

impl ScanlineReader<'_> {
    /// Converts one defiltered scanline into exactly `header.width` pixels.
    pub fn read_scanline(&self, scanline: &[u8], header: &Header, row: &mut [Rgba]) -> ChromaResult<()> {
        let width = header.width as usize;
        if row.len() != width {
            return Err(ChromaError::TruncatedData {
                expected: width,
                actual: row.len(),
            });
        }

        let samples = expand_scanline(scanline, header)?;
        let factor = header.color_type.information().scanline_factor as usize;

        match *self {
            ScanlineReader::Greyscale => {
                let scale = grey_scale_factor(header.bit_depth);
                for_each_pixel(&samples, factor, row, |s| Ok(Rgba::grey(s[0] * scale, 255)))
            }
            ScanlineReader::TrueColor => for_each_pixel(&samples, factor, row, |s| Ok(Rgba::opaque(s[0], s[1], s[2]))),
            ScanlineReader::Palette { colors, alpha } => for_each_pixel(&samples, factor, row, |s| {
                let index = s[0] as usize;
                let [r, g, b] = colors.color(index)?;
                let a = alpha.map_or(255, |p| p.alpha(index));

                Ok(Rgba::new(r, g, b, a))
            }),
            ScanlineReader::GreyscaleAlpha => for_each_pixel(&samples, factor, row, |s| Ok(Rgba::grey(s[0], s[1]))),
            ScanlineReader::TrueColorAlpha => {
                for_each_pixel(&samples, factor, row, |s| Ok(Rgba::new(s[0], s[1], s[2], s[3])))
            }
        }
    }
}

// Multiplier taking a sub-byte grey sample to the full 0-255 range
fn grey_scale_factor(bit_depth: u8) -> u8 {
    match bit_depth {
        1 => 255,
        2 => 85,
        4 => 17,
        _ => 1,
    }
}

/// Unpacks a scanline to one byte per sample.
///
/// 8-bit lines are borrowed as-is, 16-bit samples keep their high byte, and
/// 1/2/4-bit samples are read most significant bits first.
pub fn expand_scanline<'a>(scanline: &'a [u8], header: &Header) -> ChromaResult<Cow<'a, [u8]>> {
    let samples = header.samples_per_row();

    match header.bit_depth {
        8 => Ok(Cow::Borrowed(scanline.get_range_safe(0..samples)?)),
        16 => {
            let bytes = scanline.get_range_safe(0..samples * 2)?;

            Ok(Cow::Owned(bytes.chunks_exact(2).map(|s| s[0]).collect()))
        }
        depth @ (1 | 2 | 4) => {
            let bits = samples * depth as usize;
            let bytes = scanline.get_range_safe(0..bits.div_ceil(8))?;

            let mut reader = BitReader::new(bytes);
            let mut out = Vec::with_capacity(samples);
            for _ in 0..samples {
                out.push(reader.read_bits(depth)? as u8);
            }

            Ok(Cow::Owned(out))
        }
        depth => Err(ChromaError::InvalidBitDepth {
            color_type: header.color_type as u8,
            bit_depth: depth,
        }),
    }
}

#[cfg(feature = "rayon")]
fn for_each_pixel<F>(samples: &[u8], factor: usize, row: &mut [Rgba], convert: F) -> ChromaResult<()>
where
    F: Fn(&[u8]) -> ChromaResult<Rgba> + Sync + Send,
{
    use rayon::prelude::*;

    if row.len() < PARALLEL_ROW_THRESHOLD {
        return for_each_pixel_serial(samples, factor, row, convert);
    }

    row.par_iter_mut()
        .zip(samples.par_chunks_exact(factor))
        .try_for_each(|(pixel, s)| {
            *pixel = convert(s)?;
            Ok(())
        })
}

#[cfg(not(feature = "rayon"))]
fn for_each_pixel<F>(samples: &[u8], factor: usize, row: &mut [Rgba], convert: F) -> ChromaResult<()>
where
    F: Fn(&[u8]) -> ChromaResult<Rgba>,
{
    for_each_pixel_serial(samples, factor, row, convert)
}

fn for_each_pixel_serial<F>(samples: &[u8], factor: usize, row: &mut [Rgba], convert: F) -> ChromaResult<()>
where
    F: Fn(&[u8]) -> ChromaResult<Rgba>,
{
    for (pixel, s) in row.iter_mut().zip(samples.chunks_exact(factor)) {
        *pixel = convert(s)?;
    }

    Ok(())
}
