use crate::utils::error::{ChromaError, ChromaResult};

/// A single 32-bit RGBA pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Rgba {
        Rgba { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Rgba {
        Rgba { r, g, b, a: 255 }
    }

    pub const fn grey(value: u8, a: u8) -> Rgba {
        Rgba {
            r: value,
            g: value,
            b: value,
            a,
        }
    }

    pub const fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Row-major RGBA pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
}

impl Image {
    /// Creates a blank (all zero) image.
    pub fn new(width: u32, height: u32) -> Image {
        Image {
            width,
            height,
            pixels: vec![Rgba::default(); width as usize * height as usize],
        }
    }

    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Rgba>) -> ChromaResult<Image> {
        if width == 0 || height == 0 || pixels.len() != width as usize * height as usize {
            return Err(ChromaError::InvalidDimensions { width, height });
        }

        Ok(Image { width, height, pixels })
    }

    /// Builds an image from tightly packed RGBA8 bytes.
    pub fn from_rgba8(width: u32, height: u32, bytes: &[u8]) -> ChromaResult<Image> {
        if bytes.len() % 4 != 0 {
            return Err(ChromaError::InvalidDimensions { width, height });
        }

        let pixels = bytes
            .chunks_exact(4)
            .map(|p| Rgba::new(p[0], p[1], p[2], p[3]))
            .collect();

        Image::from_pixels(width, height, pixels)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Rgba] {
        &mut self.pixels
    }

    pub fn into_pixels(self) -> Vec<Rgba> {
        self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }

        self.pixels.get(y as usize * self.width as usize + x as usize).copied()
    }

    pub fn row(&self, y: u32) -> &[Rgba] {
        let width = self.width as usize;
        let start = y as usize * width;

        &self.pixels[start..start + width]
    }

    pub fn has_alpha(&self) -> bool {
        self.pixels.iter().any(|p| p.a != 255)
    }

    /// Returns the pixels as a vector of RGBA8 bytes
    pub fn as_rgba8(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|p| p.to_bytes()).collect()
    }

    /// Returns the pixels as a vector of RGB8 bytes, dropping alpha
    pub fn as_rgb8(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|p| [p.r, p.g, p.b]).collect()
    }
}
