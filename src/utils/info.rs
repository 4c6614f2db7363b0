use std::fmt::{Display, Formatter};

use crate::formats::png::header::ColorType;
use crate::formats::png::property::Property;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PngInfo {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: ColorType,
    pub interlace: bool,
    pub palette_entries: Option<usize>,
    pub transparency_entries: Option<usize>,
    pub properties: Vec<Property>,
    pub idat_chunks: usize,
    pub compressed_size: usize,
}

impl Display for PngInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Dimensions: {}x{}", self.width, self.height)?;
        writeln!(f, "Bit depth: {}", self.bit_depth)?;
        writeln!(f, "Color type: {}", self.color_type)?;
        writeln!(f, "Interlaced: {}", self.interlace)?;

        match self.palette_entries {
            Some(entries) => writeln!(f, "Palette: {} entries", entries)?,
            None => writeln!(f, "Palette: None")?,
        }

        if let Some(entries) = self.transparency_entries {
            writeln!(f, "Transparency: {} entries", entries)?;
        }

        writeln!(f, "Image data: {} bytes in {} IDAT chunks", self.compressed_size, self.idat_chunks)?;

        writeln!(f, "====================")?;

        for property in &self.properties {
            writeln!(f, "{}: {}", property.key, property.value)?;
        }

        Ok(())
    }
}
