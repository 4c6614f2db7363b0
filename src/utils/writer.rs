use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::utils::image::Image;

pub struct Writer {}

impl Writer {
    /// Writes `image` as a PAM file: RGB when fully opaque, RGB_ALPHA otherwise.
    pub fn write_pam(output_path: &Path, image: &Image) -> Result<(), std::io::Error> {
        let mut file = BufWriter::new(File::create(output_path)?);
        Writer::write_pam_to(&mut file, image)?;
        file.flush()
    }

    pub fn write_pam_to<W: Write>(writer: &mut W, image: &Image) -> Result<(), std::io::Error> {
        Writer::validate_pixel_count(image)?;

        writer.write_all(b"P7\n")?;
        writer.write_all(format!("WIDTH {}\n", image.width()).as_bytes())?;
        writer.write_all(format!("HEIGHT {}\n", image.height()).as_bytes())?;

        if image.has_alpha() {
            writer.write_all(b"DEPTH 4\nMAXVAL 255\nTUPLTYPE RGB_ALPHA\nENDHDR\n")?;
            writer.write_all(&image.as_rgba8())?;
        } else {
            writer.write_all(b"DEPTH 3\nMAXVAL 255\nTUPLTYPE RGB\nENDHDR\n")?;
            writer.write_all(&image.as_rgb8())?;
        }

        Ok(())
    }

    fn validate_pixel_count(image: &Image) -> Result<(), std::io::Error> {
        let width = image.width() as usize;
        let height = image.height() as usize;

        let expected_size = width * height;
        let actual_size = image.pixels().len();

        if expected_size == 0 || expected_size != actual_size {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!(
                    "Invalid pixel data size for {}x{} image: expected {} pixels, got {}",
                    width, height, expected_size, actual_size
                ),
            ));
        }

        Ok(())
    }
}
