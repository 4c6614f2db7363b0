#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::path::Path;

    use chroma::{
        compression, filters, ChecksumPolicy, ChromaError, Chunk, ColorType, DecodeOptions, EncodeOptions,
        FilterStrategy, FilterType, Format, Header, Image, ImageFormat, Manager, PngDecoder, PngEncoder, PngFormat,
        Property, Rgba, PNG_SIGNATURE,
    };

    struct TestCase {
        name: &'static str,
        header: Header,
        chunks: Vec<Chunk>,
        // Already filtered scanlines, tag bytes included
        scanlines: Vec<u8>,
        validation: Box<dyn Fn(&Image)>,
    }

    /// Assembles a PNG in memory. Image data is split across `idat_parts` chunks.
    fn build_png(header: &Header, extra: &[Chunk], scanlines: &[u8], idat_parts: usize) -> Vec<u8> {
        let compressed = compression::compress(scanlines, 6).unwrap();
        let part = compressed.len().div_ceil(idat_parts).max(1);

        let mut bytes = PNG_SIGNATURE.to_vec();
        header.to_chunk().write(&mut bytes).unwrap();

        for chunk in extra {
            chunk.write(&mut bytes).unwrap();
        }

        for data in compressed.chunks(part) {
            Chunk::new(*b"IDAT", data.to_vec()).write(&mut bytes).unwrap();
        }

        Chunk::new(*b"IEND", Vec::new()).write(&mut bytes).unwrap();

        bytes
    }

    fn decode(bytes: &[u8], checksum: ChecksumPolicy) -> Result<Image, ChromaError> {
        PngDecoder::with_options(bytes, DecodeOptions { checksum }).decode()
    }

    fn encode(image: &Image, options: EncodeOptions) -> Result<Vec<u8>, ChromaError> {
        let mut bytes = Vec::new();
        PngEncoder::with_options(options).encode(&mut bytes, image)?;

        Ok(bytes)
    }

    fn sample_image(width: u32, height: u32) -> Image {
        let pixels = (0..width * height)
            .map(|i| {
                let (x, y) = (i % width, i / width);
                Rgba::new((x * 16) as u8, (y * 16) as u8, ((x ^ y) * 8) as u8, (255 - x * 3) as u8)
            })
            .collect();

        Image::from_pixels(width, height, pixels).unwrap()
    }

    fn run(test_case: TestCase) -> Result<(), Box<dyn std::error::Error>> {
        for parts in [1, 3] {
            let bytes = build_png(&test_case.header, &test_case.chunks, &test_case.scanlines, parts);

            match decode(&bytes, ChecksumPolicy::Verify) {
                Ok(image) => {
                    assert_eq!(image.width(), test_case.header.width, "{}", test_case.name);
                    assert_eq!(image.height(), test_case.header.height, "{}", test_case.name);
                    (test_case.validation)(&image);
                }
                Err(e) => panic!("{} failed: {}", test_case.name, e),
            }
        }

        Ok(())
    }

    #[test]
    fn test_color_types() -> Result<(), Box<dyn std::error::Error>> {
        let test_cases = vec![
            TestCase {
                name: "greyscale 8-bit",
                header: Header::new(2, 1, 8, ColorType::Greyscale),
                chunks: vec![],
                scanlines: vec![0, 0, 200],
                validation: Box::new(|image: &Image| {
                    assert_eq!(image.pixels(), &[Rgba::grey(0, 255), Rgba::grey(200, 255)]);
                }),
            },
            TestCase {
                name: "greyscale 4-bit",
                header: Header::new(2, 2, 4, ColorType::Greyscale),
                chunks: vec![],
                scanlines: vec![0, 0xF1, 0, 0x20],
                validation: Box::new(|image: &Image| {
                    let greys: Vec<u8> = image.pixels().iter().map(|p| p.r).collect();
                    assert_eq!(greys, vec![255, 17, 34, 0]);
                }),
            },
            TestCase {
                name: "truecolor 16-bit",
                header: Header::new(1, 1, 16, ColorType::TrueColor),
                chunks: vec![],
                scanlines: vec![0, 0x10, 0xFF, 0x20, 0xFF, 0x30, 0xFF],
                validation: Box::new(|image: &Image| {
                    assert_eq!(image.pixel(0, 0), Some(Rgba::opaque(0x10, 0x20, 0x30)));
                }),
            },
            TestCase {
                name: "palette with transparency",
                header: Header::new(3, 1, 8, ColorType::Palette),
                chunks: vec![
                    Chunk::new(*b"PLTE", vec![255, 0, 0, 0, 255, 0, 0, 0, 255]),
                    Chunk::new(*b"tRNS", vec![64]),
                ],
                scanlines: vec![0, 2, 1, 0],
                validation: Box::new(|image: &Image| {
                    assert_eq!(
                        image.pixels(),
                        &[Rgba::new(0, 0, 255, 255), Rgba::new(0, 255, 0, 255), Rgba::new(255, 0, 0, 64)]
                    );
                }),
            },
            TestCase {
                name: "greyscale alpha with paeth",
                header: Header::new(2, 2, 8, ColorType::GreyscaleAlpha),
                chunks: vec![],
                // Row 0 raw: (10, 20) (30, 40); row 1 raw: (11, 21) (31, 41)
                scanlines: {
                    let row0 = [10u8, 20, 30, 40];
                    let row1 = [11u8, 21, 31, 41];

                    let mut lines = filters::encode(FilterType::Sub, &row0, &[0; 4], 2);
                    lines.extend(filters::encode(FilterType::Paeth, &row1, &row0, 2));
                    lines
                },
                validation: Box::new(|image: &Image| {
                    assert_eq!(
                        image.pixels(),
                        &[Rgba::grey(10, 20), Rgba::grey(30, 40), Rgba::grey(11, 21), Rgba::grey(31, 41)]
                    );
                }),
            },
            TestCase {
                name: "truecolor alpha with text",
                header: Header::new(1, 1, 8, ColorType::TrueColorAlpha),
                chunks: vec![Property::new("Comment", "hi").to_chunk(), Chunk::new(*b"zzZz", vec![1, 2])],
                scanlines: vec![0, 1, 2, 3, 4],
                validation: Box::new(|image: &Image| {
                    assert_eq!(image.pixel(0, 0), Some(Rgba::new(1, 2, 3, 4)));
                }),
            },
        ];

        for test_case in test_cases {
            run(test_case)?;
        }

        Ok(())
    }

    #[test]
    fn test_encode_decode_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
        let image = sample_image(17, 11);

        for filter in [
            FilterStrategy::Adaptive,
            FilterStrategy::Fixed(FilterType::None),
            FilterStrategy::Fixed(FilterType::Sub),
            FilterStrategy::Fixed(FilterType::Up),
            FilterStrategy::Fixed(FilterType::Average),
            FilterStrategy::Fixed(FilterType::Paeth),
        ] {
            for compression in [0, 6, 9] {
                let options = EncodeOptions {
                    compression,
                    filter,
                    ..EncodeOptions::default()
                };

                let bytes = encode(&image, options)?;
                assert_eq!(decode(&bytes, ChecksumPolicy::Verify)?, image, "{:?} level {}", filter, compression);
            }
        }

        Ok(())
    }

    #[test]
    fn test_single_pixel_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
        let image = Image::from_pixels(1, 1, vec![Rgba::new(10, 20, 30, 255)])?;
        let bytes = encode(&image, EncodeOptions::default())?;

        assert_eq!(decode(&bytes, ChecksumPolicy::Verify)?.pixels(), &[Rgba::new(10, 20, 30, 255)]);

        Ok(())
    }

    #[test]
    fn test_properties_survive_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
        let options = EncodeOptions {
            properties: vec![Property::new("Title", "Sample"), Property::new("Author", "")],
            max_chunk_size: 8,
            ..EncodeOptions::default()
        };
        let bytes = encode(&sample_image(4, 4), options)?;

        let mut decoder = PngDecoder::new(&bytes[..]);
        decoder.decode()?;

        assert_eq!(
            decoder.properties(),
            &[Property::new("Title", "Sample"), Property::new("Author", "")]
        );

        let info = decoder.get_info()?;
        assert!(info.idat_chunks > 1);
        assert!(info.to_string().contains("Title: Sample"));

        Ok(())
    }

    #[test]
    fn test_checksum_policies() -> Result<(), Box<dyn std::error::Error>> {
        let image = sample_image(3, 3);
        let mut bytes = encode(&image, EncodeOptions::default())?;

        // Last byte of the IHDR CRC
        bytes[8 + 4 + 4 + 13 + 3] ^= 0xFF;

        assert!(matches!(
            decode(&bytes, ChecksumPolicy::Verify),
            Err(ChromaError::ChecksumMismatch { .. })
        ));
        assert_eq!(decode(&bytes, ChecksumPolicy::Warn)?, image);
        assert_eq!(decode(&bytes, ChecksumPolicy::Ignore)?, image);

        Ok(())
    }

    #[test]
    fn test_malformed_streams() {
        let header = Header::new(2, 2, 8, ColorType::Greyscale);

        let bad_filter = build_png(&header, &[], &[5, 0, 0, 0, 0, 0], 1);
        assert!(matches!(
            decode(&bad_filter, ChecksumPolicy::Verify),
            Err(ChromaError::UnknownFilterType(5))
        ));

        let short = build_png(&header, &[], &[0, 1, 2], 1);
        assert!(matches!(
            decode(&short, ChecksumPolicy::Verify),
            Err(ChromaError::TruncatedData { .. })
        ));

        let palette_header = Header::new(1, 1, 8, ColorType::Palette);
        let no_plte = build_png(&palette_header, &[], &[0, 0], 1);
        assert!(matches!(
            decode(&no_plte, ChecksumPolicy::Verify),
            Err(ChromaError::MissingChunk("PLTE"))
        ));

        let out_of_range = build_png(&palette_header, &[Chunk::new(*b"PLTE", vec![1, 2, 3])], &[0, 4], 1);
        assert!(matches!(
            decode(&out_of_range, ChecksumPolicy::Verify),
            Err(ChromaError::PaletteIndexOutOfRange { index: 4, len: 1 })
        ));
    }

    #[test]
    fn test_oversized_header_is_an_error() {
        let largest = Header::new(0x7FFF_FFFF, 0x7FFF_FFFF, 16, ColorType::TrueColorAlpha);
        let bytes = build_png(&largest, &[], &[0, 1, 2, 3], 1);
        assert!(matches!(
            decode(&bytes, ChecksumPolicy::Verify),
            Err(ChromaError::InvalidDimensions { .. } | ChromaError::TruncatedData { .. })
        ));

        let wide = Header::new(0x7FFF_FFFF, 1, 8, ColorType::Greyscale);
        let bytes = build_png(&wide, &[], &[0, 1, 2, 3], 1);
        assert!(matches!(
            decode(&bytes, ChecksumPolicy::Verify),
            Err(ChromaError::TruncatedData { actual: 4, .. })
        ));

        let beyond_limit = Header::new(0x8000_0000, 1, 8, ColorType::Greyscale);
        let bytes = build_png(&beyond_limit, &[], &[0, 1], 1);
        assert!(matches!(
            decode(&bytes, ChecksumPolicy::Verify),
            Err(ChromaError::InvalidDimensions { width: 0x8000_0000, height: 1 })
        ));
    }

    #[test]
    fn test_unknown_critical_chunk_is_rejected() {
        let header = Header::new(1, 1, 8, ColorType::Greyscale);

        let critical = build_png(&header, &[Chunk::new(*b"ZZZZ", vec![1, 2])], &[0, 9], 1);
        assert!(matches!(
            decode(&critical, ChecksumPolicy::Verify),
            Err(ChromaError::UnsupportedFormat(_))
        ));

        let ancillary = build_png(&header, &[Chunk::new(*b"zZZZ", vec![1, 2])], &[0, 9], 1);
        assert!(matches!(decode(&ancillary, ChecksumPolicy::Verify), Ok(image) if image.pixels() == [Rgba::grey(9, 255)]));
    }

    #[test]
    fn test_manager_dispatch() -> Result<(), Box<dyn std::error::Error>> {
        let manager = Manager::default();
        let image = sample_image(5, 3);

        let mut bytes: Vec<u8> = Vec::new();
        manager.encode(&mut bytes, &image, ImageFormat::Png)?;

        let mut stream = Cursor::new(bytes);
        assert_eq!(manager.decode(&mut stream)?, image);

        let mut bmp = Cursor::new(b"BM\x00\x00\x00\x00\x00\x00\x00\x00".to_vec());
        assert!(matches!(manager.decode(&mut bmp), Err(ChromaError::UnsupportedFormat(_))));

        assert!(manager.encode(&mut Vec::<u8>::new(), &image, ImageFormat::Jpeg).is_err());

        Ok(())
    }

    #[test]
    fn test_manager_files() -> Result<(), Box<dyn std::error::Error>> {
        let manager = Manager::new();
        let image = sample_image(6, 2);
        let path = std::env::temp_dir().join(format!("chroma_manager_{}.PNG", std::process::id()));

        manager.save(&path, &image)?;
        let decoded = manager.open(&path);
        std::fs::remove_file(&path)?;

        assert_eq!(decoded?, image);
        assert!(manager.save(Path::new("image.bmp"), &image).is_err());

        Ok(())
    }

    #[test]
    fn test_format_sniffing() -> Result<(), Box<dyn std::error::Error>> {
        let format = PngFormat::default();

        // Fewer than eight bytes can never match
        assert!(!format.can_decode_bytes(&[0x89, 0x50, 0x4E, 0x47]));
        assert!(format.can_decode_bytes(&PNG_SIGNATURE));

        let mut stream = Cursor::new(PNG_SIGNATURE.to_vec());
        assert!(format.can_decode_stream(&mut stream)?);
        assert_eq!(stream.position(), 0);

        assert!(format.can_encode(Path::new("picture.Png")));
        assert!(!format.can_encode(Path::new("picture.gif")));
        assert!(format.can_decode_path(Path::new("dir/picture.png")));

        Ok(())
    }

    #[test]
    fn test_paeth_reference_vectors() {
        let raw = [1u8, 2, 3, 4, 5, 6, 7, 8, 9];
        let prior = [9u8, 8, 7, 6, 5, 4, 3, 2, 1];

        assert_eq!(
            filters::decode(FilterType::Paeth, &raw, &prior, 1),
            vec![10, 11, 14, 18, 23, 29, 36, 44, 53]
        );

        let encoded = filters::encode(FilterType::Paeth, &raw, &prior, 1);
        assert_eq!(encoded[0], 4);
        assert_eq!(filters::decode(FilterType::Paeth, &encoded[1..], &prior, 1), raw.to_vec());
    }
}
