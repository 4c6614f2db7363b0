use chroma::{
    ChecksumPolicy, ChromaResult, DecodeOptions, EncodeOptions, FilterStrategy, FilterType, Image, Logger, Manager,
    PngDecoder, PngFormat, PngInfo, Writer,
};
use clap::Parser;
use glob::glob;
use log::LevelFilter;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

#[derive(Parser, Debug)]
#[clap(name = "chroma")]
struct Cli {
    #[arg(required = true, help = "File or glob pattern")]
    path: String,

    #[arg(short, long, value_parser = ["png", "pam"], help = "Output format")]
    format: Option<String>,

    #[arg(short = 'o', long = "output-dir", help = "Output directory for converted files")]
    output_dir: Option<String>,

    #[arg(long, help = "Print chunk information")]
    info: bool,

    #[arg(long, help = "Decode the image without writing to a file")]
    void: bool,

    #[arg(long, help = "Warn instead of failing on CRC mismatches")]
    lenient: bool,

    #[arg(long = "no-crc", help = "Skip CRC verification")]
    no_crc: bool,

    #[arg(short = 'c', long, default_value_t = 6, value_parser = clap::value_parser!(u32).range(0..=9), help = "zlib compression level")]
    compression: u32,

    #[arg(long, default_value = "adaptive", value_parser = ["none", "sub", "up", "average", "paeth", "adaptive"], help = "Scanline filter")]
    filter: String,

    #[arg(short, long, help = "Enable debug logging")]
    verbose: bool,
}

impl Cli {
    fn decode_options(&self) -> DecodeOptions {
        let checksum = if self.no_crc {
            ChecksumPolicy::Ignore
        } else if self.lenient {
            ChecksumPolicy::Warn
        } else {
            ChecksumPolicy::Verify
        };

        DecodeOptions { checksum }
    }

    fn encode_options(&self) -> EncodeOptions {
        let filter = match self.filter.as_str() {
            "none" => FilterStrategy::Fixed(FilterType::None),
            "sub" => FilterStrategy::Fixed(FilterType::Sub),
            "up" => FilterStrategy::Fixed(FilterType::Up),
            "average" => FilterStrategy::Fixed(FilterType::Average),
            "paeth" => FilterStrategy::Fixed(FilterType::Paeth),
            _ => FilterStrategy::Adaptive,
        };

        EncodeOptions {
            compression: self.compression,
            filter,
            ..EncodeOptions::default()
        }
    }
}

fn get_files(path: &str) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut files = Vec::new();
    let base_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let absolute_pattern = if Path::new(path).is_relative() {
        base_dir.join(path).to_string_lossy().into_owned()
    } else {
        path.to_string()
    };

    for entry in glob(&absolute_pattern)? {
        match entry {
            Ok(path) => {
                if !path.is_file() {
                    continue;
                }

                files.push(path);
            }
            Err(e) => log::warn!("{}", e),
        }
    }

    Ok(files)
}

fn get_output_path(file: &Path, output_dir: Option<&str>, format: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let file_stem = file
        .file_stem()
        .ok_or("Invalid file name")?
        .to_str()
        .ok_or("Invalid file stem")?;

    let dir = match output_dir {
        Some(dir) => {
            let output_dir = Path::new(dir);

            // Create output directory if it doesn't exist
            if !output_dir.exists() {
                fs::create_dir_all(output_dir)?;
            }

            output_dir.to_path_buf()
        }
        None => file.parent().unwrap_or_else(|| Path::new(".")).to_path_buf(),
    };

    let output_path = dir.join(format!("{}.{}", file_stem, format));

    // Never overwrite the input
    if output_path == file {
        return Ok(dir.join(format!("{}_out.{}", file_stem, format)));
    }

    Ok(output_path)
}

/// Decodes for `--info`. There is no summary when decoding failed before IHDR.
fn read_info<R: Read>(reader: R, options: DecodeOptions) -> (Option<PngInfo>, ChromaResult<Image>) {
    let mut decoder = PngDecoder::with_options(reader, options);
    let result = decoder.decode();

    (decoder.get_info().ok(), result)
}

fn process_file(file: &Path, cli: &Cli, manager: &Manager) -> Result<(), Box<dyn std::error::Error>> {
    log::info!("File: {}", file.display());
    let start = Instant::now();

    if cli.info {
        let (info, result) = read_info(BufReader::new(File::open(file)?), cli.decode_options());

        if let Some(info) = info {
            println!("{}", info);
        }
        result?;

        return Ok(());
    }

    let image = manager.open(file)?;
    log::debug!("Decoded {}x{} in {:?}", image.width(), image.height(), start.elapsed());

    if cli.void {
        return Ok(());
    }

    let format = cli.format.as_deref().unwrap_or("png");
    let output_path = get_output_path(file, cli.output_dir.as_deref(), format)?;

    log::info!("Writing to: {}", output_path.display());
    match format {
        "pam" => Writer::write_pam(&output_path, &image)?,
        _ => manager.save(&output_path, &image)?,
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    if let Err(e) = Logger::init(level) {
        eprintln!("Failed to initialise logger: {}", e);
    }

    let mut manager = Manager::empty();
    manager.register(Box::new(PngFormat::new(cli.decode_options(), cli.encode_options())));

    let files = match get_files(&cli.path) {
        Ok(files) => files,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if files.is_empty() {
        log::warn!("No files matched {}", cli.path);
    }

    let mut failed = 0;
    for file in &files {
        if let Err(e) = process_file(file, &cli, &manager) {
            log::error!("{}: {}", file.display(), e);
            failed += 1;
        }
    }

    if failed > 0 {
        log::error!("{} of {} files failed", failed, files.len());
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;
    use chroma::{ChromaError, PngEncoder};

    #[test]
    fn test_info_keeps_decode_error_without_header() {
        let (info, result) = read_info(&b"not a png at all"[..], DecodeOptions::default());

        assert!(info.is_none());
        assert!(matches!(result, Err(ChromaError::InvalidSignature)));
    }

    #[test]
    fn test_info_for_valid_stream() -> Result<(), Box<dyn std::error::Error>> {
        let mut bytes = Vec::new();
        PngEncoder::new().encode(&mut bytes, &Image::new(3, 2))?;

        let (info, result) = read_info(&bytes[..], DecodeOptions::default());
        let info = info.ok_or("missing info")?;

        assert_eq!((info.width, info.height), (3, 2));
        assert_eq!(result?.width(), 3);

        Ok(())
    }
}
