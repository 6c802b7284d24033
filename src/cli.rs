use clap::Parser;
use std::path::PathBuf;

use crate::classify::Format;
use crate::pipeline::ARCHIVE_NAME;

#[derive(Parser, Debug)]
#[command(name = "repix")]
#[command(version)]
#[command(about = "Batch image converter with ZIP archive support", long_about = None)]
#[command(after_help = "Examples:\n  \
  repix a.png b.jpg -f webp           convert loose files into converted_images.zip\n  \
  repix batch.zip -f jpeg -o out.zip  convert a ZIP of images into out.zip\n  \
  repix batch.zip -f png -d outdir    write converted files individually into outdir\n  \
  repix -l batch.zip photo.png        show how inputs would be classified")]
pub struct Cli {
    /// Image files or ZIP archives to convert
    #[arg(value_name = "FILES", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Target format: png, jpeg or webp
    #[arg(
        short = 'f',
        long = "format",
        value_name = "FORMAT",
        value_parser = parse_format,
        required_unless_present = "list"
    )]
    pub format: Option<Format>,

    /// List classified inputs without converting
    #[arg(short = 'l')]
    pub list: bool,

    /// Write converted files into DIR instead of an archive
    #[arg(short = 'd', value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Output archive path (default: converted_images.zip)
    #[arg(short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

fn parse_format(value: &str) -> Result<Format, String> {
    match value.to_ascii_lowercase().as_str() {
        "png" => Ok(Format::Png),
        "jpg" | "jpeg" => Ok(Format::Jpeg),
        "webp" => Ok(Format::Webp),
        other => Err(format!("unsupported target format: {other}")),
    }
}

impl Cli {
    pub fn is_quiet(&self) -> bool {
        self.quiet > 0
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }

    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(ARCHIVE_NAME))
    }
}
