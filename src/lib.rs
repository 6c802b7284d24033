//! # repix
//!
//! A batch image format converter with ZIP archive support.
//!
//! This library converts sets of raster images between PNG, JPEG and
//! WEBP. Inputs may be loose image files, ZIP archives of images, or a
//! mix of both; archives are expanded inline so the whole selection
//! becomes one flat work list. Converted results can be retrieved
//! individually or packed into a single downloadable ZIP archive.
//!
//! ## Features
//!
//! - Convert between PNG, JPEG and WEBP, preserving pixel dimensions
//! - Accept loose files and ZIP containers, expanded in input order
//! - Per-item failure isolation: one bad file never aborts the batch
//! - Collision-safe entry naming when packing the output archive
//! - Content-type-first classification for loose files, extension-based
//!   classification for archive entries
//!
//! ## Example
//!
//! ```no_run
//! use repix::{Format, RawFile, RunState};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let bytes = std::fs::read("photo.png")?;
//!
//!     let mut run = RunState::new();
//!     run.load_inputs(vec![RawFile::new("photo.png", None, bytes)]).await;
//!     run.convert_all(Format::Webp).await;
//!
//!     std::fs::write("converted_images.zip", run.pack_results()?)?;
//!     Ok(())
//! }
//! ```

pub mod classify;
pub mod cli;
pub mod codec;
pub mod io;
pub mod pipeline;
pub mod zip;

pub use classify::Format;
pub use cli::Cli;
pub use io::{LocalFileReader, MemoryReader, ReadAt};
pub use pipeline::{RawFile, RunState, SourceLock};
pub use zip::{ZipExtractor, ZipWriter};
