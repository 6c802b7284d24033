//! ZIP archive reading and writing.
//!
//! This module implements both directions of the archive pipeline:
//! unpacking uploaded ZIP containers into named entries, and packing
//! converted results back into a downloadable archive.
//!
//! ## Architecture
//!
//! - [`structures`]: Data structures for ZIP format elements (EOCD, file headers)
//! - [`parser`]: Low-level parsing of ZIP structures from raw bytes
//! - [`extractor`]: High-level entry listing and decompression
//! - [`writer`]: In-memory archive assembly with collision-safe entry names
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. End of Central Directory (EOCD) record at the end
//!
//! Reading starts from the EOCD at the tail, then walks the Central
//! Directory; writing appends local headers and data first and emits the
//! directory last, so an archive is only complete once `finish` returns.
//!
//! ## Supported Features
//!
//! - Standard ZIP format (PKZIP APPNOTE 6.3.x compatible)
//! - STORED (no compression) and DEFLATE methods on the read side
//! - DEFLATE at default compression on the write side
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - No ZIP64 (in-memory batches stay well below the 4 GiB boundaries)

mod extractor;
mod parser;
mod structures;
mod writer;

pub use extractor::ZipExtractor;
pub use parser::ZipParser;
pub use structures::*;
pub use writer::{ZipWriter, unique_name};
