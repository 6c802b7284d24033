use std::io::Read;
use std::sync::Arc;

use crate::io::ReadAt;
use anyhow::{Context, Result, bail};
use flate2::Crc;
use flate2::read::DeflateDecoder;

use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipEntry};

/// High-level ZIP reading API
pub struct ZipExtractor<R: ReadAt> {
    parser: ZipParser<R>,
}

impl<R: ReadAt> ZipExtractor<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self {
            parser: ZipParser::new(reader),
        }
    }

    /// List all entries in the archive
    pub async fn entries(&self) -> Result<Vec<ZipEntry>> {
        self.parser.list_entries().await
    }

    /// Read and decompress one entry's data into memory.
    ///
    /// STORED and DEFLATE entries are supported; the decompressed bytes
    /// are verified against the recorded size and CRC-32 so that corrupt
    /// entries fail here rather than downstream.
    pub async fn read_entry(&self, entry: &ZipEntry) -> Result<Vec<u8>> {
        let data_offset = self.parser.data_offset(entry).await?;

        let mut raw = vec![0u8; entry.compressed_size as usize];
        self.parser.reader().read_at(data_offset, &mut raw).await?;

        let data = match entry.compression_method {
            CompressionMethod::Stored => raw,
            CompressionMethod::Deflate => {
                let mut out = Vec::with_capacity(entry.uncompressed_size as usize);
                DeflateDecoder::new(raw.as_slice())
                    .read_to_end(&mut out)
                    .context("corrupt DEFLATE stream")?;
                out
            }
            CompressionMethod::Unknown(method) => {
                bail!("unsupported compression method: {method}");
            }
        };

        if data.len() != entry.uncompressed_size as usize {
            bail!(
                "decompressed size mismatch: got {}, expected {}",
                data.len(),
                entry.uncompressed_size
            );
        }

        let mut crc = Crc::new();
        crc.update(&data);
        if crc.sum() != entry.crc32 {
            bail!("CRC mismatch");
        }

        Ok(data)
    }
}
