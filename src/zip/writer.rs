//! In-memory ZIP archive writer.
//!
//! Mirrors the read path: Local File Headers with DEFLATE-compressed
//! data, followed by the Central Directory and a single EOCD record.
//! The whole archive is assembled in one buffer; callers either get the
//! complete byte stream or an error, never a partial file.
//!
//! Entry names are deduplicated within one writer: a colliding name gets
//! `(n)` inserted before its extension, counting up from 1 until free.

use byteorder::{LittleEndian, WriteBytesExt};
use std::collections::HashSet;
use std::io::Write;

use anyhow::{Result, bail};
use flate2::{Compression, Crc, write::DeflateEncoder};

use super::structures::*;

/// Record kept per entry until the Central Directory is emitted.
struct CentralRecord {
    name: String,
    crc32: u32,
    compressed_size: u32,
    uncompressed_size: u32,
    lfh_offset: u32,
}

/// Builds a ZIP archive in memory.
pub struct ZipWriter {
    buf: Vec<u8>,
    central: Vec<CentralRecord>,
    used_names: HashSet<String>,
}

impl ZipWriter {
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            central: Vec::new(),
            used_names: HashSet::new(),
        }
    }

    /// Append a file entry, renaming on collision.
    ///
    /// Returns the name actually stored in the archive.
    pub fn add_entry(&mut self, name: &str, data: &[u8]) -> Result<String> {
        if data.len() > u32::MAX as usize {
            bail!("entry too large for a ZIP archive: {name}");
        }
        if self.central.len() >= u16::MAX as usize {
            bail!("too many entries for a single archive");
        }

        let name = self.claim_name(name);

        let mut crc = Crc::new();
        crc.update(data);

        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data)?;
        let compressed = encoder.finish()?;

        let lfh_offset = self.position()?;

        self.buf.extend_from_slice(LFH_SIGNATURE);
        self.buf.write_u16::<LittleEndian>(VERSION_DEFLATE)?;
        self.buf.write_u16::<LittleEndian>(UTF8_NAME_FLAG)?;
        self.buf
            .write_u16::<LittleEndian>(CompressionMethod::Deflate.as_u16())?;
        self.buf.write_u16::<LittleEndian>(DOS_EPOCH_TIME)?;
        self.buf.write_u16::<LittleEndian>(DOS_EPOCH_DATE)?;
        self.buf.write_u32::<LittleEndian>(crc.sum())?;
        self.buf.write_u32::<LittleEndian>(compressed.len() as u32)?;
        self.buf.write_u32::<LittleEndian>(data.len() as u32)?;
        self.buf.write_u16::<LittleEndian>(name.len() as u16)?;
        self.buf.write_u16::<LittleEndian>(0)?; // extra field length
        self.buf.extend_from_slice(name.as_bytes());
        self.buf.extend_from_slice(&compressed);

        self.central.push(CentralRecord {
            name: name.clone(),
            crc32: crc.sum(),
            compressed_size: compressed.len() as u32,
            uncompressed_size: data.len() as u32,
            lfh_offset,
        });

        Ok(name)
    }

    /// Emit the Central Directory and EOCD, yielding the archive bytes.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        let cd_offset = self.position()?;

        for record in &self.central {
            self.buf.extend_from_slice(CDFH_SIGNATURE);
            self.buf.write_u16::<LittleEndian>(VERSION_DEFLATE)?; // version made by
            self.buf.write_u16::<LittleEndian>(VERSION_DEFLATE)?; // version needed
            self.buf.write_u16::<LittleEndian>(UTF8_NAME_FLAG)?;
            self.buf
                .write_u16::<LittleEndian>(CompressionMethod::Deflate.as_u16())?;
            self.buf.write_u16::<LittleEndian>(DOS_EPOCH_TIME)?;
            self.buf.write_u16::<LittleEndian>(DOS_EPOCH_DATE)?;
            self.buf.write_u32::<LittleEndian>(record.crc32)?;
            self.buf.write_u32::<LittleEndian>(record.compressed_size)?;
            self.buf.write_u32::<LittleEndian>(record.uncompressed_size)?;
            self.buf.write_u16::<LittleEndian>(record.name.len() as u16)?;
            self.buf.write_u16::<LittleEndian>(0)?; // extra field length
            self.buf.write_u16::<LittleEndian>(0)?; // comment length
            self.buf.write_u16::<LittleEndian>(0)?; // disk number start
            self.buf.write_u16::<LittleEndian>(0)?; // internal attributes
            self.buf.write_u32::<LittleEndian>(0)?; // external attributes
            self.buf.write_u32::<LittleEndian>(record.lfh_offset)?;
            self.buf.extend_from_slice(record.name.as_bytes());
        }

        let cd_end = self.position()?;
        let eocd = EndOfCentralDirectory {
            disk_entries: self.central.len() as u16,
            total_entries: self.central.len() as u16,
            cd_size: cd_end - cd_offset,
            cd_offset,
            comment_len: 0,
        };
        eocd.write_to(&mut self.buf)?;

        Ok(self.buf)
    }

    fn position(&self) -> Result<u32> {
        if self.buf.len() > u32::MAX as usize {
            bail!("archive exceeds 4 GiB");
        }
        Ok(self.buf.len() as u32)
    }

    fn claim_name(&mut self, proposed: &str) -> String {
        unique_name(&mut self.used_names, proposed)
    }
}

/// Resolve a proposed name against a set of names already used, claiming
/// the result.
///
/// First use wins the plain name. A collision strips the extension,
/// appends `(n)` to the base (or `file` when the base is empty) and
/// counts n up until the name is free.
pub fn unique_name(used: &mut HashSet<String>, proposed: &str) -> String {
    if used.insert(proposed.to_string()) {
        return proposed.to_string();
    }

    let (base, ext) = match proposed.rsplit_once('.') {
        Some((base, ext)) => (base, Some(ext)),
        None => (proposed, None),
    };
    let base = if base.is_empty() { "file" } else { base };

    let mut n = 1u32;
    loop {
        let candidate = match ext {
            Some(ext) => format!("{base}({n}).{ext}"),
            None => format!("{base}({n})"),
        };
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

impl Default for ZipWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryReader;
    use crate::zip::ZipExtractor;
    use std::sync::Arc;

    #[test]
    fn collision_appends_counter_before_extension() {
        let mut writer = ZipWriter::new();
        assert_eq!(writer.add_entry("a.png", b"one").unwrap(), "a.png");
        assert_eq!(writer.add_entry("a.png", b"two").unwrap(), "a(1).png");

        assert_eq!(writer.add_entry("b.png", b"x").unwrap(), "b.png");
        assert_eq!(writer.add_entry("b.png", b"y").unwrap(), "b(1).png");
        assert_eq!(writer.add_entry("b.png", b"z").unwrap(), "b(2).png");
    }

    #[test]
    fn collision_without_extension() {
        let mut writer = ZipWriter::new();
        assert_eq!(writer.add_entry("name", b"1").unwrap(), "name");
        assert_eq!(writer.add_entry("name", b"2").unwrap(), "name(1)");
    }

    #[test]
    fn collision_with_empty_base_uses_file() {
        let mut writer = ZipWriter::new();
        assert_eq!(writer.add_entry(".png", b"1").unwrap(), ".png");
        assert_eq!(writer.add_entry(".png", b"2").unwrap(), "file(1).png");
    }

    #[test]
    fn counter_skips_names_already_taken() {
        let mut writer = ZipWriter::new();
        writer.add_entry("a.png", b"1").unwrap();
        writer.add_entry("a(1).png", b"2").unwrap();
        // a(1).png is taken, so the collision lands on a(2).png
        assert_eq!(writer.add_entry("a.png", b"3").unwrap(), "a(2).png");
    }

    #[tokio::test]
    async fn written_archive_reads_back() {
        let mut writer = ZipWriter::new();
        writer.add_entry("first.png", b"first bytes").unwrap();
        writer.add_entry("second.jpg", b"second bytes").unwrap();
        let archive = writer.finish().unwrap();

        let extractor = ZipExtractor::new(Arc::new(MemoryReader::new(archive)));
        let entries = extractor.entries().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].file_name, "first.png");
        assert_eq!(entries[1].file_name, "second.jpg");

        let data = extractor.read_entry(&entries[0]).await.unwrap();
        assert_eq!(data, b"first bytes");
        let data = extractor.read_entry(&entries[1]).await.unwrap();
        assert_eq!(data, b"second bytes");
    }

    #[tokio::test]
    async fn empty_archive_is_still_valid() {
        let archive = ZipWriter::new().finish().unwrap();
        let extractor = ZipExtractor::new(Arc::new(MemoryReader::new(archive)));
        assert!(extractor.entries().await.unwrap().is_empty());
    }
}
