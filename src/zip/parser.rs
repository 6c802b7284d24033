//! Low-level ZIP archive parser.
//!
//! This module handles the binary parsing of ZIP file structures,
//! reading from any source that implements the [`ReadAt`] trait.
//!
//! ## Parsing Strategy
//!
//! ZIP files are designed to be read from the end:
//! 1. Find the End of Central Directory (EOCD) at the file's end
//! 2. Read the Central Directory to get metadata for all entries
//! 3. For extraction, read each entry's Local File Header and data
//!
//! Entries are returned in central-directory enumeration order, which
//! downstream stages preserve.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};
use std::sync::Arc;

use crate::io::ReadAt;
use anyhow::{Result, bail};

use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// This limits the search area when looking for EOCD with a comment.
const MAX_COMMENT_SIZE: u64 = 65535;

/// Low-level ZIP parser, generic over the data source.
///
/// Typically used through [`ZipExtractor`](super::ZipExtractor)
/// rather than directly.
pub struct ZipParser<R: ReadAt> {
    /// The underlying data source
    reader: Arc<R>,
    /// Total size of the archive in bytes
    size: u64,
}

impl<R: ReadAt> ZipParser<R> {
    pub fn new(reader: Arc<R>) -> Self {
        let size = reader.size();
        Self { reader, size }
    }

    /// Find and parse the End of Central Directory record.
    ///
    /// The EOCD sits at the end of the archive. The common case (no
    /// trailing comment) is probed directly; otherwise the tail of the
    /// file is searched backwards for the signature.
    ///
    /// # Errors
    ///
    /// Returns an error if no valid EOCD can be found (the bytes are not
    /// a ZIP archive) or if the archive requires ZIP64 support.
    pub async fn find_eocd(&self) -> Result<EndOfCentralDirectory> {
        // Fast path: EOCD with a zero-length comment at the very end.
        if self.size >= EndOfCentralDirectory::SIZE as u64 {
            let offset = self.size - EndOfCentralDirectory::SIZE as u64;
            let mut buf = vec![0u8; EndOfCentralDirectory::SIZE];
            self.reader.read_at(offset, &mut buf).await?;

            if &buf[0..4] == EndOfCentralDirectory::SIGNATURE && &buf[20..22] == b"\x00\x00" {
                return Self::check_eocd(EndOfCentralDirectory::from_bytes(&buf)?);
            }
        }

        // The EOCD could be earlier if the archive carries a comment.
        // Search backwards through the maximum comment window.
        let search_size = (MAX_COMMENT_SIZE + EndOfCentralDirectory::SIZE as u64).min(self.size);
        let search_start = self.size - search_size;

        let mut buf = vec![0u8; search_size as usize];
        self.reader.read_at(search_start, &mut buf).await?;

        for i in (0..buf.len().saturating_sub(EndOfCentralDirectory::SIZE)).rev() {
            if &buf[i..i + 4] == EndOfCentralDirectory::SIGNATURE {
                // Candidate EOCD: the comment length field must account
                // for exactly the remaining bytes.
                let comment_len = u16::from_le_bytes([buf[i + 20], buf[i + 21]]) as usize;

                if comment_len == buf.len() - i - EndOfCentralDirectory::SIZE {
                    let eocd =
                        EndOfCentralDirectory::from_bytes(&buf[i..i + EndOfCentralDirectory::SIZE])?;
                    return Self::check_eocd(eocd);
                }
            }
        }

        bail!("not a valid ZIP archive")
    }

    fn check_eocd(eocd: EndOfCentralDirectory) -> Result<EndOfCentralDirectory> {
        if eocd.has_zip64_markers() {
            bail!("ZIP64 archives are not supported");
        }
        if eocd.disk_entries != eocd.total_entries {
            bail!("multi-disk archives are not supported");
        }
        Ok(eocd)
    }

    /// List all entries in the archive, in central-directory order.
    pub async fn list_entries(&self) -> Result<Vec<ZipEntry>> {
        let eocd = self.find_eocd().await?;

        let mut cd_data = vec![0u8; eocd.cd_size as usize];
        self.reader.read_at(eocd.cd_offset as u64, &mut cd_data).await?;

        let mut entries = Vec::with_capacity(eocd.total_entries as usize);
        let mut cursor = Cursor::new(&cd_data);

        for _ in 0..eocd.total_entries {
            entries.push(Self::parse_cdfh(&mut cursor)?);
        }

        Ok(entries)
    }

    /// Parse one Central Directory File Header from the cursor.
    fn parse_cdfh(cursor: &mut Cursor<&Vec<u8>>) -> Result<ZipEntry> {
        let mut sig = [0u8; 4];
        cursor.read_exact(&mut sig)?;
        if sig != CDFH_SIGNATURE {
            bail!("invalid Central Directory entry");
        }

        let _version_made_by = cursor.read_u16::<LittleEndian>()?;
        let _version_needed = cursor.read_u16::<LittleEndian>()?;
        let _flags = cursor.read_u16::<LittleEndian>()?;
        let compression_method = cursor.read_u16::<LittleEndian>()?;
        let _last_mod_time = cursor.read_u16::<LittleEndian>()?;
        let _last_mod_date = cursor.read_u16::<LittleEndian>()?;
        let crc32 = cursor.read_u32::<LittleEndian>()?;
        let compressed_size = cursor.read_u32::<LittleEndian>()?;
        let uncompressed_size = cursor.read_u32::<LittleEndian>()?;
        let file_name_length = cursor.read_u16::<LittleEndian>()?;
        let extra_field_length = cursor.read_u16::<LittleEndian>()?;
        let file_comment_length = cursor.read_u16::<LittleEndian>()?;
        let _disk_number_start = cursor.read_u16::<LittleEndian>()?;
        let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
        let _external_attrs = cursor.read_u32::<LittleEndian>()?;
        let lfh_offset = cursor.read_u32::<LittleEndian>()?;

        let mut file_name_bytes = vec![0u8; file_name_length as usize];
        cursor.read_exact(&mut file_name_bytes)?;
        // Lossy conversion keeps non-UTF8 names usable in diagnostics
        let file_name = String::from_utf8_lossy(&file_name_bytes).to_string();

        // Directory entries end with '/'
        let is_directory = file_name.ends_with('/');

        // Extra fields and per-entry comments carry nothing we need
        cursor.set_position(
            cursor.position() + extra_field_length as u64 + file_comment_length as u64,
        );

        Ok(ZipEntry {
            file_name,
            compression_method: CompressionMethod::from_u16(compression_method),
            compressed_size,
            uncompressed_size,
            crc32,
            lfh_offset,
            is_directory,
        })
    }

    /// Compute the offset where an entry's file data begins.
    ///
    /// The Local File Header repeats the name and extra field with
    /// possibly different lengths than the Central Directory records,
    /// so the LFH itself must be consulted.
    pub async fn data_offset(&self, entry: &ZipEntry) -> Result<u64> {
        let mut lfh_buf = vec![0u8; LFH_SIZE];
        self.reader.read_at(entry.lfh_offset as u64, &mut lfh_buf).await?;

        if &lfh_buf[0..4] != LFH_SIGNATURE {
            bail!("invalid Local File Header");
        }

        let mut cursor = Cursor::new(&lfh_buf);
        cursor.set_position(26); // offset of the filename length field

        let file_name_length = cursor.read_u16::<LittleEndian>()? as u64;
        let extra_field_length = cursor.read_u16::<LittleEndian>()? as u64;

        Ok(entry.lfh_offset as u64 + LFH_SIZE as u64 + file_name_length + extra_field_length)
    }

    /// Shared reference to the underlying reader.
    pub fn reader(&self) -> &Arc<R> {
        &self.reader
    }
}
