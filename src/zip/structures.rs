use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::Cursor;

use anyhow::{Result, bail};

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflate => 8,
            CompressionMethod::Unknown(v) => *v,
        }
    }
}

/// Central Directory File Header (CDFH)
pub const CDFH_SIGNATURE: &[u8] = b"PK\x01\x02";

/// Local File Header (LFH) - 30 bytes of fixed fields
pub const LFH_SIGNATURE: &[u8] = b"PK\x03\x04";
pub const LFH_SIZE: usize = 30;

/// General purpose flag bit 11: entry name is UTF-8
pub const UTF8_NAME_FLAG: u16 = 0x0800;

/// ZIP version field written into produced archives (2.0, DEFLATE capable)
pub const VERSION_DEFLATE: u16 = 20;

/// DOS timestamp written into produced archives (1980-01-01 00:00:00).
/// Produced archives are transient download payloads; a fixed timestamp
/// keeps packing deterministic.
pub const DOS_EPOCH_DATE: u16 = 0x0021;
pub const DOS_EPOCH_TIME: u16 = 0;

/// End of Central Directory (EOCD) - 22 bytes minimum
pub struct EndOfCentralDirectory {
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment_len: u16,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: &'static [u8] = b"PK\x05\x06";
    pub const SIZE: usize = 22;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE || &data[0..4] != Self::SIGNATURE {
            bail!("invalid End of Central Directory record");
        }

        let mut cursor = Cursor::new(&data[4..]);
        let _disk_number = cursor.read_u16::<LittleEndian>()?;
        let _disk_with_cd = cursor.read_u16::<LittleEndian>()?;

        Ok(Self {
            disk_entries: cursor.read_u16::<LittleEndian>()?,
            total_entries: cursor.read_u16::<LittleEndian>()?,
            cd_size: cursor.read_u32::<LittleEndian>()?,
            cd_offset: cursor.read_u32::<LittleEndian>()?,
            comment_len: cursor.read_u16::<LittleEndian>()?,
        })
    }

    /// ZIP64 archives store sentinel values here. They are out of scope
    /// for in-memory batches and rejected up front.
    pub fn has_zip64_markers(&self) -> bool {
        self.disk_entries == 0xFFFF
            || self.total_entries == 0xFFFF
            || self.cd_size == 0xFFFFFFFF
            || self.cd_offset == 0xFFFFFFFF
    }

    /// Serialize the full 22-byte record (single-disk, no comment) onto
    /// the end of the buffer.
    pub fn write_to(&self, buf: &mut Vec<u8>) -> Result<()> {
        buf.extend_from_slice(Self::SIGNATURE);
        buf.write_u16::<LittleEndian>(0)?; // disk number
        buf.write_u16::<LittleEndian>(0)?; // disk with CD
        buf.write_u16::<LittleEndian>(self.disk_entries)?;
        buf.write_u16::<LittleEndian>(self.total_entries)?;
        buf.write_u32::<LittleEndian>(self.cd_size)?;
        buf.write_u32::<LittleEndian>(self.cd_offset)?;
        buf.write_u16::<LittleEndian>(self.comment_len)?;
        Ok(())
    }
}

/// Parsed ZIP entry metadata from the Central Directory
#[derive(Debug, Clone)]
pub struct ZipEntry {
    pub file_name: String,
    pub compression_method: CompressionMethod,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub crc32: u32,
    pub lfh_offset: u32,
    pub is_directory: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eocd_round_trips_through_bytes() {
        let eocd = EndOfCentralDirectory {
            disk_entries: 3,
            total_entries: 3,
            cd_size: 150,
            cd_offset: 4096,
            comment_len: 0,
        };
        let mut bytes = Vec::new();
        eocd.write_to(&mut bytes).unwrap();

        let parsed = EndOfCentralDirectory::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.total_entries, 3);
        assert_eq!(parsed.cd_size, 150);
        assert_eq!(parsed.cd_offset, 4096);
        assert!(!parsed.has_zip64_markers());
    }

    #[test]
    fn eocd_rejects_bad_signature() {
        let eocd = EndOfCentralDirectory {
            disk_entries: 0,
            total_entries: 0,
            cd_size: 0,
            cd_offset: 0,
            comment_len: 0,
        };
        let mut bytes = Vec::new();
        eocd.write_to(&mut bytes).unwrap();
        bytes[0] = b'Q';
        assert!(EndOfCentralDirectory::from_bytes(&bytes).is_err());
    }

    #[test]
    fn compression_method_mapping() {
        assert_eq!(CompressionMethod::from_u16(0), CompressionMethod::Stored);
        assert_eq!(CompressionMethod::from_u16(8), CompressionMethod::Deflate);
        assert_eq!(CompressionMethod::from_u16(12), CompressionMethod::Unknown(12));
        assert_eq!(CompressionMethod::Deflate.as_u16(), 8);
    }
}
