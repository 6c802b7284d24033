use super::ReadAt;
use anyhow::{Result, bail};
use async_trait::async_trait;

/// In-memory byte buffer with random access support.
///
/// This is the reader used for archives that arrive as raw bytes
/// (uploaded files, archive entries already extracted into memory).
pub struct MemoryReader {
    data: Vec<u8>,
}

impl MemoryReader {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }
}

#[async_trait]
impl ReadAt for MemoryReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let start = offset as usize;
        let end = start + buf.len();
        if end > self.data.len() {
            bail!(
                "read past end of buffer: {}..{} of {}",
                start,
                end,
                self.data.len()
            );
        }
        buf.copy_from_slice(&self.data[start..end]);
        Ok(buf.len())
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_at_offset() {
        let reader = MemoryReader::new(vec![1, 2, 3, 4, 5]);
        let mut buf = [0u8; 2];
        reader.read_at(2, &mut buf).await.unwrap();
        assert_eq!(buf, [3, 4]);
        assert_eq!(reader.size(), 5);
    }

    #[tokio::test]
    async fn rejects_out_of_range_reads() {
        let reader = MemoryReader::new(vec![1, 2, 3]);
        let mut buf = [0u8; 4];
        assert!(reader.read_at(1, &mut buf).await.is_err());
    }
}
