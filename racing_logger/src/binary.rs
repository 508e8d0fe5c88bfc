//! Fixed 64-byte binary log file header plus the packed `LogSample` stream
//! that follows it (`spec.md` §4.9), grounded on the corpus's
//! `const_assert_eq!`-pinned fixed-header convention for on-disk/shared
//! layouts.

use racing_common::error::{RuntimeError, RuntimeResult};

use crate::sample::{LogSample, LOG_SAMPLE_SIZE};
use crate::storage::{Storage, StorageHandle};

pub const MAGIC: [u8; 4] = *b"RDLG";
pub const FORMAT_VERSION: u16 = 1;
pub const HEADER_SIZE: usize = 64;

/// The file header, exactly [`HEADER_SIZE`] bytes on disk.
#[derive(Debug, Clone, Copy)]
pub struct BinaryLogHeader {
    pub magic: [u8; 4],
    pub version: u16,
    pub flags: u16,
    pub header_size: u16,
    pub schema_hash: u32,
    pub session_start_utc: u64,
}

static_assertions::const_assert!(
    4 + 2 + 2 + 2 + 4 + 8 <= HEADER_SIZE
);

impl BinaryLogHeader {
    pub fn new(schema_hash: u32, session_start_utc: u64) -> Self {
        Self {
            magic: MAGIC,
            version: FORMAT_VERSION,
            flags: 0,
            header_size: HEADER_SIZE as u16,
            schema_hash,
            session_start_utc,
        }
    }

    pub fn to_bytes(self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0..4].copy_from_slice(&self.magic);
        out[4..6].copy_from_slice(&self.version.to_le_bytes());
        out[6..8].copy_from_slice(&self.flags.to_le_bytes());
        out[8..10].copy_from_slice(&self.header_size.to_le_bytes());
        out[10..14].copy_from_slice(&self.schema_hash.to_le_bytes());
        out[14..22].copy_from_slice(&self.session_start_utc.to_le_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8; HEADER_SIZE]) -> RuntimeResult<Self> {
        if bytes[0..4] != MAGIC {
            return Err(RuntimeError::InvalidFormat);
        }
        let version = u16::from_le_bytes(bytes[4..6].try_into().unwrap());
        if version != FORMAT_VERSION {
            return Err(RuntimeError::InvalidFormat);
        }
        Ok(Self {
            magic: MAGIC,
            version,
            flags: u16::from_le_bytes(bytes[6..8].try_into().unwrap()),
            header_size: u16::from_le_bytes(bytes[8..10].try_into().unwrap()),
            schema_hash: u32::from_le_bytes(bytes[10..14].try_into().unwrap()),
            session_start_utc: u64::from_le_bytes(bytes[14..22].try_into().unwrap()),
        })
    }
}

/// Writes the fixed header once, then a contiguous stream of packed
/// [`LogSample`] records.
pub struct BinaryWriter<'s, S: Storage> {
    storage: &'s S,
    handle: StorageHandle,
    header_written: bool,
}

impl<'s, S: Storage> BinaryWriter<'s, S> {
    pub fn create(storage: &'s S, handle: StorageHandle) -> Self {
        Self {
            storage,
            handle,
            header_written: false,
        }
    }

    pub fn write_header(&mut self, header: BinaryLogHeader) -> RuntimeResult<()> {
        self.storage.write(&mut self.handle, &header.to_bytes())?;
        self.header_written = true;
        Ok(())
    }

    /// Write one contiguous batch of samples in a single storage call, per
    /// `spec.md` §4.9's "Recording" write-buffer flush contract.
    pub fn write_batch(&mut self, samples: &[LogSample]) -> RuntimeResult<usize> {
        if !self.header_written {
            return Err(RuntimeError::NotInitialized);
        }
        let mut buf: heapless::Vec<u8, { 256 * LOG_SAMPLE_SIZE }> = heapless::Vec::new();
        for sample in samples {
            for byte in sample.to_le_bytes() {
                if buf.push(byte).is_err() {
                    break;
                }
            }
        }
        self.storage.write(&mut self.handle, &buf)
    }

    pub fn flush(&mut self) -> RuntimeResult<()> {
        self.storage.flush(&mut self.handle)
    }

    pub fn close(self) -> RuntimeResult<()> {
        self.storage.close(self.handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FilesystemStorage;

    #[test]
    fn header_round_trips_through_bytes() {
        let header = BinaryLogHeader::new(0xdead_beef, 1_700_000_000);
        let bytes = header.to_bytes();
        assert_eq!(bytes.len(), HEADER_SIZE);
        let back = BinaryLogHeader::from_bytes(&bytes).unwrap();
        assert_eq!(back.schema_hash, 0xdead_beef);
        assert_eq!(back.session_start_utc, 1_700_000_000);
    }

    #[test]
    fn unknown_version_is_rejected() {
        let mut bytes = BinaryLogHeader::new(0, 0).to_bytes();
        bytes[4..6].copy_from_slice(&99u16.to_le_bytes());
        assert_eq!(BinaryLogHeader::from_bytes(&bytes), Err(RuntimeError::InvalidFormat));
    }

    #[test]
    fn write_header_then_batch() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FilesystemStorage::new();
        let handle = storage.open_write(&dir.path().join("s.bin"), false).unwrap();
        let mut writer = BinaryWriter::create(&storage, handle);
        writer.write_header(BinaryLogHeader::new(1, 0)).unwrap();
        let samples = [
            LogSample::new(0, 0, 1, "rpm", 1.0, false),
            LogSample::new(10, 0, 2, "rpm", 2.0, false),
        ];
        let written = writer.write_batch(&samples).unwrap();
        assert_eq!(written, 2 * LOG_SAMPLE_SIZE);
        writer.flush().unwrap();
        writer.close().unwrap();
    }
}
