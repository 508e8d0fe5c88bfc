//! Textual CSV sample framing (`spec.md` §4.9's CSV log format).
//!
//! One row per sample: `timestamp_ms,gps_utc_ms,sequence,channel,value,
//! is_digital` — the same field set as the binary record (`spec.md` §6),
//! in text form. Digital values are written as `0`/`1`; numeric values are
//! formatted with 6 decimal places, matching the corpus's fixed-precision
//! telemetry dumps.

use racing_common::error::RuntimeResult;

use crate::sample::Sample;
use crate::storage::{Storage, StorageHandle};

pub const HEADER_ROW: &str = "timestamp_ms,gps_utc_ms,sequence,channel,value,is_digital\n";

pub struct CsvWriter<'s, S: Storage> {
    storage: &'s S,
    handle: StorageHandle,
    header_written: bool,
}

impl<'s, S: Storage> CsvWriter<'s, S> {
    pub fn create(storage: &'s S, handle: StorageHandle) -> Self {
        Self {
            storage,
            handle,
            header_written: false,
        }
    }

    pub fn write_header(&mut self) -> RuntimeResult<()> {
        self.storage.write(&mut self.handle, HEADER_ROW.as_bytes())?;
        self.header_written = true;
        Ok(())
    }

    pub fn write_sample(&mut self, sample: &Sample) -> RuntimeResult<()> {
        if !self.header_written {
            self.write_header()?;
        }
        let flag = if sample.is_digital { 1 } else { 0 };
        let line = std::format!(
            "{},{},{},{},{:.6},{}\n",
            sample.timestamp_ms,
            sample.gps_utc_ms,
            sample.sequence,
            sample.channel_name.as_str(),
            sample.value,
            flag
        );
        self.storage.write(&mut self.handle, line.as_bytes())?;
        Ok(())
    }

    pub fn write_batch(&mut self, samples: &[Sample]) -> RuntimeResult<()> {
        for sample in samples {
            self.write_sample(sample)?;
        }
        Ok(())
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
    use racing_common::consts::MAX_NAME_LEN;

    fn sample(ts: u64, name: &str, value: f64, digital: bool) -> Sample {
        Sample {
            timestamp_ms: ts,
            gps_utc_ms: 0,
            sequence: 0,
            channel_name: heapless::String::<MAX_NAME_LEN>::try_from(name).unwrap(),
            value,
            is_digital: digital,
        }
    }

    #[test]
    fn writes_header_then_formatted_rows() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FilesystemStorage::new();
        let handle = storage.open_write(&dir.path().join("log.csv"), false).unwrap();
        let mut writer = CsvWriter::create(&storage, handle);
        writer
            .write_batch(&[sample(0, "rpm", 6500.0, false), sample(10, "ignition", 1.0, true)])
            .unwrap();
        writer.flush().unwrap();
        writer.close().unwrap();

        let contents = std::fs::read_to_string(dir.path().join("log.csv")).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next().unwrap(), "timestamp_ms,gps_utc_ms,sequence,channel,value,is_digital");
        assert_eq!(lines.next().unwrap(), "0,0,0,rpm,6500.000000,0");
        assert_eq!(lines.next().unwrap(), "10,0,0,ignition,1.000000,1");
    }
}
