//! The in-memory sample emitted by a `DataLogger` sweep, and its
//! fixed-layout on-disk counterpart for the binary writer.

use racing_common::consts::MAX_NAME_LEN;

/// One channel observation captured during a logger sweep.
#[derive(Debug, Clone)]
pub struct Sample {
    pub timestamp_ms: u64,
    pub gps_utc_ms: u64,
    pub sequence: u32,
    pub channel_name: heapless::String<MAX_NAME_LEN>,
    pub value: f64,
    pub is_digital: bool,
}

/// Width of the fixed `[u8; 32]` name field in the on-disk record
/// (`spec.md` §6). Distinct from `MAX_NAME_LEN`, which bounds the
/// in-memory channel name; the on-disk field is always this exact width,
/// zero-padded.
pub const LOG_SAMPLE_NAME_LEN: usize = 32;

/// Fixed-layout record written by [`crate::binary::BinaryWriter`]:
/// `u64 ts_ms, u64 gps_utc_ms, u32 seq, [32]u8 name, f32 value, u8
/// is_digital, [3]u8 pad` (`spec.md` §6). Field order and size are pinned
/// by the `const_assert_eq!` below — changing either is a wire-format
/// break.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct LogSample {
    pub ts_ms: u64,
    pub gps_utc_ms: u64,
    pub seq: u32,
    pub name: [u8; LOG_SAMPLE_NAME_LEN],
    pub value: f32,
    pub is_digital: u8,
    pub _pad: [u8; 3],
}

pub const LOG_SAMPLE_SIZE: usize = 60;
static_assertions::const_assert_eq!(
    8 + 8 + 4 + LOG_SAMPLE_NAME_LEN + 4 + 1 + 3,
    LOG_SAMPLE_SIZE
);

impl LogSample {
    pub fn new(
        ts_ms: u64,
        gps_utc_ms: u64,
        seq: u32,
        name: &str,
        value: f32,
        is_digital: bool,
    ) -> Self {
        let mut packed_name = [0u8; LOG_SAMPLE_NAME_LEN];
        let bytes = name.as_bytes();
        let n = bytes.len().min(LOG_SAMPLE_NAME_LEN);
        packed_name[..n].copy_from_slice(&bytes[..n]);
        Self {
            ts_ms,
            gps_utc_ms,
            seq,
            name: packed_name,
            value,
            is_digital: is_digital as u8,
            _pad: [0; 3],
        }
    }

    pub fn from_sample(sample: &Sample) -> Self {
        Self::new(
            sample.timestamp_ms,
            sample.gps_utc_ms,
            sample.sequence,
            sample.channel_name.as_str(),
            sample.value as f32,
            sample.is_digital,
        )
    }

    /// Little-endian on-disk encoding, `LOG_SAMPLE_SIZE` bytes.
    pub fn to_le_bytes(self) -> [u8; LOG_SAMPLE_SIZE] {
        let mut out = [0u8; LOG_SAMPLE_SIZE];
        out[0..8].copy_from_slice(&self.ts_ms.to_le_bytes());
        out[8..16].copy_from_slice(&self.gps_utc_ms.to_le_bytes());
        out[16..20].copy_from_slice(&self.seq.to_le_bytes());
        out[20..52].copy_from_slice(&self.name);
        out[52..56].copy_from_slice(&self.value.to_le_bytes());
        out[56] = self.is_digital;
        out[57..60].copy_from_slice(&self._pad);
        out
    }

    pub fn from_le_bytes(bytes: &[u8; LOG_SAMPLE_SIZE]) -> Self {
        let mut name = [0u8; LOG_SAMPLE_NAME_LEN];
        name.copy_from_slice(&bytes[20..52]);
        Self {
            ts_ms: u64::from_le_bytes(bytes[0..8].try_into().unwrap()),
            gps_utc_ms: u64::from_le_bytes(bytes[8..16].try_into().unwrap()),
            seq: u32::from_le_bytes(bytes[16..20].try_into().unwrap()),
            name,
            value: f32::from_le_bytes(bytes[52..56].try_into().unwrap()),
            is_digital: bytes[56],
            _pad: [bytes[57], bytes[58], bytes[59]],
        }
    }

    pub fn is_digital(&self) -> bool {
        self.is_digital != 0
    }

    /// The channel name, trimmed of trailing zero padding.
    pub fn name_str(&self) -> &str {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(LOG_SAMPLE_NAME_LEN);
        core::str::from_utf8(&self.name[..end]).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_le_bytes() {
        let sample = LogSample::new(123_456, 999_000, 7, "coolant_temp", 98.6, true);
        let bytes = sample.to_le_bytes();
        let back = LogSample::from_le_bytes(&bytes);
        assert_eq!(back.ts_ms, 123_456);
        assert_eq!(back.gps_utc_ms, 999_000);
        assert_eq!(back.seq, 7);
        assert_eq!(back.name_str(), "coolant_temp");
        assert_eq!(back.value, 98.6_f32);
        assert!(back.is_digital());
    }

    #[test]
    fn from_sample_carries_gps_utc_and_sequence_through() {
        let sample = Sample {
            timestamp_ms: 10,
            gps_utc_ms: 1_700_000_000_000,
            sequence: 42,
            channel_name: heapless::String::try_from("rpm").unwrap(),
            value: 6_500.0,
            is_digital: false,
        };
        let log_sample = LogSample::from_sample(&sample);
        assert_eq!(log_sample.gps_utc_ms, 1_700_000_000_000);
        assert_eq!(log_sample.seq, 42);
        assert_eq!(log_sample.name_str(), "rpm");
    }
}
