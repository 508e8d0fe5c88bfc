//! System-wide constants for the racing dashboard workspace.
//!
//! Single source of truth for fixed-capacity limits. Imported by every
//! crate — no duplication permitted.

/// Maximum number of numeric signals held by the bus (spec: ">=64").
pub const MAX_NUMERIC_SIGNALS: usize = 128;

/// Maximum number of digital signals held by the bus (spec: ">=32").
pub const MAX_DIGITAL_SIGNALS: usize = 64;

/// Maximum length of a signal/channel name, including the terminator slot.
pub const MAX_NAME_LEN: usize = 32;

/// Maximum number of registered channel definitions (spec: "capacity <=256").
pub const MAX_CHANNELS: usize = 256;

/// Maximum number of alert rules.
pub const MAX_ALERT_RULES: usize = 64;

/// Maximum number of Logic channel input references.
pub const MAX_LOGIC_INPUTS: usize = 4;

/// Maximum number of Logic channel numeric parameters.
pub const MAX_LOGIC_PARAMS: usize = 4;

/// Maximum number of sector lines per track.
pub const MAX_SECTORS: usize = 10;

/// Maximum number of known tracks for auto-detect.
pub const MAX_TRACKS: usize = 16;

/// Maximum number of completed laps retained in a session's history.
pub const MAX_LAP_HISTORY: usize = 128;

/// Maximum number of display rules.
pub const MAX_DISPLAY_RULES: usize = 32;

/// Maximum number of registered screens.
pub const MAX_SCREENS: usize = 16;

/// Maximum depth of the ingress queue (MPSC, bounded).
pub const INGRESS_QUEUE_CAPACITY: usize = 256;

/// Pre-trigger ring buffer capacity, in samples.
pub const LOGGER_PRETRIGGER_CAPACITY: usize = 512;

/// Logger write-buffer capacity, in samples.
pub const LOGGER_WRITE_BUFFER_CAPACITY: usize = 1024;

/// Earth radius used by the haversine distance calculation, in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Auto-detect radius for matching current GPS position to a known track.
pub const TRACK_AUTODETECT_RADIUS_M: f64 = 500.0;

/// Primary orchestrator tick deadline, in milliseconds.
pub const PRIMARY_TICK_DEADLINE_MS: u64 = 10;

/// Display task period, in milliseconds.
pub const DISPLAY_TICK_PERIOD_MS: u64 = 16;

/// CAN task period, in milliseconds.
pub const CAN_TICK_PERIOD_MS: u64 = 10;

/// GPS task period, in milliseconds.
pub const GPS_TICK_PERIOD_MS: u64 = 50;

/// Lap timer task period, in milliseconds.
pub const LAP_TIMER_TICK_PERIOD_MS: u64 = 50;

/// GPS fix timeout before a snapshot is considered invalid, in milliseconds.
pub const GPS_FIX_TIMEOUT_MS: u64 = 2_000;

/// Default configuration directory path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/racing-dash/config";

/// Maximum length of a diagnostic log line routed through the logger's
/// diagnostic channel (health monitor stale-signal notices, etc.).
pub const MAX_DIAGNOSTIC_LEN: usize = 96;

/// Maximum number of diagnostic lines buffered between logger sweeps.
pub const MAX_PENDING_DIAGNOSTICS: usize = 16;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_are_consistent() {
        assert!(MAX_NUMERIC_SIGNALS >= 64);
        assert!(MAX_DIGITAL_SIGNALS >= 32);
        assert!(MAX_CHANNELS <= 256);
        assert!(MAX_SECTORS <= 10);
        assert!(EARTH_RADIUS_M > 6_300_000.0 && EARTH_RADIUS_M < 6_400_000.0);
    }

    #[test]
    fn channel_ids_fit_densely_indexed_array() {
        // Channel registry uses a dense array indexed by registration order;
        // id lookup is linear scan over at most MAX_CHANNELS entries.
        assert!(MAX_CHANNELS <= u16::MAX as usize);
    }
}
