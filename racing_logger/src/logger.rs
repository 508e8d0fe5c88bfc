//! The Data Logger (I): arm/trigger/record state machine wired to the
//! registry and bus, writing framed samples to storage (`spec.md` §4.9).

use racing_common::consts::{
    MAX_CHANNELS, MAX_DIAGNOSTIC_LEN, MAX_NAME_LEN, MAX_PENDING_DIAGNOSTICS,
    LOGGER_WRITE_BUFFER_CAPACITY,
};
use racing_common::error::{RuntimeError, RuntimeResult};
use racing_core::bus::SignalBus;
use racing_core::channel::registry::ChannelRegistry;
use racing_core::channel::types::ChannelKind;

use crate::sample::Sample;
use crate::state::{LoggerState, PreTriggerRing, TriggerPredicate};
use crate::storage::Storage;

/// File rotation boundary, `spec.md` §4.9 "Rotation".
#[derive(Debug, Clone, Copy)]
pub enum RotationPolicy {
    SizeBytes(u64),
    TimeMs(u64),
    LapBoundary,
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub sample_rate_hz: f64,
    pub whitelist: Option<heapless::Vec<heapless::String<MAX_NAME_LEN>, MAX_CHANNELS>>,
    pub auto_flush_interval_ms: u64,
    pub rotation: RotationPolicy,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 50.0,
            whitelist: None,
            auto_flush_interval_ms: 5_000,
            rotation: RotationPolicy::SizeBytes(64 * 1024 * 1024),
        }
    }
}

struct RateGate {
    channel_id: u16,
    last_sample_ms: u64,
}

/// One line accepted through [`DataLogger::record_diagnostic`] — the
/// logger's diagnostic channel (`spec.md` §4.5, §7), distinct from the
/// typed channel samples that flow through `sweep`.
#[derive(Debug, Clone)]
pub struct DiagnosticLine {
    pub timestamp_ms: u64,
    pub message: heapless::String<MAX_DIAGNOSTIC_LEN>,
}

/// Ties the state machine, pre-trigger ring, and write buffer to a
/// [`Storage`] backend. Does not itself own a `Storage` writer — callers
/// drain [`DataLogger::take_pending_writes`] into a `CsvWriter`/
/// `BinaryWriter` of their choosing, keeping this type storage-format
/// agnostic.
pub struct DataLogger {
    config: LoggerConfig,
    trigger: TriggerPredicate,
    state: LoggerState,
    ring: PreTriggerRing,
    write_buffer: heapless::Vec<Sample, LOGGER_WRITE_BUFFER_CAPACITY>,
    rate_gates: heapless::Vec<RateGate, MAX_CHANNELS>,
    last_flush_ms: u64,
    samples_dropped: u64,
    rotation_counter: u32,
    diagnostics: heapless::Vec<DiagnosticLine, MAX_PENDING_DIAGNOSTICS>,
    diagnostics_dropped: u64,
    next_seq: u32,
}

impl DataLogger {
    pub fn new(config: LoggerConfig, trigger: TriggerPredicate) -> Self {
        Self {
            config,
            trigger,
            state: LoggerState::Stopped,
            ring: PreTriggerRing::new(),
            write_buffer: heapless::Vec::new(),
            rate_gates: heapless::Vec::new(),
            last_flush_ms: 0,
            samples_dropped: 0,
            rotation_counter: 0,
            diagnostics: heapless::Vec::new(),
            diagnostics_dropped: 0,
            next_seq: 0,
        }
    }

    pub fn state(&self) -> LoggerState {
        self.state
    }

    pub fn samples_dropped(&self) -> u64 {
        self.samples_dropped
    }

    pub fn rotation_counter(&self) -> u32 {
        self.rotation_counter
    }

    pub fn arm(&mut self) {
        self.state = LoggerState::Armed;
    }

    pub fn pause(&mut self) {
        if self.state == LoggerState::Recording {
            self.state = LoggerState::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.state == LoggerState::Paused {
            self.state = LoggerState::Recording;
        }
    }

    pub fn stop(&mut self) {
        self.state = LoggerState::Stopped;
        self.ring = PreTriggerRing::new();
        self.write_buffer.clear();
        self.diagnostics.clear();
    }

    pub fn diagnostics_dropped(&self) -> u64 {
        self.diagnostics_dropped
    }

    /// The logger's diagnostic channel (`spec.md` §4.5): accepts a free-text
    /// line (e.g. from the health monitor's stale-signal specialization)
    /// independently of the typed channel samples `sweep` collects. Buffered
    /// until the caller drains it with [`DataLogger::take_pending_diagnostics`].
    pub fn record_diagnostic(&mut self, message: &str, now_ms: u64) {
        let line = DiagnosticLine {
            timestamp_ms: now_ms,
            message: heapless::String::try_from(message).unwrap_or_default(),
        };
        if self.diagnostics.push(line).is_err() {
            self.diagnostics_dropped += 1;
        }
    }

    /// Drain buffered diagnostic lines for the caller to persist or emit.
    pub fn take_pending_diagnostics(&mut self) -> heapless::Vec<DiagnosticLine, MAX_PENDING_DIAGNOSTICS> {
        core::mem::take(&mut self.diagnostics)
    }

    fn evaluate_trigger(&self, bus: &SignalBus, _now_ms: u64) -> bool {
        match self.trigger {
            TriggerPredicate::Manual => false,
            TriggerPredicate::NumericThreshold { channel_name, rises_above } => {
                match bus.get_numeric(channel_name) {
                    Some(v) => v > rises_above,
                    None => false,
                }
            }
            TriggerPredicate::DigitalInput { channel_name, active_high } => {
                match bus.get_digital(channel_name) {
                    Some(v) => v == active_high,
                    None => false,
                }
            }
            TriggerPredicate::GpsSpeedAbove { mps } => match bus.get_numeric("gps.speed_mps") {
                Some(v) => v > mps,
                None => false,
            },
            TriggerPredicate::Geofence { lat, lon, radius_m } => {
                let (Some(plat), Some(plon)) =
                    (bus.get_numeric("gps.lat"), bus.get_numeric("gps.lon"))
                else {
                    return false;
                };
                let a = racing_core::lap::geo::GeoPoint::new(lat, lon);
                let b = racing_core::lap::geo::GeoPoint::new(plat, plon);
                racing_core::lap::geo::haversine_distance_m(a, b) <= radius_m
            }
        }
    }

    /// Manually fire the trigger regardless of predicate state — used by
    /// `TriggerPredicate::Manual` and operator-initiated "start recording".
    pub fn fire_manual_trigger(&mut self) {
        if matches!(self.state, LoggerState::Armed | LoggerState::PreTrigger) {
            self.begin_recording();
        }
    }

    fn begin_recording(&mut self) {
        let drained = self.ring.drain_in_order();
        for sample in drained {
            if self.write_buffer.push(sample).is_err() {
                self.samples_dropped += 1;
            }
        }
        self.state = LoggerState::Recording;
    }

    fn rate_allows(&mut self, channel_id: u16, now_ms: u64) -> bool {
        if self.config.sample_rate_hz <= 0.0 {
            return true;
        }
        let min_interval_ms = (1000.0 / self.config.sample_rate_hz) as u64;
        if let Some(gate) = self.rate_gates.iter_mut().find(|g| g.channel_id == channel_id) {
            if now_ms.saturating_sub(gate.last_sample_ms) < min_interval_ms {
                return false;
            }
            gate.last_sample_ms = now_ms;
            return true;
        }
        let _ = self.rate_gates.push(RateGate { channel_id, last_sample_ms: now_ms });
        true
    }

    fn whitelisted(&self, name: &str) -> bool {
        match &self.config.whitelist {
            Some(list) => list.iter().any(|n| n.as_str() == name),
            None => true,
        }
    }

    /// Sweep the bus for enabled, whitelisted channels and feed one sample
    /// per channel into the ring buffer or write buffer according to the
    /// current state, per `spec.md` §4.9.
    pub fn sweep(&mut self, bus: &SignalBus, registry: &ChannelRegistry, now_ms: u64) {
        if self.state == LoggerState::Stopped || self.state == LoggerState::Error {
            return;
        }
        if self.state == LoggerState::Armed {
            self.state = LoggerState::PreTrigger;
        }

        let gps_utc_ms = bus.get_numeric("gps.utc_ms").unwrap_or(0.0).max(0.0) as u64;

        let mut collected: heapless::Vec<Sample, MAX_CHANNELS> = heapless::Vec::new();
        registry.for_each(|def| {
            if !def.enabled || !self.whitelisted(def.name.as_str()) {
                return;
            }
            if !self.rate_allows(def.id, now_ms) {
                return;
            }
            let Some(value) = bus.get_numeric(def.name.as_str()) else {
                return;
            };
            let is_digital = matches!(def.kind, ChannelKind::DigitalIn(_));
            let sample = Sample {
                timestamp_ms: now_ms,
                gps_utc_ms,
                sequence: self.next_seq,
                channel_name: def.name.clone(),
                value,
                is_digital,
            };
            self.next_seq = self.next_seq.wrapping_add(1);
            let _ = collected.push(sample);
        });

        if matches!(self.state, LoggerState::Armed | LoggerState::PreTrigger) {
            for sample in collected {
                self.ring.push(sample);
            }
            if self.evaluate_trigger(bus, now_ms) {
                self.begin_recording();
            }
            return;
        }

        if self.state != LoggerState::Recording {
            return;
        }
        for sample in collected {
            if self.write_buffer.push(sample).is_err() {
                self.samples_dropped += 1;
            }
        }
    }

    /// True once the write buffer should be flushed — at least 80% full or
    /// the auto-flush interval has elapsed, per `spec.md` §4.9.
    pub fn should_flush(&self, now_ms: u64) -> bool {
        if self.write_buffer.is_empty() {
            return false;
        }
        let fullness = self.write_buffer.len() as f64 / LOGGER_WRITE_BUFFER_CAPACITY as f64;
        fullness >= 0.8 || now_ms.saturating_sub(self.last_flush_ms) >= self.config.auto_flush_interval_ms
    }

    /// Drain the write buffer for the caller to persist via a `CsvWriter`/
    /// `BinaryWriter`, and mark the flush watermark.
    pub fn take_pending_writes(&mut self, now_ms: u64) -> heapless::Vec<Sample, LOGGER_WRITE_BUFFER_CAPACITY> {
        self.last_flush_ms = now_ms;
        core::mem::take(&mut self.write_buffer)
    }

    /// True when rotation should occur given the bytes already written to
    /// the current file, per the configured [`RotationPolicy`].
    pub fn should_rotate(&self, bytes_written: u64, session_elapsed_ms: u64) -> bool {
        match self.config.rotation {
            RotationPolicy::SizeBytes(max) => bytes_written >= max,
            RotationPolicy::TimeMs(max) => session_elapsed_ms >= max,
            RotationPolicy::LapBoundary => false,
        }
    }

    pub fn rotate<S: Storage>(&mut self, storage: &S, base_path: &std::path::Path) -> RuntimeResult<std::path::PathBuf> {
        self.rotation_counter += 1;
        let path = crate::storage::rotated_path(base_path, self.rotation_counter);
        storage.mkdir(
            path.parent().ok_or(RuntimeError::InvalidParam)?,
        )?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use racing_core::channel::types::{AnalogInConfig, AnalogInputType, ChannelDef};

    fn analog_channel(id: u16, name: &str) -> ChannelDef {
        ChannelDef::new(
            id,
            name,
            "",
            ChannelKind::AnalogIn(AnalogInConfig {
                input_type: AnalogInputType::Voltage,
                scale: 1.0,
                offset: 0.0,
                raw_min: 0.0,
                raw_max: 65535.0,
                min_value: -1000.0,
                max_value: 1000.0,
                filter_alpha: 0.0,
                thermistor_beta: 0.0,
                thermistor_r25: 1.0,
                thermistor_pullup: 1.0,
            }),
            1,
        )
    }

    #[test]
    fn armed_samples_land_in_ring_until_manual_trigger() {
        let mut registry = ChannelRegistry::new();
        registry.register(analog_channel(1, "rpm")).unwrap();
        let mut bus = SignalBus::new();
        bus.set_numeric("rpm", 6000.0, 0);

        let mut logger = DataLogger::new(LoggerConfig::default(), TriggerPredicate::Manual);
        logger.arm();
        logger.sweep(&bus, &registry, 0);
        assert_eq!(logger.state(), LoggerState::PreTrigger);
        assert_eq!(logger.ring.len(), 1);

        logger.fire_manual_trigger();
        assert_eq!(logger.state(), LoggerState::Recording);
        assert_eq!(logger.write_buffer.len(), 1, "pretrigger ring flushed into write buffer");
    }

    #[test]
    fn threshold_trigger_transitions_to_recording() {
        let mut registry = ChannelRegistry::new();
        registry.register(analog_channel(1, "coolant_temp")).unwrap();
        let mut bus = SignalBus::new();

        let mut logger = DataLogger::new(
            LoggerConfig::default(),
            TriggerPredicate::NumericThreshold { channel_name: "coolant_temp", rises_above: 100.0 },
        );
        logger.arm();
        bus.set_numeric("coolant_temp", 50.0, 0);
        logger.sweep(&bus, &registry, 0);
        assert_eq!(logger.state(), LoggerState::PreTrigger);

        bus.set_numeric("coolant_temp", 105.0, 10);
        logger.sweep(&bus, &registry, 10);
        assert_eq!(logger.state(), LoggerState::Recording);
    }

    #[test]
    fn diagnostic_lines_are_buffered_and_drained() {
        let mut logger = DataLogger::new(LoggerConfig::default(), TriggerPredicate::Manual);
        logger.record_diagnostic("health: gps_fix stale (>2000 ms)", 3_000);
        let drained = logger.take_pending_diagnostics();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].timestamp_ms, 3_000);
        assert_eq!(drained[0].message.as_str(), "health: gps_fix stale (>2000 ms)");
        assert!(logger.take_pending_diagnostics().is_empty(), "drain empties the buffer");
    }

    #[test]
    fn disabled_channel_is_excluded_from_sweep() {
        let mut registry = ChannelRegistry::new();
        let mut def = analog_channel(1, "rpm");
        def.enabled = false;
        registry.register(def).unwrap();
        let mut bus = SignalBus::new();
        bus.set_numeric("rpm", 6000.0, 0);

        let mut logger = DataLogger::new(LoggerConfig::default(), TriggerPredicate::Manual);
        logger.arm();
        logger.sweep(&bus, &registry, 0);
        assert!(logger.ring.is_empty());
    }
}
