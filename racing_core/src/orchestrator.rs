//! The Runtime Orchestrator (H): the fixed single-threaded per-tick
//! pipeline that ties every subsystem together (`spec.md` §4.8).
//!
//! Raw `AnalogIn`/`DigitalIn` samples are pulled directly by the Inputs
//! task via [`Orchestrator::ingest_raw_sample`] rather than through the
//! ingress queue (`spec.md` §5's task table assigns that pull to Inputs,
//! distinct from the generic named-signal/CAN/GPS ingress items). Logger
//! sweeping lives one layer up, in `racing_dash`, since `racing_logger`
//! depends on `racing_core` rather than the reverse.

use racing_common::consts::{GPS_FIX_TIMEOUT_MS, MAX_CHANNELS, MAX_DIAGNOSTIC_LEN, MAX_PENDING_DIAGNOSTICS};
use racing_common::error::RuntimeError;

use crate::alerts::AlertMonitor;
use crate::bus::SignalBus;
use crate::can::{self, CanFrame};
use crate::channel::registry::ChannelRegistry;
use crate::channel::types::ChannelKind;
use crate::display::DisplayStateMachine;
use crate::ingress::{IngressEvent, IngressQueue};
use crate::lap::geo::GeoPoint;
use crate::lap::timer::{GpsSample, LapTimer};
use crate::math::engine::MathEngine;

/// Owns every subsystem and drives the fixed per-tick pipeline.
pub struct Orchestrator {
    pub bus: SignalBus,
    pub registry: ChannelRegistry,
    pub math_engine: MathEngine,
    pub alerts: AlertMonitor,
    pub lap_timer: LapTimer,
    pub display: DisplayStateMachine,
    ingress: IngressQueue,
    can_error_count: u64,
    last_gps_fix_ms: Option<u64>,
    pending_diagnostics: heapless::Vec<heapless::String<MAX_DIAGNOSTIC_LEN>, MAX_PENDING_DIAGNOSTICS>,
}

impl Orchestrator {
    pub fn new(default_screen_id: u16) -> Self {
        Self {
            bus: SignalBus::new(),
            registry: ChannelRegistry::new(),
            math_engine: MathEngine::new(),
            alerts: AlertMonitor::new(),
            lap_timer: LapTimer::new(),
            display: DisplayStateMachine::new(default_screen_id),
            ingress: IngressQueue::new(),
            can_error_count: 0,
            last_gps_fix_ms: None,
            pending_diagnostics: heapless::Vec::new(),
        }
    }

    /// Drain diagnostic lines produced by the health monitor's stale-signal
    /// specialization since the last call — the logger's ingress interface
    /// for diagnostic text (`spec.md` §4.5, §7).
    pub fn take_diagnostics(&mut self) -> heapless::Vec<heapless::String<MAX_DIAGNOSTIC_LEN>, MAX_PENDING_DIAGNOSTICS> {
        core::mem::take(&mut self.pending_diagnostics)
    }

    /// Obtain a cloneable producer handle for the ingress queue.
    pub fn ingress_producer(&self) -> crate::ingress::IngressProducer {
        self.ingress.producer()
    }

    /// Recompute the Math/Logic evaluation order. Call after any
    /// registration change (boot, or config reload while tasks are
    /// quiesced, per `spec.md` §5).
    pub fn rebuild_math_order(&mut self) -> Result<(), RuntimeError> {
        self.math_engine.rebuild(&self.registry)
    }

    /// Direct raw-sample path for the Inputs task (`spec.md` §5).
    pub fn ingest_raw_sample(&mut self, channel_id: u16, raw: u32, now_ms: u64) -> Result<(), RuntimeError> {
        self.registry.update_raw(channel_id, raw, now_ms, &mut self.bus)
    }

    pub fn can_error_count(&self) -> u64 {
        self.can_error_count
    }

    /// Run one full pipeline pass (`spec.md` §4.8). `now_ms` is the tick's
    /// monotonic timestamp.
    pub fn tick(&mut self, now_ms: u64) {
        let (can_frames, gps_sample) = self.drain_ingress(now_ms);

        self.sweep_can_timeouts(now_ms);

        for frame in &can_frames {
            can::decode_frame(frame, &mut self.registry, &mut self.bus, &mut self.can_error_count);
        }

        self.math_engine.evaluate(&mut self.registry, &mut self.bus, now_ms);
        for line in self.alerts.evaluate(&self.bus, now_ms) {
            if self.pending_diagnostics.push(line).is_err() {
                tracing::warn!("diagnostic queue full, health monitor line dropped");
            }
        }

        if let Some(sample) = gps_sample {
            self.lap_timer.process(&mut self.bus, sample);
        } else {
            let timed_out = match self.last_gps_fix_ms {
                Some(t) => now_ms.saturating_sub(t) >= GPS_FIX_TIMEOUT_MS,
                None => true,
            };
            if timed_out {
                self.bus.set_digital("gps.fix_valid", false, now_ms);
            }
        }

        let _ = self.display.tick(&self.bus, now_ms);
    }

    fn drain_ingress(&mut self, now_ms: u64) -> (heapless::Vec<CanFrame, 32>, Option<GpsSample>) {
        let mut events: std::vec::Vec<IngressEvent> = std::vec::Vec::new();
        self.ingress.drain_into(&mut events);

        let mut can_frames: heapless::Vec<CanFrame, 32> = heapless::Vec::new();
        let mut gps_sample = None;

        for event in events {
            match event {
                IngressEvent::NumericSet { name, value, now_ms: ts } => {
                    self.bus.set_numeric(name, value, ts);
                }
                IngressEvent::DigitalSet { name, value, now_ms: ts } => {
                    self.bus.set_digital(name, value, ts);
                }
                IngressEvent::CanRxFrame(frame) => {
                    if can_frames.push(frame.into()).is_err() {
                        tracing::warn!("CAN frame burst exceeded per-tick decode capacity, frame dropped");
                    }
                }
                IngressEvent::GpsFix(fix) => {
                    self.last_gps_fix_ms = Some(fix.now_ms);
                    self.bus.set_digital("gps.fix_valid", fix.fix_valid, fix.now_ms);
                    self.bus.set_numeric("gps.lat", fix.lat, fix.now_ms);
                    self.bus.set_numeric("gps.lon", fix.lon, fix.now_ms);
                    self.bus.set_numeric("gps.speed_mps", fix.speed_mps, fix.now_ms);
                    self.bus.set_numeric("gps.heading_deg", fix.heading_deg, fix.now_ms);
                    self.bus.set_numeric("gps.sats", fix.sats as f64, fix.now_ms);
                    self.bus.set_numeric("gps.utc_ms", fix.utc_ms as f64, fix.now_ms);
                    if fix.fix_valid {
                        gps_sample = Some(GpsSample {
                            pos: GeoPoint::new(fix.lat, fix.lon),
                            speed_mps: fix.speed_mps,
                            heading_deg: fix.heading_deg,
                            now_ms: fix.now_ms,
                        });
                    }
                }
            }
        }

        let _ = now_ms;
        (can_frames, gps_sample)
    }

    fn sweep_can_timeouts(&mut self, now_ms: u64) {
        let mut snapshot: heapless::Vec<(u16, u64), MAX_CHANNELS> = heapless::Vec::new();
        self.registry.for_each(|def| {
            if matches!(def.kind, ChannelKind::CanRx(_)) {
                if let Some(ts) = self.bus.timestamp(&def.name) {
                    let _ = snapshot.push((def.id, ts));
                }
            }
        });
        self.registry
            .process(now_ms, |id| snapshot.iter().find(|(i, _)| *i == id).map(|(_, t)| *t));
    }
}
