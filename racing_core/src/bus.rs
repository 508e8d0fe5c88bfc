//! The Signal Bus (A): the central typed, time-stamped key→value store.
//!
//! Storage is fixed-capacity (`spec.md` §4.1: ">=64 numeric, >=32 digital").
//! An over-capacity insertion for an *existing* name always succeeds (it is
//! an update, not a growth); only a *new* name past capacity fails, and that
//! failure never propagates — it bumps a one-shot internal counter instead.
//!
//! The bus is the single shared mutable structure. Only the orchestrator
//! thread calls `set_numeric`/`set_digital`; every other producer (CAN ISR,
//! ADC DMA, GPS UART parser) writes to the [`crate::ingress`] queue instead.

use heapless::{String, Vec};
use racing_common::consts::{MAX_DIGITAL_SIGNALS, MAX_NAME_LEN, MAX_NUMERIC_SIGNALS};

type Name = String<MAX_NAME_LEN>;

#[derive(Debug, Clone)]
struct NumericSignal {
    name: Name,
    value: f64,
    timestamp_ms: u64,
    valid: bool,
}

#[derive(Debug, Clone)]
struct DigitalSignal {
    name: Name,
    value: bool,
    timestamp_ms: u64,
    valid: bool,
}

/// The Signal Bus: time-stamped storage of numeric and digital signals.
#[derive(Debug)]
pub struct SignalBus {
    numeric: Vec<NumericSignal, MAX_NUMERIC_SIGNALS>,
    digital: Vec<DigitalSignal, MAX_DIGITAL_SIGNALS>,
    /// One-shot counter of dropped new-name inserts past capacity.
    capacity_overflow_count: u64,
}

impl Default for SignalBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self {
            numeric: Vec::new(),
            digital: Vec::new(),
            capacity_overflow_count: 0,
        }
    }

    /// Upsert a numeric entry. Fails silently (logged, counted) if the name
    /// is new and the bus is at capacity; an existing name always succeeds.
    pub fn set_numeric(&mut self, name: &str, value: f64, now_ms: u64) {
        if let Some(slot) = self.numeric.iter_mut().find(|s| s.name == name) {
            slot.value = value;
            slot.timestamp_ms = now_ms;
            slot.valid = !value.is_nan();
            return;
        }
        let Ok(bounded) = Name::try_from(name) else {
            tracing::warn!(name, "signal name exceeds MAX_NAME_LEN, dropped");
            self.capacity_overflow_count += 1;
            return;
        };
        let valid = !value.is_nan();
        if self
            .numeric
            .push(NumericSignal {
                name: bounded,
                value,
                timestamp_ms: now_ms,
                valid,
            })
            .is_err()
        {
            self.capacity_overflow_count += 1;
            tracing::warn!(name, "numeric bus at capacity, new signal dropped");
        }
    }

    /// Upsert a digital entry. Same capacity semantics as [`Self::set_numeric`].
    pub fn set_digital(&mut self, name: &str, value: bool, now_ms: u64) {
        if let Some(slot) = self.digital.iter_mut().find(|s| s.name == name) {
            slot.value = value;
            slot.timestamp_ms = now_ms;
            slot.valid = true;
            return;
        }
        let Ok(bounded) = Name::try_from(name) else {
            tracing::warn!(name, "signal name exceeds MAX_NAME_LEN, dropped");
            self.capacity_overflow_count += 1;
            return;
        };
        if self
            .digital
            .push(DigitalSignal {
                name: bounded,
                value,
                timestamp_ms: now_ms,
                valid: true,
            })
            .is_err()
        {
            self.capacity_overflow_count += 1;
            tracing::warn!(name, "digital bus at capacity, new signal dropped");
        }
    }

    /// Last numeric value if present, valid, and finite.
    pub fn get_numeric(&self, name: &str) -> Option<f64> {
        self.numeric
            .iter()
            .find(|s| s.name == name)
            .filter(|s| s.valid && s.value.is_finite())
            .map(|s| s.value)
    }

    /// Last digital value if present and valid.
    pub fn get_digital(&self, name: &str) -> Option<bool> {
        self.digital
            .iter()
            .find(|s| s.name == name)
            .filter(|s| s.valid)
            .map(|s| s.value)
    }

    /// Timestamp of the last write to `name`, searching both namespaces
    /// (names are unique across the numeric/digital union, `spec.md` §3.1).
    pub fn timestamp(&self, name: &str) -> Option<u64> {
        if let Some(s) = self.numeric.iter().find(|s| s.name == name) {
            return Some(s.timestamp_ms);
        }
        self.digital.iter().find(|s| s.name == name).map(|s| s.timestamp_ms)
    }

    /// True if `name` is missing or its last write is older than `max_age_ms`.
    pub fn is_stale(&self, name: &str, now_ms: u64, max_age_ms: u64) -> bool {
        match self.timestamp(name) {
            Some(ts) => now_ms.saturating_sub(ts) > max_age_ms,
            None => true,
        }
    }

    /// Count of new-name inserts dropped due to capacity exhaustion.
    pub fn capacity_overflow_count(&self) -> u64 {
        self.capacity_overflow_count
    }

    /// Number of distinct numeric signals currently stored.
    pub fn numeric_len(&self) -> usize {
        self.numeric.len()
    }

    /// Number of distinct digital signals currently stored.
    pub fn digital_len(&self) -> usize {
        self.digital.len()
    }
}
