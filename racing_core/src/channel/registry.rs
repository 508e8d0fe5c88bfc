//! The Channel Registry (B): owns channel definitions and per-channel
//! runtime data in a fixed-capacity dense array (`spec.md` §4.2).
//!
//! Id→index lookup is a linear scan, matching the capacity bound (<=256)
//! the spec calls out — a hash map would be overkill at this size and this
//! mirrors the dense-array-plus-linear-scan pattern used elsewhere in the
//! corpus for small, boot-time-populated tables.

use crate::bus::SignalBus;
use crate::channel::types::{
    AnalogInConfig, AnalogInputType, CanTimeoutPolicy, ChannelDef, ChannelKind, DigitalInConfig,
    DigitalInputType,
};
use heapless::Vec;
use racing_common::consts::MAX_CHANNELS;
use racing_common::error::RuntimeError;

/// Owns all channel definitions and their live runtime state.
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    defs: Vec<ChannelDef, MAX_CHANNELS>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self { defs: Vec::new() }
    }

    /// Register a new channel. Fails with `AlreadyExists` for a duplicate
    /// id, `Capacity` once the table is full, or `InvalidParam` if a Logic
    /// channel references an input id that is not yet registered.
    pub fn register(&mut self, def: ChannelDef) -> Result<(), RuntimeError> {
        if self.index_of(def.id).is_some() {
            return Err(RuntimeError::AlreadyExists);
        }
        if let ChannelKind::Logic(logic) = &def.kind {
            for input_id in &logic.inputs {
                if self.index_of(*input_id).is_none() {
                    return Err(RuntimeError::InvalidParam);
                }
            }
        }
        self.defs.push(def).map_err(|_| RuntimeError::Capacity)
    }

    /// Remove a channel by id. No-op (`Ok`) if not present — matching the
    /// corpus convention that teardown operations are idempotent.
    pub fn unregister(&mut self, id: u16) {
        if let Some(idx) = self.index_of(id) {
            self.defs.swap_remove(idx);
        }
    }

    fn index_of(&self, id: u16) -> Option<usize> {
        self.defs.iter().position(|d| d.id == id)
    }

    pub fn get_def(&self, id: u16) -> Option<&ChannelDef> {
        self.index_of(id).map(|i| &self.defs[i])
    }

    pub fn get_def_mut(&mut self, id: u16) -> Option<&mut ChannelDef> {
        let idx = self.index_of(id)?;
        Some(&mut self.defs[idx])
    }

    pub fn get_value(&self, id: u16) -> Option<f64> {
        self.get_def(id).map(|d| d.last_value)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&ChannelDef> {
        self.defs.iter().find(|d| d.name == name)
    }

    /// Visit every registered channel definition.
    pub fn for_each(&self, mut callback: impl FnMut(&ChannelDef)) {
        for def in &self.defs {
            callback(def);
        }
    }

    /// Directly set a Logic channel's scaled value (called only by the math
    /// engine, per the kind-exclusive-writer invariant in `spec.md` §3.2).
    pub fn set_value(&mut self, id: u16, value: f32) -> Result<(), RuntimeError> {
        let def = self.get_def_mut(id).ok_or(RuntimeError::NotFound)?;
        if !matches!(def.kind, ChannelKind::Logic(_)) {
            return Err(RuntimeError::InvalidType);
        }
        def.last_value = value as f64;
        def.update_count += 1;
        Ok(())
    }

    /// Transform one raw sample into a scaled value for an `AnalogIn` or
    /// `DigitalIn` channel, per the transformation table in `spec.md` §4.2,
    /// and publish the result onto the bus under the channel's name.
    pub fn update_raw(
        &mut self,
        id: u16,
        raw: u32,
        now_ms: u64,
        bus: &mut SignalBus,
    ) -> Result<(), RuntimeError> {
        let def = self.get_def_mut(id).ok_or(RuntimeError::NotFound)?;
        if !def.enabled {
            def.error_count += 1;
            return Err(RuntimeError::InvalidType);
        }

        let raw_f = raw as f64;
        let value = match &mut def.kind {
            ChannelKind::AnalogIn(cfg) => analog_transform(cfg, raw_f, def.last_value),
            ChannelKind::DigitalIn(cfg) => digital_transform(cfg, raw_f),
            _ => {
                def.error_count += 1;
                return Err(RuntimeError::InvalidType);
            }
        };

        def.last_raw = raw_f;
        if value.is_nan() {
            def.error_count += 1;
        } else {
            def.update_count += 1;
        }
        def.last_value = value;
        let name = def.name.clone();
        bus.set_numeric(&name, value, now_ms);
        Ok(())
    }

    /// Apply a decoded CAN value to a `CanRx` channel (called only by the
    /// CAN codec, per the kind-exclusive-writer invariant).
    pub fn apply_can_value(
        &mut self,
        id: u16,
        value: f64,
        now_ms: u64,
        bus: &mut SignalBus,
    ) -> Result<(), RuntimeError> {
        let def = self.get_def_mut(id).ok_or(RuntimeError::NotFound)?;
        if !matches!(def.kind, ChannelKind::CanRx(_)) {
            return Err(RuntimeError::InvalidType);
        }
        def.last_value = value;
        def.update_count += 1;
        let name = def.name.clone();
        bus.set_numeric(&name, value, now_ms);
        Ok(())
    }

    /// Sweep `CanRx` channels for source timeout and apply each channel's
    /// configured timeout policy (`spec.md` §5 "Cancellation / timeout").
    pub fn process(&mut self, now_ms: u64, last_update_ms: impl Fn(u16) -> Option<u64>) {
        for def in &mut self.defs {
            let ChannelKind::CanRx(cfg) = &def.kind else {
                continue;
            };
            let Some(last) = last_update_ms(def.id) else {
                continue;
            };
            if now_ms.saturating_sub(last) <= cfg.timeout_ms {
                continue;
            }
            match cfg.timeout_policy {
                CanTimeoutPolicy::HoldLast => {}
                CanTimeoutPolicy::UseDefault => def.last_value = cfg.default_value,
                CanTimeoutPolicy::SetZero => def.last_value = 0.0,
            }
            def.error_count += 1;
        }
    }
}

fn analog_transform(cfg: &mut AnalogInConfig, raw: f64, last_value: f64) -> f64 {
    let pre_filter = match cfg.input_type {
        AnalogInputType::Voltage
        | AnalogInputType::VoltageDivider
        | AnalogInputType::Current4_20mA
        | AnalogInputType::Custom => {
            (raw * cfg.scale + cfg.offset).clamp(cfg.min_value, cfg.max_value)
        }
        AnalogInputType::ThermistorNtc => thermistor_ntc(cfg, raw),
        AnalogInputType::ThermistorPtc => {
            // Not defined by the transformation table; treated like the
            // linear path since no PTC-specific formula is specified.
            (raw * cfg.scale + cfg.offset).clamp(cfg.min_value, cfg.max_value)
        }
        AnalogInputType::Resistance => resistance(cfg, raw),
    };

    if cfg.filter_alpha > 0.0 && cfg.filter_alpha < 1.0 {
        let alpha = cfg.filter_alpha as f64;
        if last_value.is_nan() {
            pre_filter
        } else {
            last_value * (1.0 - alpha) + pre_filter * alpha
        }
    } else {
        pre_filter
    }
}

fn thermistor_ntc(cfg: &AnalogInConfig, raw: f64) -> f64 {
    if raw <= 0.0 || raw >= cfg.raw_max {
        return f64::NAN;
    }
    let r = cfg.thermistor_pullup * raw / (cfg.raw_max - raw);
    let inv_t = (r / cfg.thermistor_r25).ln() / cfg.thermistor_beta + 1.0 / 298.15;
    1.0 / inv_t - 273.15
}

fn resistance(cfg: &AnalogInConfig, raw: f64) -> f64 {
    if raw <= 0.0 || raw >= cfg.raw_max {
        return f64::NAN;
    }
    cfg.thermistor_pullup * raw / (cfg.raw_max - raw)
}

fn digital_transform(cfg: &DigitalInConfig, raw: f64) -> f64 {
    match cfg.input_type {
        DigitalInputType::OnOff => {
            let on = raw != 0.0;
            if on != cfg.inverted {
                1.0
            } else {
                0.0
            }
        }
        DigitalInputType::Frequency => {
            let hz = raw / 1000.0;
            if hz < cfg.min_freq_hz {
                0.0
            } else {
                hz.min(cfg.max_freq_hz)
            }
        }
        DigitalInputType::Speed => {
            if cfg.pulses_per_unit == 0.0 {
                0.0
            } else {
                (raw / 1000.0) / cfg.pulses_per_unit
            }
        }
        DigitalInputType::PwmDuty => raw / 100.0,
        // Not defined by the transformation table; pass the raw pulse count
        // through unscaled.
        DigitalInputType::PulseCount => raw,
    }
}
