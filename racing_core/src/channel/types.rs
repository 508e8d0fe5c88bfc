//! Channel definition types (`spec.md` §3.2).
//!
//! `ChannelKind` is a closed sum type over the five channel kinds rather
//! than a tagged union, so the compiler enforces exhaustive handling in
//! `update_raw`, `process`, and the config validator (`spec.md` §9).

use crate::math::ops::LogicOp;
use heapless::{String, Vec};
use racing_common::consts::{MAX_LOGIC_INPUTS, MAX_LOGIC_PARAMS, MAX_NAME_LEN};

/// AnalogIn input-type variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalogInputType {
    Voltage,
    VoltageDivider,
    Current4_20mA,
    ThermistorNtc,
    ThermistorPtc,
    Resistance,
    Custom,
}

/// Configuration for an `AnalogIn` channel.
#[derive(Debug, Clone, Copy)]
pub struct AnalogInConfig {
    pub input_type: AnalogInputType,
    pub scale: f64,
    pub offset: f64,
    /// Raw-range clamp (also doubles as `max_raw` for NTC/Resistance).
    pub raw_min: f64,
    pub raw_max: f64,
    /// Output-range clamp.
    pub min_value: f64,
    pub max_value: f64,
    /// First-order filter coefficient, in `[0, 1]`.
    pub filter_alpha: f32,
    pub thermistor_beta: f64,
    pub thermistor_r25: f64,
    pub thermistor_pullup: f64,
}

/// DigitalIn input-type variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigitalInputType {
    OnOff,
    Frequency,
    PulseCount,
    PwmDuty,
    Speed,
}

/// Configuration for a `DigitalIn` channel.
#[derive(Debug, Clone, Copy)]
pub struct DigitalInConfig {
    pub input_type: DigitalInputType,
    pub inverted: bool,
    pub debounce_ms: u32,
    pub pulses_per_unit: f64,
    pub min_freq_hz: f64,
    pub max_freq_hz: f64,
}

/// CAN signal data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanDataType {
    Unsigned,
    Signed,
    Float,
    Bcd,
}

/// CAN signal byte order ("Intel" little-endian vs "Motorola" big-endian).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanByteOrder {
    LittleEndian,
    BigEndian,
}

/// Behavior when a `CanRx` channel's source message stops arriving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanTimeoutPolicy {
    HoldLast,
    UseDefault,
    SetZero,
}

/// Configuration for a `CanRx` channel.
#[derive(Debug, Clone, Copy)]
pub struct CanRxConfig {
    pub message_id: u32,
    pub extended: bool,
    pub start_bit: u16,
    pub bit_length: u8,
    pub data_type: CanDataType,
    pub byte_order: CanByteOrder,
    pub scale: f32,
    pub offset: f32,
    pub timeout_ms: u64,
    pub timeout_policy: CanTimeoutPolicy,
    pub default_value: f64,
}

/// Configuration for a `Logic` (derived) channel.
#[derive(Debug, Clone)]
pub struct LogicConfig {
    pub operation: LogicOp,
    /// Up to 4 input channel ids, in evaluation order.
    pub inputs: Vec<u16, MAX_LOGIC_INPUTS>,
    /// Up to 4 numeric parameters.
    pub params: [f64; MAX_LOGIC_PARAMS],
    /// Per-instance scalar state (hysteresis / rate-of-change / filter).
    pub state: f64,
}

/// The closed sum type over channel kinds (`spec.md` §3.2, §9).
#[derive(Debug, Clone)]
pub enum ChannelKind {
    AnalogIn(AnalogInConfig),
    DigitalIn(DigitalInConfig),
    CanRx(CanRxConfig),
    Logic(LogicConfig),
    GpsDerived,
    LapDerived,
    System,
}

impl ChannelKind {
    /// Short tag used in logging and error messages.
    pub fn tag(&self) -> &'static str {
        match self {
            ChannelKind::AnalogIn(_) => "AnalogIn",
            ChannelKind::DigitalIn(_) => "DigitalIn",
            ChannelKind::CanRx(_) => "CanRx",
            ChannelKind::Logic(_) => "Logic",
            ChannelKind::GpsDerived => "GpsDerived",
            ChannelKind::LapDerived => "LapDerived",
            ChannelKind::System => "System",
        }
    }
}

/// A channel's static schema node plus its live runtime data.
#[derive(Debug, Clone)]
pub struct ChannelDef {
    pub id: u16,
    pub name: String<MAX_NAME_LEN>,
    pub units: String<16>,
    pub kind: ChannelKind,
    pub decimals: u8,
    pub enabled: bool,

    // ─── Runtime data (spec.md §3.2) ───────────────────────────────
    pub last_value: f64,
    pub last_raw: f64,
    pub update_count: u64,
    pub error_count: u64,
}

impl ChannelDef {
    /// Build a new, disabled-by-default-false channel definition with zeroed
    /// runtime counters.
    pub fn new(id: u16, name: &str, units: &str, kind: ChannelKind, decimals: u8) -> Self {
        Self {
            id,
            name: String::try_from(name).unwrap_or_default(),
            units: String::try_from(units).unwrap_or_default(),
            kind,
            decimals,
            enabled: true,
            last_value: f64::NAN,
            last_raw: f64::NAN,
            update_count: 0,
            error_count: 0,
        }
    }
}
