//! Channels config domain: channel definitions persisted as TOML and
//! converted into runtime [`ChannelDef`](racing_core::channel::types::ChannelDef)s
//! (`spec.md` §3.2, §4.10).

use racing_common::config::ConfigError;
use racing_core::channel::types::{
    AnalogInConfig, AnalogInputType, CanByteOrder, CanDataType, CanRxConfig, CanTimeoutPolicy,
    ChannelDef, ChannelKind, DigitalInConfig, DigitalInputType, LogicConfig,
};
use racing_core::math::ops::LogicOp;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKindTag {
    AnalogIn,
    DigitalIn,
    CanRx,
    Logic,
    GpsDerived,
    LapDerived,
    System,
}

fn default_scale() -> f64 {
    1.0
}

fn default_max_value() -> f64 {
    f64::MAX
}

fn default_min_value() -> f64 {
    f64::MIN
}

/// One channel's TOML representation. Kind-specific fields are flattened
/// into a single table with sensible defaults so a minimal entry (just
/// `id`/`name`/`kind`) parses, matching the corpus's forgiving config style.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub id: u16,
    pub name: String,
    #[serde(default)]
    pub units: String,
    pub kind: ChannelKindTag,
    #[serde(default)]
    pub decimals: u8,
    #[serde(default = "default_true")]
    pub enabled: bool,

    // AnalogIn / shared linear fields
    #[serde(default)]
    pub analog_input_type: Option<AnalogInputTypeTag>,
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default)]
    pub offset: f64,
    #[serde(default)]
    pub raw_min: f64,
    #[serde(default = "default_max_value")]
    pub raw_max: f64,
    #[serde(default = "default_min_value")]
    pub min_value: f64,
    #[serde(default = "default_max_value")]
    pub max_value: f64,
    #[serde(default)]
    pub filter_alpha: f32,
    #[serde(default)]
    pub thermistor_beta: f64,
    #[serde(default)]
    pub thermistor_r25: f64,
    #[serde(default)]
    pub thermistor_pullup: f64,

    // DigitalIn fields
    #[serde(default)]
    pub digital_input_type: Option<DigitalInputTypeTag>,
    #[serde(default)]
    pub inverted: bool,
    #[serde(default)]
    pub debounce_ms: u32,
    #[serde(default)]
    pub pulses_per_unit: f64,
    #[serde(default)]
    pub min_freq_hz: f64,
    #[serde(default)]
    pub max_freq_hz: f64,

    // CanRx fields
    #[serde(default)]
    pub message_id: u32,
    #[serde(default)]
    pub extended: bool,
    #[serde(default)]
    pub start_bit: u16,
    #[serde(default)]
    pub bit_length: u8,
    #[serde(default)]
    pub data_type: Option<CanDataTypeTag>,
    #[serde(default)]
    pub byte_order: Option<CanByteOrderTag>,
    #[serde(default)]
    pub timeout_ms: u64,
    #[serde(default)]
    pub timeout_policy: Option<CanTimeoutPolicyTag>,
    #[serde(default)]
    pub default_value: f64,

    // Logic fields
    #[serde(default)]
    pub operation: Option<LogicOpTag>,
    #[serde(default)]
    pub inputs: Vec<u16>,
    #[serde(default)]
    pub params: Vec<f64>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalogInputTypeTag {
    Voltage,
    VoltageDivider,
    Current4_20mA,
    ThermistorNtc,
    ThermistorPtc,
    Resistance,
    Custom,
}

impl From<AnalogInputTypeTag> for AnalogInputType {
    fn from(tag: AnalogInputTypeTag) -> Self {
        match tag {
            AnalogInputTypeTag::Voltage => AnalogInputType::Voltage,
            AnalogInputTypeTag::VoltageDivider => AnalogInputType::VoltageDivider,
            AnalogInputTypeTag::Current4_20mA => AnalogInputType::Current4_20mA,
            AnalogInputTypeTag::ThermistorNtc => AnalogInputType::ThermistorNtc,
            AnalogInputTypeTag::ThermistorPtc => AnalogInputType::ThermistorPtc,
            AnalogInputTypeTag::Resistance => AnalogInputType::Resistance,
            AnalogInputTypeTag::Custom => AnalogInputType::Custom,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DigitalInputTypeTag {
    OnOff,
    Frequency,
    PulseCount,
    PwmDuty,
    Speed,
}

impl From<DigitalInputTypeTag> for DigitalInputType {
    fn from(tag: DigitalInputTypeTag) -> Self {
        match tag {
            DigitalInputTypeTag::OnOff => DigitalInputType::OnOff,
            DigitalInputTypeTag::Frequency => DigitalInputType::Frequency,
            DigitalInputTypeTag::PulseCount => DigitalInputType::PulseCount,
            DigitalInputTypeTag::PwmDuty => DigitalInputType::PwmDuty,
            DigitalInputTypeTag::Speed => DigitalInputType::Speed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanDataTypeTag {
    Unsigned,
    Signed,
    Float,
    Bcd,
}

impl From<CanDataTypeTag> for CanDataType {
    fn from(tag: CanDataTypeTag) -> Self {
        match tag {
            CanDataTypeTag::Unsigned => CanDataType::Unsigned,
            CanDataTypeTag::Signed => CanDataType::Signed,
            CanDataTypeTag::Float => CanDataType::Float,
            CanDataTypeTag::Bcd => CanDataType::Bcd,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanByteOrderTag {
    LittleEndian,
    BigEndian,
}

impl From<CanByteOrderTag> for CanByteOrder {
    fn from(tag: CanByteOrderTag) -> Self {
        match tag {
            CanByteOrderTag::LittleEndian => CanByteOrder::LittleEndian,
            CanByteOrderTag::BigEndian => CanByteOrder::BigEndian,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanTimeoutPolicyTag {
    HoldLast,
    UseDefault,
    SetZero,
}

impl From<CanTimeoutPolicyTag> for CanTimeoutPolicy {
    fn from(tag: CanTimeoutPolicyTag) -> Self {
        match tag {
            CanTimeoutPolicyTag::HoldLast => CanTimeoutPolicy::HoldLast,
            CanTimeoutPolicyTag::UseDefault => CanTimeoutPolicy::UseDefault,
            CanTimeoutPolicyTag::SetZero => CanTimeoutPolicy::SetZero,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicOpTag {
    Add,
    Sub,
    Mul,
    Div,
    Abs,
    Clamp,
    Sum,
    Avg,
    Min,
    Max,
    Scale,
    Map,
    Gt,
    Lt,
    Gte,
    Lte,
    Eq,
    Range,
    And,
    Or,
    Not,
    Xor,
    MovingAvg,
    LowPass,
    RateOfChange,
    Conditional,
    Hysteresis,
    Debounce,
    Deadband,
}

impl From<LogicOpTag> for LogicOp {
    fn from(tag: LogicOpTag) -> Self {
        match tag {
            LogicOpTag::Add => LogicOp::Add,
            LogicOpTag::Sub => LogicOp::Sub,
            LogicOpTag::Mul => LogicOp::Mul,
            LogicOpTag::Div => LogicOp::Div,
            LogicOpTag::Abs => LogicOp::Abs,
            LogicOpTag::Clamp => LogicOp::Clamp,
            LogicOpTag::Sum => LogicOp::Sum,
            LogicOpTag::Avg => LogicOp::Avg,
            LogicOpTag::Min => LogicOp::Min,
            LogicOpTag::Max => LogicOp::Max,
            LogicOpTag::Scale => LogicOp::Scale,
            LogicOpTag::Map => LogicOp::Map,
            LogicOpTag::Gt => LogicOp::Gt,
            LogicOpTag::Lt => LogicOp::Lt,
            LogicOpTag::Gte => LogicOp::Gte,
            LogicOpTag::Lte => LogicOp::Lte,
            LogicOpTag::Eq => LogicOp::Eq,
            LogicOpTag::Range => LogicOp::Range,
            LogicOpTag::And => LogicOp::And,
            LogicOpTag::Or => LogicOp::Or,
            LogicOpTag::Not => LogicOp::Not,
            LogicOpTag::Xor => LogicOp::Xor,
            LogicOpTag::MovingAvg => LogicOp::MovingAvg,
            LogicOpTag::LowPass => LogicOp::LowPass,
            LogicOpTag::RateOfChange => LogicOp::RateOfChange,
            LogicOpTag::Conditional => LogicOp::Conditional,
            LogicOpTag::Hysteresis => LogicOp::Hysteresis,
            LogicOpTag::Debounce => LogicOp::Debounce,
            LogicOpTag::Deadband => LogicOp::Deadband,
        }
    }
}

impl ChannelConfig {
    /// Build the kind-specific config record for this entry, defaulting
    /// any missing type tag to the first listed variant — matching the
    /// corpus's "a minimal entry still parses" config style.
    pub fn to_channel_def(&self) -> Result<ChannelDef, ConfigError> {
        let kind = match self.kind {
            ChannelKindTag::AnalogIn => ChannelKind::AnalogIn(AnalogInConfig {
                input_type: self.analog_input_type.unwrap_or(AnalogInputTypeTag::Voltage).into(),
                scale: self.scale,
                offset: self.offset,
                raw_min: self.raw_min,
                raw_max: self.raw_max,
                min_value: self.min_value,
                max_value: self.max_value,
                filter_alpha: self.filter_alpha,
                thermistor_beta: self.thermistor_beta,
                thermistor_r25: self.thermistor_r25,
                thermistor_pullup: self.thermistor_pullup,
            }),
            ChannelKindTag::DigitalIn => ChannelKind::DigitalIn(DigitalInConfig {
                input_type: self.digital_input_type.unwrap_or(DigitalInputTypeTag::OnOff).into(),
                inverted: self.inverted,
                debounce_ms: self.debounce_ms,
                pulses_per_unit: self.pulses_per_unit,
                min_freq_hz: self.min_freq_hz,
                max_freq_hz: self.max_freq_hz,
            }),
            ChannelKindTag::CanRx => {
                if self.bit_length == 0 || self.bit_length > 64 {
                    return Err(ConfigError::ValidationError(format!(
                        "channel {}: bit_length must be in 1..=64",
                        self.id
                    )));
                }
                let max_id = if self.extended { (1u32 << 29) - 1 } else { (1u32 << 11) - 1 };
                if self.message_id > max_id {
                    return Err(ConfigError::ValidationError(format!(
                        "channel {}: message_id {} exceeds {}-bit range for extended={}",
                        self.id,
                        self.message_id,
                        if self.extended { 29 } else { 11 },
                        self.extended
                    )));
                }
                ChannelKind::CanRx(CanRxConfig {
                    message_id: self.message_id,
                    extended: self.extended,
                    start_bit: self.start_bit,
                    bit_length: self.bit_length,
                    data_type: self.data_type.unwrap_or(CanDataTypeTag::Unsigned).into(),
                    byte_order: self.byte_order.unwrap_or(CanByteOrderTag::LittleEndian).into(),
                    scale: self.scale as f32,
                    offset: self.offset as f32,
                    timeout_ms: self.timeout_ms,
                    timeout_policy: self.timeout_policy.unwrap_or(CanTimeoutPolicyTag::HoldLast).into(),
                    default_value: self.default_value,
                })
            }
            ChannelKindTag::Logic => {
                if self.inputs.len() > racing_common::consts::MAX_LOGIC_INPUTS {
                    return Err(ConfigError::ValidationError(format!(
                        "channel {}: at most {} logic inputs",
                        self.id,
                        racing_common::consts::MAX_LOGIC_INPUTS
                    )));
                }
                let mut inputs = heapless::Vec::new();
                for id in &self.inputs {
                    let _ = inputs.push(*id);
                }
                let mut params = [0.0f64; racing_common::consts::MAX_LOGIC_PARAMS];
                for (slot, value) in params.iter_mut().zip(self.params.iter()) {
                    *slot = *value;
                }
                ChannelKind::Logic(LogicConfig {
                    operation: self.operation.unwrap_or(LogicOpTag::Add).into(),
                    inputs,
                    params,
                    state: f64::NAN,
                })
            }
            ChannelKindTag::GpsDerived => ChannelKind::GpsDerived,
            ChannelKindTag::LapDerived => ChannelKind::LapDerived,
            ChannelKindTag::System => ChannelKind::System,
        };

        let mut def = ChannelDef::new(self.id, &self.name, &self.units, kind, self.decimals);
        def.enabled = self.enabled;
        Ok(def)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelsFile {
    pub format_version: u32,
    #[serde(default, rename = "channel")]
    pub channel: Vec<ChannelConfig>,
}
