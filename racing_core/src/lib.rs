//! Racing Dashboard Core Runtime
//!
//! The five tightly coupled subsystems that normalize vehicle telemetry
//! into a signal namespace, derive channels, detect faults, time laps, and
//! select the active display screen.
//!
//! # Module Structure
//!
//! - [`bus`] — the Signal Bus (A)
//! - [`ingress`] — the bounded MPSC ingress queue feeding the bus
//! - [`channel`] — the Channel Registry (B) and CAN decoding input (via [`can`])
//! - [`can`] — the CAN Codec (C)
//! - [`math`] — the Math/Logic Engine (D)
//! - [`alerts`] — the Alert & Health Monitor (E)
//! - [`lap`] — the GPS-driven Lap Timer (F)
//! - [`display`] — the Display State Machine (G), brightness model, external video source
//! - [`orchestrator`] — the Runtime Orchestrator (H): the fixed per-tick pipeline

pub mod alerts;
pub mod bus;
pub mod can;
pub mod channel;
pub mod display;
pub mod ingress;
pub mod lap;
pub mod math;
pub mod orchestrator;

pub mod prelude {
    //! Common re-exports for downstream crates.
    pub use crate::alerts::{AlertRule, AlertMonitor, Comparator, Severity};
    pub use crate::bus::SignalBus;
    pub use crate::can::{self, ByteOrder, CanDataType, CanFrame};
    pub use crate::channel::registry::ChannelRegistry;
    pub use crate::channel::types::{ChannelDef, ChannelKind};
    pub use crate::display::{DisplayRule, DisplayStateMachine, ExternalVideoSource};
    pub use crate::ingress::{IngressEvent, IngressQueue};
    pub use crate::lap::timer::{Lap, LapTimer};
    pub use crate::math::engine::MathEngine;
    pub use crate::orchestrator::Orchestrator;
    pub use racing_common::error::{RuntimeError, RuntimeResult};
}
