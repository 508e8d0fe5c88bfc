//! The bounded MPSC ingress queue feeding the Signal Bus.
//!
//! Any external thread (CAN ISR, ADC DMA completion, GPS UART parser) writes
//! to this queue instead of calling the bus's `set_*` directly (`spec.md`
//! §4.1, §5). The orchestrator drains it once at the start of each tick,
//! which removes locks from the hot bus-read/write path while preserving a
//! consistent per-tick snapshot. Writers observe FIFO order per producer but
//! not across producers (`spec.md` §5).

use racing_common::consts::INGRESS_QUEUE_CAPACITY;
use std::sync::mpsc::{sync_channel, Receiver, SyncSender, TrySendError};

/// CAN frame carried through the ingress queue.
#[derive(Debug, Clone, Copy)]
pub struct CanRxFrame {
    pub iface: u8,
    pub id: u32,
    pub extended: bool,
    pub fd: bool,
    pub brs: bool,
    pub rtr: bool,
    pub dlc: u8,
    pub data: [u8; 64],
    pub now_ms: u64,
}

/// GPS fix carried through the ingress queue.
#[derive(Debug, Clone, Copy)]
pub struct GpsFix {
    pub lat: f64,
    pub lon: f64,
    pub alt: f64,
    pub speed_mps: f64,
    pub heading_deg: f64,
    pub sats: u8,
    pub fix_valid: bool,
    pub hdop: f32,
    pub utc_ms: u64,
    pub now_ms: u64,
}

/// Tagged item carried from a producer into the orchestrator.
#[derive(Debug, Clone)]
pub enum IngressEvent {
    NumericSet {
        name: &'static str,
        value: f64,
        now_ms: u64,
    },
    DigitalSet {
        name: &'static str,
        value: bool,
        now_ms: u64,
    },
    CanRxFrame(CanRxFrame),
    GpsFix(GpsFix),
}

/// A bounded, many-producer/single-consumer channel of [`IngressEvent`]s.
///
/// Producers call [`IngressQueue::producer`] to obtain a cheap-to-clone
/// handle; the orchestrator owns the single [`IngressQueue`] and drains it
/// with [`IngressQueue::drain_into`].
pub struct IngressQueue {
    tx: SyncSender<IngressEvent>,
    rx: Receiver<IngressEvent>,
}

/// A cloneable producer handle into the ingress queue.
#[derive(Clone)]
pub struct IngressProducer {
    tx: SyncSender<IngressEvent>,
}

impl IngressProducer {
    /// Enqueue an event. Never blocks the calling producer thread; if the
    /// queue is momentarily full the event is dropped and logged.
    pub fn send(&self, event: IngressEvent) {
        if let Err(TrySendError::Full(_)) = self.tx.try_send(event) {
            tracing::warn!("ingress queue full, event dropped");
        }
    }
}

impl Default for IngressQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl IngressQueue {
    /// Create a new bounded queue with [`INGRESS_QUEUE_CAPACITY`] slots.
    pub fn new() -> Self {
        let (tx, rx) = sync_channel(INGRESS_QUEUE_CAPACITY);
        Self { tx, rx }
    }

    /// Obtain a cloneable producer handle.
    pub fn producer(&self) -> IngressProducer {
        IngressProducer {
            tx: self.tx.clone(),
        }
    }

    /// Drain all currently-queued events into `out`, in arrival order.
    /// Called once at the start of each tick (`spec.md` §4.8).
    pub fn drain_into(&self, out: &mut Vec<IngressEvent>) {
        while let Ok(event) = self.rx.try_recv() {
            out.push(event);
        }
    }
}
