//! The discriminated error taxonomy shared by every subsystem.
//!
//! `spec.md` §7 requires a single, closed error surface: transformation and
//! evaluation errors are absorbed internally (they bump a counter and mark
//! the produced signal invalid) while configuration/init errors surface to
//! the boot sequence. `RuntimeError` is the variant set every subsystem
//! (bus, registry, codec, math engine, alerts, lap timer, display SM) maps
//! its failures onto.

use thiserror::Error;

/// Error taxonomy for the racing dashboard core runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// Null reference, out-of-range index, or zero capacity.
    #[error("invalid parameter")]
    InvalidParam,

    /// Operation called before subsystem init.
    #[error("subsystem not initialized")]
    NotInitialized,

    /// Unknown channel id, signal name, or lap index.
    #[error("not found")]
    NotFound,

    /// Duplicate channel id on registration.
    #[error("already exists")]
    AlreadyExists,

    /// A fixed-size table is full.
    #[error("capacity exceeded")]
    Capacity,

    /// An awaited event (CAN RX, storage write) did not complete in time.
    #[error("timeout")]
    Timeout,

    /// The channel kind does not support the requested operation.
    #[error("invalid type for operation")]
    InvalidType,

    /// Persisted config or log file header is unparseable or version mismatched.
    #[error("invalid format")]
    InvalidFormat,

    /// The underlying peripheral (storage, UART, CAN) reported failure.
    #[error("transport failure")]
    Transport,
}

/// Convenience alias used throughout the workspace.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_display_without_panicking() {
        for e in [
            RuntimeError::InvalidParam,
            RuntimeError::NotInitialized,
            RuntimeError::NotFound,
            RuntimeError::AlreadyExists,
            RuntimeError::Capacity,
            RuntimeError::Timeout,
            RuntimeError::InvalidType,
            RuntimeError::InvalidFormat,
            RuntimeError::Transport,
        ] {
            assert!(!e.to_string().is_empty());
        }
    }
}
