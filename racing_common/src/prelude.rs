//! Prelude module for common re-exports.
//!
//! ```rust
//! use racing_common::prelude::*;
//! ```

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{check_version, ConfigError, ConfigLoader, SharedConfig};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{MAX_CHANNELS, MAX_DIGITAL_SIGNALS, MAX_NUMERIC_SIGNALS};

// ─── Errors ─────────────────────────────────────────────────────────
pub use crate::error::{RuntimeError, RuntimeResult};
