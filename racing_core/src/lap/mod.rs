//! The GPS-driven Lap Timer (F): track geometry, line-crossing detection,
//! and the lap/sector state machine (`spec.md` §4.6, §3.4).

pub mod geo;
pub mod timer;
