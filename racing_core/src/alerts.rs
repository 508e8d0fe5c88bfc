//! The Alert & Health Monitor (E): threshold/staleness rule evaluation with
//! latching acknowledgement (`spec.md` §4.5).

use heapless::{String, Vec};
use racing_common::consts::{MAX_ALERT_RULES, MAX_DIAGNOSTIC_LEN, MAX_NAME_LEN};
use racing_common::error::RuntimeError;

use crate::bus::SignalBus;

/// Diagnostic lines produced by `AlertMonitor::evaluate` for the health
/// monitor's stale-signal specialization (`spec.md` §4.5). Capped at
/// `MAX_ALERT_RULES` since at most one is emitted per rule per call.
pub type Diagnostics = Vec<String<MAX_DIAGNOSTIC_LEN>, MAX_ALERT_RULES>;

/// Comparison performed against the monitored channel's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Lt,
    Gt,
    Lte,
    Gte,
    /// Fires when the channel has not updated within `threshold` ms.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warn,
    Critical,
}

/// One alert rule, bound to a channel by name (`spec.md` §3.3).
#[derive(Debug, Clone)]
pub struct AlertRule {
    pub id: u16,
    pub channel_name: String<MAX_NAME_LEN>,
    pub comparator: Comparator,
    pub threshold: f64,
    pub severity: Severity,
    /// Once active, stays active until `acknowledge` is called even if the
    /// condition clears (`spec.md` §4.5 "latching").
    pub latch_until_ack: bool,

    // ─── Runtime state ──────────────────────────────────────────────
    active: bool,
    acked: bool,
}

impl AlertRule {
    pub fn new(
        id: u16,
        channel_name: &str,
        comparator: Comparator,
        threshold: f64,
        severity: Severity,
        latch_until_ack: bool,
    ) -> Self {
        Self {
            id,
            channel_name: String::try_from(channel_name).unwrap_or_default(),
            comparator,
            threshold,
            severity,
            latch_until_ack,
            active: false,
            acked: true,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// Owns the fixed-capacity rule table and evaluates it every tick.
#[derive(Debug, Default)]
pub struct AlertMonitor {
    rules: Vec<AlertRule, MAX_ALERT_RULES>,
}

impl AlertMonitor {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn add_rule(&mut self, rule: AlertRule) -> Result<(), RuntimeError> {
        if self.rules.iter().any(|r| r.id == rule.id) {
            return Err(RuntimeError::AlreadyExists);
        }
        self.rules.push(rule).map_err(|_| RuntimeError::Capacity)
    }

    /// Acknowledge a latched rule. Clears `active` immediately; the next
    /// `evaluate` re-raises it if the condition still holds.
    pub fn acknowledge(&mut self, rule_id: u16) -> Result<(), RuntimeError> {
        let rule = self
            .rules
            .iter_mut()
            .find(|r| r.id == rule_id)
            .ok_or(RuntimeError::NotFound)?;
        rule.acked = true;
        rule.active = false;
        Ok(())
    }

    pub fn is_active(&self, rule_id: u16) -> Option<bool> {
        self.rules.iter().find(|r| r.id == rule_id).map(|r| r.active)
    }

    /// Evaluate every rule against the current bus state. `now_ms` is used
    /// for staleness comparisons. Returns one diagnostic line per `Stale`
    /// rule that just rose to active — the health monitor specialization of
    /// this component, which writes through the logger's diagnostic channel
    /// in addition to the ordinary active-alert bookkeeping (`spec.md`
    /// §4.5, §6).
    pub fn evaluate(&mut self, bus: &SignalBus, now_ms: u64) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();
        for rule in &mut self.rules {
            let was_active = rule.active;
            let (value, stale) = match rule.comparator {
                Comparator::Stale => {
                    let stale = bus.is_stale(&rule.channel_name, now_ms, rule.threshold as u64);
                    (0.0, stale)
                }
                _ => {
                    let value = bus.get_numeric(&rule.channel_name).unwrap_or(f64::NAN);
                    (value, false)
                }
            };

            let raw_active = match rule.comparator {
                Comparator::Lt => value < rule.threshold,
                Comparator::Gt => value > rule.threshold,
                Comparator::Lte => value <= rule.threshold,
                Comparator::Gte => value >= rule.threshold,
                Comparator::Stale => stale,
            };

            if raw_active {
                if !was_active {
                    rule.acked = false;
                    tracing::warn!(
                        rule_id = rule.id,
                        channel = rule.channel_name.as_str(),
                        severity = ?rule.severity,
                        "alert raised"
                    );
                    if rule.comparator == Comparator::Stale {
                        let line: String<MAX_DIAGNOSTIC_LEN> = format_stale_diagnostic(
                            rule.channel_name.as_str(),
                            rule.threshold as u64,
                        );
                        let _ = diagnostics.push(line);
                    }
                }
                rule.active = true;
            } else if !rule.latch_until_ack || rule.acked {
                rule.active = false;
            }
            // else: condition cleared but rule is latched and un-acked — stays active.
        }
        diagnostics
    }
}

fn format_stale_diagnostic(channel: &str, max_age_ms: u64) -> String<MAX_DIAGNOSTIC_LEN> {
    use core::fmt::Write;
    let mut line = String::new();
    let _ = write!(line, "health: {channel} stale (>{max_age_ms} ms)");
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_crossing_raises_and_clears() {
        let mut mon = AlertMonitor::new();
        mon.add_rule(AlertRule::new(1, "oil_pressure", Comparator::Lt, 10.0, Severity::Critical, false))
            .unwrap();
        let mut bus = SignalBus::new();
        bus.set_numeric("oil_pressure", 20.0, 0);
        mon.evaluate(&bus, 0);
        assert_eq!(mon.is_active(1), Some(false));

        bus.set_numeric("oil_pressure", 5.0, 1);
        mon.evaluate(&bus, 1);
        assert_eq!(mon.is_active(1), Some(true));

        bus.set_numeric("oil_pressure", 20.0, 2);
        mon.evaluate(&bus, 2);
        assert_eq!(mon.is_active(1), Some(false));
    }

    #[test]
    fn latched_rule_stays_active_until_acknowledged() {
        let mut mon = AlertMonitor::new();
        mon.add_rule(AlertRule::new(1, "water_temp", Comparator::Gt, 110.0, Severity::Critical, true))
            .unwrap();
        let mut bus = SignalBus::new();
        bus.set_numeric("water_temp", 120.0, 0);
        mon.evaluate(&bus, 0);
        assert_eq!(mon.is_active(1), Some(true));

        bus.set_numeric("water_temp", 90.0, 1);
        mon.evaluate(&bus, 1);
        assert_eq!(mon.is_active(1), Some(true), "latched rule must survive condition clearing");

        mon.acknowledge(1).unwrap();
        assert_eq!(mon.is_active(1), Some(false));
    }

    #[test]
    fn staleness_rule_fires_when_channel_goes_quiet() {
        let mut mon = AlertMonitor::new();
        mon.add_rule(AlertRule::new(1, "gps_fix", Comparator::Stale, 2_000.0, Severity::Warn, false))
            .unwrap();
        let mut bus = SignalBus::new();
        bus.set_numeric("gps_fix", 1.0, 0);
        let none_yet = mon.evaluate(&bus, 500);
        assert_eq!(mon.is_active(1), Some(false));
        assert!(none_yet.is_empty());

        let diagnostics = mon.evaluate(&bus, 3_000);
        assert_eq!(mon.is_active(1), Some(true));
        assert_eq!(diagnostics.len(), 1, "rising edge into stale emits one diagnostic line");
        assert_eq!(diagnostics[0].as_str(), "health: gps_fix stale (>2000 ms)");

        // Still stale on the next tick — already active, no repeat diagnostic.
        let repeat = mon.evaluate(&bus, 3_500);
        assert!(repeat.is_empty(), "diagnostic only fires on the rising edge");
    }

    #[test]
    fn threshold_rule_rising_edge_emits_no_diagnostic() {
        let mut mon = AlertMonitor::new();
        mon.add_rule(AlertRule::new(1, "oil_pressure", Comparator::Lt, 10.0, Severity::Critical, false))
            .unwrap();
        let mut bus = SignalBus::new();
        bus.set_numeric("oil_pressure", 5.0, 0);
        let diagnostics = mon.evaluate(&bus, 0);
        assert_eq!(mon.is_active(1), Some(true));
        assert!(diagnostics.is_empty(), "only the stale specialization routes through the logger");
    }

    #[test]
    fn duplicate_rule_id_rejected() {
        let mut mon = AlertMonitor::new();
        mon.add_rule(AlertRule::new(1, "a", Comparator::Gt, 0.0, Severity::Info, false)).unwrap();
        assert_eq!(
            mon.add_rule(AlertRule::new(1, "b", Comparator::Gt, 0.0, Severity::Info, false)),
            Err(RuntimeError::AlreadyExists)
        );
    }
}
