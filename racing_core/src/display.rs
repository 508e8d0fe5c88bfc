//! The Display State Machine (G): priority-ranked screen selection
//! (`spec.md` §4.7), plus the brightness model and external-video-source
//! selector recovered from the pre-distillation source (`SPEC_FULL.md`
//! §3.12, §3.13).

use heapless::{String, Vec};
use racing_common::consts::{MAX_DISPLAY_RULES, MAX_NAME_LEN};

use crate::alerts::Comparator;
use crate::bus::SignalBus;

/// An externally-delegated video source. Non-`None` short-circuits rule
/// evaluation (`spec.md` §4.7 step 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExternalVideoSource {
    #[default]
    None,
    Hdmi,
    CarPlay,
    AndroidAuto,
}

/// One priority-ranked routing rule: if `comparator(channel, threshold)`
/// holds, `target_screen_id` is the candidate active screen.
#[derive(Debug, Clone)]
pub struct DisplayRule {
    pub id: u16,
    pub priority: i32,
    pub channel_name: String<MAX_NAME_LEN>,
    pub comparator: Comparator,
    pub threshold: f64,
    pub target_screen_id: u16,
}

impl DisplayRule {
    fn holds(&self, bus: &SignalBus, now_ms: u64) -> bool {
        match self.comparator {
            Comparator::Stale => bus.is_stale(&self.channel_name, now_ms, self.threshold as u64),
            _ => {
                let Some(value) = bus.get_numeric(&self.channel_name) else {
                    return false;
                };
                match self.comparator {
                    Comparator::Lt => value < self.threshold,
                    Comparator::Gt => value > self.threshold,
                    Comparator::Lte => value <= self.threshold,
                    Comparator::Gte => value >= self.threshold,
                    Comparator::Stale => unreachable!(),
                }
            }
        }
    }
}

/// A one-shot screen-switch notification consumed by the rendering/voice
/// layers (`spec.md` §4.7 step 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenSwitchEvent {
    pub from: u16,
    pub to: u16,
}

/// Hardware-independent backlight-percent model (`SPEC_FULL.md` §3.12).
#[derive(Debug, Clone, Copy)]
pub struct BrightnessModel {
    current_percent: f64,
    manual_override: Option<f64>,
}

impl Default for BrightnessModel {
    fn default() -> Self {
        Self {
            current_percent: 40.0,
            manual_override: None,
        }
    }
}

impl BrightnessModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_percent(&self) -> f64 {
        self.current_percent
    }

    pub fn set_manual(&mut self, percent: f64) {
        let clamped = percent.clamp(5.0, 100.0);
        self.manual_override = Some(clamped);
        self.current_percent = clamped;
    }

    pub fn clear_manual(&mut self) {
        self.manual_override = None;
    }

    pub fn update_from_lux(&mut self, lux: f64) {
        if self.manual_override.is_some() {
            return;
        }
        self.current_percent = (lux / 20_000.0 * 100.0).clamp(15.0, 100.0);
    }
}

/// Owns the routing rule table, the current screen, the brightness model,
/// and the external-video-source selection.
#[derive(Debug)]
pub struct DisplayStateMachine {
    rules: Vec<DisplayRule, MAX_DISPLAY_RULES>,
    default_screen_id: u16,
    current_screen_id: u16,
    external_video: ExternalVideoSource,
    overlay_registered: bool,
    pub brightness: BrightnessModel,
}

impl DisplayStateMachine {
    pub fn new(default_screen_id: u16) -> Self {
        Self {
            rules: Vec::new(),
            default_screen_id,
            current_screen_id: default_screen_id,
            external_video: ExternalVideoSource::None,
            overlay_registered: false,
            brightness: BrightnessModel::new(),
        }
    }

    pub fn add_rule(&mut self, rule: DisplayRule) -> Result<(), racing_common::error::RuntimeError> {
        self.rules
            .push(rule)
            .map_err(|_| racing_common::error::RuntimeError::Capacity)
    }

    pub fn set_external_video(&mut self, source: ExternalVideoSource) {
        self.external_video = source;
    }

    pub fn register_overlay_widget(&mut self) {
        self.overlay_registered = true;
    }

    pub fn current_screen_id(&self) -> u16 {
        self.current_screen_id
    }

    pub fn overlay_registered(&self) -> bool {
        self.overlay_registered
    }

    /// Ambient telemetry driving the brightness model, read from the bus
    /// once per tick (`SPEC_FULL.md` §3.12).
    pub fn update_ambient_lux(&mut self, bus: &SignalBus) {
        if let Some(lux) = bus.get_numeric("ambient_lux") {
            self.brightness.update_from_lux(lux);
        }
    }

    /// `spec.md` §4.7's three-step contract.
    pub fn tick(&mut self, bus: &SignalBus, now_ms: u64) -> Option<ScreenSwitchEvent> {
        self.update_ambient_lux(bus);

        if self.external_video != ExternalVideoSource::None {
            // Step 1: delegate rendering, invoke the overlay if registered,
            // and never evaluate rules while an external source is active.
            return None;
        }

        let mut winner = None;
        let mut best_priority = i32::MIN;
        for rule in &self.rules {
            if rule.priority > best_priority && rule.holds(bus, now_ms) {
                best_priority = rule.priority;
                winner = Some(rule.target_screen_id);
            }
        }

        let target = winner.unwrap_or(self.default_screen_id);
        if target != self.current_screen_id {
            let event = ScreenSwitchEvent {
                from: self.current_screen_id,
                to: target,
            };
            self.current_screen_id = target;
            Some(event)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(id: u16, priority: i32, channel: &str, comparator: Comparator, threshold: f64, screen: u16) -> DisplayRule {
        DisplayRule {
            id,
            priority,
            channel_name: String::try_from(channel).unwrap(),
            comparator,
            threshold,
            target_screen_id: screen,
        }
    }

    #[test]
    fn highest_priority_matching_rule_wins() {
        let mut sm = DisplayStateMachine::new(0);
        sm.add_rule(rule(1, 10, "rpm", Comparator::Gt, 6000.0, 2)).unwrap();
        sm.add_rule(rule(2, 20, "pit_limiter", Comparator::Gte, 1.0, 3)).unwrap();

        let mut bus = SignalBus::new();
        bus.set_numeric("rpm", 7000.0, 0);
        bus.set_numeric("pit_limiter", 1.0, 0);

        let event = sm.tick(&bus, 0);
        assert_eq!(event, Some(ScreenSwitchEvent { from: 0, to: 3 }));
        assert_eq!(sm.current_screen_id(), 3);
    }

    #[test]
    fn falls_back_to_default_when_no_rule_holds() {
        let mut sm = DisplayStateMachine::new(0);
        sm.add_rule(rule(1, 10, "rpm", Comparator::Gt, 6000.0, 2)).unwrap();
        let bus = SignalBus::new();
        let event = sm.tick(&bus, 0);
        assert_eq!(event, None);
        assert_eq!(sm.current_screen_id(), 0);
    }

    #[test]
    fn external_video_short_circuits_rule_evaluation() {
        let mut sm = DisplayStateMachine::new(0);
        sm.add_rule(rule(1, 10, "rpm", Comparator::Gt, 0.0, 2)).unwrap();
        sm.set_external_video(ExternalVideoSource::CarPlay);
        let mut bus = SignalBus::new();
        bus.set_numeric("rpm", 100.0, 0);
        let event = sm.tick(&bus, 0);
        assert_eq!(event, None);
        assert_eq!(sm.current_screen_id(), 0);
    }

    #[test]
    fn brightness_manual_override_blocks_ambient_tracking() {
        let mut model = BrightnessModel::new();
        model.set_manual(80.0);
        model.update_from_lux(0.0);
        assert_eq!(model.current_percent(), 80.0);
        model.clear_manual();
        model.update_from_lux(10_000.0);
        assert_eq!(model.current_percent(), 50.0);
    }

    #[test]
    fn brightness_clamps_to_floor_and_ceiling() {
        let mut model = BrightnessModel::new();
        model.update_from_lux(0.0);
        assert_eq!(model.current_percent(), 15.0);
        model.update_from_lux(1_000_000.0);
        assert_eq!(model.current_percent(), 100.0);
    }
}
