//! The Math/Logic Engine (D): evaluates `Logic` channels in dependency
//! order once per tick (`spec.md` §4.4).
//!
//! The evaluation order is a topological sort over `Logic` channels by
//! their referenced input ids, computed whenever the channel table changes
//! rather than re-derived every tick. A cycle is rejected instead of
//! silently breaking the order.

use crate::bus::SignalBus;
use crate::channel::registry::ChannelRegistry;
use crate::channel::types::ChannelKind;
use crate::math::ops;
use heapless::Vec;
use racing_common::consts::{MAX_CHANNELS, MAX_LOGIC_INPUTS};
use racing_common::error::RuntimeError;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Walks registered `Logic` channels in dependency order and writes their
/// results back into the registry and onto the bus.
#[derive(Debug, Default)]
pub struct MathEngine {
    order: Vec<u16, MAX_CHANNELS>,
}

impl MathEngine {
    pub fn new() -> Self {
        Self { order: Vec::new() }
    }

    /// Recompute the evaluation order. Call after any channel registration
    /// change. Fails with `InvalidParam` if the `Logic` channels' input
    /// references form a cycle.
    pub fn rebuild(&mut self, registry: &ChannelRegistry) -> Result<(), RuntimeError> {
        let mut logic_ids: Vec<u16, MAX_CHANNELS> = Vec::new();
        registry.for_each(|def| {
            if matches!(def.kind, ChannelKind::Logic(_)) {
                let _ = logic_ids.push(def.id);
            }
        });

        let mut marks: Vec<(u16, Mark), MAX_CHANNELS> = Vec::new();
        for &id in &logic_ids {
            let _ = marks.push((id, Mark::Unvisited));
        }

        let mut order: Vec<u16, MAX_CHANNELS> = Vec::new();
        for &id in &logic_ids {
            visit(id, registry, &mut marks, &mut order)?;
        }

        self.order = order;
        Ok(())
    }

    /// Evaluate every `Logic` channel once, in dependency order.
    pub fn evaluate(&self, registry: &mut ChannelRegistry, bus: &mut SignalBus, now_ms: u64) {
        for &id in &self.order {
            let Some((op, input_ids, params, state, name)) = read_logic(registry, id) else {
                continue;
            };

            let mut values = [0.0f64; MAX_LOGIC_INPUTS];
            for (i, input_id) in input_ids.iter().enumerate() {
                values[i] = registry.get_value(*input_id).unwrap_or(0.0);
            }

            let mut state_out = state;
            let result = ops::evaluate(op, &values[..input_ids.len()], &params, state, &mut state_out);

            if let Some(def) = registry.get_def_mut(id) {
                if let ChannelKind::Logic(logic) = &mut def.kind {
                    logic.state = state_out;
                }
            }
            let _ = registry.set_value(id, result as f32);
            bus.set_numeric(&name, result, now_ms);
        }
    }
}

type LogicSnapshot = (
    ops::LogicOp,
    Vec<u16, MAX_LOGIC_INPUTS>,
    [f64; racing_common::consts::MAX_LOGIC_PARAMS],
    f64,
    heapless::String<racing_common::consts::MAX_NAME_LEN>,
);

fn read_logic(registry: &ChannelRegistry, id: u16) -> Option<LogicSnapshot> {
    let def = registry.get_def(id)?;
    let ChannelKind::Logic(logic) = &def.kind else {
        return None;
    };
    Some((
        logic.operation,
        logic.inputs.clone(),
        logic.params,
        logic.state,
        def.name.clone(),
    ))
}

fn visit(
    id: u16,
    registry: &ChannelRegistry,
    marks: &mut Vec<(u16, Mark), MAX_CHANNELS>,
    order: &mut Vec<u16, MAX_CHANNELS>,
) -> Result<(), RuntimeError> {
    let mark = marks.iter().find(|(i, _)| *i == id).map(|(_, m)| *m);
    match mark {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::InProgress) => return Err(RuntimeError::InvalidParam),
        None => return Ok(()), // not a Logic channel, nothing to order
        Some(Mark::Unvisited) => {}
    }

    if let Some(entry) = marks.iter_mut().find(|(i, _)| *i == id) {
        entry.1 = Mark::InProgress;
    }

    if let Some(def) = registry.get_def(id) {
        if let ChannelKind::Logic(logic) = &def.kind {
            for &input_id in &logic.inputs {
                visit(input_id, registry, marks, order)?;
            }
        }
    }

    if let Some(entry) = marks.iter_mut().find(|(i, _)| *i == id) {
        entry.1 = Mark::Done;
    }
    order.push(id).map_err(|_| RuntimeError::Capacity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::types::{AnalogInConfig, AnalogInputType, ChannelDef, LogicConfig};
    use crate::math::ops::LogicOp;

    fn analog(id: u16, name: &str) -> ChannelDef {
        ChannelDef::new(
            id,
            name,
            "",
            ChannelKind::AnalogIn(AnalogInConfig {
                input_type: AnalogInputType::Voltage,
                scale: 1.0,
                offset: 0.0,
                raw_min: 0.0,
                raw_max: 65535.0,
                min_value: -1000.0,
                max_value: 1000.0,
                filter_alpha: 0.0,
                thermistor_beta: 0.0,
                thermistor_r25: 0.0,
                thermistor_pullup: 0.0,
            }),
            2,
        )
    }

    fn logic(id: u16, name: &str, op: LogicOp, inputs: &[u16]) -> ChannelDef {
        let mut hinputs = Vec::new();
        for &i in inputs {
            hinputs.push(i).unwrap();
        }
        ChannelDef::new(
            id,
            name,
            "",
            ChannelKind::Logic(LogicConfig {
                operation: op,
                inputs: hinputs,
                params: [0.0; 4],
                state: f64::NAN,
            }),
            2,
        )
    }

    #[test]
    fn evaluates_chain_in_dependency_order() {
        let mut reg = ChannelRegistry::new();
        reg.register(analog(1, "a")).unwrap();
        reg.register(analog(2, "b")).unwrap();
        reg.register(logic(3, "sum_ab", LogicOp::Add, &[1, 2])).unwrap();
        reg.register(logic(4, "double_sum", LogicOp::Scale, &[3])).unwrap();
        if let ChannelKind::Logic(cfg) = &mut reg.get_def_mut(4).unwrap().kind {
            cfg.params[0] = 2.0;
        }

        let mut bus = SignalBus::new();
        reg.update_raw(1, 10, 0, &mut bus).unwrap();
        reg.update_raw(2, 20, 0, &mut bus).unwrap();

        let mut engine = MathEngine::new();
        engine.rebuild(&reg).unwrap();
        engine.evaluate(&mut reg, &mut bus, 0);

        assert_eq!(reg.get_value(3), Some(30.0));
        assert_eq!(reg.get_value(4), Some(60.0));
    }

    #[test]
    fn cycle_is_rejected() {
        let mut reg = ChannelRegistry::new();
        // Build a two-node cycle by hand: register both non-cyclically first,
        // then mutate one input list to point back, bypassing the
        // registration-time input-exists check.
        reg.register(logic(1, "a", LogicOp::Add, &[])).unwrap();
        reg.register(logic(2, "b", LogicOp::Add, &[1])).unwrap();
        if let ChannelKind::Logic(cfg) = &mut reg.get_def_mut(1).unwrap().kind {
            cfg.inputs.push(2).unwrap();
        }

        let mut engine = MathEngine::new();
        assert_eq!(engine.rebuild(&reg), Err(RuntimeError::InvalidParam));
    }

    #[test]
    fn missing_input_channel_yields_zero() {
        let mut reg = ChannelRegistry::new();
        reg.register(logic(1, "derived", LogicOp::Add, &[])).unwrap();
        let mut engine = MathEngine::new();
        engine.rebuild(&reg).unwrap();
        let mut bus = SignalBus::new();
        engine.evaluate(&mut reg, &mut bus, 0);
        assert_eq!(reg.get_value(1), Some(0.0));
    }
}
